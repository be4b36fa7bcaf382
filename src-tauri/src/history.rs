// Bounded list of sent requests, newest first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::{RequestData, ResponseData};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub request: RequestData,
    pub response: ResponseData,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(request: RequestData, response: ResponseData, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            response,
            timestamp,
        }
    }

    /// Relative age for the history list, e.g. `3 minutes ago`.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let secs = (now - self.timestamp).num_seconds().max(0);
        let (n, unit) = match secs {
            0..=59 => return "just now".to_string(),
            60..=3_599 => (secs / 60, "minute"),
            3_600..=86_399 => (secs / 3_600, "hour"),
            _ => (secs / 86_400, "day"),
        };
        let plural = if n == 1 { "" } else { "s" };
        format!("{n} {unit}{plural} ago")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    items: VecDeque<HistoryItem>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::new(),
            limit,
        }
    }

    /// Loads previously stored items (newest first), dropping any beyond the limit.
    pub fn from_items(items: Vec<HistoryItem>, limit: usize) -> Self {
        let mut history = Self::new(limit);
        history.items = items.into();
        history.items.truncate(limit);
        history
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.items.truncate(limit);
    }

    pub fn record(&mut self, item: HistoryItem) {
        self.items.push_front(item);
        self.items.truncate(self.limit);
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn to_vec(&self) -> Vec<HistoryItem> {
        self.items.iter().cloned().collect()
    }
}
