use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::Result;
use crate::history::{History, HistoryItem};
use crate::request::{format_size, PreparedRequest, RequestData, ResponseData};

/// The external send primitive.
pub trait Transport: Send + Sync {
    /// Performs the round trip. Network and protocol failures are `Err(Error::Transport)`.
    fn send(&self, request: &PreparedRequest) -> Result<ResponseData>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// Repeated header names are joined with `, `.
pub fn response_from_parts(
    status: u16,
    status_text: impl Into<String>,
    headers: impl IntoIterator<Item = (String, String)>,
    body: String,
    elapsed: Duration,
) -> ResponseData {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        merged
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    let content_type = merged
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.clone())
        .unwrap_or_default();

    ResponseData {
        status,
        status_text: status_text.into(),
        time: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        size: format_size(body.len()),
        headers: merged,
        body,
        content_type,
    }
}

/// Sends `request` and records the exchange in `history`. An invalid URL or a transport error
/// becomes an error response (status 0) and nothing is recorded.
pub fn send_and_record(
    transport: &dyn Transport,
    clock: &dyn Clock,
    request: &RequestData,
    history: &mut History,
) -> ResponseData {
    let result = request.prepare().and_then(|prepared| transport.send(&prepared));
    match result {
        Ok(response) => {
            info!(
                method = %request.method,
                url = %request.url,
                status = response.status,
                time_ms = response.time,
                "request sent"
            );
            history.record(HistoryItem::new(request.clone(), response.clone(), clock.now()));
            response
        }
        Err(e) => {
            warn!(url = %request.url, error = %e, "request failed");
            ResponseData::error(e.to_string())
        }
    }
}
