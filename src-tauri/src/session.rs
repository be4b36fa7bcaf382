use tracing::info;

use crate::collections::CollectionStore;
use crate::config::ViewerConfig;
use crate::curl::{generate_curl, parse_curl};
use crate::error::{Error, Result};
use crate::history::History;
use crate::request::{RequestData, ResponseData};
use crate::send::{send_and_record, Clock, Transport};
use crate::viewer::JsonViewer;

#[derive(Debug, Clone, Default)]
pub struct Session {
    active: RequestData,
    response: Option<ResponseData>,
    collections: CollectionStore,
    history: History,
}

impl Session {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: History::new(history_limit),
            ..Self::default()
        }
    }

    pub fn active_request(&self) -> &RequestData {
        &self.active
    }

    pub fn response(&self) -> Option<&ResponseData> {
        self.response.as_ref()
    }

    pub fn collections(&self) -> &CollectionStore {
        &self.collections
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn new_request(&mut self) {
        self.active = RequestData::draft();
        self.response = None;
    }

    pub fn update_request(&mut self, edit: impl FnOnce(&mut RequestData)) {
        edit(&mut self.active);
    }

    /// Opens a saved request. The previous response no longer applies and is dropped.
    pub fn select_request(&mut self, request_id: &str) -> Result<()> {
        let (_, request) = self
            .collections
            .find_request(request_id)
            .ok_or_else(|| Error::RequestNotFound(request_id.to_string()))?;
        self.active = request.clone();
        self.response = None;
        Ok(())
    }

    /// Restores both the request and the response of a past send.
    pub fn select_history_item(&mut self, id: &str) -> Result<()> {
        let item = self
            .history
            .get(id)
            .ok_or_else(|| Error::RequestNotFound(id.to_string()))?;
        self.active = item.request.clone();
        self.response = Some(item.response.clone());
        Ok(())
    }

    pub fn send(&mut self, transport: &dyn Transport, clock: &dyn Clock) -> &ResponseData {
        let response = send_and_record(transport, clock, &self.active, &mut self.history);
        self.response.insert(response)
    }

    /// Saves the active request, into `collection_id` or else the first collection (created if
    /// needed), and makes the saved copy active.
    pub fn save_active_request(
        &mut self,
        collection_id: Option<&str>,
        name: impl Into<String>,
    ) -> Result<&RequestData> {
        let collection_id = match collection_id {
            Some(id) => id.to_string(),
            None => self.collections.ensure_default(),
        };
        self.active = self
            .collections
            .save_request(&collection_id, name, &self.active)?;
        Ok(&self.active)
    }

    pub fn rename_request(
        &mut self,
        collection_id: &str,
        request_id: &str,
        name: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        self.collections
            .rename_request(collection_id, request_id, name.clone())?;
        if self.active.id == request_id {
            self.active.name = name;
        }
        Ok(())
    }

    /// Deleting the open request leaves a fresh draft in its place.
    pub fn delete_request(&mut self, collection_id: &str, request_id: &str) -> Result<()> {
        self.collections.delete_request(collection_id, request_id)?;
        if self.active.id == request_id {
            self.new_request();
        }
        Ok(())
    }

    pub fn delete_collection(&mut self, collection_id: &str) -> Result<()> {
        let removed = self.collections.delete_collection(collection_id)?;
        if removed.requests.iter().any(|r| r.id == self.active.id) {
            self.new_request();
        }
        Ok(())
    }

    /// Replaces the active request with one parsed from a cURL command line.
    pub fn import_curl(&mut self, command: &str) -> Result<&RequestData> {
        let request = parse_curl(command)?;
        info!(method = %request.method, url = %request.url, "imported curl command");
        self.active = request;
        self.response = None;
        Ok(&self.active)
    }

    pub fn export_curl(&self) -> String {
        generate_curl(&self.active)
    }

    pub fn response_viewer(&self, config: &ViewerConfig) -> Option<JsonViewer> {
        self.response
            .as_ref()
            .map(|r| JsonViewer::with_config(r.body.clone(), config))
    }
}
