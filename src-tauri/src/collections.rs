use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::request::{new_id, RequestData, SAVED_ID_PREFIX};

pub const COLLECTION_ID_PREFIX: &str = "col-";
pub const DEFAULT_COLLECTION_NAME: &str = "My Collection";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub requests: Vec<RequestData>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(COLLECTION_ID_PREFIX),
            name: name.into(),
            requests: Vec::new(),
        }
    }

    fn request_mut(&mut self, request_id: &str) -> Result<&mut RequestData> {
        self.requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| Error::RequestNotFound(request_id.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStore {
    collections: Vec<Collection>,
}

impl CollectionStore {
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn get(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Collection> {
        self.collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::CollectionNotFound(id.to_string()))
    }

    pub fn add_collection(&mut self, name: impl Into<String>) -> &Collection {
        let collection = Collection::new(name);
        info!(id = %collection.id, name = %collection.name, "collection added");
        self.collections.push(collection);
        &self.collections[self.collections.len() - 1]
    }

    /// Id of the first collection, creating the default one if there is none.
    pub fn ensure_default(&mut self) -> String {
        if let Some(first) = self.collections.first() {
            return first.id.clone();
        }
        self.add_collection(DEFAULT_COLLECTION_NAME).id.clone()
    }

    pub fn rename_collection(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn delete_collection(&mut self, id: &str) -> Result<Collection> {
        let pos = self
            .collections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::CollectionNotFound(id.to_string()))?;
        Ok(self.collections.remove(pos))
    }

    /// Stores a copy of `request` under `name`. A draft gets a fresh saved id; a request that is
    /// already in the collection is replaced in place.
    pub fn save_request(
        &mut self,
        collection_id: &str,
        name: impl Into<String>,
        request: &RequestData,
    ) -> Result<RequestData> {
        let collection = self.get_mut(collection_id)?;
        let mut saved = request.clone();
        saved.name = name.into();
        if saved.is_draft() {
            saved.id = new_id(SAVED_ID_PREFIX);
        }
        match collection.requests.iter_mut().find(|r| r.id == saved.id) {
            Some(existing) => *existing = saved.clone(),
            None => collection.requests.push(saved.clone()),
        }
        info!(collection = collection_id, request = %saved.id, "request saved");
        Ok(saved)
    }

    pub fn rename_request(
        &mut self,
        collection_id: &str,
        request_id: &str,
        name: impl Into<String>,
    ) -> Result<()> {
        self.get_mut(collection_id)?.request_mut(request_id)?.name = name.into();
        Ok(())
    }

    pub fn delete_request(&mut self, collection_id: &str, request_id: &str) -> Result<RequestData> {
        let collection = self.get_mut(collection_id)?;
        let pos = collection
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| Error::RequestNotFound(request_id.to_string()))?;
        Ok(collection.requests.remove(pos))
    }

    pub fn find_request(&self, request_id: &str) -> Option<(&Collection, &RequestData)> {
        self.collections.iter().find_map(|c| {
            c.requests
                .iter()
                .find(|r| r.id == request_id)
                .map(|r| (c, r))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;
    use pretty_assertions::assert_eq;

    #[test]
    fn collection_crud() {
        let mut store = CollectionStore::default();
        let id = store.add_collection("APIs").id.clone();
        assert!(id.starts_with("col-"));

        store.rename_collection(&id, "Renamed").unwrap();
        assert_eq!(store.get(&id).unwrap().name, "Renamed");

        let removed = store.delete_collection(&id).unwrap();
        assert_eq!(removed.name, "Renamed");
        assert!(store.collections().is_empty());
        assert!(matches!(store.delete_collection(&id), Err(Error::CollectionNotFound(_))));
    }

    #[test]
    fn ensure_default_creates_once() {
        let mut store = CollectionStore::default();
        let first = store.ensure_default();
        let second = store.ensure_default();
        assert_eq!(first, second);
        assert_eq!(store.collections().len(), 1);
        assert_eq!(store.collections()[0].name, "My Collection");
    }

    #[test]
    fn saving_a_draft_assigns_an_id_then_upserts() {
        let mut store = CollectionStore::default();
        let col = store.ensure_default();
        let draft = RequestData::draft();

        let saved = store.save_request(&col, "List users", &draft).unwrap();
        assert!(saved.id.starts_with("req-"));
        assert_eq!(saved.name, "List users");

        let mut edited = saved.clone();
        edited.method = HttpMethod::Post;
        let resaved = store.save_request(&col, "Create user", &edited).unwrap();
        assert_eq!(resaved.id, saved.id);

        let requests = &store.get(&col).unwrap().requests;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "Create user");
        assert_eq!(requests[0].method, HttpMethod::Post);
    }

    #[test]
    fn request_rename_delete_and_lookup() {
        let mut store = CollectionStore::default();
        let col = store.ensure_default();
        let saved = store.save_request(&col, "a", &RequestData::draft()).unwrap();

        store.rename_request(&col, &saved.id, "b").unwrap();
        let (owner, found) = store.find_request(&saved.id).unwrap();
        assert_eq!(owner.id, col);
        assert_eq!(found.name, "b");

        assert!(matches!(
            store.rename_request(&col, "req-missing", "x"),
            Err(Error::RequestNotFound(_))
        ));
        store.delete_request(&col, &saved.id).unwrap();
        assert!(store.find_request(&saved.id).is_none());
    }

    #[test]
    fn missing_collection() {
        let mut store = CollectionStore::default();
        let err = store.save_request("col-x", "n", &RequestData::draft()).unwrap_err();
        assert_eq!(err.to_string(), "collection not found: col-x");
    }
}
