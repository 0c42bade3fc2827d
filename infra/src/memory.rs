//! An in-process document store with the same semantics as the Postgres one,
//! shared between every connection handed out by a [`MemoryConnectionManager`].
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use log::*;
use r2d2::ManageConnection;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::documents::{HasMeta, Version};
use crate::filter::Filter;
use crate::ids::{Entity, Id};
use crate::persistence::{ConcurrencyError, Storage};

#[derive(Debug, Default)]
struct Collections {
    next_version: u64,
    collections: BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocuments {
    inner: Arc<Mutex<Collections>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryConnectionManager {
    docs: MemoryDocuments,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        MemoryDocuments::default()
    }

    fn lock(&self) -> Result<MutexGuard<Collections>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl Storage for MemoryDocuments {
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>> {
        let store = self.lock()?;
        store
            .collections
            .get(D::PREFIX)
            .and_then(|c| c.get(&id.to_string()))
            .map(|json| serde_json::from_value(json.clone()).map_err(anyhow::Error::from))
            .transpose()
    }

    fn save<D: Serialize + HasMeta>(&mut self, document: &mut D) -> Result<()> {
        let mut json = serde_json::to_value(&*document)?;
        let id = document.meta().id.to_string();
        let mut store = self.lock()?;
        let store = &mut *store;

        let collection = store
            .collections
            .entry(D::PREFIX.to_string())
            .or_default();
        let current = collection
            .get(&id)
            .map(|body| body.get("_version").cloned().unwrap_or(Value::Null));
        let expected = if document.meta().is_new() {
            None
        } else {
            Some(Value::String(document.meta().version.as_str().to_string()))
        };
        if current != expected {
            warn!("Save of {} found version {:?} not {:?}", id, current, expected);
            return Err(ConcurrencyError.into());
        }

        store.next_version += 1;
        let version = format!("{:x}", store.next_version);
        json["_version"] = Value::String(version.clone());
        collection.insert(id, json);
        document.meta_mut().version = Version::from(version);
        Ok(())
    }

    fn delete<D: Entity>(&mut self, id: &Id<D>) -> Result<bool> {
        let mut store = self.lock()?;
        let removed = store
            .collections
            .get_mut(D::PREFIX)
            .and_then(|c| c.remove(&id.to_string()))
            .is_some();
        debug!("Delete {} removed: {}", id, removed);
        Ok(removed)
    }

    fn find_raw(&mut self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let store = self.lock()?;
        let found: Vec<Value> = store
            .collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(found)
    }
}

impl MemoryConnectionManager {
    pub fn new() -> Self {
        MemoryConnectionManager::default()
    }
}

impl ManageConnection for MemoryConnectionManager {
    type Connection = MemoryDocuments;
    type Error = Infallible;

    fn connect(&self) -> Result<MemoryDocuments, Infallible> {
        Ok(self.docs.clone())
    }

    fn is_valid(&self, _: &mut MemoryDocuments) -> Result<(), Infallible> {
        Ok(())
    }

    fn has_broken(&self, _: &mut MemoryDocuments) -> bool {
        false
    }
}
