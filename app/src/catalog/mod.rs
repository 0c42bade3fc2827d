//! Canonical menus, customers and critiques.
use std::marker::PhantomData;

use log::*;
use r2d2::Pool;

use infra::filter::Filter;
use infra::ids::Id;
use infra::persistence::Storage;

use crate::error::{AppError, Result};
use crate::services::{Commandable, Queryable, Request};

mod models;

pub use self::models::{Canonical, Critique, Customer, Menu, Reference};

#[derive(Debug)]
pub struct Catalog<M: r2d2::ManageConnection> {
    db: Pool<M>,
}

/// Registers a canonical record under `name`, returning the existing record
/// when one is already registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register<T> {
    pub name: String,
    _phantom: PhantomData<T>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAll<T>(PhantomData<T>);

impl<T> Register<T> {
    pub fn named(name: &str) -> Self {
        Register {
            name: name.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl<T> ListAll<T> {
    pub fn new() -> Self {
        ListAll(PhantomData)
    }
}

impl<T> Default for ListAll<T> {
    fn default() -> Self {
        ListAll::new()
    }
}

impl<T: Canonical> Request for Register<T> {
    type Resp = Id<T>;
}

impl<T: Canonical> Request for ListAll<T> {
    type Resp = Vec<T>;
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Catalog<M> {
    pub fn new(db: Pool<M>) -> Self {
        Catalog { db }
    }
}

impl<M, D, T> Commandable<Register<T>> for Catalog<M>
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
    T: Canonical,
{
    fn execute(&self, req: Register<T>) -> Result<Id<T>> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::MissingField("name"));
        }

        let mut docs = self.db.get()?;
        let id = T::id_for(name);
        if let Some(existing) = docs.load::<T>(&id)? {
            debug!("{} already registered as {}", name, id);
            return Ok(existing.meta().id);
        }

        let mut record = T::new(id, name);
        docs.save(&mut record)?;
        info!("Registered {}: {}", id, name);
        Ok(id)
    }
}

impl<M, D, T> Queryable<ListAll<T>> for Catalog<M>
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
    T: Canonical,
{
    fn query(&self, _: ListAll<T>) -> Result<Vec<T>> {
        let mut docs = self.db.get()?;
        Ok(docs.find::<T>(&Filter::All)?)
    }
}

impl<M: r2d2::ManageConnection> Clone for Catalog<M> {
    fn clone(&self) -> Self {
        let db = self.db.clone();
        Catalog { db }
    }
}
