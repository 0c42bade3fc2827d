use anyhow::{anyhow, Result};
use err_derive::Error;
use log::*;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use r2d2::ManageConnection;
use r2d2_postgres::PostgresConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::documents::{HasMeta, Version};
use crate::filter::Filter;
use crate::ids::{Entity, Id};

#[derive(Debug, Error, PartialEq, Eq)]
#[error(display = "stale version")]
pub struct ConcurrencyError;

/// A connection to a document store. Documents live in the collection named
/// by their entity prefix and carry their own `_id` and `_version`.
pub trait Storage {
    fn setup(&mut self) -> Result<()>;

    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>>;

    /// Inserts documents that have never been saved, and otherwise replaces
    /// the stored document only if it is still at the version we loaded.
    /// Fails with [`ConcurrencyError`] when either condition is violated. On
    /// success the document's version is updated in place.
    fn save<D: Serialize + HasMeta>(&mut self, document: &mut D) -> Result<()>;

    /// Returns whether a document was removed.
    fn delete<D: Entity>(&mut self, id: &Id<D>) -> Result<bool>;

    /// All documents in `collection` matching `filter`, in id order.
    fn find_raw(&mut self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    fn find<D: DeserializeOwned + Entity>(&mut self, filter: &Filter) -> Result<Vec<D>> {
        self.find_raw(D::PREFIX, filter)?
            .into_iter()
            .map(|json| serde_json::from_value(json).map_err(anyhow::Error::from))
            .collect()
    }
}

/// True when `err` was caused by a stale or conflicting write.
pub fn is_conflict(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<ConcurrencyError>().is_some())
}

pub struct Documents {
    connection: Client,
}

pub struct DocumentConnectionManager(PostgresConnectionManager<NoTls>);

const SETUP_SQL: &str = include_str!("persistence.sql");
const LOAD_SQL: &str = "SELECT body FROM documents WHERE id = $1 AND collection = $2";
const INSERT_SQL: &str = "INSERT INTO documents (id, collection, body) \
                          VALUES ($1, $2, jsonb_set($3::jsonb, '{_version}', to_jsonb(to_hex(txid_current())))) \
                          ON CONFLICT (id) DO NOTHING \
                          RETURNING body ->> '_version'";
const UPDATE_SQL: &str = "UPDATE documents \
                          SET body = jsonb_set($3::jsonb, '{_version}', to_jsonb(to_hex(txid_current()))) \
                          WHERE id = $1 AND collection = $2 \
                          AND body -> '_version' = $3::jsonb -> '_version' \
                          RETURNING body ->> '_version'";
const DELETE_SQL: &str = "DELETE FROM documents WHERE id = $1 AND collection = $2";

impl Documents {
    pub fn wrap(connection: Client) -> Self {
        Documents { connection }
    }

    pub fn get_mut(&mut self) -> &mut Client {
        &mut self.connection
    }
}

impl Storage for Documents {
    fn setup(&mut self) -> Result<()> {
        self.connection.batch_execute(SETUP_SQL)?;
        Ok(())
    }

    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>> {
        let rows = self
            .connection
            .query(LOAD_SQL, &[&id.to_string(), &D::PREFIX])?;

        match rows.first() {
            Some(row) => {
                let json: Value = row.try_get(0)?;
                Ok(Some(serde_json::from_value(json)?))
            }
            None => Ok(None),
        }
    }

    fn save<D: Serialize + HasMeta>(&mut self, document: &mut D) -> Result<()> {
        let json = serde_json::to_value(&*document)?;
        let id = document.meta().id.to_string();
        let sql = if document.meta().is_new() {
            INSERT_SQL
        } else {
            UPDATE_SQL
        };

        let rows = self.connection.query(sql, &[&id, &D::PREFIX, &json])?;
        debug!("Save {} modified {} rows", id, rows.len());
        let row = match rows.first() {
            Some(row) => row,
            None => {
                warn!("Save of {} impacted no rows", id);
                return Err(ConcurrencyError.into());
            }
        };
        let version: String = row.try_get(0)?;
        document.meta_mut().version = Version::from(version);
        Ok(())
    }

    fn delete<D: Entity>(&mut self, id: &Id<D>) -> Result<bool> {
        let nrows = self
            .connection
            .execute(DELETE_SQL, &[&id.to_string(), &D::PREFIX])?;
        debug!("Delete {} removed {} rows", id, nrows);
        Ok(nrows == 1)
    }

    fn find_raw(&mut self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let sql_filter = filter.to_sql(2);
        let sql = format!(
            "SELECT body FROM documents WHERE collection = $1 AND ({}) ORDER BY id COLLATE \"C\"",
            sql_filter.clause
        );
        trace!("find in {}: {} {:?}", collection, sql, sql_filter.params);

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        params.push(&collection);
        params.extend(sql_filter.params.iter().map(|p| p as &(dyn ToSql + Sync)));

        self.connection
            .query(sql.as_str(), &params)?
            .iter()
            .map(|row| row.try_get::<_, Value>(0).map_err(|e| anyhow!(e)))
            .collect()
    }
}

impl DocumentConnectionManager {
    pub fn new(url: &str) -> Result<Self> {
        let config = url.parse::<postgres::Config>()?;
        Ok(DocumentConnectionManager(PostgresConnectionManager::new(
            config, NoTls,
        )))
    }
}

impl ManageConnection for DocumentConnectionManager {
    type Connection = Documents;
    type Error = postgres::Error;

    fn connect(&self) -> Result<Documents, postgres::Error> {
        self.0.connect().map(Documents::wrap)
    }

    fn is_valid(&self, conn: &mut Documents) -> Result<(), postgres::Error> {
        self.0.is_valid(&mut conn.connection)
    }

    fn has_broken(&self, conn: &mut Documents) -> bool {
        self.0.has_broken(&mut conn.connection)
    }
}
