use actix_cors::Cors;
use actix_web::{http::header, web};
use anyhow::Context;
use log::*;
use r2d2::Pool;

use infra::persistence::Storage;

pub mod catalog;
pub mod config;
pub mod error;
pub mod restaurants;
pub mod services;
pub mod users;

#[cfg(test)]
mod test;

pub use crate::config::Config;
use crate::error::AppError;

pub struct Rustaurant<M: r2d2::ManageConnection> {
    db: Pool<M>,
    catalog: catalog::Catalog<M>,
    restaurants: restaurants::Restaurants<M>,
    users: users::Users<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Rustaurant<M> {
    pub fn new(
        db: Pool<M>,
        auth: users::Auth,
        customers: restaurants::CustomerMatch,
    ) -> Self {
        let catalog = catalog::Catalog::new(db.clone());
        let restaurants = restaurants::Restaurants::new(db.clone(), customers);
        let users = users::Users::new(db.clone(), auth);
        Rustaurant {
            db,
            catalog,
            restaurants,
            users,
        }
    }

    pub fn setup(&self) -> anyhow::Result<()> {
        debug!("Init schema");
        self.db.get()?.setup().context("Setup persistence")?;
        Ok(())
    }

    pub fn catalog(&self) -> &catalog::Catalog<M> {
        &self.catalog
    }

    pub fn restaurants(&self) -> &restaurants::Restaurants<M> {
        &self.restaurants
    }

    pub fn users(&self) -> &users::Users<M> {
        &self.users
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        info!("Booting rustaurant");
        cfg.app_data(web::Data::new(self.users.auth().clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::MalformedPayload(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::MalformedPayload(err.to_string()).into()
            }));

        self.restaurants.configure(cfg);
        self.users.configure(cfg);
    }
}

/// Browsers may call from any origin, with or without a bearer token.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}

impl<M: r2d2::ManageConnection> Clone for Rustaurant<M> {
    fn clone(&self) -> Self {
        Rustaurant {
            db: self.db.clone(),
            catalog: self.catalog.clone(),
            restaurants: self.restaurants.clone(),
            users: self.users.clone(),
        }
    }
}
