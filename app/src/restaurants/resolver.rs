//! Resolves the menu, customer and critique names on a submitted restaurant
//! to their canonical records. Only ever reads from the store.
use std::str::FromStr;

use err_derive::Error;
use log::*;
use serde::Deserialize;

use infra::filter::Filter;
use infra::persistence::Storage;

use crate::catalog::{Critique, Customer, Menu, Reference};
use crate::error::{AppError, Result};

use super::models::NewRestaurant;

/// How a requested customer name is compared against canonical customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerMatch {
    Exact,
    /// Case-insensitive substring.
    Partial,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error(display = "unknown customer match strategy: {:?}", _0)]
pub struct UnknownStrategy(String);

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub menu: Reference<Menu>,
    pub customers: Vec<Reference<Customer>>,
    pub critiques: Vec<Reference<Critique>>,
}

impl Default for CustomerMatch {
    fn default() -> Self {
        CustomerMatch::Exact
    }
}

impl FromStr for CustomerMatch {
    type Err = UnknownStrategy;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(CustomerMatch::Exact),
            "partial" => Ok(CustomerMatch::Partial),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl CustomerMatch {
    fn filter(&self, name: &str) -> Filter {
        match self {
            CustomerMatch::Exact => Filter::equals("name", name),
            CustomerMatch::Partial => Filter::contains("name", name),
        }
    }
}

pub fn resolve<D: Storage>(
    docs: &mut D,
    form: &NewRestaurant,
    strategy: CustomerMatch,
) -> Result<Resolved> {
    let menu = resolve_menu(docs, &form.menu)?;
    let customers = resolve_customers(docs, &form.customers, strategy)?;
    let critiques = resolve_critiques(docs, &form.critiques)?;
    Ok(Resolved {
        menu,
        customers,
        critiques,
    })
}

fn resolve_menu<D: Storage>(docs: &mut D, name: &str) -> Result<Reference<Menu>> {
    let found = docs.find::<Menu>(&Filter::equals("name", name))?;
    if found.len() > 1 {
        debug!("{} menus named {:?}; using the first", found.len(), name);
    }
    found
        .first()
        .map(Reference::of)
        .ok_or(AppError::InvalidReference("menu"))
}

fn resolve_customers<D: Storage>(
    docs: &mut D,
    names: &[String],
    strategy: CustomerMatch,
) -> Result<Vec<Reference<Customer>>> {
    let mut customers: Vec<Reference<Customer>> = Vec::with_capacity(names.len());
    for name in names {
        let found = docs.find::<Customer>(&strategy.filter(name))?;
        let first = found.first().ok_or_else(|| {
            debug!("No customer matches {:?} ({:?})", name, strategy);
            AppError::InvalidReference("customer")
        })?;
        if customers.iter().all(|c| c.id != first.meta.id) {
            customers.push(Reference::of(first));
        }
    }
    if customers.is_empty() {
        debug!("No customers requested");
        return Err(AppError::InvalidReference("customer"));
    }
    Ok(customers)
}

fn resolve_critiques<D: Storage>(docs: &mut D, names: &[String]) -> Result<Vec<Reference<Critique>>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let found = docs.find::<Critique>(&Filter::one_of("name", names))?;
    if found.len() != names.len() {
        debug!(
            "Requested {} critiques, found {}",
            names.len(),
            found.len()
        );
        return Err(AppError::InvalidReference("critique"));
    }
    Ok(found.iter().map(Reference::of).collect())
}
