//! Store writes for restaurants and their overview entries.
//!
//! Overview changes load the restaurant, modify it and save it back; the
//! store rejects the save if someone else wrote the restaurant in between.
use chrono::{DateTime, Utc};
use log::*;

use infra::ids::Id;
use infra::persistence::Storage;

use crate::error::{AppError, Result};

use super::models::{Overview, OverviewFields, Restaurant};

pub fn create_restaurant<D: Storage>(docs: &mut D, mut restaurant: Restaurant) -> Result<Id<Restaurant>> {
    docs.save(&mut restaurant)?;
    info!("Created restaurant {}: {}", restaurant.meta.id, restaurant.name);
    Ok(restaurant.meta.id)
}

pub fn delete_restaurant<D: Storage>(docs: &mut D, id: &Id<Restaurant>) -> Result<bool> {
    let removed = docs.delete(id)?;
    info!("Delete restaurant {}: removed {}", id, removed);
    Ok(removed)
}

pub fn append_overview<D: Storage>(
    docs: &mut D,
    restaurant_id: &Id<Restaurant>,
    overview_id: Id<Overview>,
    fields: OverviewFields,
    now: DateTime<Utc>,
) -> Result<Id<Overview>> {
    let mut restaurant = docs
        .load(restaurant_id)?
        .ok_or(AppError::NotFound("restaurant"))?;

    restaurant
        .overview
        .push(Overview::new(overview_id, fields, now));
    docs.save(&mut restaurant)?;
    debug!("Appended {} to {}", overview_id, restaurant_id);
    Ok(overview_id)
}

pub fn update_overview<D: Storage>(
    docs: &mut D,
    restaurant_id: &Id<Restaurant>,
    overview_id: &Id<Overview>,
    fields: OverviewFields,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut restaurant: Restaurant = docs
        .load(restaurant_id)?
        .ok_or(AppError::NotFound("restaurant"))?;

    let entry = restaurant
        .overview
        .iter_mut()
        .find(|o| o.overview_id == *overview_id)
        .ok_or(AppError::NotFound("overview"))?;
    *entry = Overview::new(*overview_id, fields, now);

    docs.save(&mut restaurant)?;
    debug!("Replaced {} in {}", overview_id, restaurant_id);
    Ok(())
}
