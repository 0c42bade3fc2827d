//! Restaurant records: creation with reference checks, search, deletion and
//! the overview entries nested in each restaurant.
use chrono::Utc;
use log::*;
use r2d2::Pool;
use serde_json::Value;

use infra::filter::Filter;
use infra::ids::{Entity, Id, IdGen};
use infra::persistence::Storage;
use infra::projection::Projection;

use crate::error::{AppError, Result};
use crate::services::{Commandable, Queryable, Request};

mod composer;
mod gateway;
mod models;
mod query;
mod resolver;
mod resources;

pub use self::models::{
    NewRestaurant, OneOrMany, Overview, OverviewFields, OverviewForm, Restaurant, RestaurantForm,
};
pub use self::query::{SearchParams, SEARCH_PROJECTION};
pub use self::resolver::{CustomerMatch, Resolved, UnknownStrategy};

#[derive(Debug)]
pub struct Restaurants<M: r2d2::ManageConnection> {
    db: Pool<M>,
    idgen: IdGen,
    customers: CustomerMatch,
}

#[derive(Debug, Clone)]
pub struct CreateRestaurant(pub RestaurantForm);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRestaurant(pub Id<Restaurant>);

#[derive(Debug, Clone)]
pub struct AppendOverview {
    pub restaurant: Id<Restaurant>,
    pub form: OverviewForm,
}

#[derive(Debug, Clone)]
pub struct UpdateOverview {
    pub restaurant: Id<Restaurant>,
    pub overview: Id<Overview>,
    pub form: OverviewForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRestaurants;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRestaurants(pub SearchParams);

impl Request for CreateRestaurant {
    type Resp = Id<Restaurant>;
}

impl Request for DeleteRestaurant {
    type Resp = ();
}

impl Request for AppendOverview {
    type Resp = Id<Overview>;
}

impl Request for UpdateOverview {
    type Resp = ();
}

impl Request for ListRestaurants {
    type Resp = Vec<Restaurant>;
}

impl Request for SearchRestaurants {
    type Resp = Vec<Value>;
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Restaurants<M> {
    pub fn new(db: Pool<M>, customers: CustomerMatch) -> Self {
        let idgen = IdGen::new();
        Restaurants {
            db,
            idgen,
            customers,
        }
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Commandable<CreateRestaurant> for Restaurants<M>
{
    fn execute(&self, req: CreateRestaurant) -> Result<Id<Restaurant>> {
        let form = req.0.validate()?;
        debug!("Create restaurant: {:?}", form);

        let mut docs = self.db.get()?;
        let resolved = resolver::resolve(&mut *docs, &form, self.customers)?;
        let restaurant = composer::compose(self.idgen.generate(), form, resolved);
        gateway::create_restaurant(&mut *docs, restaurant)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Commandable<DeleteRestaurant> for Restaurants<M>
{
    fn execute(&self, req: DeleteRestaurant) -> Result<()> {
        let mut docs = self.db.get()?;
        if gateway::delete_restaurant(&mut *docs, &req.0)? {
            Ok(())
        } else {
            Err(AppError::NotFound("restaurant"))
        }
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Commandable<AppendOverview> for Restaurants<M>
{
    fn execute(&self, req: AppendOverview) -> Result<Id<Overview>> {
        let fields = req.form.validate()?;
        let mut docs = self.db.get()?;
        gateway::append_overview(
            &mut *docs,
            &req.restaurant,
            self.idgen.generate(),
            fields,
            Utc::now(),
        )
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Commandable<UpdateOverview> for Restaurants<M>
{
    fn execute(&self, req: UpdateOverview) -> Result<()> {
        let fields = req.form.validate()?;
        let mut docs = self.db.get()?;
        gateway::update_overview(
            &mut *docs,
            &req.restaurant,
            &req.overview,
            fields,
            Utc::now(),
        )
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Queryable<ListRestaurants> for Restaurants<M>
{
    fn query(&self, _: ListRestaurants) -> Result<Vec<Restaurant>> {
        let mut docs = self.db.get()?;
        let restaurants = docs.find::<Restaurant>(&Filter::All)?;
        debug!("Listed {} restaurants", restaurants.len());
        Ok(restaurants)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Queryable<SearchRestaurants> for Restaurants<M>
{
    fn query(&self, req: SearchRestaurants) -> Result<Vec<Value>> {
        let filter = req.0.to_filter();
        debug!("Search restaurants: {:?}", filter);

        let mut docs = self.db.get()?;
        let projection = Projection::of(SEARCH_PROJECTION);
        let found = docs
            .find_raw(Restaurant::PREFIX, &filter)?
            .iter()
            .map(|doc| projection.apply(doc))
            .collect();
        Ok(found)
    }
}

impl<M: r2d2::ManageConnection> Clone for Restaurants<M> {
    fn clone(&self) -> Self {
        Restaurants {
            db: self.db.clone(),
            idgen: self.idgen.clone(),
            customers: self.customers,
        }
    }
}
