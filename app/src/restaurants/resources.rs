use actix_web::{web, HttpResponse};
use log::*;
use serde_json::json;

use infra::ids::{Entity, Id};
use infra::persistence::Storage;

use crate::error::{AppError, Result};
use crate::services::{Commandable, Queryable};
use crate::users::Authenticated;

use super::*;

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Restaurants<M> {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.service(
            web::resource("/restaurant")
                .route(web::get().to({
                    let me = self.clone();
                    move |auth: Authenticated| me.clone().list(auth)
                }))
                .route(web::post().to({
                    let me = self.clone();
                    move |form: web::Json<RestaurantForm>| me.clone().create(form.into_inner())
                })),
        )
        .service(web::resource("/search").route(web::get().to({
            let me = self.clone();
            move |params: web::Query<SearchParams>| me.clone().search(params.into_inner())
        })))
        .service(web::resource("/restaurant/{id}").route(web::delete().to({
            let me = self.clone();
            move |id: web::Path<String>| me.clone().delete(id.into_inner())
        })))
        .service(
            web::resource("/restaurant/{id}/overview").route(web::post().to({
                let me = self.clone();
                move |id: web::Path<String>, form: web::Json<OverviewForm>| {
                    me.clone()
                        .append_overview(id.into_inner(), form.into_inner())
                }
            })),
        )
        .service(
            web::resource("/restaurant/{restaurantId}/overview/{overviewId}").route(
                web::put().to({
                    let me = self.clone();
                    move |ids: web::Path<(String, String)>, form: web::Json<OverviewForm>| {
                        let (restaurant, overview) = ids.into_inner();
                        me.clone()
                            .update_overview(restaurant, overview, form.into_inner())
                    }
                }),
            ),
        );
    }

    async fn list(self, auth: Authenticated) -> Result<HttpResponse> {
        debug!("List restaurants for {}", auth.claims.email);
        let restaurants = self.in_pool(|me| me.query(ListRestaurants)).await?;
        Ok(HttpResponse::Ok().json(restaurants))
    }

    async fn search(self, params: SearchParams) -> Result<HttpResponse> {
        let result = self
            .in_pool(move |me| me.query(SearchRestaurants(params)))
            .await?;
        Ok(HttpResponse::Ok().json(json!({ "result": result })))
    }

    async fn create(self, form: RestaurantForm) -> Result<HttpResponse> {
        let id = self
            .in_pool(move |me| me.execute(CreateRestaurant(form)))
            .await?;
        Ok(HttpResponse::Created().json(json!({
            "message": "Restaurant created successfully",
            "restaurantId": id.to_string(),
        })))
    }

    async fn delete(self, id: String) -> Result<HttpResponse> {
        let id = path_id::<Restaurant>(&id, "restaurant")?;
        self.in_pool(move |me| me.execute(DeleteRestaurant(id)))
            .await?;
        Ok(HttpResponse::Ok().json(json!({ "message": "Restaurant deleted successfully" })))
    }

    async fn append_overview(self, restaurant: String, form: OverviewForm) -> Result<HttpResponse> {
        let restaurant = path_id::<Restaurant>(&restaurant, "restaurant")?;
        let overview = self
            .in_pool(move |me| me.execute(AppendOverview { restaurant, form }))
            .await?;
        Ok(HttpResponse::Created().json(json!({
            "message": "Overview added successfully",
            "overviewId": overview.to_string(),
        })))
    }

    async fn update_overview(
        self,
        restaurant: String,
        overview: String,
        form: OverviewForm,
    ) -> Result<HttpResponse> {
        let restaurant = path_id::<Restaurant>(&restaurant, "restaurant")?;
        let overview = path_id::<Overview>(&overview, "overview")?;
        self.in_pool(move |me| {
            me.execute(UpdateOverview {
                restaurant,
                overview,
                form,
            })
        })
        .await?;
        Ok(HttpResponse::Ok().json(json!({ "message": "Overview updated successfully" })))
    }

    async fn in_pool<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&Self) -> Result<R> + Send + 'static,
    {
        let me = self.clone();
        web::block(move || f(&me)).await?
    }
}

/// Ids in paths that don't parse can't name any stored document.
fn path_id<T: Entity>(raw: &str, kind: &'static str) -> Result<Id<T>> {
    raw.parse().map_err(|e| {
        debug!("Unparseable {} id {:?}: {}", kind, raw, e);
        AppError::NotFound(kind)
    })
}
