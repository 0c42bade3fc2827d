use actix_web::{web, HttpResponse};
use serde_json::json;

use infra::persistence::Storage;

use crate::error::Result;
use crate::services::{Commandable, Queryable};

use super::*;

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Users<M> {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.service(web::resource("/users").route(web::post().to({
            let me = self.clone();
            move |form: web::Json<Credentials>| me.clone().sign_up(form.into_inner())
        })))
        .service(web::resource("/login").route(web::post().to({
            let me = self.clone();
            move |form: web::Json<Credentials>| me.clone().login(form.into_inner())
        })));
    }

    async fn sign_up(self, credentials: Credentials) -> Result<HttpResponse> {
        let id = web::block(move || self.execute(SignUp(credentials))).await??;
        Ok(HttpResponse::Created().json(json!({
            "message": "User created successfully",
            "userId": id.to_string(),
        })))
    }

    async fn login(self, credentials: Credentials) -> Result<HttpResponse> {
        let token = web::block(move || self.query(Login(credentials))).await??;
        Ok(HttpResponse::Ok().json(json!({ "token": token })))
    }
}
