//! Signup and login.
use log::*;
use r2d2::Pool;

use infra::filter::Filter;
use infra::ids::Id;
use infra::persistence::{is_conflict, Storage};

use crate::error::{AppError, Result};
use crate::services::{Commandable, Queryable, Request};

mod auth;
mod models;
mod resources;

pub use self::auth::{Auth, Authenticated, Claims};
pub use self::models::{Credentials, User};

#[derive(Debug)]
pub struct Users<M: r2d2::ManageConnection> {
    db: Pool<M>,
    auth: Auth,
}

#[derive(Debug, Clone)]
pub struct SignUp(pub Credentials);

#[derive(Debug, Clone)]
pub struct Login(pub Credentials);

impl Request for SignUp {
    type Resp = Id<User>;
}

/// Responds with a signed bearer token.
impl Request for Login {
    type Resp = String;
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Users<M> {
    pub fn new(db: Pool<M>, auth: Auth) -> Self {
        Users { db, auth }
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Commandable<SignUp>
    for Users<M>
{
    fn execute(&self, req: SignUp) -> Result<Id<User>> {
        let (email, password) = req.0.validate()?;
        let hash = self.auth.hash_password(&password)?;
        let mut user = User::new(&email, hash);

        let mut docs = self.db.get()?;
        docs.save(&mut user).map_err(|e| {
            if is_conflict(&e) {
                AppError::Conflict("user")
            } else {
                AppError::from(e)
            }
        })?;
        info!("Signed up {}", user.meta.id);
        Ok(user.meta.id)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Queryable<Login>
    for Users<M>
{
    fn query(&self, req: Login) -> Result<String> {
        let (email, password) = req.0.validate()?;

        let mut docs = self.db.get()?;
        let user = docs
            .find::<User>(&Filter::equals("email", &email))?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound("user"))?;

        if !self.auth.verify_password(&password, &user.password) {
            debug!("Bad password for {}", user.meta.id);
            return Err(AppError::InvalidCredential);
        }

        self.auth.issue_token(&user.meta.id, &user.email)
    }
}

impl<M: r2d2::ManageConnection> Clone for Users<M> {
    fn clone(&self) -> Self {
        Users {
            db: self.db.clone(),
            auth: self.auth.clone(),
        }
    }
}
