//! Password hashing and bearer tokens.
use std::fmt;
use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{http::header, web, FromRequest, HttpRequest};
use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use infra::ids::Id;

use crate::error::{AppError, Result};

use super::models::User;

const TOKEN_LIFETIME_SECS: i64 = 60 * 60;
const BEARER: &str = "Bearer ";

#[derive(Clone)]
pub struct Auth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    bcrypt_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of a request that carried a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: Claims,
}

impl Auth {
    pub fn new(secret: &str, bcrypt_cost: u32) -> Self {
        Auth {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, plain: &str) -> Result<String> {
        let hash = bcrypt::hash(plain, self.bcrypt_cost).map_err(anyhow::Error::from)?;
        Ok(hash)
    }

    pub fn verify_password(&self, plain: &str, hash: &str) -> bool {
        bcrypt::verify(plain, hash).unwrap_or_else(|e| {
            warn!("Unverifiable password hash: {}", e);
            false
        })
    }

    pub fn issue_token(&self, user_id: &Id<User>, email: &str) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        self.sign(&claims)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AppError::AuthRejected
            })
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(anyhow::Error::from)?;
        Ok(token)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Auth")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl FromRequest for Authenticated {
    type Error = AppError;
    type Future = Ready<Result<Self>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Authenticated> {
    let auth = req
        .app_data::<web::Data<Auth>>()
        .ok_or_else(|| anyhow!("no token verifier configured"))?;
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::AuthRejected)?;

    let claims = auth.verify_token(token)?;
    trace!("Authenticated {}", claims.email);
    Ok(Authenticated { claims })
}
