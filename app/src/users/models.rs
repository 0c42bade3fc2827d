use serde::{Deserialize, Serialize};

use infra::documents::{DocMeta, HasMeta};
use infra::ids::{Entity, Id};

use crate::error::{AppError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(flatten)]
    pub meta: DocMeta<User>,
    pub email: String,
    /// bcrypt hash, never the plain password.
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Entity for User {
    const PREFIX: &'static str = "user";
}

impl HasMeta for User {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut DocMeta<Self> {
        &mut self.meta
    }
}

impl User {
    /// One user per email: a second signup for the same address collides
    /// with the first on insert.
    pub fn id_for(email: &str) -> Id<User> {
        Id::hashed(email)
    }

    pub fn new(email: &str, password_hash: String) -> Self {
        User {
            meta: DocMeta::new_with_id(Self::id_for(email)),
            email: email.to_string(),
            password: password_hash,
        }
    }
}

impl Credentials {
    pub fn validate(self) -> Result<(String, String)> {
        let email = self
            .email
            .filter(|s| !s.trim().is_empty())
            .ok_or(AppError::MissingField("email"))?;
        let password = self
            .password
            .filter(|s| !s.is_empty())
            .ok_or(AppError::MissingField("password"))?;
        Ok((email, password))
    }
}
