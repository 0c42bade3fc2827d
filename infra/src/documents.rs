use serde::{Deserialize, Serialize};

use crate::ids::{Entity, Id};

/// Opaque token naming the stored revision of a document. The empty version
/// marks a document that has never been saved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default, Hash)]
pub struct Version(String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(bound = "T: Entity")]
pub struct DocMeta<T> {
    #[serde(rename = "_id")]
    pub id: Id<T>,
    #[serde(rename = "_version", default)]
    pub version: Version,
}

pub trait HasMeta: Entity + Sized {
    fn meta(&self) -> &DocMeta<Self>;
    fn meta_mut(&mut self) -> &mut DocMeta<Self>;
}

impl<T> Default for DocMeta<T> {
    fn default() -> Self {
        DocMeta {
            id: Default::default(),
            version: Default::default(),
        }
    }
}

impl<T> DocMeta<T> {
    pub fn new_with_id(id: Id<T>) -> Self {
        DocMeta {
            id,
            ..Default::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.version == Version::default()
    }
}

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Version {
    fn from(val: String) -> Self {
        Version(val)
    }
}

impl std::str::FromStr for Version {
    type Err = std::convert::Infallible;
    fn from_str(val: &str) -> Result<Self, Self::Err> {
        Ok(Version(val.to_string()))
    }
}
