use serde::{de::DeserializeOwned, Deserialize, Serialize};

use infra::documents::{DocMeta, HasMeta};
use infra::ids::{Entity, Id};

/// An authoritative record that restaurants refer to by name.
pub trait Canonical: HasMeta + Serialize + DeserializeOwned + Send + 'static {
    fn new(id: Id<Self>, name: &str) -> Self;
    fn name(&self) -> &str;

    /// Identifiers for canonical records are derived from their name, so
    /// registering the same name twice finds the existing record.
    fn id_for(name: &str) -> Id<Self> {
        Id::hashed(&(Self::PREFIX, name))
    }
}

/// Snapshot of a canonical record embedded in another document. Not kept in
/// sync with the original.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(bound = "T: Entity")]
pub struct Reference<T> {
    #[serde(rename = "_id")]
    pub id: Id<T>,
    pub name: String,
}

impl<T: Canonical> Reference<T> {
    pub fn of(record: &T) -> Self {
        Reference {
            id: record.meta().id,
            name: record.name().to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Menu {
    #[serde(flatten)]
    pub meta: DocMeta<Menu>,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Customer {
    #[serde(flatten)]
    pub meta: DocMeta<Customer>,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Critique {
    #[serde(flatten)]
    pub meta: DocMeta<Critique>,
    pub name: String,
}

macro_rules! canonical {
    ($ty:ident, $prefix:expr) => {
        impl Entity for $ty {
            const PREFIX: &'static str = $prefix;
        }

        impl HasMeta for $ty {
            fn meta(&self) -> &DocMeta<Self> {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut DocMeta<Self> {
                &mut self.meta
            }
        }

        impl Canonical for $ty {
            fn new(id: Id<Self>, name: &str) -> Self {
                let meta = DocMeta::new_with_id(id);
                let name = name.to_string();
                $ty { meta, name }
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

canonical!(Menu, "menu");
canonical!(Customer, "customer");
canonical!(Critique, "critique");
