use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use infra::documents::{DocMeta, HasMeta};
use infra::ids::{Entity, Id};

use crate::catalog::{Critique, Customer, Menu, Reference};
use crate::error::{AppError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Restaurant {
    #[serde(flatten)]
    pub meta: DocMeta<Restaurant>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    pub customers: Vec<Reference<Customer>>,
    pub menu: Reference<Menu>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<f64>,
    pub remarks: Vec<String>,
    pub critiques: Vec<Reference<Critique>>,
    #[serde(default)]
    pub overview: Vec<Overview>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Overview {
    #[serde(rename = "overviewId")]
    pub overview_id: Id<Overview>,
    pub cost: f64,
    pub time: String,
    pub date: DateTime<Utc>,
}

impl Entity for Restaurant {
    const PREFIX: &'static str = "restaurant";
}

impl HasMeta for Restaurant {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut DocMeta<Self> {
        &mut self.meta
    }
}

impl Entity for Overview {
    const PREFIX: &'static str = "overview";
}

/// Accepts either a bare string or a list of strings.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_present(self) -> Option<Vec<String>> {
        match self {
            OneOrMany::One(s) if s.trim().is_empty() => None,
            OneOrMany::One(s) => Some(vec![s]),
            OneOrMany::Many(items) => Some(items),
        }
    }
}

/// A restaurant as submitted by a client, before any checks.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RestaurantForm {
    pub name: Option<String>,
    pub block_no: Option<String>,
    pub address: Option<String>,
    pub zipcode: Option<String>,
    pub customers: Option<OneOrMany>,
    pub menu: Option<String>,
    pub overall: Option<Value>,
    pub recommendation: Option<Value>,
    pub remarks: Option<OneOrMany>,
    pub critiques: Option<OneOrMany>,
}

/// A restaurant form with every required field present and every scalar
/// coerced to its stored type.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRestaurant {
    pub name: String,
    pub block_no: Option<String>,
    pub address: Option<String>,
    pub zipcode: Option<String>,
    pub customers: Vec<String>,
    pub menu: String,
    pub overall: Option<f64>,
    pub recommendation: Option<f64>,
    pub remarks: Vec<String>,
    pub critiques: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct OverviewForm {
    pub cost: Option<Value>,
    pub time: Option<String>,
    pub date: Option<Value>,
}

/// Checked overview fields. The client's `date` is discarded; the store
/// stamps its own.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewFields {
    pub cost: f64,
    pub time: String,
}

impl RestaurantForm {
    pub fn validate(self) -> Result<NewRestaurant> {
        let name = required(self.name, "name")?;
        let menu = required(self.menu, "menu")?;
        let customers = self
            .customers
            .and_then(OneOrMany::into_present)
            .ok_or(AppError::MissingField("customers"))?;
        let remarks = self
            .remarks
            .and_then(OneOrMany::into_present)
            .ok_or(AppError::MissingField("remarks"))?;
        let critiques = self
            .critiques
            .and_then(OneOrMany::into_present)
            .ok_or(AppError::MissingField("critiques"))?;

        let overall = self
            .overall
            .map(|v| number("overall", &v))
            .transpose()?;
        let recommendation = self
            .recommendation
            .map(|v| number("recommendation", &v))
            .transpose()?;

        Ok(NewRestaurant {
            name,
            block_no: self.block_no,
            address: self.address,
            zipcode: self.zipcode,
            customers,
            menu,
            overall,
            recommendation,
            remarks,
            critiques,
        })
    }
}

impl OverviewForm {
    pub fn validate(self) -> Result<OverviewFields> {
        let cost = match self.cost {
            None | Some(Value::Null) => return Err(AppError::MissingField("cost")),
            Some(Value::String(ref s)) if s.trim().is_empty() => {
                return Err(AppError::MissingField("cost"))
            }
            Some(cost) => number("cost", &cost)?,
        };
        let time = required(self.time, "time")?;
        match self.date {
            None | Some(Value::Null) => return Err(AppError::MissingField("date")),
            Some(Value::String(ref s)) if s.trim().is_empty() => {
                return Err(AppError::MissingField("date"))
            }
            Some(_) => {}
        }

        Ok(OverviewFields { cost, time })
    }
}

impl Overview {
    pub fn new(overview_id: Id<Overview>, fields: OverviewFields, date: DateTime<Utc>) -> Self {
        Overview {
            overview_id,
            cost: fields.cost,
            time: fields.time,
            date,
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(AppError::MissingField(field)),
    }
}

fn number(field: &'static str, value: &Value) -> Result<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
        .ok_or(AppError::InvalidField(field))
}
