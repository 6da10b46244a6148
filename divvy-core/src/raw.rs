//! Raw wire payloads as returned by the REST backend.
//!
//! Field names are the backend's snake_case columns. Money columns come from
//! PostgreSQL `numeric` and may arrive as JSON strings, ids from some
//! endpoints arrive quoted; both are coerced while deserializing.

use crate::entities::ActivityKind;
use crate::identity::{ItemId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMember {
    #[serde(deserialize_with = "coerce::id")]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub joined_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGroup {
    #[serde(deserialize_with = "coerce::id")]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_id")]
    pub created_by: Option<ItemId>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "coerce::count")]
    pub member_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExpenseSplit {
    #[serde(deserialize_with = "coerce::id")]
    pub user_id: ItemId,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(deserialize_with = "coerce::money")]
    pub amount_owed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExpense {
    #[serde(deserialize_with = "coerce::id")]
    pub id: ItemId,
    #[serde(deserialize_with = "coerce::id")]
    pub group_id: ItemId,
    pub description: String,
    #[serde(deserialize_with = "coerce::money")]
    pub amount: f64,
    #[serde(deserialize_with = "coerce::id")]
    pub paid_by: ItemId,
    #[serde(default)]
    pub paid_by_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub splits: Vec<RawExpenseSplit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBalance {
    #[serde(deserialize_with = "coerce::id")]
    pub user_id: ItemId,
    pub user_name: String,
    #[serde(deserialize_with = "coerce::money")]
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawActivityEntry {
    #[serde(deserialize_with = "coerce::id")]
    pub id: ItemId,
    #[serde(deserialize_with = "coerce::id")]
    pub group_id: ItemId,
    #[serde(default, deserialize_with = "coerce::optional_id")]
    pub user_id: Option<ItemId>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub action: ActivityKind,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::optional_money")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

mod coerce {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    fn parse_id<E: Error>(value: IntOrString) -> Result<i64, E> {
        match value {
            IntOrString::Int(id) => Ok(id),
            IntOrString::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("invalid id {:?}", text))),
        }
    }

    fn parse_money<E: Error>(value: NumberOrString) -> Result<f64, E> {
        let amount = match value {
            NumberOrString::Number(amount) => amount,
            NumberOrString::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid amount {:?}", text)))?,
        };
        if amount.is_finite() {
            Ok(amount)
        } else {
            Err(E::custom("amount must be finite"))
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        parse_id(IntOrString::deserialize(deserializer)?)
    }

    pub fn optional_id<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Option::<IntOrString>::deserialize(deserializer)?
            .map(parse_id)
            .transpose()
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let count = parse_id(IntOrString::deserialize(deserializer)?)?;
        u32::try_from(count).map_err(|_| D::Error::custom(format!("invalid count {}", count)))
    }

    pub fn money<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse_money(NumberOrString::deserialize(deserializer)?)
    }

    pub fn optional_money<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<NumberOrString>::deserialize(deserializer)?
            .map(parse_money)
            .transpose()
    }
}
