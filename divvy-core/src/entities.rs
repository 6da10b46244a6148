//! Domain entity structures
//!
//! These are the shapes the admin client works with after the raw wire
//! payloads (see [`crate::raw`]) went through their transforms. They
//! serialize with camelCase field names.

use crate::identity::{ItemId, Timestamp};
use serde::{Deserialize, Serialize};

/// Amounts closer to zero than half a cent count as settled.
const SETTLED_EPSILON: f64 = 0.005;

/// A group member (users domain, keyed by group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: ItemId,
    pub name: String,
    pub email: Option<String>,
    pub joined_at: Option<Timestamp>,
}

/// A group the user belongs to (groups domain, keyed by user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<ItemId>,
    pub created_at: Option<Timestamp>,
    pub member_count: u32,
}

/// One participant's share of an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSplit {
    pub user_id: ItemId,
    pub user_name: Option<String>,
    pub amount_owed: f64,
}

/// An expense recorded in a group (expenses domain, keyed by group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ItemId,
    pub group_id: ItemId,
    pub description: String,
    pub amount: f64,
    pub paid_by: ItemId,
    pub paid_by_name: Option<String>,
    pub created_at: Option<Timestamp>,
    pub splits: Vec<ExpenseSplit>,
}

impl Expense {
    /// Sum of all split shares.
    pub fn split_total(&self) -> f64 {
        self.splits.iter().map(|split| split.amount_owed).sum()
    }

    /// Whether `user_id` owes a share of this expense.
    pub fn involves(&self, user_id: ItemId) -> bool {
        self.paid_by == user_id || self.splits.iter().any(|split| split.user_id == user_id)
    }
}

/// A member's net position in a group (balances domain, keyed by group).
///
/// Positive balances are owed money, negative balances owe money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub user_id: ItemId,
    pub user_name: String,
    pub balance: f64,
}

impl Balance {
    pub fn is_creditor(&self) -> bool {
        self.balance >= SETTLED_EPSILON
    }

    pub fn is_debtor(&self) -> bool {
        self.balance <= -SETTLED_EPSILON
    }

    pub fn is_settled(&self) -> bool {
        !self.is_creditor() && !self.is_debtor()
    }
}

/// What happened in an activity feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ExpenseAdded,
    ExpenseUpdated,
    ExpenseDeleted,
    MemberJoined,
    MemberLeft,
    GroupCreated,
    SettlementRecorded,
    #[serde(other)]
    Other,
}

/// An entry of a group's activity feed (activity domain, keyed by group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: ItemId,
    pub group_id: ItemId,
    pub user_id: Option<ItemId>,
    pub user_name: Option<String>,
    pub kind: ActivityKind,
    pub description: String,
    pub amount: Option<f64>,
    pub created_at: Option<Timestamp>,
}
