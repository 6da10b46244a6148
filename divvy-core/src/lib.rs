//! Divvy Core - Entity Types
//!
//! Pure data structures shared by the cache engine and the admin client:
//! resource keys, the five domain entities with their raw wire payloads and
//! transforms, and the error taxonomy. This crate contains no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod raw;
pub mod transform;

pub use entities::{ActivityEntry, ActivityKind, Balance, Expense, ExpenseSplit, Group, Member};
pub use error::{
    DivvyError, DivvyResult, FailureKind, LoadError, TransportError, ValidationError,
};
pub use identity::{IntoResourceKey, InvalidKey, ItemId, ResourceKey, Timestamp};
pub use raw::{RawActivityEntry, RawBalance, RawExpense, RawExpenseSplit, RawGroup, RawMember};
pub use transform::{
    activity_from_raw, balances_from_raw, expenses_from_raw, groups_from_raw, members_from_raw,
};
