//! Domain transforms: raw wire payloads to domain entities.
//!
//! Every transform is pure and total over well-formed payloads. Order of the
//! input list is preserved.

use crate::entities::{ActivityEntry, Balance, Expense, ExpenseSplit, Group, Member};
use crate::raw::{RawActivityEntry, RawBalance, RawExpense, RawExpenseSplit, RawGroup, RawMember};

impl From<RawMember> for Member {
    fn from(raw: RawMember) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            email: raw.email.filter(|email| !email.trim().is_empty()),
            joined_at: raw.joined_at,
        }
    }
}

impl From<RawGroup> for Group {
    fn from(raw: RawGroup) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            created_by: raw.created_by,
            created_at: raw.created_at,
            member_count: raw.member_count,
        }
    }
}

impl From<RawExpenseSplit> for ExpenseSplit {
    fn from(raw: RawExpenseSplit) -> Self {
        Self {
            user_id: raw.user_id,
            user_name: raw.user_name,
            amount_owed: raw.amount_owed,
        }
    }
}

impl From<RawExpense> for Expense {
    fn from(raw: RawExpense) -> Self {
        Self {
            id: raw.id,
            group_id: raw.group_id,
            description: raw.description,
            amount: raw.amount,
            paid_by: raw.paid_by,
            paid_by_name: raw.paid_by_name,
            created_at: raw.created_at,
            splits: raw.splits.into_iter().map(ExpenseSplit::from).collect(),
        }
    }
}

impl From<RawBalance> for Balance {
    fn from(raw: RawBalance) -> Self {
        Self {
            user_id: raw.user_id,
            user_name: raw.user_name,
            balance: raw.balance,
        }
    }
}

impl From<RawActivityEntry> for ActivityEntry {
    fn from(raw: RawActivityEntry) -> Self {
        Self {
            id: raw.id,
            group_id: raw.group_id,
            user_id: raw.user_id,
            user_name: raw.user_name,
            kind: raw.action,
            description: raw.description,
            amount: raw.amount,
            created_at: raw.created_at,
        }
    }
}

pub fn members_from_raw(raw: Vec<RawMember>) -> Vec<Member> {
    raw.into_iter().map(Member::from).collect()
}

pub fn groups_from_raw(raw: Vec<RawGroup>) -> Vec<Group> {
    raw.into_iter().map(Group::from).collect()
}

pub fn expenses_from_raw(raw: Vec<RawExpense>) -> Vec<Expense> {
    raw.into_iter().map(Expense::from).collect()
}

pub fn balances_from_raw(raw: Vec<RawBalance>) -> Vec<Balance> {
    raw.into_iter().map(Balance::from).collect()
}

pub fn activity_from_raw(raw: Vec<RawActivityEntry>) -> Vec<ActivityEntry> {
    raw.into_iter().map(ActivityEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ActivityKind;
    use serde_json::json;

    #[test]
    fn test_balance_transform_renames_fields() {
        let raw: Vec<RawBalance> = serde_json::from_value(json!([
            {"user_id": 1, "user_name": "Alice", "balance": 50.0}
        ]))
        .unwrap();

        let balances = balances_from_raw(raw);

        assert_eq!(
            balances,
            vec![Balance {
                user_id: 1,
                user_name: "Alice".to_string(),
                balance: 50.0,
            }]
        );
        assert_eq!(
            serde_json::to_value(&balances[0]).unwrap(),
            json!({"userId": 1, "userName": "Alice", "balance": 50.0})
        );
    }

    #[test]
    fn test_transform_preserves_order() {
        let raw: Vec<RawMember> = serde_json::from_value(json!([
            {"id": 3, "name": "Carol"},
            {"id": 1, "name": "Alice"},
            {"id": 2, "name": "Bob"}
        ]))
        .unwrap();
        let ids: Vec<i64> = members_from_raw(raw).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_member_blank_email_dropped() {
        let raw = RawMember {
            id: 1,
            name: "Alice".to_string(),
            email: Some("  ".to_string()),
            joined_at: None,
        };
        assert_eq!(Member::from(raw).email, None);
    }

    #[test]
    fn test_expense_transform_carries_splits() {
        let raw: RawExpense = serde_json::from_value(json!({
            "id": 7,
            "group_id": 2,
            "description": "Taxi",
            "amount": "30",
            "paid_by": "4",
            "paid_by_name": "Dana",
            "splits": [{"user_id": 4, "user_name": "Dana", "amount_owed": "15"},
                       {"user_id": 5, "amount_owed": 15}]
        }))
        .unwrap();
        let expense = Expense::from(raw);
        assert_eq!(expense.paid_by, 4);
        assert_eq!(expense.splits.len(), 2);
        assert_eq!(expense.splits[1].user_name, None);
        assert!((expense.split_total() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_activity_transform_maps_action_to_kind() {
        let raw: RawActivityEntry = serde_json::from_value(json!({
            "id": 9,
            "group_id": 2,
            "user_id": 1,
            "user_name": "Alice",
            "action": "expense_added",
            "description": "Alice added Taxi",
            "amount": "30.00"
        }))
        .unwrap();
        let entry = ActivityEntry::from(raw);
        assert_eq!(entry.kind, ActivityKind::ExpenseAdded);
        assert_eq!(entry.amount, Some(30.0));
    }
}
