//! Balances domain: each member's net position, keyed by group.

use crate::transport::Endpoint;
use divvy_cache::{
    Domain, IntoResourceKey, ItemId, LoadFuture, PageRequest, ResourceCache, ResourceKey,
};
use divvy_core::{balances_from_raw, Balance, RawBalance};

pub struct Balances;

impl Domain for Balances {
    type Raw = Vec<RawBalance>;
    type Item = Balance;

    const NAME: &'static str = "balances";
    const KEY_LABEL: &'static str = "group";
    const NOT_FOUND_MESSAGE: &'static str = "Group not found";
    const LOAD_FAILED_MESSAGE: &'static str = "Failed to load balances";

    fn transform(raw: Vec<RawBalance>) -> Vec<Balance> {
        balances_from_raw(raw)
    }

    fn item_id(item: &Balance) -> ItemId {
        item.user_id
    }

    fn search_text(item: &Balance) -> String {
        item.user_name.clone()
    }
}

impl Endpoint for Balances {
    fn path(key: ResourceKey) -> String {
        format!("/api/groups/{}/balances", key)
    }
}

pub type BalanceCache = ResourceCache<Balances>;

/// Balance views of one group.
pub trait BalanceViews {
    fn balances_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<Balance>;

    /// Net sum of every balance in the group. Settled groups sum to zero.
    fn total_balance(&self, group_id: impl IntoResourceKey) -> f64;

    /// Members who owe money, largest debt first.
    fn debtors(&self, group_id: impl IntoResourceKey) -> Vec<Balance>;

    /// Members who are owed money, largest credit first.
    fn creditors(&self, group_id: impl IntoResourceKey) -> Vec<Balance>;

    fn balance_for_user(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Option<Balance>;

    /// Whether every member of a loaded group is settled.
    fn is_settled(&self, group_id: impl IntoResourceKey) -> bool;
}

impl BalanceViews for BalanceCache {
    fn balances_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<Balance> {
        self.load(group_id, PageRequest::first())
    }

    fn total_balance(&self, group_id: impl IntoResourceKey) -> f64 {
        self.sum_by(group_id, |balance| balance.balance)
    }

    fn debtors(&self, group_id: impl IntoResourceKey) -> Vec<Balance> {
        let mut debtors: Vec<Balance> = self
            .items(group_id)
            .into_iter()
            .filter(Balance::is_debtor)
            .collect();
        debtors.sort_by(|a, b| a.balance.total_cmp(&b.balance));
        debtors
    }

    fn creditors(&self, group_id: impl IntoResourceKey) -> Vec<Balance> {
        let mut creditors: Vec<Balance> = self
            .items(group_id)
            .into_iter()
            .filter(Balance::is_creditor)
            .collect();
        creditors.sort_by(|a, b| b.balance.total_cmp(&a.balance));
        creditors
    }

    fn balance_for_user(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Option<Balance> {
        self.find_by_id(group_id, user_id)
    }

    fn is_settled(&self, group_id: impl IntoResourceKey) -> bool {
        let entry = self.entry(group_id);
        entry.status.is_success() && entry.items.iter().all(Balance::is_settled)
    }
}
