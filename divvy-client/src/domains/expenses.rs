//! Expenses domain: a group's expenses with their splits, paginated.

use crate::transport::Endpoint;
use divvy_cache::{
    Domain, IntoResourceKey, ItemId, LoadFuture, PageRequest, ResourceCache, ResourceKey,
};
use divvy_core::{expenses_from_raw, Expense, RawExpense};

pub struct Expenses;

impl Domain for Expenses {
    type Raw = Vec<RawExpense>;
    type Item = Expense;

    const NAME: &'static str = "expenses";
    const KEY_LABEL: &'static str = "group";
    const NOT_FOUND_MESSAGE: &'static str = "Group not found";
    const LOAD_FAILED_MESSAGE: &'static str = "Failed to load expenses";

    fn transform(raw: Vec<RawExpense>) -> Vec<Expense> {
        expenses_from_raw(raw)
    }

    fn item_id(item: &Expense) -> ItemId {
        item.id
    }

    fn search_text(item: &Expense) -> String {
        match &item.paid_by_name {
            Some(name) => format!("{}\n{}", item.description, name),
            None => item.description.clone(),
        }
    }
}

impl Endpoint for Expenses {
    fn path(key: ResourceKey) -> String {
        format!("/api/groups/{}/expenses", key)
    }
}

pub type ExpenseCache = ResourceCache<Expenses>;

pub trait ExpenseViews {
    /// Load the first page of a group's expenses.
    fn expenses_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<Expense>;

    /// Append the next page after the expenses already cached.
    fn load_more(&self, group_id: impl IntoResourceKey + Copy, page_size: usize)
        -> LoadFuture<Expense>;

    fn total_amount(&self, group_id: impl IntoResourceKey) -> f64;

    /// Expenses whose description or payer name contains `needle`.
    fn search(&self, group_id: impl IntoResourceKey, needle: &str) -> Vec<Expense>;

    fn paid_by(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Vec<Expense>;

    /// Expenses the user paid for or has a share in.
    fn involving(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Vec<Expense>;

    /// Expenses ordered by creation time, newest first. Undated expenses
    /// come last.
    fn newest_first(&self, group_id: impl IntoResourceKey) -> Vec<Expense>;
}

impl ExpenseViews for ExpenseCache {
    fn expenses_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<Expense> {
        self.refresh(group_id)
    }

    fn load_more(
        &self,
        group_id: impl IntoResourceKey + Copy,
        page_size: usize,
    ) -> LoadFuture<Expense> {
        let offset = self.count(group_id);
        self.load(group_id, PageRequest::page(page_size, offset))
    }

    fn total_amount(&self, group_id: impl IntoResourceKey) -> f64 {
        self.sum_by(group_id, |expense| expense.amount)
    }

    fn search(&self, group_id: impl IntoResourceKey, needle: &str) -> Vec<Expense> {
        self.filter_text(group_id, needle)
    }

    fn paid_by(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Vec<Expense> {
        self.items(group_id)
            .into_iter()
            .filter(|expense| expense.paid_by == user_id)
            .collect()
    }

    fn involving(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Vec<Expense> {
        self.items(group_id)
            .into_iter()
            .filter(|expense| expense.involves(user_id))
            .collect()
    }

    fn newest_first(&self, group_id: impl IntoResourceKey) -> Vec<Expense> {
        self.sorted_by(group_id, |a, b| b.created_at.cmp(&a.created_at))
    }
}
