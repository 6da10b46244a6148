//! Groups domain: the groups a user belongs to, keyed by user.

use crate::transport::Endpoint;
use divvy_cache::{
    Domain, IntoResourceKey, ItemId, LoadFuture, PageRequest, ResourceCache, ResourceKey,
};
use divvy_core::{groups_from_raw, Group, RawGroup};

pub struct Groups;

impl Domain for Groups {
    type Raw = Vec<RawGroup>;
    type Item = Group;

    const NAME: &'static str = "groups";
    const KEY_LABEL: &'static str = "user";
    const NOT_FOUND_MESSAGE: &'static str = "User not found";
    const LOAD_FAILED_MESSAGE: &'static str = "Failed to load groups";

    fn transform(raw: Vec<RawGroup>) -> Vec<Group> {
        groups_from_raw(raw)
    }

    fn item_id(item: &Group) -> ItemId {
        item.id
    }

    fn search_text(item: &Group) -> String {
        match &item.description {
            Some(description) => format!("{}\n{}", item.name, description),
            None => item.name.clone(),
        }
    }
}

impl Endpoint for Groups {
    fn path(key: ResourceKey) -> String {
        format!("/api/users/{}/groups", key)
    }
}

pub type GroupCache = ResourceCache<Groups>;

pub trait GroupViews {
    fn groups_for_user(&self, user_id: impl IntoResourceKey) -> LoadFuture<Group>;

    /// Groups whose name or description contains `needle`.
    fn search(&self, user_id: impl IntoResourceKey, needle: &str) -> Vec<Group>;

    fn find_group(&self, user_id: impl IntoResourceKey, group_id: ItemId) -> Option<Group>;

    /// Sum of member counts over the user's groups.
    fn total_members(&self, user_id: impl IntoResourceKey) -> u64;
}

impl GroupViews for GroupCache {
    fn groups_for_user(&self, user_id: impl IntoResourceKey) -> LoadFuture<Group> {
        self.load(user_id, PageRequest::first())
    }

    fn search(&self, user_id: impl IntoResourceKey, needle: &str) -> Vec<Group> {
        self.filter_text(user_id, needle)
    }

    fn find_group(&self, user_id: impl IntoResourceKey, group_id: ItemId) -> Option<Group> {
        self.find_by_id(user_id, group_id)
    }

    fn total_members(&self, user_id: impl IntoResourceKey) -> u64 {
        self.items(user_id)
            .iter()
            .map(|group| u64::from(group.member_count))
            .sum()
    }
}
