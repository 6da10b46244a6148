//! Activity domain: a group's feed, paginated.

use crate::transport::Endpoint;
use divvy_cache::{
    Domain, IntoResourceKey, ItemId, LoadFuture, PageRequest, ResourceCache, ResourceKey,
};
use divvy_core::{activity_from_raw, ActivityEntry, ActivityKind, RawActivityEntry};

pub struct Activity;

impl Domain for Activity {
    type Raw = Vec<RawActivityEntry>;
    type Item = ActivityEntry;

    const NAME: &'static str = "activity";
    const KEY_LABEL: &'static str = "group";
    const NOT_FOUND_MESSAGE: &'static str = "Group not found";
    const LOAD_FAILED_MESSAGE: &'static str = "Failed to load activity";

    fn transform(raw: Vec<RawActivityEntry>) -> Vec<ActivityEntry> {
        activity_from_raw(raw)
    }

    fn item_id(item: &ActivityEntry) -> ItemId {
        item.id
    }

    fn search_text(item: &ActivityEntry) -> String {
        item.description.clone()
    }
}

impl Endpoint for Activity {
    fn path(key: ResourceKey) -> String {
        format!("/api/groups/{}/activity", key)
    }
}

pub type ActivityCache = ResourceCache<Activity>;

pub trait ActivityViews {
    fn activity_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<ActivityEntry>;

    /// Append the next page after the entries already cached.
    fn load_more(
        &self,
        group_id: impl IntoResourceKey + Copy,
        page_size: usize,
    ) -> LoadFuture<ActivityEntry>;

    /// The `n` most recent entries. Undated entries sort last.
    fn recent(&self, group_id: impl IntoResourceKey, n: usize) -> Vec<ActivityEntry>;

    fn by_kind(&self, group_id: impl IntoResourceKey, kind: ActivityKind) -> Vec<ActivityEntry>;
}

impl ActivityViews for ActivityCache {
    fn activity_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<ActivityEntry> {
        self.refresh(group_id)
    }

    fn load_more(
        &self,
        group_id: impl IntoResourceKey + Copy,
        page_size: usize,
    ) -> LoadFuture<ActivityEntry> {
        let offset = self.count(group_id);
        self.load(group_id, PageRequest::page(page_size, offset))
    }

    fn recent(&self, group_id: impl IntoResourceKey, n: usize) -> Vec<ActivityEntry> {
        let mut entries = self.sorted_by(group_id, |a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(n);
        entries
    }

    fn by_kind(&self, group_id: impl IntoResourceKey, kind: ActivityKind) -> Vec<ActivityEntry> {
        self.items(group_id)
            .into_iter()
            .filter(|entry| entry.kind == kind)
            .collect()
    }
}
