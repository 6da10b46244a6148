//! Users domain: the members of a group.

use crate::transport::Endpoint;
use divvy_cache::{
    Domain, IntoResourceKey, ItemId, LoadFuture, PageRequest, ResourceCache, ResourceKey,
};
use divvy_core::{members_from_raw, Member, RawMember};

pub struct Users;

impl Domain for Users {
    type Raw = Vec<RawMember>;
    type Item = Member;

    const NAME: &'static str = "users";
    const KEY_LABEL: &'static str = "group";
    const NOT_FOUND_MESSAGE: &'static str = "Group not found";
    const LOAD_FAILED_MESSAGE: &'static str = "Failed to load members";

    fn transform(raw: Vec<RawMember>) -> Vec<Member> {
        members_from_raw(raw)
    }

    fn item_id(item: &Member) -> ItemId {
        item.id
    }

    fn search_text(item: &Member) -> String {
        match &item.email {
            Some(email) => format!("{}\n{}", item.name, email),
            None => item.name.clone(),
        }
    }
}

impl Endpoint for Users {
    fn path(key: ResourceKey) -> String {
        format!("/api/groups/{}/members", key)
    }
}

pub type MemberCache = ResourceCache<Users>;

pub trait MemberViews {
    fn members_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<Member>;

    /// Members whose name or email contains `needle`.
    fn search(&self, group_id: impl IntoResourceKey, needle: &str) -> Vec<Member>;

    fn find_member(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Option<Member>;

    fn member_count(&self, group_id: impl IntoResourceKey) -> usize;
}

impl MemberViews for MemberCache {
    fn members_for_group(&self, group_id: impl IntoResourceKey) -> LoadFuture<Member> {
        self.load(group_id, PageRequest::first())
    }

    fn search(&self, group_id: impl IntoResourceKey, needle: &str) -> Vec<Member> {
        self.filter_text(group_id, needle)
    }

    fn find_member(&self, group_id: impl IntoResourceKey, user_id: ItemId) -> Option<Member> {
        self.find_by_id(group_id, user_id)
    }

    fn member_count(&self, group_id: impl IntoResourceKey) -> usize {
        self.count(group_id)
    }
}
