//! Domain cache tests over scripted transports.

use divvy_cache::{Domain, FailureKind, LoadStatus, PageRequest, TransportError};
use divvy_client::cli::{self, Command};
use divvy_client::domains::{
    Activity, ActivityViews, BalanceViews, Balances, DomainName, ExpenseViews, Expenses,
    GroupViews, Groups, MemberViews, Users,
};
use divvy_client::{AdminCaches, AdminConfig, ClientError, DomainTransports, NotificationLevel};
use divvy_core::ActivityKind;
use divvy_test_utils::fixtures::{
    activity_payload, balances_payload, expenses_payload, groups_payload, key, members_payload,
    server_error,
};
use divvy_test_utils::MockTransport;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

// ============================================================================
// HELPERS
// ============================================================================

fn config() -> AdminConfig {
    let config = AdminConfig::from_toml(
        r#"
        api_base_url = "http://localhost:3000"
        request_timeout_ms = 5000

        [auth]
        api_key = "test-key"

        [pagination]
        page_size = 20
        "#,
    )
    .unwrap();
    config.validate().unwrap();
    config
}

/// A transport answering every fetch with `payload`.
fn serving<D>(payload: Value) -> Arc<MockTransport<D>>
where
    D: Domain,
    D::Raw: DeserializeOwned,
{
    Arc::new(MockTransport::new(move |_, _| {
        Ok(serde_json::from_value(payload.clone()).unwrap())
    }))
}

struct Harness {
    caches: AdminCaches,
    activity: Arc<MockTransport<Activity>>,
    balances: Arc<MockTransport<Balances>>,
    expenses: Arc<MockTransport<Expenses>>,
    groups: Arc<MockTransport<Groups>>,
    users: Arc<MockTransport<Users>>,
}

fn harness() -> Harness {
    let activity = serving::<Activity>(activity_payload());
    let balances = serving::<Balances>(balances_payload());
    let expenses = serving::<Expenses>(expenses_payload());
    let groups = serving::<Groups>(groups_payload());
    let users = serving::<Users>(members_payload());
    let transports = DomainTransports {
        activity: activity.clone(),
        balances: balances.clone(),
        expenses: expenses.clone(),
        groups: groups.clone(),
        users: users.clone(),
    };
    Harness {
        caches: AdminCaches::new(&config(), transports),
        activity,
        balances,
        expenses,
        groups,
        users,
    }
}

// ============================================================================
// BALANCES
// ============================================================================

#[tokio::test]
async fn test_balances_transform_to_camel_case() {
    let h = harness();
    let loaded = h.caches.balances.balances_for_group(1).await.unwrap();

    assert_eq!(
        serde_json::to_value(&loaded.items[0]).unwrap(),
        json!({"userId": 1, "userName": "Alice", "balance": 50.0})
    );
    assert_eq!(h.balances.call_count(), 1);
}

#[tokio::test]
async fn test_balances_survive_failed_refresh() {
    let h = harness();
    let balances = &h.caches.balances;
    balances.balances_for_group(1).await.unwrap();
    let before = balances.items(1);

    h.balances.push_err(key(1), server_error());
    let refreshed = balances.refresh(1).await.unwrap();

    assert!(refreshed.is_stale());
    assert_eq!(balances.items(1), before);
    assert_eq!(balances.status(1), LoadStatus::Success);
    assert_eq!(
        h.caches.current_error().as_deref(),
        Some("Failed to load balances")
    );

    let latest = h.caches.notifications.latest().unwrap();
    assert_eq!(latest.level, NotificationLevel::Error);
    assert_eq!(latest.source, Some("balances"));
}

#[tokio::test]
async fn test_balance_aggregates() {
    let h = harness();
    let balances = &h.caches.balances;
    balances.balances_for_group(1).await.unwrap();

    assert!(balances.total_balance(1).abs() < f64::EPSILON);
    assert_eq!(balances.creditors(1)[0].user_name, "Alice");
    assert_eq!(balances.debtors(1)[0].user_name, "Bob");
    assert_eq!(balances.balance_for_user(1, 2).unwrap().balance, -50.0);
    assert!(!balances.is_settled(1));
    assert!(!balances.is_settled(2));
}

// ============================================================================
// EXPENSES
// ============================================================================

#[tokio::test]
async fn test_expense_views() {
    let h = harness();
    let expenses = &h.caches.expenses;
    expenses.expenses_for_group(1).await.unwrap();

    assert!((expenses.total_amount(1) - 114.5).abs() < 1e-9);
    assert_eq!(expenses.search(1, "TAXI")[0].id, 11);
    assert_eq!(expenses.search(1, "alice")[0].id, 10);
    assert_eq!(expenses.paid_by(1, 2).len(), 1);
    assert_eq!(expenses.involving(1, 3)[0].description, "Dinner");

    let newest: Vec<i64> = expenses.newest_first(1).iter().map(|e| e.id).collect();
    assert_eq!(newest, vec![11, 10]);
}

#[tokio::test]
async fn test_expenses_load_more_appends_after_cached_items() {
    let h = harness();
    let expenses = &h.caches.expenses;

    let first = expenses.expenses_for_group(1).await.unwrap();
    assert!(!first.has_more);

    let more = expenses.load_more(1, h.caches.page_size()).await.unwrap();
    assert_eq!(more.items.len(), 4);
    assert_eq!(more.fetched, 2);
    assert_eq!(
        h.expenses.calls(),
        vec![
            (key(1), PageRequest::page(20, 0)),
            (key(1), PageRequest::page(20, 2)),
        ]
    );

    expenses.expenses_for_group(1).await.unwrap();
    assert_eq!(expenses.count(1), 2);
}

// ============================================================================
// ACTIVITY, GROUPS, USERS
// ============================================================================

#[tokio::test]
async fn test_activity_views() {
    let h = harness();
    let activity = &h.caches.activity;
    activity.activity_for_group(1).await.unwrap();

    let recent: Vec<i64> = activity.recent(1, 2).iter().map(|e| e.id).collect();
    assert_eq!(recent, vec![100, 101]);
    assert_eq!(activity.by_kind(1, ActivityKind::MemberJoined)[0].id, 101);
    assert_eq!(activity.by_kind(1, ActivityKind::Other)[0].id, 102);
    assert_eq!(h.activity.calls()[0].1, PageRequest::limit(20));
}

#[tokio::test]
async fn test_group_views_keyed_by_user() {
    let h = harness();
    let groups = &h.caches.groups;
    groups.groups_for_user(7).await.unwrap();

    assert_eq!(groups.total_members(7), 7);
    assert_eq!(groups.search(7, "groceries")[0].name, "Flatmates");
    assert_eq!(groups.find_group(7, 2).unwrap().name, "Lisbon trip");
    assert_eq!(h.groups.calls()[0], (key(7), PageRequest::first()));
}

#[tokio::test]
async fn test_unknown_user_clears_groups() {
    let h = harness();
    let groups = &h.caches.groups;
    groups.groups_for_user(7).await.unwrap();

    h.groups.push_err(key(7), TransportError::http(404, None, "Not Found"));
    let failure = groups.refresh(7).await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::NotFound);
    assert_eq!(failure.user_message(), "User not found");
    assert!(groups.items(7).is_empty());
    assert!(groups.is_error(7));
}

#[tokio::test]
async fn test_member_views() {
    let h = harness();
    let users = &h.caches.users;
    users.members_for_group(1).await.unwrap();

    assert_eq!(users.member_count(1), 3);
    assert_eq!(users.find_member(1, 3).unwrap().email, None);
    assert_eq!(users.search(1, "example.com")[0].name, "Alice");
    assert_eq!(users.search(1, "").len(), 3);
}

// ============================================================================
// SHARED STATE AND COMMANDS
// ============================================================================

#[tokio::test]
async fn test_success_in_any_domain_clears_shared_error() {
    let h = harness();
    h.balances.push_err(key(3), server_error());
    assert!(h.caches.balances.balances_for_group(3).await.is_err());
    assert_eq!(
        h.caches.current_error().as_deref(),
        Some("Failed to load balances")
    );

    h.caches.users.members_for_group(3).await.unwrap();
    assert_eq!(h.caches.current_error(), None);
    assert_eq!(h.caches.notifications.len(), 1);
}

#[tokio::test]
async fn test_group_dashboard_loads_every_domain() {
    let h = harness();
    let dashboard = h.caches.load_group_dashboard(1).await.unwrap();

    assert_eq!(dashboard.balances.len(), 2);
    assert_eq!(dashboard.expenses.len(), 2);
    assert_eq!(dashboard.members.len(), 3);
    assert_eq!(dashboard.activity.len(), 3);
    assert_eq!(h.groups.call_count(), 0);
}

#[tokio::test]
async fn test_run_command_prints_items() {
    let h = harness();
    let command = Command {
        domain: DomainName::Balances,
        key: "1".to_string(),
    };
    let report = cli::run(&h.caches, &command).await.unwrap();

    assert_eq!(report.stale, None);
    assert_eq!(report.items[1]["userName"], "Bob");
    assert_eq!(report.items[1]["balance"], -50.0);
}

#[tokio::test]
async fn test_run_command_rejects_invalid_key() {
    let h = harness();
    let command = Command {
        domain: DomainName::Users,
        key: "abc".to_string(),
    };
    let failure = cli::run(&h.caches, &command).await.unwrap_err();

    assert!(matches!(failure, ClientError::Load(ref e) if e.kind() == FailureKind::Validation));
    assert_eq!(h.users.call_count(), 0);
    assert!(h.caches.current_error().is_some());
}
