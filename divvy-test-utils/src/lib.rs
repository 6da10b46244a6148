//! Divvy Test Utilities
//!
//! Centralized test infrastructure for the Divvy workspace:
//! - A scripted mock transport and a recording reporter
//! - A minimal test domain for exercising the cache engine
//! - Proptest generators for keys and raw payloads
//! - Test fixtures for common scenarios
//! - Custom assertions for cache invariants

pub use divvy_cache::{
    CacheConfig, CacheEntry, Domain, ErrorReport, LoadStatus, PageRequest, Reporter,
    ResourceCache, Transport,
};
pub use divvy_core::{
    Balance, ItemId, LoadError, RawBalance, RawExpense, RawExpenseSplit, RawMember, ResourceKey,
    TransportError,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// TEST DOMAIN
// ============================================================================

/// Item of the test domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestItem {
    pub id: ItemId,
    pub label: String,
    pub amount: f64,
}

impl TestItem {
    pub fn new(id: ItemId, label: impl Into<String>, amount: f64) -> Self {
        Self {
            id,
            label: label.into(),
            amount,
        }
    }

    /// The single item the default mock responder returns for `key`.
    pub fn for_key(key: ResourceKey) -> Self {
        let id = key.get() as ItemId;
        Self::new(id, format!("item {}", id), id as f64)
    }
}

/// A domain whose raw payload already is the item list.
#[derive(Debug, Clone, Copy)]
pub struct TestDomain;

impl Domain for TestDomain {
    type Raw = Vec<TestItem>;
    type Item = TestItem;

    const NAME: &'static str = "test";
    const KEY_LABEL: &'static str = "group";
    const NOT_FOUND_MESSAGE: &'static str = "Group not found";
    const LOAD_FAILED_MESSAGE: &'static str = "Failed to load items";

    fn transform(raw: Vec<TestItem>) -> Vec<TestItem> {
        raw
    }

    fn item_id(item: &TestItem) -> ItemId {
        item.id
    }

    fn search_text(item: &TestItem) -> String {
        item.label.clone()
    }
}

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

type Outcome<D> = Result<<D as Domain>::Raw, TransportError>;
type Responder<D> = Box<dyn Fn(ResourceKey, PageRequest) -> Outcome<D> + Send + Sync>;

/// Scripted transport for any domain.
///
/// Each fetch is recorded, then answered by the next outcome queued for its
/// key, or by the fallback responder when nothing is queued. A gated
/// transport holds every response until [`MockTransport::release`] is called.
pub struct MockTransport<D: Domain> {
    calls: Mutex<Vec<(ResourceKey, PageRequest)>>,
    scripted: Mutex<HashMap<ResourceKey, VecDeque<Outcome<D>>>>,
    fallback: Responder<D>,
    gate: Option<Arc<Semaphore>>,
    waiting: AtomicUsize,
}

impl<D: Domain> MockTransport<D> {
    /// A transport answering unscripted fetches with `fallback`.
    pub fn new(
        fallback: impl Fn(ResourceKey, PageRequest) -> Outcome<D> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(HashMap::new()),
            fallback: Box::new(fallback),
            gate: None,
            waiting: AtomicUsize::new(0),
        }
    }

    /// A transport failing every unscripted fetch with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self::new(move |_, _| Err(error.clone()))
    }

    /// Hold every response until released.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `responses` held fetches complete.
    pub fn release(&self, responses: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(responses);
        }
    }

    /// Queue the outcome of the next unscripted fetch for `key`.
    pub fn push(&self, key: ResourceKey, outcome: Outcome<D>) -> &Self {
        lock(&self.scripted).entry(key).or_default().push_back(outcome);
        self
    }

    pub fn push_ok(&self, key: ResourceKey, raw: D::Raw) -> &Self {
        self.push(key, Ok(raw))
    }

    pub fn push_err(&self, key: ResourceKey, error: TransportError) -> &Self {
        self.push(key, Err(error))
    }

    /// Every fetch so far, in call order.
    pub fn calls(&self) -> Vec<(ResourceKey, PageRequest)> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_for(&self, key: ResourceKey) -> usize {
        lock(&self.calls).iter().filter(|(called, _)| *called == key).count()
    }

    /// Fetches currently held by the gate.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Yield until at least `count` fetches are held by the gate.
    pub async fn wait_for_waiting(&self, count: usize) {
        while self.waiting() < count {
            tokio::task::yield_now().await;
        }
    }

    fn respond(&self, key: ResourceKey, page: PageRequest) -> Outcome<D> {
        let scripted = lock(&self.scripted)
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| (self.fallback)(key, page))
    }
}

impl MockTransport<TestDomain> {
    /// Answers every fetch with [`TestItem::for_key`].
    pub fn echo() -> Self {
        Self::new(|key, _| Ok(vec![TestItem::for_key(key)]))
    }
}

impl<D: Domain> fmt::Debug for MockTransport<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("domain", &D::NAME)
            .field("calls", &self.call_count())
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

#[async_trait]
impl<D: Domain> Transport<D> for MockTransport<D> {
    async fn fetch(&self, key: ResourceKey, page: PageRequest) -> Outcome<D> {
        lock(&self.calls).push((key, page));
        if let Some(gate) = &self.gate {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let permit = gate.acquire().await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            if let Ok(permit) = permit {
                permit.forget();
            }
        }
        self.respond(key, page)
    }
}

// ============================================================================
// RECORDING REPORTER
// ============================================================================

/// Reporter that records every call.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ErrorReport>>,
    clears: AtomicUsize,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        lock(&self.reports).clone()
    }

    /// User-visible messages of every report, in order.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.reports)
            .iter()
            .map(|report| report.message.clone())
            .collect()
    }

    pub fn report_count(&self) -> usize {
        lock(&self.reports).len()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl Reporter for RecordingReporter {
    fn report_error(&self, report: &ErrorReport) {
        lock(&self.reports).push(report.clone());
    }

    fn clear_error(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for keys and raw payloads.

    use super::*;
    use proptest::prelude::*;

    /// A valid resource key in `1..=max`.
    pub fn arb_resource_key(max: i64) -> impl Strategy<Value = ResourceKey> {
        (1..=max.max(1)).prop_map(|value| {
            ResourceKey::new(value).unwrap_or_else(|_| unreachable!("range starts at one"))
        })
    }

    /// A raw key value that must be rejected.
    pub fn arb_invalid_key() -> impl Strategy<Value = i64> {
        prop_oneof![Just(0_i64), Just(-1_i64), i64::MIN..0]
    }

    /// A sequence of raw key values in `1..=max`, repeats allowed.
    pub fn arb_key_sequence(max: i64, len: usize) -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(1..=max.max(1), 1..=len.max(1))
    }

    /// A finite amount with cent precision.
    pub fn arb_amount() -> impl Strategy<Value = f64> {
        (-1_000_000_i64..1_000_000).prop_map(|cents| cents as f64 / 100.0)
    }

    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,11}"
    }

    pub fn arb_test_item() -> impl Strategy<Value = TestItem> {
        (1..10_000_i64, arb_name(), arb_amount())
            .prop_map(|(id, label, amount)| TestItem::new(id, label, amount))
    }

    pub fn arb_raw_balance() -> impl Strategy<Value = RawBalance> {
        (1..10_000_i64, arb_name(), arb_amount()).prop_map(|(user_id, user_name, balance)| {
            RawBalance {
                user_id,
                user_name,
                balance,
            }
        })
    }

    pub fn arb_raw_member() -> impl Strategy<Value = RawMember> {
        (1..10_000_i64, arb_name(), proptest::option::of("[a-z]{3,8}@example\\.com")).prop_map(
            |(id, name, email)| RawMember {
                id,
                name,
                email,
                joined_at: None,
            },
        )
    }

    pub fn arb_raw_split() -> impl Strategy<Value = RawExpenseSplit> {
        (1..10_000_i64, arb_amount()).prop_map(|(user_id, amount_owed)| RawExpenseSplit {
            user_id,
            user_name: None,
            amount_owed,
        })
    }

    pub fn arb_raw_expense() -> impl Strategy<Value = RawExpense> {
        (
            1..10_000_i64,
            1..1_000_i64,
            "[a-z ]{1,24}",
            arb_amount(),
            1..10_000_i64,
            prop::collection::vec(arb_raw_split(), 0..6),
        )
            .prop_map(
                |(id, group_id, description, amount, paid_by, splits)| RawExpense {
                    id,
                    group_id,
                    description,
                    amount,
                    paid_by,
                    paid_by_name: None,
                    created_at: None,
                    splits,
                },
            )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use serde_json::{json, Value};

    /// A valid key. Panics on non-positive input.
    pub fn key(value: i64) -> ResourceKey {
        ResourceKey::new(value).unwrap_or_else(|err| panic!("invalid fixture key: {}", err))
    }

    /// A test-domain cache over an echo transport with a recording reporter.
    pub fn test_cache(
        capacity: usize,
    ) -> (
        ResourceCache<TestDomain>,
        Arc<MockTransport<TestDomain>>,
        Arc<RecordingReporter>,
    ) {
        cache_with(capacity, MockTransport::echo())
    }

    /// A test-domain cache over `transport` with a recording reporter.
    pub fn cache_with(
        capacity: usize,
        transport: MockTransport<TestDomain>,
    ) -> (
        ResourceCache<TestDomain>,
        Arc<MockTransport<TestDomain>>,
        Arc<RecordingReporter>,
    ) {
        let transport = Arc::new(transport);
        let reporter = Arc::new(RecordingReporter::new());
        let cache = ResourceCache::new(
            CacheConfig::new().with_capacity(capacity),
            transport.clone(),
            reporter.clone(),
        );
        (cache, transport, reporter)
    }

    pub fn server_error() -> TransportError {
        TransportError::http(
            500,
            Some(json!({"error": "could not connect to database"})),
            "Internal Server Error",
        )
    }

    pub fn group_not_found() -> TransportError {
        TransportError::http(404, Some(json!({"error": "Group not found"})), "Not Found")
    }

    /// Balances of a two-person group as the backend sends them.
    pub fn balances_payload() -> Value {
        json!([
            {"user_id": 1, "user_name": "Alice", "balance": "50.00"},
            {"user_id": 2, "user_name": "Bob", "balance": "-50.00"}
        ])
    }

    /// Members of a group as the backend sends them.
    pub fn members_payload() -> Value {
        json!([
            {"id": 1, "name": "Alice", "email": "alice@example.com", "joined_at": "2024-01-05T10:00:00Z"},
            {"id": 2, "name": "Bob", "email": null},
            {"id": "3", "name": "Carol", "email": ""}
        ])
    }

    /// Expenses of a group as the backend sends them.
    pub fn expenses_payload() -> Value {
        json!([
            {
                "id": 10, "group_id": 1, "description": "Dinner", "amount": "90.00",
                "paid_by": 1, "paid_by_name": "Alice", "created_at": "2024-02-01T19:30:00Z",
                "splits": [
                    {"user_id": 1, "user_name": "Alice", "amount_owed": "30.00"},
                    {"user_id": 2, "user_name": "Bob", "amount_owed": "30.00"},
                    {"user_id": 3, "user_name": "Carol", "amount_owed": "30.00"}
                ]
            },
            {
                "id": 11, "group_id": 1, "description": "Taxi home", "amount": 24.5,
                "paid_by": 2, "paid_by_name": "Bob", "created_at": "2024-02-01T23:10:00Z",
                "splits": []
            }
        ])
    }

    /// Groups of a user as the backend sends them.
    pub fn groups_payload() -> Value {
        json!([
            {"id": 1, "name": "Flatmates", "description": "Bills and groceries", "created_by": 1, "member_count": "3"},
            {"id": 2, "name": "Lisbon trip", "description": null, "created_by": 2, "member_count": 4}
        ])
    }

    /// A group's activity feed as the backend sends it.
    pub fn activity_payload() -> Value {
        json!([
            {"id": 100, "group_id": 1, "user_id": 1, "user_name": "Alice", "action": "expense_added",
             "description": "Alice added Dinner", "amount": "90.00", "created_at": "2024-02-01T19:31:00Z"},
            {"id": 101, "group_id": 1, "user_id": 3, "user_name": "Carol", "action": "member_joined",
             "description": "Carol joined", "created_at": "2024-01-20T08:00:00Z"},
            {"id": 102, "group_id": 1, "action": "something_new", "description": "Imported"}
        ])
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over cache invariants.

    use super::*;

    /// Assert that `key` reads exactly like a never-loaded key.
    #[track_caller]
    pub fn assert_virgin<D: Domain>(cache: &ResourceCache<D>, key: ResourceKey) {
        let entry = cache.entry(key);
        assert!(entry.items.is_empty(), "expected no items for key {}", key);
        assert_eq!(entry.status, LoadStatus::Idle, "expected idle key {}", key);
        assert_eq!(entry.last_loaded_at, None);
        assert!(!entry.has_more);
    }

    /// Assert that the cache holds no more keys than its capacity and that
    /// its recency order tracks exactly the cached keys.
    #[track_caller]
    pub fn assert_within_capacity<D: Domain>(cache: &ResourceCache<D>) {
        let keys = cache.cached_keys();
        assert!(
            keys.len() <= cache.capacity(),
            "{} keys cached with capacity {}",
            keys.len(),
            cache.capacity()
        );
        let mut recency = cache.recency();
        recency.sort_unstable();
        assert_eq!(recency, keys, "recency order out of sync with the store");
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes_precede_fallback() {
        let transport = MockTransport::echo();
        transport.push_err(key(1), server_error());

        assert!(transport.fetch(key(1), PageRequest::first()).await.is_err());
        let items = transport.fetch(key(1), PageRequest::first()).await.unwrap();
        assert_eq!(items, vec![TestItem::for_key(key(1))]);
        assert_eq!(transport.calls_for(key(1)), 2);
    }

    #[tokio::test]
    async fn test_gate_holds_until_released() {
        let transport = Arc::new(MockTransport::echo().gated());
        let held = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.fetch(key(2), PageRequest::first()).await })
        };
        transport.wait_for_waiting(1).await;
        assert_eq!(transport.call_count(), 1);

        transport.release(1);
        let items = held.await.unwrap().unwrap();
        assert_eq!(items[0].id, 2);
        assert_eq!(transport.waiting(), 0);
    }

    #[test]
    fn test_recording_reporter_counts() {
        let reporter = RecordingReporter::new();
        reporter.clear_error();
        reporter.report_error(&ErrorReport {
            domain: "test",
            key: None,
            message: "Invalid group ID".to_string(),
            details: LoadError::Transient {
                message: "x".to_string(),
                details: TransportError::network("x"),
            },
        });
        assert_eq!(reporter.clear_count(), 1);
        assert_eq!(reporter.messages(), vec!["Invalid group ID".to_string()]);
    }
}
