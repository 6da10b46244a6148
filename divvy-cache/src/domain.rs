//! The per-domain description a cache instance is parameterised over.

use divvy_core::ItemId;

/// Describes one cached domain: what the transport returns, what the cache
/// stores, and the messages shown when loading fails.
///
/// # Implementation Requirements
///
/// - `transform` must be pure and keep the order of the payload
/// - `item_id` must be unique within one partition
/// - `LOAD_FAILED_MESSAGE` must not contain server-provided text; it replaces
///   the raw message of every 5xx/network failure
pub trait Domain: Send + Sync + 'static {
    /// Payload produced by the transport for one partition.
    type Raw: Send + 'static;
    /// Item stored in the cache.
    type Item: Clone + Send + Sync + 'static;

    /// Short name used in logs and reports (e.g. `"balances"`).
    const NAME: &'static str;
    /// What the key identifies (e.g. `"group"`), used in validation messages.
    const KEY_LABEL: &'static str;
    /// Shown for a 4xx response whose body carries no message.
    const NOT_FOUND_MESSAGE: &'static str;
    /// Shown for every 5xx or network failure.
    const LOAD_FAILED_MESSAGE: &'static str;

    /// Map a raw payload to the stored items.
    fn transform(raw: Self::Raw) -> Vec<Self::Item>;

    /// Identity of an item inside its partition.
    fn item_id(item: &Self::Item) -> ItemId;

    /// Text searched by substring filters. Empty by default, which makes
    /// every non-empty filter match nothing.
    fn search_text(_item: &Self::Item) -> String {
        String::new()
    }
}
