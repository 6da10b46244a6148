//! Command-line handling for `divvy-admin`.

use crate::domains::DomainName;
use crate::error::{ClientError, ClientResult};
use crate::state::AdminCaches;
use divvy_cache::{Loaded, ResourceCache};
use serde::Serialize;
use serde_json::Value;

pub const USAGE: &str = "divvy-admin [--config <path>] <domain> <key>\n  \
    domains: activity, balances, expenses, groups, users";

/// One invocation: which domain to load for which key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub domain: DomainName,
    /// Passed to the cache as given; the cache validates it.
    pub key: String,
}

impl Command {
    /// Parse the arguments after the program name. `--config <path>` may
    /// appear anywhere and is skipped.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> ClientResult<Self> {
        let mut positional = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--config" {
                args.next();
                continue;
            }
            positional.push(arg);
        }

        match positional.as_slice() {
            [domain, key] => Ok(Self {
                domain: domain.parse()?,
                key: key.clone(),
            }),
            _ => Err(ClientError::Usage(USAGE.to_string())),
        }
    }
}

/// The result of one command, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub items: Value,
    /// Message of the transient failure that left cached items in place.
    pub stale: Option<String>,
}

fn report<T: Serialize>(loaded: Loaded<T>) -> ClientResult<Report> {
    Ok(Report {
        stale: loaded.stale.as_ref().map(|failure| failure.user_message()),
        items: serde_json::to_value(&loaded.items)?,
    })
}

async fn load<D>(cache: &ResourceCache<D>, key: &str) -> ClientResult<Report>
where
    D: divvy_cache::Domain,
    D::Item: Serialize,
{
    let loaded = cache.refresh(key).await?;
    report(loaded)
}

/// Load the partition named by `command`.
pub async fn run(caches: &AdminCaches, command: &Command) -> ClientResult<Report> {
    let key = command.key.as_str();
    match command.domain {
        DomainName::Activity => load(&caches.activity, key).await,
        DomainName::Balances => load(&caches.balances, key).await,
        DomainName::Expenses => load(&caches.expenses, key).await,
        DomainName::Groups => load(&caches.groups, key).await,
        DomainName::Users => load(&caches.users, key).await,
    }
}
