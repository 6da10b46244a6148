//! The five domain caches of the admin client.
//!
//! Each module binds a domain to the cache engine (raw payload, transform,
//! failure messages), to its REST endpoint, and adds the typed aggregates the
//! admin screens read.

pub mod activity;
pub mod balances;
pub mod expenses;
pub mod groups;
pub mod users;

pub use activity::{Activity, ActivityCache, ActivityViews};
pub use balances::{BalanceCache, BalanceViews, Balances};
pub use expenses::{ExpenseCache, ExpenseViews, Expenses};
pub use groups::{GroupCache, GroupViews, Groups};
pub use users::{MemberCache, MemberViews, Users};

use crate::error::ClientError;
use std::fmt;
use std::str::FromStr;

/// Domain names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainName {
    Activity,
    Balances,
    Expenses,
    Groups,
    Users,
}

impl DomainName {
    pub const ALL: [DomainName; 5] = [
        DomainName::Activity,
        DomainName::Balances,
        DomainName::Expenses,
        DomainName::Groups,
        DomainName::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainName::Activity => "activity",
            DomainName::Balances => "balances",
            DomainName::Expenses => "expenses",
            DomainName::Groups => "groups",
            DomainName::Users => "users",
        }
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainName {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        DomainName::ALL
            .into_iter()
            .find(|name| name.as_str() == value)
            .or(match value.as_str() {
                "members" => Some(DomainName::Users),
                _ => None,
            })
            .ok_or_else(|| ClientError::Usage(format!("unknown domain: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_names_round_trip() {
        for name in DomainName::ALL {
            assert_eq!(name.as_str().parse::<DomainName>().unwrap(), name);
        }
    }

    #[test]
    fn test_members_alias_and_case() {
        assert_eq!("Members".parse::<DomainName>().unwrap(), DomainName::Users);
        assert_eq!(" BALANCES ".parse::<DomainName>().unwrap(), DomainName::Balances);
        assert!(matches!(
            "payments".parse::<DomainName>(),
            Err(ClientError::Usage(_))
        ));
    }
}
