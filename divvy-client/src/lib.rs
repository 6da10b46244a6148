//! Divvy admin client.
//!
//! Wires the cache engine to the Divvy REST API: one cache per domain,
//! a shared error signal and notification list, TOML configuration and
//! tracing setup for the `divvy-admin` binary.

pub mod cli;
pub mod config;
pub mod domains;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod state;
pub mod transport;

pub use config::AdminConfig;
pub use domains::DomainName;
pub use error::{ClientError, ClientResult};
pub use notifications::{Notification, NotificationCenter, NotificationLevel};
pub use state::{AdminCaches, DomainTransports, GroupDashboard};
pub use transport::{Endpoint, RestTransport};
