//! Embedded telemetry collector for database server processes.
//!
//! After a grace period the collector samples the node's identity, build
//! metadata and replication role every scrape interval, writes each sample
//! as one JSON file into a directory shared by every instance on the host,
//! and prunes files older than the history keep interval.
//!
//! ```ignore
//! let config = TelemetryNodeConfig::new()?.validate()?;
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let handle = CollectorBuilder::new(config, shutdown_rx).build()?.spawn();
//! // ...
//! shutdown_tx.send(())?;
//! handle.join().await?;
//! ```

mod config;
pub mod constants;
mod control;
mod errors;
mod identity;
mod node;
mod retention;
mod role;
mod scheduler;
mod snapshot;
pub mod utils;

pub use config::*;
pub use control::*;
pub use errors::*;
pub use identity::*;
pub use node::*;
pub use retention::*;
pub use role::*;
pub use scheduler::*;
pub use snapshot::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
