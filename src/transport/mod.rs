//! The hub session boundary.
//!
//! The bridge core only ever sees these two traits; whether the hub is a
//! real BLE device or the in-process simulator is decided at startup.

pub mod ble;
pub mod sim;

use anyhow::Result;
use async_trait::async_trait;

/// Discovery half of the boundary: find the named hub and hand back an
/// unconnected session for it. `Ok(None)` means the scan ran but the hub
/// never appeared.
#[async_trait]
pub trait HubConnector: Send + Sync {
    async fn discover(&self, name: &str) -> Result<Option<Box<dyn HubSession>>>;
}

/// An established (or establishable) link to exactly one hub, able to run
/// one program at a time.
#[async_trait]
pub trait HubSession: Send {
    /// Establish the session.
    async fn connect(&mut self) -> Result<()>;

    /// Upload `program` and run it to completion on the hub.
    async fn run(&mut self, program: &str) -> Result<()>;

    /// Tear the session down. Best-effort by contract: callers must
    /// tolerate failure here.
    async fn disconnect(&mut self) -> Result<()>;
}
