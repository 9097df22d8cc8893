//! In-process simulated hub, used by `--simulate` and by the bridge tests.
//!
//! The connector is a cheap clone-able handle; tests keep one clone to
//! script outcomes and inspect the programs the bridge executed.

use super::{HubConnector, HubSession};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::debug;

#[derive(Clone, Default)]
pub struct SimConnector {
    state: Arc<SimState>,
}

#[derive(Default)]
struct SimState {
    absent: AtomicBool,
    refuse_connect: AtomicBool,
    hold_discovery: AtomicBool,
    hold_connects: AtomicBool,
    hold_runs: AtomicBool,
    release: Notify,
    failing_runs: Mutex<HashSet<usize>>,
    run_seq: AtomicUsize,
    programs: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimConnector {
    /// A hub that is present, connects, and runs everything instantly.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scripting and inspection surface for tests.
#[cfg(test)]
impl SimConnector {
    /// A hub that never shows up in a scan.
    pub fn absent() -> Self {
        let connector = Self::default();
        connector.set_present(false);
        connector
    }

    pub fn set_present(&self, present: bool) {
        self.state.absent.store(!present, Ordering::SeqCst);
    }

    /// Make every connect attempt fail.
    pub fn refuse_connect(&self) {
        self.state.refuse_connect.store(true, Ordering::SeqCst);
    }

    /// Fail the nth run (0-based, counted across all sessions).
    pub fn fail_run(&self, index: usize) {
        locked(&self.state.failing_runs).insert(index);
    }

    /// Block every discovery until the hub is released.
    pub fn hold_discovery(&self) {
        self.state.hold_discovery.store(true, Ordering::SeqCst);
    }

    /// Block every connect attempt until the hub is released.
    pub fn hold_connects(&self) {
        self.state.hold_connects.store(true, Ordering::SeqCst);
    }

    /// Block every run until [`release_runs`](Self::release_runs).
    pub fn hold_runs(&self) {
        self.state.hold_runs.store(true, Ordering::SeqCst);
    }

    pub fn release_runs(&self) {
        self.state.hold_runs.store(false, Ordering::SeqCst);
        self.state.release.notify_waiters();
    }

    /// Every program executed so far, in execution order.
    pub fn programs(&self) -> Vec<String> {
        locked(&self.state.programs).clone()
    }

    /// How many times a session's `disconnect` was called.
    pub fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HubConnector for SimConnector {
    async fn discover(&self, name: &str) -> Result<Option<Box<dyn HubSession>>> {
        if self.state.absent.load(Ordering::SeqCst) {
            debug!("[SIM] No hub named {name} present");
            return Ok(None);
        }
        if self.state.hold_discovery.load(Ordering::SeqCst) {
            self.state.release.notified().await;
        }
        debug!("[SIM] Hub {name} discovered");
        Ok(Some(Box::new(SimSession {
            state: self.state.clone(),
            connected: false,
        })))
    }
}

struct SimSession {
    state: Arc<SimState>,
    connected: bool,
}

#[async_trait]
impl HubSession for SimSession {
    async fn connect(&mut self) -> Result<()> {
        if self.state.hold_connects.load(Ordering::SeqCst) {
            self.state.release.notified().await;
        }
        if self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated hub refused the connection"));
        }
        self.connected = true;
        Ok(())
    }

    async fn run(&mut self, program: &str) -> Result<()> {
        if !self.connected {
            return Err(anyhow!("session not connected"));
        }
        let seq = self.state.run_seq.fetch_add(1, Ordering::SeqCst);
        locked(&self.state.programs).push(program.to_string());
        if self.state.hold_runs.load(Ordering::SeqCst) {
            self.state.release.notified().await;
        }
        if locked(&self.state.failing_runs).contains(&seq) {
            return Err(anyhow!("simulated hub fault on run {seq}"));
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_hub_is_not_discovered() {
        let connector = SimConnector::absent();
        let found = connector.discover("SP-7").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_run_requires_a_connected_session() {
        let connector = SimConnector::new();
        let mut session = connector.discover("SP-7").await.unwrap().unwrap();
        assert!(session.run("wait(100)").await.is_err());
        session.connect().await.unwrap();
        assert!(session.run("wait(100)").await.is_ok());
        assert_eq!(connector.programs(), vec!["wait(100)".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_run_failure_hits_the_right_run() {
        let connector = SimConnector::new();
        connector.fail_run(1);
        let mut session = connector.discover("SP-7").await.unwrap().unwrap();
        session.connect().await.unwrap();
        assert!(session.run("a").await.is_ok());
        assert!(session.run("b").await.is_err());
        assert!(session.run("c").await.is_ok());
    }
}
