//! Process-wide service statistics.
//!
//! All counters live behind one mutex so a report is a consistent snapshot.
//! The mutex is leaf-level: it is never taken while any other lock is held
//! and never held across an await point.

use std::sync::Mutex;

#[derive(Debug, Default)]
struct Counters {
    current_clients: u32,
    completed_clients: u32,
    face_detect_ok: u32,
    face_replace_ok: u32,
    malformed_requests: u32,
}

/// Shared, lock-guarded service counters.
///
/// Invariant: at any quiescent moment `current_clients + completed_clients`
/// equals the number of connections ever accepted; `current_clients` only
/// decreases when a worker terminates.
#[derive(Debug, Default)]
pub struct Stats {
    inner: Mutex<Counters>,
}

impl Stats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted connection.
    pub fn client_connected(&self) {
        let mut counters = self.inner.lock().unwrap();
        counters.current_clients += 1;
    }

    /// Records a worker exit, on every termination path.
    pub fn client_finished(&self) {
        let mut counters = self.inner.lock().unwrap();
        counters.current_clients -= 1;
        counters.completed_clients += 1;
    }

    /// Records a completed face-detect request.
    pub fn face_detect_ok(&self) {
        self.inner.lock().unwrap().face_detect_ok += 1;
    }

    /// Records a completed face-replace request.
    pub fn face_replace_ok(&self) {
        self.inner.lock().unwrap().face_replace_ok += 1;
    }

    /// Records a frame with a bad magic.
    pub fn malformed_request(&self) {
        self.inner.lock().unwrap().malformed_requests += 1;
    }

    /// Takes a consistent snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.inner.lock().unwrap();
        StatsSnapshot {
            current_clients: counters.current_clients,
            completed_clients: counters.completed_clients,
            face_detect_ok: counters.face_detect_ok,
            face_replace_ok: counters.face_replace_ok,
            malformed_requests: counters.malformed_requests,
        }
    }
}

/// A consistent copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub current_clients: u32,
    pub completed_clients: u32,
    pub face_detect_ok: u32,
    pub face_replace_ok: u32,
    pub malformed_requests: u32,
}

impl StatsSnapshot {
    /// Renders the operator report, one counter per line.
    pub fn render(&self) -> String {
        format!(
            "Num clients connected: {}\n\
             Clients completed: {}\n\
             Face detect requests: {}\n\
             Face replace requests: {}\n\
             Malformed requests: {}\n",
            self.current_clients,
            self.completed_clients,
            self.face_detect_ok,
            self.face_replace_ok,
            self.malformed_requests,
        )
    }
}
