//! Operator statistics reporter.
//!
//! A dedicated task consumes SIGHUP deliveries and prints the counters to
//! stderr. The runtime's signal driver owns delivery, so no worker observes
//! the signal and no work happens in an async-signal context. The report is
//! written as exact bytes, outside the tracing pipeline.

use std::io::Write;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::error;

use crate::stats::Stats;

/// Spawns the SIGHUP reporter. The task runs for the process lifetime.
pub fn spawn_reporter(stats: Arc<Stats>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("unable to install SIGHUP handler: {e}");
                return;
            }
        };
        while hangups.recv().await.is_some() {
            let report = stats.snapshot().render();
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(report.as_bytes());
            let _ = stderr.flush();
        }
    })
}
