use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use serverun::errors::Result;
use serverun::host::{Host, LogLevel, ServiceUpdate};

/// A fake host that:
/// - records every log and status call
/// - records `start_target` calls (target, watch)
/// - plays back scripted service updates, then either closes the
///   stream or keeps it open for the test to drive via
///   [`push_build`](FakeHost::push_build)
///
/// By default the stream stays open after the initial updates, like a
/// dev server that keeps running.
pub struct FakeHost {
    project_root: PathBuf,
    logs: Mutex<Vec<(LogLevel, String)>>,
    statuses: Mutex<Vec<String>>,
    start_calls: Mutex<Vec<(String, bool)>>,
    initial_updates: Mutex<Vec<ServiceUpdate>>,
    close_after_initial: AtomicBool,
    start_error: Mutex<Option<String>>,
    service_tx: Mutex<Option<mpsc::Sender<ServiceUpdate>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            project_root: PathBuf::from("."),
            logs: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
            start_calls: Mutex::new(Vec::new()),
            initial_updates: Mutex::new(Vec::new()),
            close_after_initial: AtomicBool::new(false),
            start_error: Mutex::new(None),
            service_tx: Mutex::new(None),
        }
    }

    /// Queue an update delivered as soon as the service is started.
    pub fn queue_update(&self, update: ServiceUpdate) {
        self.initial_updates.lock().unwrap().push(update);
    }

    /// Queue a build update delivered as soon as the service starts.
    pub fn queue_build(&self, success: bool) {
        self.queue_update(ServiceUpdate::Build { success });
    }

    /// Close the update stream right after the queued updates instead
    /// of keeping it open.
    pub fn close_after_initial(&self) {
        self.close_after_initial.store(true, Ordering::SeqCst);
    }

    /// Make the next `start_target` call fail.
    pub fn fail_start(&self, message: &str) {
        *self.start_error.lock().unwrap() = Some(message.to_string());
    }

    /// Deliver a build update on the live stream.
    ///
    /// Panics if no service is running or the stream was closed; that
    /// is a test bug, not a runtime condition.
    pub fn push_build(&self, success: bool) {
        self.push_update(ServiceUpdate::Build { success });
    }

    /// Deliver an update on the live stream.
    pub fn push_update(&self, update: ServiceUpdate) {
        let guard = self.service_tx.lock().unwrap();
        let tx = guard.as_ref().expect("no service stream running");
        tx.try_send(update).expect("service update channel full or closed");
    }

    /// Close the live update stream.
    pub fn close_stream(&self) {
        *self.service_tx.lock().unwrap() = None;
    }

    pub fn logs(&self) -> Vec<(LogLevel, String)> {
        self.logs.lock().unwrap().clone()
    }

    /// Just the messages, for substring asserts.
    pub fn log_messages(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn start_calls(&self) -> Vec<(String, bool)> {
        self.start_calls.lock().unwrap().clone()
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for FakeHost {
    fn resolve_project_root(&self) -> Result<PathBuf> {
        Ok(self.project_root.clone())
    }

    fn start_target(&self, target: &str, watch: bool) -> Result<mpsc::Receiver<ServiceUpdate>> {
        self.start_calls
            .lock()
            .unwrap()
            .push((target.to_string(), watch));

        if let Some(message) = self.start_error.lock().unwrap().take() {
            return Err(anyhow::anyhow!(message).into());
        }

        let (tx, rx) = mpsc::channel(64);

        for update in self.initial_updates.lock().unwrap().drain(..) {
            tx.try_send(update).expect("initial service updates exceed channel capacity");
        }

        if !self.close_after_initial.load(Ordering::SeqCst) {
            *self.service_tx.lock().unwrap() = Some(tx);
        }
        // Otherwise tx drops here and the stream closes after the
        // queued updates.

        Ok(rx)
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.logs.lock().unwrap().push((level, message.to_string()));
    }

    fn report_status(&self, status: &str) {
        self.statuses.lock().unwrap().push(status.to_string());
    }
}
