use crate::domain::session::{Completion, SessionMachine, TickOutcome};
use crate::infrastructure::error::InfraError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};
use tracing::debug;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owns the single periodic tick subscription that drives a [`SessionMachine`].
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    completion_delay: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new(period: Duration, completion_delay: Duration) -> Self {
        Self {
            period,
            completion_delay,
            handle: Mutex::new(None),
        }
    }

    /// Replaces any live subscription with one bound to `epoch`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn subscribe(
        &self,
        session: &Arc<Mutex<SessionMachine>>,
        epoch: u64,
    ) -> Result<(), InfraError> {
        let runtime = runtime_handle()?;
        let mut handle = self.lock_handle()?;
        if let Some(previous) = handle.take() {
            previous.abort();
        }
        *handle = Some(runtime.spawn(run_ticks(
            Arc::clone(session),
            epoch,
            self.period,
            self.completion_delay,
        )));
        debug!(epoch, "tick subscription started");
        Ok(())
    }

    /// Drops the live subscription, including a pending completion.
    pub fn cancel(&self) -> Result<(), InfraError> {
        if let Some(previous) = self.lock_handle()?.take() {
            previous.abort();
            debug!("tick subscription cancelled");
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.lock_handle()
            .map(|handle| handle.as_ref().is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }

    fn lock_handle(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<JoinHandle<()>>>, InfraError> {
        self.handle
            .lock()
            .map_err(|error| InfraError::Runtime(format!("ticker lock poisoned: {error}")))
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Ok(handle) = self.handle.get_mut() {
            if let Some(task) = handle.take() {
                task.abort();
            }
        }
    }
}

/// The runtime the tick task would be spawned on.
pub fn runtime_handle() -> Result<Handle, InfraError> {
    Handle::try_current().map_err(|error| {
        InfraError::Runtime(format!("tick source needs a tokio runtime: {error}"))
    })
}

async fn run_ticks(
    session: Arc<Mutex<SessionMachine>>,
    mut epoch: u64,
    period: Duration,
    completion_delay: Duration,
) {
    let mut interval = interval_at(Instant::now() + period, period);
    loop {
        interval.tick().await;
        let (outcome, expired_epoch) = {
            let Ok(mut machine) = session.lock() else {
                return;
            };
            let outcome = machine.tick(epoch);
            (outcome, machine.epoch())
        };
        match outcome {
            TickOutcome::Advanced => continue,
            TickOutcome::Ignored => return,
            TickOutcome::Expired => {}
        }

        sleep(completion_delay).await;
        let (completion, next_epoch) = {
            let Ok(mut machine) = session.lock() else {
                return;
            };
            let completion = machine.complete(expired_epoch);
            (completion, machine.epoch())
        };
        match completion {
            Some(Completion::PhaseAdvanced { .. }) => {
                epoch = next_epoch;
                interval = interval_at(Instant::now() + period, period);
            }
            _ => return,
        }
    }
}
