//! Session host: owns a `WorkoutSession` and the clock that ticks it
//!
//! The ticker is a tokio task started on the Idle -> Active transition. It is
//! cancelled when the session finishes and when the host is dropped (the
//! workout screen was torn down), so a stale timer can never touch a
//! discarded session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::session::{
    Outcome, SessionError, SessionEvent, SessionStatus, SessionView, WorkoutSession,
};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Running tick task; aborted when dropped
struct Ticker(JoinHandle<()>);

impl Drop for Ticker {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct SessionHost {
    session: Arc<Mutex<WorkoutSession>>,
    ticker: Option<Ticker>,
    period: Duration,
}

impl SessionHost {
    pub fn new(session: WorkoutSession) -> Self {
        Self::with_period(session, TICK_PERIOD)
    }

    pub fn with_period(session: WorkoutSession, period: Duration) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            ticker: None,
            period,
        }
    }

    /// Route an event through the session and keep the ticker in step with
    /// the resulting status. Must be called inside a tokio runtime.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Outcome, SessionError> {
        let (outcome, status) = {
            let mut session = self.lock();
            let outcome = session.apply(event, Utc::now())?;
            (outcome, session.status())
        };

        match status {
            SessionStatus::Active if self.ticker.is_none() => self.spawn_ticker(),
            SessionStatus::Finished if self.ticker.is_some() => {
                self.ticker = None;
                tracing::debug!("Session ticker cancelled");
            }
            _ => {}
        }

        Ok(outcome)
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(&*self.lock())
    }

    /// Copy of the current session state
    #[cfg(test)]
    pub fn snapshot(&self) -> WorkoutSession {
        self.lock().clone()
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.0.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, WorkoutSession> {
        // The session has no invariant a panicking holder could break halfway
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_ticker(&mut self) {
        let session = Arc::clone(&self.session);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut current = session.lock().unwrap_or_else(PoisonError::into_inner);
                if current.status() != SessionStatus::Active {
                    break;
                }
                current.tick();
            }
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "Session ticker started");
        self.ticker = Some(Ticker(handle));
    }
}

impl Drop for SessionHost {
    fn drop(&mut self) {
        if self.ticker.take().is_some() {
            tracing::debug!("Session host dropped, ticker cancelled");
        }
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
