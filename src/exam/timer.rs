// src/exam/timer.rs

use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::config::TIMER_TICK;

/// Handle to a repeating task. The task is aborted when the handle is
/// cancelled or dropped, so it can never outlive its owner.
#[derive(Debug)]
pub struct TaskHandle {
    inner: JoinHandle<()>,
}

impl TaskHandle {
    pub fn cancel(self) {
        // Drop aborts.
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

/// Runs `task` every `period`, first run one period from now, until it
/// returns `ControlFlow::Break`. Must be called inside a Tokio runtime.
pub fn schedule_repeating<F>(period: Duration, mut task: F) -> TaskHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let inner = tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if task().is_break() {
                break;
            }
        }
    });

    TaskHandle { inner }
}

pub type ExpiryCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
struct TimerState {
    remaining: u64,
    running: bool,
    /// Bumped on every start/pause/reset so a tick from a stale run is ignored.
    run: u64,
}

/// One-second countdown that fires `on_expiry` once when it reaches zero.
pub struct CountdownTimer {
    initial: u64,
    period: Duration,
    state: Arc<Mutex<TimerState>>,
    on_expiry: ExpiryCallback,
    task: Option<TaskHandle>,
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CountdownTimer {
    pub fn new<F>(initial_secs: u64, on_expiry: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_period(initial_secs, TIMER_TICK, on_expiry)
    }

    /// Same as [`CountdownTimer::new`] with a custom tick length.
    pub fn with_period<F>(initial_secs: u64, period: Duration, on_expiry: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        CountdownTimer {
            initial: initial_secs,
            period,
            state: Arc::new(Mutex::new(TimerState {
                remaining: initial_secs,
                running: false,
                run: 0,
            })),
            on_expiry: Arc::new(on_expiry),
            task: None,
        }
    }

    /// Starts ticking. No-op if already running or nothing is left.
    pub fn start(&mut self) {
        let run = {
            let mut state = lock(&self.state);
            if state.running || state.remaining == 0 {
                return;
            }
            state.running = true;
            state.run += 1;
            state.run
        };

        let state = Arc::clone(&self.state);
        let on_expiry = Arc::clone(&self.on_expiry);

        self.task = Some(schedule_repeating(self.period, move || {
            let expired = {
                let mut state = lock(&state);
                if state.run != run || !state.running {
                    return ControlFlow::Break(());
                }
                state.remaining = state.remaining.saturating_sub(1);
                if state.remaining == 0 {
                    state.running = false;
                }
                state.remaining == 0
            };

            if expired {
                tracing::debug!("countdown expired");
                on_expiry();
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }));
    }

    /// Stops ticking, keeping the remaining time.
    pub fn pause(&mut self) {
        {
            let mut state = lock(&self.state);
            state.running = false;
            state.run += 1;
        }
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }

    /// Stops and sets the remaining time to `new_secs` or the initial duration.
    pub fn reset(&mut self, new_secs: Option<u64>) {
        self.pause();
        lock(&self.state).remaining = new_secs.unwrap_or(self.initial);
    }

    pub fn remaining(&self) -> u64 {
        lock(&self.state).remaining
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn initial(&self) -> u64 {
        self.initial
    }

    /// Seconds spent: initial duration minus remaining time.
    pub fn elapsed(&self) -> u64 {
        self.initial.saturating_sub(self.remaining())
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.pause();
    }
}
