//! OTP verification UI state machine.
//!
//! [`VerificationStateMachine`] tracks the state an OTP entry screen renders
//! from: loading flag, field errors, the resend countdown and the attempt
//! budget. The host UI reads snapshots via [`VerificationStateMachine::state`]
//! after each operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

const OTP_LENGTH: usize = 4;
const RESEND_WINDOW_SECS: u32 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Snapshot of the OTP entry screen state.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct VerifyState {
    /// Whether a verification request is in flight.
    pub is_loading: bool,
    /// Field-keyed validation messages (`otp` is the only key today).
    pub errors: HashMap<String, String>,
    /// Seconds remaining until resend becomes available.
    pub resend_seconds: u32,
    /// Whether the resend action is currently disabled.
    pub is_resend_disabled: bool,
    /// Resend attempts consumed so far.
    pub attempts: u32,
    /// Resend attempts allowed in total.
    pub max_attempts: u32,
}

impl Default for VerifyState {
    fn default() -> Self {
        Self {
            is_loading: false,
            errors: HashMap::new(),
            resend_seconds: RESEND_WINDOW_SECS,
            is_resend_disabled: true,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Drives the OTP entry screen: input validation, the resend countdown and
/// the attempt budget.
#[derive(uniffi::Object)]
pub struct VerificationStateMachine {
    state: Arc<Mutex<VerifyState>>,
    /// The live countdown task and the generation it was started with.
    /// Generation bumps and handle swaps happen under this lock so a
    /// stale caller can never abort a newer countdown.
    countdown: Mutex<Option<(u64, AbortHandle)>>,
    /// Bumped whenever a countdown starts or is cancelled; a running tick
    /// loop observing a newer generation stops touching the state.
    generation: Arc<AtomicU64>,
}

#[uniffi::export(async_runtime = "tokio")]
impl VerificationStateMachine {
    #[uniffi::constructor]
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    #[uniffi::constructor]
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(VerifyState {
                max_attempts,
                ..VerifyState::default()
            })),
            countdown: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Validates the OTP input locally, recording a field error on failure.
    ///
    /// An empty code reports `OTP is required`; anything other than exactly
    /// four digits, whitespace-padded input included, reports
    /// `Enter a valid OTP`.
    pub fn validate_otp(&self, code: String) -> bool {
        let mut state = lock(&self.state);
        if code.is_empty() {
            state
                .errors
                .insert("otp".to_string(), "OTP is required".to_string());
            return false;
        }
        if code.len() != OTP_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            state
                .errors
                .insert("otp".to_string(), "Enter a valid OTP".to_string());
            return false;
        }
        state.errors.clear();
        true
    }

    /// Consumes one resend attempt and starts the 30 second countdown.
    ///
    /// A no-op once the attempt budget is exhausted. Starting a new
    /// countdown replaces any countdown already running.
    pub async fn start_resend_timer(&self) {
        {
            let mut state = lock(&self.state);
            if state.attempts >= state.max_attempts {
                log::debug!("resend attempts exhausted ({})", state.max_attempts);
                return;
            }
            state.attempts += 1;
            state.is_resend_disabled = true;
            state.resend_seconds = RESEND_WINDOW_SECS;
            state.errors.clear();
        }

        let mut countdown = lock(&self.countdown);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let handle = tokio::spawn(async move {
            for tick in 0..RESEND_WINDOW_SECS {
                tokio::time::sleep(Duration::from_secs(1)).await;
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }
                lock(&state).resend_seconds = RESEND_WINDOW_SECS - 1 - tick;
            }
            if current.load(Ordering::SeqCst) == generation {
                lock(&state).is_resend_disabled = false;
            }
        })
        .abort_handle();

        if let Some((_, previous)) = countdown.replace((generation, handle)) {
            previous.abort();
        }
    }

    /// Stops any running countdown and re-enables resend immediately.
    /// Idempotent.
    pub fn cancel_countdown(&self) {
        {
            let mut countdown = lock(&self.countdown);
            self.generation.fetch_add(1, Ordering::SeqCst);
            if let Some((_, handle)) = countdown.take() {
                handle.abort();
            }
        }
        lock(&self.state).is_resend_disabled = false;
    }

    pub fn set_loading(&self, loading: bool) {
        lock(&self.state).is_loading = loading;
    }

    /// Returns to the initial state, keeping the configured attempt budget.
    pub fn reset(&self) {
        {
            let mut countdown = lock(&self.countdown);
            self.generation.fetch_add(1, Ordering::SeqCst);
            if let Some((_, handle)) = countdown.take() {
                handle.abort();
            }
        }
        let mut state = lock(&self.state);
        let max_attempts = state.max_attempts;
        *state = VerifyState {
            max_attempts,
            ..VerifyState::default()
        };
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> VerifyState {
        lock(&self.state).clone()
    }
}

impl Default for VerificationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
