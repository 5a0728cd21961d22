//! Activation policy: when the engine samples the light sensor and when it stops.
//!
//! The controller is a two-state machine (`Inactive`, `Listening`) driven by the
//! configured [`ActivationMode`], the stored device orientation, and lifecycle events.
//! Every activation decision goes through [`evaluate`], and the only deferred operation
//! is the auto-suspend timer.
//!
//! ## Suspend timer
//!
//! The timer is a deadline plus a generation number. Arming replaces the pending
//! deadline, cancelling bumps the generation, and an expiry is only honored when the
//! token it carries is still the pending one. A timer that fires after a later
//! `stop()`/`start()` is therefore a no-op.
//!
//! ## Mode behavior
//!
//! | Mode        | Activates              | Suspend timer                   |
//! |-------------|------------------------|---------------------------------|
//! | `always`    | always                 | never                           |
//! | `landscape` | always (grace if not)  | armed while in portrait         |
//! | `portrait`  | always (grace if not)  | armed while in landscape        |
//! | `unlock`    | always                 | always (tears down the one-shot)|
//!
//! Orientation modes that start in the wrong orientation listen for one suspend period
//! and then deactivate unless a matching orientation event arrives first. Once
//! deactivated, only a matching orientation (or an unlock) brings them back.

use serde::{Deserialize, Serialize};

/// Configured policy deciding when sampling runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationMode {
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "portrait")]
    ActiveWhilePortrait,
    #[serde(rename = "landscape")]
    ActiveWhileLandscape,
    #[serde(rename = "unlock")]
    OnUnlockOnce,
}

impl ActivationMode {
    /// Name used in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::ActiveWhilePortrait => "portrait",
            Self::ActiveWhileLandscape => "landscape",
            Self::OnUnlockOnce => "unlock",
        }
    }
}

impl std::fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Inactive,
    Listening { suspend_deadline_ms: Option<i64> },
}

/// Handle for one armed suspend deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendToken {
    generation: u64,
    pub deadline_ms: i64,
}

/// Cancelable, idempotently re-armable one-shot deadline.
#[derive(Debug, Default)]
pub struct SuspendTimer {
    generation: u64,
    pending: Option<SuspendToken>,
}

impl SuspendTimer {
    /// Replace any pending deadline with `now_ms + delay_ms`.
    pub fn arm(&mut self, now_ms: i64, delay_ms: u64) -> SuspendToken {
        self.generation = self.generation.wrapping_add(1);
        let token = SuspendToken {
            generation: self.generation,
            deadline_ms: now_ms.saturating_add(delay_ms as i64),
        };
        self.pending = Some(token);
        token
    }

    /// Invalidate the pending deadline, if any.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
    }

    pub fn pending(&self) -> Option<SuspendToken> {
        self.pending
    }

    /// Consume `token` if it is still the pending deadline and it has passed.
    pub fn expire(&mut self, token: SuspendToken, now_ms: i64) -> bool {
        if self.pending != Some(token) || now_ms < token.deadline_ms {
            return false;
        }
        self.pending = None;
        true
    }
}

/// Outcome of evaluating a mode against the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPlan {
    /// Whether the activation condition itself holds (matching orientation, immediate
    /// flag, or an unconditional mode)
    pub condition_met: bool,
    /// Whether a suspend timer must run while listening
    pub arm_suspend: bool,
}

/// Decide activation for `mode` given orientation and the immediate-update flag.
pub fn evaluate(mode: ActivationMode, landscape: bool, immediate: bool) -> ActivationPlan {
    match mode {
        ActivationMode::Always => ActivationPlan {
            condition_met: true,
            arm_suspend: false,
        },
        ActivationMode::ActiveWhileLandscape => ActivationPlan {
            condition_met: landscape || immediate,
            arm_suspend: !landscape,
        },
        ActivationMode::ActiveWhilePortrait => ActivationPlan {
            condition_met: !landscape || immediate,
            arm_suspend: landscape,
        },
        ActivationMode::OnUnlockOnce => ActivationPlan {
            condition_met: true,
            arm_suspend: true,
        },
    }
}

/// State change produced by a controller operation, for the engine to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still in the same state (the suspend timer may have been re-evaluated)
    Unchanged,
    /// Entered `Listening` from `Inactive`
    Activated { reset_gate: bool },
    /// Entered `Inactive` from `Listening`
    Deactivated,
}

#[derive(Debug)]
pub struct ActivationController {
    mode: ActivationMode,
    suspend_delay_ms: u64,
    landscape: bool,
    immediate: bool,
    listening: bool,
    timer: SuspendTimer,
}

impl ActivationController {
    pub fn new(mode: ActivationMode, suspend_delay_ms: u64, landscape: bool) -> Self {
        Self {
            mode,
            suspend_delay_ms,
            landscape,
            immediate: false,
            listening: false,
            timer: SuspendTimer::default(),
        }
    }

    /// Enter (or stay in) `Listening` and re-evaluate the suspend timer from scratch.
    pub fn start(&mut self, now_ms: i64) -> Transition {
        let plan = evaluate(self.mode, self.landscape, self.immediate);

        self.timer.cancel();
        if plan.arm_suspend {
            self.timer.arm(now_ms, self.suspend_delay_ms);
        }

        if self.listening {
            return Transition::Unchanged;
        }
        self.listening = true;
        Transition::Activated {
            reset_gate: self.mode == ActivationMode::OnUnlockOnce || self.immediate,
        }
    }

    /// Cancel the suspend timer and enter `Inactive`.
    pub fn stop(&mut self) -> Transition {
        self.timer.cancel();
        if !self.listening {
            return Transition::Unchanged;
        }
        self.listening = false;
        Transition::Deactivated
    }

    /// Handle an expired suspend deadline. Stale tokens are ignored.
    pub fn on_suspend_timer(&mut self, token: SuspendToken, now_ms: i64) -> Transition {
        if !self.listening || !self.timer.expire(token, now_ms) {
            return Transition::Unchanged;
        }
        // The condition that armed the timer must still hold
        if !evaluate(self.mode, self.landscape, self.immediate).arm_suspend {
            return Transition::Unchanged;
        }
        self.stop()
    }

    /// Store the new orientation and re-evaluate activation.
    ///
    /// An `Inactive` controller only wakes up when the activation condition holds; a
    /// mismatched orientation leaves it asleep.
    pub fn notify_orientation_changed(&mut self, landscape: bool, now_ms: i64) -> Transition {
        self.landscape = landscape;
        if self.mode == ActivationMode::Always {
            return Transition::Unchanged;
        }
        if !self.listening && !evaluate(self.mode, self.landscape, self.immediate).condition_met
        {
            return Transition::Unchanged;
        }
        self.start(now_ms)
    }

    pub fn notify_unlock_or_screen_on(&mut self, now_ms: i64) -> Transition {
        self.immediate = true;
        self.start(now_ms)
    }

    /// Pre-arm the immediate update for the next screen-on without activating.
    pub fn notify_screen_off(&mut self) {
        self.immediate = true;
    }

    /// Stop, swap in the new settings, and start evaluating again.
    pub fn reconfigure(
        &mut self,
        mode: ActivationMode,
        suspend_delay_ms: u64,
        now_ms: i64,
    ) -> Transition {
        self.stop();
        self.mode = mode;
        self.suspend_delay_ms = suspend_delay_ms;
        self.start(now_ms)
    }

    /// The immediate reading has been applied: clear the flag and end a one-shot session.
    pub fn complete_one_shot(&mut self) -> Transition {
        self.immediate = false;
        if self.mode == ActivationMode::OnUnlockOnce {
            return self.stop();
        }
        Transition::Unchanged
    }

    pub fn state(&self) -> ActivationState {
        if self.listening {
            ActivationState::Listening {
                suspend_deadline_ms: self.timer.pending().map(|token| token.deadline_ms),
            }
        } else {
            ActivationState::Inactive
        }
    }

    pub fn mode(&self) -> ActivationMode {
        self.mode
    }

    pub fn suspend_delay_ms(&self) -> u64 {
        self.suspend_delay_ms
    }

    pub fn is_landscape(&self) -> bool {
        self.landscape
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn immediate_pending(&self) -> bool {
        self.immediate
    }

    pub fn pending_suspend(&self) -> Option<SuspendToken> {
        self.timer.pending()
    }
}
