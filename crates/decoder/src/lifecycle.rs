//! Thread-safe decoder lifecycle controller.
//!
//! `DecoderLifecycle` owns the current [`DecoderState`] and the backend's
//! [`DecoderHooks`]. Every verb is checked against the transition table; a
//! verb that is stale for the current state is ignored and reported as
//! [`Outcome::Ignored`], never as an error.
//!
//! ## Locking
//!
//! Two locks, always taken in this order:
//!
//! 1. `hooks`: held by a verb for its whole duration, including the
//!    delegate hook. This linearizes verbs: one finishes its state update
//!    and hook before the next one starts.
//! 2. `state`: held only long enough to read or write the state.
//!
//! Queries take only the `state` lock, so they never wait behind a slow
//! hardware call and observe the target state as soon as a verb records it.

use std::fmt;
use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use hs_common::{DecodeError, HookFailurePolicy, LifecycleOptions, Outcome, Verb};

use crate::hooks::DecoderHooks;
use crate::state::DecoderState;

/// Lifecycle state machine around a hardware decoding session.
///
/// `C` is the opaque configuration type passed to `configure`. `H` is the
/// backend hook implementation; by default a trait object.
///
/// # Example
///
/// ```ignore
/// let decoder = DecoderLifecycle::new(Box::new(MediaCodecHooks::new()));
/// decoder.create("video/hevc")?;
/// decoder.configure(format)?;
/// decoder.start()?;
/// // A second start is stale and does nothing.
/// assert_eq!(decoder.start()?, Outcome::Ignored);
/// ```
pub struct DecoderLifecycle<C, H: ?Sized = dyn DecoderHooks<C>> {
    options: LifecycleOptions,
    state: Mutex<DecoderState>,
    hooks: Mutex<Box<H>>,
    _config: PhantomData<fn(C)>,
}

impl<C, H> DecoderLifecycle<C, H>
where
    H: DecoderHooks<C> + ?Sized,
{
    /// Create a controller in `Uninitialized` with default options.
    pub fn new(hooks: Box<H>) -> Self {
        Self::with_options(hooks, LifecycleOptions::default())
    }

    pub fn with_options(hooks: Box<H>, options: LifecycleOptions) -> Self {
        Self {
            options,
            state: Mutex::new(DecoderState::Uninitialized),
            hooks: Mutex::new(hooks),
            _config: PhantomData,
        }
    }

    pub fn options(&self) -> &LifecycleOptions {
        &self.options
    }

    pub fn label(&self) -> &str {
        &self.options.label
    }

    // ------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------

    pub fn create(&self, mime: &str) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Create, |hooks| hooks.on_create(mime))
    }

    /// `config` is dropped unopened when the verb is stale.
    pub fn configure(&self, config: C) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Configure, move |hooks| hooks.on_configure(config))
    }

    pub fn start(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Start, |hooks| hooks.on_start())
    }

    pub fn pause(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Pause, |hooks| hooks.on_pause())
    }

    pub fn resume(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Resume, |hooks| hooks.on_resume())
    }

    pub fn flush(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Flush, |hooks| hooks.on_flush())
    }

    pub fn stop(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Stop, |hooks| hooks.on_stop())
    }

    pub fn reset(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Reset, |hooks| hooks.on_reset())
    }

    pub fn destroy(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Destroy, |hooks| hooks.on_destroy())
    }

    /// Enter the terminal state. The state stays `Released` even if the
    /// hook fails.
    pub fn release(&self) -> Result<Outcome, DecodeError> {
        self.transition(Verb::Release, |hooks| hooks.on_release())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> DecoderState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    pub fn is_created(&self) -> bool {
        self.state().is_created()
    }

    pub fn is_configured(&self) -> bool {
        self.state().is_configured()
    }

    pub fn is_started(&self) -> bool {
        self.state().is_started()
    }

    pub fn is_released(&self) -> bool {
        self.state().is_released()
    }

    // ------------------------------------------------------------------
    // Backend access for extensions
    // ------------------------------------------------------------------

    /// Run `f` on the hooks together with the current state, serialized
    /// with the verbs: no verb can change the state until `f` returns.
    pub(crate) fn with_hooks<R>(&self, f: impl FnOnce(DecoderState, &mut H) -> R) -> R {
        let mut hooks = self.hooks.lock();
        let state = self.state();
        f(state, &mut **hooks)
    }

    /// Read-only access to the hooks, serialized with the verbs.
    pub(crate) fn inspect_hooks<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        let hooks = self.hooks.lock();
        f(&**hooks)
    }

    fn transition(
        &self,
        verb: Verb,
        hook: impl FnOnce(&mut H) -> Result<(), DecodeError>,
    ) -> Result<Outcome, DecodeError> {
        let mut hooks = self.hooks.lock();

        let from = {
            let mut state = self.state.lock();
            let from = *state;
            match from.next(verb) {
                Some(to) => {
                    *state = to;
                    debug!(decoder = %self.options.label, %verb, ?from, ?to, "Decoder transition");
                    from
                }
                None => {
                    trace!(decoder = %self.options.label, %verb, state = ?from, "Ignoring stale decoder verb");
                    return Ok(Outcome::Ignored);
                }
            }
        };

        if let Err(err) = hook(&mut **hooks) {
            let rolled_back =
                self.options.hook_failure == HookFailurePolicy::Rollback && verb != Verb::Release;
            if rolled_back {
                *self.state.lock() = from;
            }
            warn!(
                decoder = %self.options.label,
                %verb,
                error = %err,
                rolled_back,
                state = ?self.state(),
                "Decoder hook failed"
            );
            return Err(err);
        }

        Ok(Outcome::Applied)
    }
}

impl<C, H: ?Sized> fmt::Debug for DecoderLifecycle<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderLifecycle")
            .field("label", &self.options.label)
            .field("state", &*self.state.lock())
            .field("hook_failure", &self.options.hook_failure)
            .finish()
    }
}
