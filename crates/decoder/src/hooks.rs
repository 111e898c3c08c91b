//! Capability interface implemented by a concrete decoding backend.

use hs_common::DecodeError;

/// One delegate hook per lifecycle verb.
///
/// The controller calls exactly one hook per applied transition, after the
/// new state has been recorded. Hooks may block on hardware; errors are
/// returned to the caller of the verb unchanged.
///
/// `C` is the backend's configuration type. The controller never looks
/// inside it.
pub trait DecoderHooks<C>: Send {
    fn on_create(&mut self, mime: &str) -> Result<(), DecodeError>;

    fn on_configure(&mut self, config: C) -> Result<(), DecodeError>;

    fn on_start(&mut self) -> Result<(), DecodeError>;

    fn on_pause(&mut self) -> Result<(), DecodeError>;

    fn on_resume(&mut self) -> Result<(), DecodeError>;

    fn on_flush(&mut self) -> Result<(), DecodeError>;

    /// Back to the created state; the session is kept.
    fn on_stop(&mut self) -> Result<(), DecodeError>;

    /// Drop the configuration; the session is kept.
    fn on_reset(&mut self) -> Result<(), DecodeError>;

    /// Tear down the session. A later `on_create` may build a new one.
    fn on_destroy(&mut self) -> Result<(), DecodeError>;

    /// Final cleanup. Called at most once per controller.
    fn on_release(&mut self) -> Result<(), DecodeError>;
}
