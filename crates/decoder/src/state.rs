//! Decoder lifecycle states and the transition table.
//!
//! The table is a pure function of `(state, verb)`; the controller in
//! [`crate::lifecycle`] is the only place that stores a state.

use hs_common::Verb;

/// Lifecycle state of a hardware decoding session.
///
/// Ordered as the session progresses; `Released` is absorbing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecoderState {
    /// Constructed, no backend session yet.
    #[default]
    Uninitialized,
    Created,
    Configured,
    Started,
    Paused,
    Resumed,
    /// Backend session destroyed; `create` may start a new one.
    Destroyed,
    /// Terminal. No verb leaves this state.
    Released,
}

impl DecoderState {
    pub const ALL: [DecoderState; 8] = [
        DecoderState::Uninitialized,
        DecoderState::Created,
        DecoderState::Configured,
        DecoderState::Started,
        DecoderState::Paused,
        DecoderState::Resumed,
        DecoderState::Destroyed,
        DecoderState::Released,
    ];

    /// The state `verb` leads to from `self`, or `None` when the verb is
    /// stale for this state. `flush` maps a valid state to itself.
    pub fn next(self, verb: Verb) -> Option<DecoderState> {
        use DecoderState::*;

        match verb {
            Verb::Create => matches!(self, Uninitialized | Destroyed).then_some(Created),
            Verb::Configure => (self == Created).then_some(Configured),
            Verb::Start => (self == Configured).then_some(Started),
            Verb::Pause => self.is_running().then_some(Paused),
            Verb::Resume => self.is_paused().then_some(Resumed),
            Verb::Flush => self.is_started().then_some(self),
            Verb::Stop => self.is_started().then_some(Created),
            Verb::Reset => self.is_configured().then_some(Created),
            Verb::Destroy => self.is_created().then_some(Destroyed),
            Verb::Release => (self != Released).then_some(Released),
        }
    }

    /// Started or Resumed.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Started | Self::Resumed)
    }

    pub fn is_paused(self) -> bool {
        self == Self::Paused
    }

    /// Created through Resumed.
    pub fn is_created(self) -> bool {
        matches!(
            self,
            Self::Created | Self::Configured | Self::Started | Self::Paused | Self::Resumed
        )
    }

    /// Configured through Resumed.
    pub fn is_configured(self) -> bool {
        matches!(
            self,
            Self::Configured | Self::Started | Self::Paused | Self::Resumed
        )
    }

    /// Started through Resumed.
    pub fn is_started(self) -> bool {
        matches!(self, Self::Started | Self::Paused | Self::Resumed)
    }

    pub fn is_released(self) -> bool {
        self == Self::Released
    }
}
