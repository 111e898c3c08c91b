//! `hs-decoder` — Lifecycle management for hardware decoding sessions.
//!
//! A decoding session is driven from several threads at once: a control
//! thread issuing lifecycle verbs, a decode thread finishing work, an error
//! handler stopping things. This crate serializes those verbs against a
//! single recorded state and turns every stale or redundant call into a
//! harmless no-op.
//!
//! ## Module Overview
//!
//! - [`state`] — `DecoderState` and the transition table
//! - [`hooks`] — `DecoderHooks`, the per-verb backend interface
//! - [`lifecycle`] — `DecoderLifecycle`, the thread-safe controller
//! - [`video`] — `VideoDecoder`, output routing and capability queries
//!
//! ## Usage
//!
//! ```ignore
//! use hs_decoder::{DecoderLifecycle, DecoderState};
//!
//! let decoder = DecoderLifecycle::new(Box::new(backend));
//! decoder.create("video/hevc")?;
//! decoder.configure(format)?;
//! decoder.start()?;
//!
//! // Two threads racing to stop: one applies, the other is ignored.
//! decoder.stop()?;
//! decoder.stop()?;
//! assert_eq!(decoder.state(), DecoderState::Created);
//!
//! decoder.release()?;
//! ```

pub mod hooks;
pub mod lifecycle;
pub mod state;
pub mod video;

pub use hooks::DecoderHooks;
pub use lifecycle::DecoderLifecycle;
pub use state::DecoderState;
pub use video::{VideoConfiguration, VideoDecoder, VideoDecoderHooks};
