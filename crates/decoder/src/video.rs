//! Video decoder layered over the lifecycle controller.
//!
//! Adds output routing (CPU buffers or a render surface) and capability
//! queries. The output surface can be swapped at any time while the decoder
//! is configured, or handed in before configuration and picked up by
//! `configure`.

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, trace};

use hs_common::{DecodeError, LifecycleOptions, Outcome, OutputMode, SurfaceHandle};

use crate::hooks::DecoderHooks;
use crate::lifecycle::DecoderLifecycle;
use crate::state::DecoderState;

/// What a video backend receives in `on_configure`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoConfiguration<C> {
    /// The caller's format description, unopened.
    pub format: C,
    pub output_mode: OutputMode,
    /// Only ever `Some` in [`OutputMode::Surface`].
    pub output_surface: Option<SurfaceHandle>,
}

/// Hooks of a video decoding backend.
pub trait VideoDecoderHooks<C>: DecoderHooks<VideoConfiguration<C>> {
    /// Switch the output surface of a configured session.
    fn on_output_surface(&mut self, surface: Option<SurfaceHandle>) -> Result<(), DecodeError>;

    /// Whether buffer output can carry 10-bit YUV 4:2:0 (stored as 16 bits).
    fn supports_10bit_yuv420_buffer(&self) -> bool;

    fn supports_color_format(&self, color_format: i32) -> bool;
}

#[derive(Copy, Clone, Debug, Default)]
struct OutputSettings {
    mode: OutputMode,
    surface: Option<SurfaceHandle>,
}

/// Video decoder: lifecycle verbs plus output routing.
///
/// Lock order is `output`, then the lifecycle's own locks.
pub struct VideoDecoder<C> {
    lifecycle: DecoderLifecycle<VideoConfiguration<C>, dyn VideoDecoderHooks<C>>,
    output: Mutex<OutputSettings>,
}

impl<C> VideoDecoder<C> {
    pub fn new(hooks: Box<dyn VideoDecoderHooks<C>>) -> Self {
        Self::with_options(hooks, LifecycleOptions::default())
    }

    pub fn with_options(hooks: Box<dyn VideoDecoderHooks<C>>, options: LifecycleOptions) -> Self {
        Self {
            lifecycle: DecoderLifecycle::with_options(hooks, options),
            output: Mutex::new(OutputSettings::default()),
        }
    }

    // ------------------------------------------------------------------
    // Output routing
    // ------------------------------------------------------------------

    /// Choose buffer or surface output. Only takes effect while the decoder
    /// is not configured; a configured session keeps its mode until `reset`,
    /// `stop` or `destroy`.
    pub fn set_output_mode(&self, mode: OutputMode) -> Outcome {
        let mut output = self.output.lock();
        self.lifecycle.with_hooks(|state, _| {
            if state.is_configured() || state.is_released() {
                trace!(decoder = %self.lifecycle.label(), ?mode, ?state, "Ignoring output mode change");
                return Outcome::Ignored;
            }
            output.mode = mode;
            if mode == OutputMode::Buffer {
                output.surface = None;
            }
            debug!(decoder = %self.lifecycle.label(), ?mode, "Output mode set");
            Outcome::Applied
        })
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output.lock().mode
    }

    /// Set or clear the output surface. Ignored in buffer mode and after
    /// release. A configured session gets the new surface immediately; the
    /// remembered value only changes if the backend accepted it.
    pub fn set_output_surface(
        &self,
        surface: Option<SurfaceHandle>,
    ) -> Result<Outcome, DecodeError> {
        let mut output = self.output.lock();
        if output.mode != OutputMode::Surface {
            return Ok(Outcome::Ignored);
        }

        let accepted = self
            .lifecycle
            .with_hooks(|state, hooks| -> Result<bool, DecodeError> {
                if state.is_released() {
                    return Ok(false);
                }
                if state.is_configured() {
                    hooks.on_output_surface(surface)?;
                }
                Ok(true)
            })?;
        if !accepted {
            trace!(decoder = %self.lifecycle.label(), ?surface, "Ignoring output surface after release");
            return Ok(Outcome::Ignored);
        }

        output.surface = surface;
        debug!(decoder = %self.lifecycle.label(), ?surface, "Output surface set");
        Ok(Outcome::Applied)
    }

    pub fn output_surface(&self) -> Option<SurfaceHandle> {
        self.output.lock().surface
    }

    // ------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------

    pub fn supports_10bit_yuv420_buffer(&self) -> bool {
        self.lifecycle
            .inspect_hooks(|hooks| hooks.supports_10bit_yuv420_buffer())
    }

    pub fn supports_color_format(&self, color_format: i32) -> bool {
        self.lifecycle
            .inspect_hooks(|hooks| hooks.supports_color_format(color_format))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn create(&self, mime: &str) -> Result<Outcome, DecodeError> {
        self.lifecycle.create(mime)
    }

    /// Configure with the current output mode and surface.
    pub fn configure(&self, format: C) -> Result<Outcome, DecodeError> {
        let output = self.output.lock();
        self.lifecycle.configure(VideoConfiguration {
            format,
            output_mode: output.mode,
            output_surface: output.surface,
        })
    }

    pub fn start(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.start()
    }

    pub fn pause(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.pause()
    }

    pub fn resume(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.resume()
    }

    pub fn flush(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.flush()
    }

    pub fn stop(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.stop()
    }

    pub fn reset(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.reset()
    }

    pub fn destroy(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.destroy()
    }

    pub fn release(&self) -> Result<Outcome, DecodeError> {
        self.lifecycle.release()
    }

    pub fn state(&self) -> DecoderState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.lifecycle.is_paused()
    }

    pub fn is_created(&self) -> bool {
        self.lifecycle.is_created()
    }

    pub fn is_configured(&self) -> bool {
        self.lifecycle.is_configured()
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle.is_started()
    }

    pub fn is_released(&self) -> bool {
        self.lifecycle.is_released()
    }
}

impl<C> fmt::Debug for VideoDecoder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = self.output.lock();
        f.debug_struct("VideoDecoder")
            .field("lifecycle", &self.lifecycle)
            .field("output_mode", &output.mode)
            .field("output_surface", &output.surface)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Configure(VideoConfiguration<&'static str>),
        Surface(Option<SurfaceHandle>),
        Other(&'static str),
    }

    struct FakeCodec {
        calls: Arc<Mutex<Vec<Call>>>,
        reject_surface: bool,
    }

    impl DecoderHooks<VideoConfiguration<&'static str>> for FakeCodec {
        fn on_create(&mut self, _mime: &str) -> Result<(), DecodeError> {
            self.calls.lock().push(Call::Other("create"));
            Ok(())
        }
        fn on_configure(
            &mut self,
            config: VideoConfiguration<&'static str>,
        ) -> Result<(), DecodeError> {
            self.calls.lock().push(Call::Configure(config));
            Ok(())
        }
        fn on_start(&mut self) -> Result<(), DecodeError> {
            Ok(())
        }
        fn on_pause(&mut self) -> Result<(), DecodeError> {
            Ok(())
        }
        fn on_resume(&mut self) -> Result<(), DecodeError> {
            Ok(())
        }
        fn on_flush(&mut self) -> Result<(), DecodeError> {
            Ok(())
        }
        fn on_stop(&mut self) -> Result<(), DecodeError> {
            Ok(())
        }
        fn on_reset(&mut self) -> Result<(), DecodeError> {
            self.calls.lock().push(Call::Other("reset"));
            Ok(())
        }
        fn on_destroy(&mut self) -> Result<(), DecodeError> {
            Ok(())
        }
        fn on_release(&mut self) -> Result<(), DecodeError> {
            self.calls.lock().push(Call::Other("release"));
            Ok(())
        }
    }

    impl VideoDecoderHooks<&'static str> for FakeCodec {
        fn on_output_surface(&mut self, surface: Option<SurfaceHandle>) -> Result<(), DecodeError> {
            if self.reject_surface {
                return Err(DecodeError::Hardware {
                    verb: hs_common::Verb::Configure,
                    reason: "surface rejected".into(),
                });
            }
            self.calls.lock().push(Call::Surface(surface));
            Ok(())
        }

        fn supports_10bit_yuv420_buffer(&self) -> bool {
            true
        }

        fn supports_color_format(&self, color_format: i32) -> bool {
            color_format == 0x7f42_0888
        }
    }

    fn decoder(reject_surface: bool) -> (VideoDecoder<&'static str>, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let codec = FakeCodec {
            calls: calls.clone(),
            reject_surface,
        };
        (VideoDecoder::new(Box::new(codec)), calls)
    }

    #[test]
    fn surface_given_before_configure_is_passed_to_configure() {
        let (decoder, calls) = decoder(false);
        assert!(decoder.set_output_mode(OutputMode::Surface).is_applied());
        assert!(decoder
            .set_output_surface(Some(SurfaceHandle(9)))
            .unwrap()
            .is_applied());

        decoder.create("video/hevc").unwrap();
        decoder.configure("hdr10").unwrap();

        let calls = calls.lock();
        assert_eq!(
            calls[1],
            Call::Configure(VideoConfiguration {
                format: "hdr10",
                output_mode: OutputMode::Surface,
                output_surface: Some(SurfaceHandle(9)),
            })
        );
    }

    #[test]
    fn surface_swap_while_running_reaches_backend() {
        let (decoder, calls) = decoder(false);
        assert!(decoder.set_output_mode(OutputMode::Surface).is_applied());
        decoder.create("video/avc").unwrap();
        decoder.configure("sdr").unwrap();
        decoder.start().unwrap();

        decoder.set_output_surface(Some(SurfaceHandle(3))).unwrap();
        assert_eq!(decoder.output_surface(), Some(SurfaceHandle(3)));
        assert_eq!(
            calls.lock().last(),
            Some(&Call::Surface(Some(SurfaceHandle(3))))
        );
    }

    #[test]
    fn rejected_surface_keeps_previous() {
        let (decoder, _) = decoder(true);
        assert!(decoder.set_output_mode(OutputMode::Surface).is_applied());
        decoder.set_output_surface(Some(SurfaceHandle(1))).unwrap();
        decoder.create("video/avc").unwrap();
        decoder.configure("sdr").unwrap();

        assert!(decoder.set_output_surface(Some(SurfaceHandle(2))).is_err());
        assert_eq!(decoder.output_surface(), Some(SurfaceHandle(1)));
    }

    #[test]
    fn buffer_mode_ignores_surface() {
        let (decoder, calls) = decoder(false);
        assert_eq!(
            decoder.set_output_surface(Some(SurfaceHandle(1))).unwrap(),
            Outcome::Ignored
        );
        assert_eq!(decoder.output_surface(), None);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn output_mode_locked_while_configured() {
        let (decoder, calls) = decoder(false);
        decoder.create("video/avc").unwrap();
        decoder.configure("sdr").unwrap();
        assert_eq!(decoder.set_output_mode(OutputMode::Surface), Outcome::Ignored);
        assert_eq!(decoder.output_mode(), OutputMode::Buffer);

        decoder.reset().unwrap();
        assert!(decoder.set_output_mode(OutputMode::Surface).is_applied());
        assert_eq!(calls.lock().last(), Some(&Call::Other("reset")));
    }

    #[test]
    fn nothing_changes_after_release() {
        let (decoder, _) = decoder(false);
        assert!(decoder.set_output_mode(OutputMode::Surface).is_applied());
        decoder.release().unwrap();
        assert_eq!(decoder.set_output_mode(OutputMode::Buffer), Outcome::Ignored);
        assert_eq!(
            decoder.set_output_surface(Some(SurfaceHandle(4))).unwrap(),
            Outcome::Ignored
        );
        assert_eq!(decoder.create("video/avc").unwrap(), Outcome::Ignored);
    }

    #[test]
    fn surface_racing_release_is_applied_only_before_it() {
        for _ in 0..200 {
            let (decoder, calls) = decoder(false);
            assert!(decoder.set_output_mode(OutputMode::Surface).is_applied());
            decoder.create("video/avc").unwrap();
            decoder.configure("sdr").unwrap();
            let barrier = std::sync::Barrier::new(2);

            let outcome = std::thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    decoder.release().unwrap();
                });
                barrier.wait();
                decoder.set_output_surface(Some(SurfaceHandle(7))).unwrap()
            });

            let calls = calls.lock();
            let swap = calls
                .iter()
                .position(|c| *c == Call::Surface(Some(SurfaceHandle(7))));
            let release = calls.iter().position(|c| *c == Call::Other("release"));
            match outcome {
                Outcome::Applied => {
                    assert!(swap.unwrap() < release.unwrap());
                    assert_eq!(decoder.output_surface(), Some(SurfaceHandle(7)));
                }
                Outcome::Ignored => {
                    assert_eq!(swap, None);
                    assert_eq!(decoder.output_surface(), None);
                }
            }
        }
    }

    #[test]
    fn capabilities_come_from_backend() {
        let (decoder, _) = decoder(false);
        assert!(decoder.supports_10bit_yuv420_buffer());
        assert!(decoder.supports_color_format(0x7f42_0888));
        assert!(!decoder.supports_color_format(19));
    }
}
