use thiserror::Error;

/// Failures surfaced by the playback engine.
///
/// Everything else (a dropped sound event, an out-of-range tempo) is
/// recovered locally and never reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The platform has no usable audio output. Fatal for the session.
    #[error("no usable audio output device")]
    AudioUnavailable,

    /// The output pipeline is suspended until a user gesture. Recoverable:
    /// call `start()` again after a user-initiated action.
    #[error("audio output is suspended until a user gesture")]
    NeedsUserInteraction,
}
