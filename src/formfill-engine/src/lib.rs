//! Formfill engine.
//!
//! Consumes an event stream describing what to type into a mock form and
//! plays it back with a typewriter effect:
//!
//! - [`source`]: transports that yield raw records (push, bulk, replay)
//! - [`consumer`]: decoding and routing of records
//! - [`sequencer`]: the single FIFO of fill requests
//! - [`typewriter`]: the per-character animation
//! - [`session`]: the run/stop state machine tying it together
//! - [`state`]: the snapshot the rendering surface reads

pub mod config;
pub mod consumer;
pub mod error;
pub mod sequencer;
pub mod session;
pub mod source;
pub mod state;
pub mod typewriter;

pub use config::{
    AnimationConfig, CONFIG_FILE, DEFAULT_BASE_URL, EngineConfig, FORMFILL_API_URL_ENV,
    FORMFILL_CONFIG_ENV, ServerConfig, TransportKind, load_config, parse_config_content,
};
pub use consumer::{ConsumeOutcome, ConsumeStats, DropReason, EventRouter, RouteOutcome, consume};
pub use error::{EngineError, Result};
pub use sequencer::{DrainOutcome, FillQueue, FillRequest, FillSequencer};
pub use session::SessionController;
pub use source::{
    BulkSource, EventSource, PayloadStream, ReplaySource, SseSource, endpoint_url,
    source_from_config,
};
pub use state::{
    FieldState, FormSink, LogEntry, LogLevel, SessionPhase, SessionSnapshot, SessionState,
};
pub use typewriter::{AnimationOutcome, TypingAnimator, TypingFrames};

// Re-export protocol types used in the public API.
pub use formfill_protocol::{Event, FieldId};
