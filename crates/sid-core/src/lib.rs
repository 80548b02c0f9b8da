/// Data model, template store, configuration and errors for speakerid.
///
/// This crate holds every type shared across the workspace. It performs no
/// file I/O apart from reading the TOML configuration.

pub mod cancel;
pub mod config;
pub mod error;
pub mod frame;
pub mod store;

pub use cancel::CancelToken;
pub use config::{FailurePolicy, MatchConfig, StrategyKind};
pub use error::{RecordOrigin, SidError, SidResult};
pub use frame::{FRAME_DIM, FeatureFrame, FeatureSequence};
pub use store::{SpeakerTemplate, TemplateRef, TemplateStore};
