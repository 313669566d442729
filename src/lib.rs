//! Focus Flux - On-device classification engine for focus timelines
//!
//! Flux turns fixed-cadence input-activity samples (keystrokes, clicks,
//! scrolls, idle flag, active window) into a labeled focus timeline through a
//! deterministic pipeline: micro classification → threshold calibration →
//! windowed macro classification with recovery refinement → gap handling →
//! downsampling, replay segmentation and passport reporting.
//!
//! ## Modules
//!
//! - **Classification core**: `micro`, `threshold`, `macro_state`, `gaps`,
//!   `downsample`, `replay`, `category`, `passport`
//! - **Edges**: `adapter` (sample intake), `profile`, `summary`, `encoder`,
//!   `pipeline` and the C `ffi`

pub mod adapter;
pub mod category;
pub mod config;
pub mod downsample;
pub mod encoder;
pub mod error;
pub mod gaps;
pub mod macro_state;
pub mod micro;
pub mod passport;
pub mod pipeline;
pub mod profile;
pub mod replay;
pub mod summary;
pub mod tally;
pub mod threshold;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::FocusConfig;
pub use encoder::{FocusEncoder, SCHEMA_VERSION};
pub use error::ComputeError;
pub use pipeline::{
    dashboard_to_json, passport_to_json, replay_to_json, summary_to_json, timeline_to_json,
    FocusProcessor,
};
pub use profile::FocusProfile;

/// Flux version embedded in all payloads
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "focus-flux";
