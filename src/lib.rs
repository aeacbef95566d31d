//! pixelpress — live preview synchronization for a remote image-transform
//! service.
//!
//! A [`PreviewEngine`] owns one editing session: the source image, the
//! [`TransformParameters`] the user is editing, and the preview rendered by
//! the processing service. Edits are debounced, filtered for preview
//! relevance, and turned into at most one in-flight preview request; export
//! is a separate, explicit call that carries crop and rotation.
//!
//! The processing service is reached through the [`ImageProcessor`] trait;
//! [`HttpProcessor`] is the multipart HTTP implementation.

pub mod classify;
pub mod debounce;
pub mod engine;
pub mod export;
pub mod params;
pub mod preview;
pub mod process;
pub mod source;
pub mod tracker;
pub mod units;

pub use engine::{EngineError, PreviewEngine, PreviewStatus};
pub use export::{ExportArtifact, ExportError};
pub use params::{CropRegion, FillMode, OutputFormat, ParameterChange, ResolutionMode, TransformParameters};
pub use preview::PreviewState;
pub use process::config::ConfigError;
pub use process::{HttpProcessor, ImageProcessor, ProcessError, ProcessRequest, ProcessorConfig};
pub use source::{SourceError, SourceImage};
pub use units::Unit;
