//! Error taxonomy for the kernel and its backends.
//!
//! Errors fall into two classes. Fatal errors (a singular transform, a missing
//! GPU context, a resource that could not be created, a rejected configuration)
//! mean the frame loop cannot continue in a meaningful state. Everything else is
//! scoped to a single entity or draw call and is skipped by the scheduler.
//! [`Error::is_fatal`] is the switch the scheduler uses.

use crate::math::SingularMatrix;
use crate::render::RenderTargetId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the kernel and its backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transform that must be invertible was not.
    #[error("singular transform: {0}")]
    Singular(#[from] SingularMatrix),

    /// No adapter, device or surface could be obtained.
    #[error("no GPU context available: {0}")]
    NoGpuContext(String),

    /// A GPU resource (pipeline, buffer, texture, window) could not be created.
    #[error("could not create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },

    /// A draw call or group referenced a render target the backend does not know.
    #[error("unknown render target {0:?}")]
    UnknownTarget(RenderTargetId),

    /// An external asset failed to load.
    #[error("failed to load asset '{path}': {source}")]
    Asset {
        path: String,
        #[source]
        source: image::ImageError,
    },

    /// Configuration rejected before entering the frame loop.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A failure raised by user code inside an updatable or drawable.
    #[error("{0}")]
    Entity(String),
}

impl Error {
    /// Shorthand for [`Error::Entity`].
    pub fn entity(message: impl Into<String>) -> Self {
        Self::Entity(message.into())
    }

    /// Whether this error must halt the frame loop.
    ///
    /// Per-entity failures, unknown targets and asset failures are recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Singular(_)
                | Error::NoGpuContext(_)
                | Error::ResourceCreation { .. }
                | Error::Config(_)
        )
    }
}
