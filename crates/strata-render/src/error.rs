//! Errors raised by backend adaptors and the renderer.

use crate::backend::BackendKind;
use crate::paint::PaintContextId;
use crate::uniform::UniformType;

/// Result alias used throughout the renderer.
pub type RenderResult<T> = Result<T, RenderError>;

/// Renderer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No graphics API on this machine satisfies the requested preference.
    NoCompatibleBackend,
    /// The requested backend was selected but could not be connected.
    BackendUnavailable(BackendKind),
    /// An adaptor was handed an encoder for the other backend.
    BackendMismatch {
        adaptor: BackendKind,
        backend: BackendKind,
    },
    /// Adapter probing failed.
    AdapterRequest(String),
    /// The named component was used before `init`.
    NotInitialized(&'static str),
    /// The named component was used after `destroy`.
    AdaptorDestroyed(&'static str),
    /// A batch addresses indices past the end of its geometry.
    BatchOutOfBounds {
        batch: usize,
        start: u32,
        size: u32,
        index_count: u32,
    },
    /// A batch references more textures than a texture set can hold.
    TooManyTextures { count: usize, max: usize },
    /// A uniform block does not fit in a single uniform chunk.
    UniformBlockTooLarge { size: u64, chunk_size: u64 },
    /// No paint context is registered under this id.
    UnknownPaintContext(PaintContextId),
    /// The uniform group has no member with this name.
    UnknownUniform(String),
    /// A uniform was written with a value of the wrong type.
    UniformTypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCompatibleBackend => write!(f, "No compatible graphics backend found"),
            Self::BackendUnavailable(kind) => write!(f, "Backend {} is unavailable", kind),
            Self::BackendMismatch { adaptor, backend } => write!(
                f,
                "Adaptor for {} cannot drive a {} backend",
                adaptor, backend
            ),
            Self::AdapterRequest(msg) => write!(f, "Adapter request failed: {}", msg),
            Self::NotInitialized(what) => write!(f, "{} used before init", what),
            Self::AdaptorDestroyed(what) => write!(f, "{} used after destroy", what),
            Self::BatchOutOfBounds {
                batch,
                start,
                size,
                index_count,
            } => write!(
                f,
                "Batch {} covers indices {}..{} but geometry has {}",
                batch,
                start,
                *start as u64 + *size as u64,
                index_count
            ),
            Self::TooManyTextures { count, max } => {
                write!(f, "Texture set of {} exceeds the limit of {}", count, max)
            }
            Self::UniformBlockTooLarge { size, chunk_size } => write!(
                f,
                "Uniform block of {} bytes does not fit a {} byte chunk",
                size, chunk_size
            ),
            Self::UnknownPaintContext(id) => write!(f, "Unknown paint context {:?}", id),
            Self::UnknownUniform(name) => write!(f, "Unknown uniform '{}'", name),
            Self::UniformTypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Uniform '{}' is declared {:?} but was given {:?}",
                name, expected, found
            ),
        }
    }
}

impl std::error::Error for RenderError {}
