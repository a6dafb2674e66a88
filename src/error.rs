use std::io;
use thiserror::Error;

/// Errors the render loop can hit while talking to the host surface.
///
/// Neither variant is fatal to the process: the loop stops cleanly and the
/// main thread tears the terminal down.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The host surface is gone (screen torn down or size query failed).
    #[error("surface is no longer available")]
    SurfaceUnavailable,

    /// Writing the frame to the terminal failed.
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}
