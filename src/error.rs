use thiserror::Error;

/// failures of backend operations
///
/// Only `Session::open` hands these to the caller. Drawing, audio and font
/// calls turn them into a diagnostic plus a safe default.
#[derive(Debug, Error)]
pub enum Error {
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("surface: {0}")]
    Surface(#[from] pixels::Error),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("font: {0}")]
    Font(String),

    #[error("audio device: {0}")]
    Audio(String),

    #[error("audio decoding: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("audio is not available in this session")]
    AudioUnavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
