/// default drawing surface width in pixels
pub const SCREEN_WIDTH: u32 = 800;
/// default drawing surface height in pixels
pub const SCREEN_HEIGHT: u32 = 600;

const DEFAULT_TITLE: &str = "medialib";

/// parameters for opening a session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// window title
    pub title: String,
    /// surface width in pixels
    pub width: u32,
    /// surface height in pixels
    pub height: u32,
    /// open an audio output device
    pub audio: bool,
    /// install a `tracing` subscriber printing diagnostics to stderr
    pub install_logger: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            title: String::from(DEFAULT_TITLE),
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            audio: true,
            install_logger: true,
        }
    }
}

impl SessionConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = String::from(title);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_logger(mut self, install_logger: bool) -> Self {
        self.install_logger = install_logger;
        self
    }
}
