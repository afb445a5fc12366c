use crate::bitmap::{Color, Rect};
use crate::cache::ImageCache;
use crate::config::SessionConfig;
use crate::error::Error;
use crate::event::EventPump;
use crate::screen::Screen;
use crate::screen::backend::Backend;
use crate::screen::textwriter::TextWriter;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// size of the rectangle drawn in place of an image that cannot be loaded
pub const PLACEHOLDER_WIDTH: u32 = 160;
pub const PLACEHOLDER_HEIGHT: u32 = 120;

/// open a session with the default window
///
/// Must be the first call of a program; everything else is a method on the
/// returned session.
pub fn initialize() -> Result<Session, Error> {
    Session::open(SessionConfig::default())
}

/// drawing surface, input and audio of one program run
///
/// Created by `initialize` / `Session::open` and destroyed by `shutdown`, so
/// no operation can run outside that window.
pub struct Session<B: Backend = Screen> {
    pub(crate) backend: B,
    pub(crate) events: EventPump,
    /// colour used by `clear` when none is given
    background: Color,
    /// active font
    font: TextWriter,
    /// decoded images by path
    images: ImageCache,
}

impl Session<Screen> {
    /// open the window and audio output described by `config`
    pub fn open(config: SessionConfig) -> Result<Session<Screen>, Error> {
        if config.install_logger {
            install_logger();
        }
        let screen = Screen::new(&config)?;
        info!(
            title = %config.title,
            width = config.width,
            height = config.height,
            "session opened"
        );
        Ok(Session::with_backend(screen))
    }
}

impl<B: Backend> Session<B> {
    /// session over an already created backend
    pub fn with_backend(mut backend: B) -> Session<B> {
        backend.frame().fill(Color::BLACK);
        Session {
            backend,
            events: EventPump::new(),
            background: Color::BLACK,
            font: TextWriter::default(),
            images: ImageCache::new(),
        }
    }

    /// release window and audio; must be the last call
    pub fn shutdown(mut self) {
        self.backend.shutdown();
        info!(images = self.images.len(), "session closed");
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn font_path(&self) -> &str {
        self.font.path()
    }

    /// milliseconds since the session was opened
    pub fn ticks(&self) -> u64 {
        self.backend.elapsed().as_millis() as u64
    }

    /// whether the user asked to close the window
    pub fn close_requested(&self) -> bool {
        self.events.quit_requested()
    }

    /// pause for `seconds` while keeping the window responsive
    ///
    /// Input arriving during the pause is discarded. Zero or negative
    /// durations still process one round of events.
    pub fn wait(&mut self, seconds: f64) {
        let millis = (seconds * 1000.0).round().max(0.0) as u64;
        let start = self.backend.elapsed();
        let deadline = start
            .checked_add(Duration::from_millis(millis))
            .unwrap_or(Duration::MAX);
        loop {
            self.events.clear(&mut self.backend);
            if self.backend.elapsed() >= deadline {
                break;
            }
        }
    }

    /// fill the whole surface with `color`, or with the last colour used
    ///
    /// A given colour becomes the background for later calls.
    pub fn clear(&mut self, color: impl Into<Option<Color>>) {
        if let Some(color) = color.into() {
            self.background = color;
        }
        self.backend.frame().fill(self.background);
        self.present(None);
    }

    /// filled rectangle, white unless a colour is given
    pub fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: impl Into<Option<Color>>) {
        let color = color.into().unwrap_or(Color::WHITE);
        let drawn = self.backend.frame().fill_rect(Rect::new(x, y, w, h), color);
        self.present_region(drawn);
    }

    /// image file at (x, y), optionally scaled to `size`
    ///
    /// An image that cannot be loaded is replaced by a white 160x120
    /// rectangle and a warning.
    pub fn draw_image(&mut self, path: &str, x: i32, y: i32, size: impl Into<Option<(u32, u32)>>) {
        let image = match self.images.get_or_load(path, &mut self.backend) {
            Ok(image) => image,
            Err(err) => {
                warn!(path, %err, "image not found");
                let placeholder = Rect::new(x, y, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
                let drawn = self.backend.frame().fill_rect(placeholder, Color::WHITE);
                self.present_region(drawn);
                return;
            }
        };

        let drawn = match size.into() {
            Some((0, _)) | Some((_, 0)) => None,
            Some((width, height)) => self.backend.frame().blit(&image.scaled(width, height), x, y),
            None => self.backend.frame().blit(&image, x, y),
        };
        self.present_region(drawn);
    }

    /// text in the active font, `font_size` pixels high, white unless a colour is given
    pub fn draw_text(
        &mut self,
        message: &str,
        x: i32,
        y: i32,
        font_size: u32,
        color: impl Into<Option<Color>>,
    ) {
        let color = color.into().unwrap_or(Color::WHITE);
        let mask = self.font.render(message, font_size);
        let drawn = self.backend.frame().blend_mask(&mask, x, y, color);
        self.present_region(drawn);
    }

    /// size `draw_text` would cover, without drawing
    pub fn measure_text(&self, message: &str, font_size: u32) -> (u32, u32) {
        self.font.measure(message, font_size)
    }

    /// write the surface, or one region of it, to an image file
    ///
    /// A saved region always starts at (0,0) in the output file.
    pub fn save_screen(&mut self, path: &str, region: impl Into<Option<Rect>>) {
        let frame = self.backend.frame();
        let region = region.into().unwrap_or_else(|| frame.bounds());
        let bitmap = frame.copy_region(region);
        match bitmap.save(Path::new(path)) {
            Ok(()) => debug!(path, ?region, "screen saved"),
            Err(err) => warn!(path, %err, "cannot save screen"),
        }
    }

    /// stop the current track and play an audio file once
    pub fn play_sound(&mut self, path: &str) {
        let file = Path::new(path);
        if !file.is_file() {
            warn!(path, "audio file not found");
            return;
        }
        if let Err(err) = self.backend.play_music(file) {
            warn!(path, %err, "cannot play audio file");
        }
    }

    /// use the font at `path`, or the default font if it cannot be loaded
    pub fn set_font(&mut self, path: &str) {
        self.font = match TextWriter::load(path) {
            Ok(font) => font,
            Err(err) => {
                debug!(path, %err, "using the default font");
                TextWriter::default()
            }
        };
    }

    fn present_region(&mut self, region: Option<Rect>) {
        // nothing landed on the surface
        if region.is_some() {
            self.present(region);
        }
    }

    fn present(&mut self, region: Option<Rect>) {
        if let Err(err) = self.backend.present(region) {
            error!(%err, "cannot present surface");
        }
    }
}

fn install_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // an application subscriber takes precedence
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
