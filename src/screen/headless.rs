use super::backend::{Backend, Frame};
use crate::bitmap::{Bitmap, Rect};
use crate::error::Error;
use crate::event::{MouseState, RawEvent};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// in-memory backend without a window or audio device
///
/// Input is scripted with `push_event` / `set_mouse`; presents, image decodes
/// and played tracks are recorded for inspection.
pub struct Headless {
    frame: Vec<u8>,
    width: u32,
    height: u32,
    queue: VecDeque<RawEvent>,
    mouse: MouseState,
    started: Instant,
    presents: Vec<Option<Rect>>,
    decodes: usize,
    played: Vec<PathBuf>,
}

impl Headless {
    pub fn new(width: u32, height: u32) -> Headless {
        Headless {
            frame: vec![0; (width * height * 4) as usize],
            width,
            height,
            queue: VecDeque::new(),
            mouse: MouseState::default(),
            started: Instant::now(),
            presents: Vec::new(),
            decodes: 0,
            played: Vec::new(),
        }
    }

    /// queue an event for the next poll
    pub fn push_event(&mut self, event: RawEvent) {
        self.queue.push_back(event);
    }

    pub fn set_mouse(&mut self, mouse: MouseState) {
        self.mouse = mouse;
    }

    /// regions passed to `present`, oldest first
    pub fn presents(&self) -> &[Option<Rect>] {
        &self.presents
    }

    /// number of image decode attempts
    pub fn decodes(&self) -> usize {
        self.decodes
    }

    pub fn played(&self) -> &[PathBuf] {
        &self.played
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let p = ((y * self.width + x) * 4) as usize;
        [
            self.frame[p],
            self.frame[p + 1],
            self.frame[p + 2],
            self.frame[p + 3],
        ]
    }
}

impl Backend for Headless {
    fn frame(&mut self) -> Frame<'_> {
        Frame {
            frame: &mut self.frame,
            width: self.width,
            height: self.height,
        }
    }

    fn present(&mut self, region: Option<Rect>) -> Result<(), Error> {
        self.presents.push(region);
        Ok(())
    }

    fn poll_events(&mut self, events: &mut Vec<RawEvent>) {
        events.extend(self.queue.drain(..));
    }

    fn mouse(&self) -> MouseState {
        self.mouse
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn load_image(&mut self, path: &Path) -> Result<Bitmap, Error> {
        self.decodes += 1;
        Bitmap::open(path)
    }

    fn play_music(&mut self, path: &Path) -> Result<(), Error> {
        debug!(path = %path.display(), "headless playback");
        self.played.push(path.to_path_buf());
        Ok(())
    }
}
