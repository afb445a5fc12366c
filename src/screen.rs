pub mod backend;
pub mod headless;
pub mod textwriter;

use crate::audio::Player;
use crate::bitmap::Rect;
use crate::config::SessionConfig;
use crate::error::Error;
use crate::event::{Modifiers, MouseButton, MouseState, RawEvent};
use crate::input::platform_code;
use backend::{Backend, Frame};
use pixels::{Pixels, SurfaceTexture};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};
use winit_input_helper::WinitInputHelper;

/// window backend: a winit window showing a pixels surface, plus audio output
pub struct Screen {
    width: u32,
    height: u32,
    window: Arc<Window>,
    input: WinitInputHelper,
    pixels: Pixels<'static>,
    event_loop: EventLoop<()>,
    time: Instant,
    modifiers: Modifiers,
    mouse: MouseState,
    audio: Option<Player>,
}

impl Screen {
    pub fn new(config: &SessionConfig) -> Result<Screen, Error> {
        let event_loop = EventLoop::new()?;
        let input = WinitInputHelper::new();
        let window = Arc::new({
            let size = LogicalSize::new(config.width as f64, config.height as f64);
            WindowBuilder::new()
                .with_title(config.title.as_str())
                .with_inner_size(size)
                .with_min_inner_size(size)
                .build(&event_loop)?
        });

        let pixels = {
            let window_size = window.inner_size();
            let surface_texture =
                SurfaceTexture::new(window_size.width, window_size.height, window.clone());
            Pixels::new(config.width, config.height, surface_texture)?
        };

        let audio = if config.audio {
            match Player::start() {
                Ok(player) => Some(player),
                Err(err) => {
                    warn!(%err, "audio output unavailable, continuing without sound");
                    None
                }
            }
        } else {
            None
        };

        Ok(Screen {
            width: config.width,
            height: config.height,
            window,
            input,
            pixels,
            event_loop,
            time: Instant::now(),
            modifiers: Modifiers::default(),
            mouse: MouseState::default(),
            audio,
        })
    }

    fn render(&mut self) -> Result<(), Error> {
        self.pixels.render()?;
        Ok(())
    }
}

impl Backend for Screen {
    fn frame(&mut self) -> Frame<'_> {
        Frame {
            frame: self.pixels.frame_mut(),
            width: self.width,
            height: self.height,
        }
    }

    fn present(&mut self, region: Option<Rect>) -> Result<(), Error> {
        // pixels uploads the whole texture; the region only matters to
        // backends that can update part of the screen
        let _ = region;
        self.render()
    }

    fn poll_events(&mut self, events: &mut Vec<RawEvent>) {
        let Screen {
            input,
            pixels,
            event_loop,
            modifiers,
            mouse,
            ..
        } = self;
        let mut redraw = false;
        let mut resized = None;

        let status = event_loop.pump_events(Some(Duration::ZERO), |event, _target| {
            // Handle input events
            if input.update(&event) {
                if let Some(size) = input.window_resized() {
                    resized = Some(size);
                }
            }

            let Event::WindowEvent { event, .. } = event else {
                return;
            };
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => events.push(RawEvent::Quit),
                WindowEvent::RedrawRequested => redraw = true,
                WindowEvent::ModifiersChanged(state) => {
                    modifiers.shift = state.state().shift_key();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(key) = event.physical_key else {
                        return;
                    };
                    if key == KeyCode::CapsLock && event.state == ElementState::Pressed {
                        modifiers.caps_lock = !modifiers.caps_lock;
                    }
                    let Some(code) = platform_code(key) else {
                        debug!(?key, "unmapped key");
                        return;
                    };
                    match event.state {
                        ElementState::Pressed if !event.repeat => events.push(RawEvent::KeyDown {
                            code,
                            modifiers: *modifiers,
                        }),
                        ElementState::Released => events.push(RawEvent::KeyUp { code }),
                        _ => {}
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    let button = match button {
                        winit::event::MouseButton::Left => MouseButton::Left,
                        winit::event::MouseButton::Right => MouseButton::Right,
                        winit::event::MouseButton::Middle => MouseButton::Middle,
                        winit::event::MouseButton::Back => MouseButton::Other(3),
                        winit::event::MouseButton::Forward => MouseButton::Other(4),
                        winit::event::MouseButton::Other(n) => MouseButton::Other(n),
                    };
                    let (x, y) = (mouse.x, mouse.y);
                    match state {
                        ElementState::Pressed => {
                            if button == MouseButton::Left {
                                mouse.left_pressed = true;
                            }
                            events.push(RawEvent::MouseDown { button, x, y });
                        }
                        ElementState::Released => {
                            if button == MouseButton::Left {
                                mouse.left_pressed = false;
                            }
                            events.push(RawEvent::MouseUp { button, x, y });
                        }
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let pos = (position.x as f32, position.y as f32);
                    let (x, y) = match pixels.window_pos_to_pixel(pos) {
                        Ok((x, y)) => (x as i32, y as i32),
                        Err((x, y)) => (x as i32, y as i32),
                    };
                    mouse.x = x;
                    mouse.y = y;
                    events.push(RawEvent::MouseMotion { x, y });
                }
                _ => {}
            }
        });

        if let PumpStatus::Exit(code) = status {
            debug!(code, "event loop exited");
            events.push(RawEvent::Quit);
        }

        // Resize the window
        if let Some(size) = resized {
            if let Err(err) = self.pixels.resize_surface(size.width, size.height) {
                error!(%err, "cannot resize surface");
            }
            redraw = true;
        }
        if redraw {
            if let Err(err) = self.render() {
                error!(%err, "cannot redraw window");
            }
        }
    }

    fn mouse(&self) -> MouseState {
        self.mouse
    }

    fn elapsed(&self) -> Duration {
        self.time.elapsed()
    }

    fn play_music(&mut self, path: &Path) -> Result<(), Error> {
        match &self.audio {
            Some(player) => player.play(path),
            None => Err(Error::AudioUnavailable),
        }
    }

    fn shutdown(&mut self) {
        if let Some(player) = self.audio.take() {
            player.stop();
        }
        self.window.set_visible(false);
    }
}
