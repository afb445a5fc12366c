//! Small procedural toolkit for drawing, sound and input in a single window.
//!
//! ```no_run
//! use medialib::{Color, initialize};
//!
//! let mut s = initialize()?;
//! s.clear(Color::rgb(0, 0, 80));
//! s.draw_rect(10, 10, 150, 250, None);
//! s.draw_text("press a key", 200, 20, 24, None);
//! let key = s.wait_key_press();
//! println!("you pressed {key}");
//! s.shutdown();
//! # Ok::<(), medialib::Error>(())
//! ```

pub mod audio;
pub mod bitmap;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod screen;
pub mod session;
pub mod util;

pub use bitmap::{Color, Rect};
pub use config::SessionConfig;
pub use error::Error;
pub use input::KeySymbol;
pub use session::{Session, initialize};
pub use util::{a_to_b, distance, point_inside_rect};
