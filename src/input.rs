use crate::event::{Modifiers, RawEvent, Reader};
use crate::screen::backend::Backend;
use crate::session::Session;
use std::fmt;
use tracing::debug;
use winit::keyboard::KeyCode;

/// pause between mouse polls while waiting for a click
const CLICK_POLL_SECS: f64 = 0.1;

/// flag marking platform codes derived from a scancode
const SCANCODE_MASK: u32 = 0x4000_0000;

/// key reported by `wait_key_press`
///
/// Codes below 256 become a character, anything else (arrows, function keys,
/// lock keys) keeps its numeric platform code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeySymbol {
    Char(char),
    Code(u32),
}

impl KeySymbol {
    /// derive the symbol for a key-down with platform code `code`
    pub fn decode(code: u32, modifiers: Modifiers) -> KeySymbol {
        match u8::try_from(code) {
            Ok(byte) => {
                let c = char::from(byte);
                if c.is_ascii_lowercase() && (modifiers.shift || modifiers.caps_lock) {
                    KeySymbol::Char(c.to_ascii_uppercase())
                } else {
                    KeySymbol::Char(c)
                }
            }
            Err(_) => KeySymbol::Code(code),
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Char(c) => write!(f, "{c}"),
            KeySymbol::Code(code) => write!(f, "{code}"),
        }
    }
}

impl PartialEq<str> for KeySymbol {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for KeySymbol {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// platform code for a key name given to `is_key_pressed`
///
/// A single character stands for its own code, a decimal number for an
/// extended code.
fn code_for_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c as u32),
        _ => name.parse().ok(),
    }
}

/// platform code of a physical key
pub fn platform_code(key: KeyCode) -> Option<u32> {
    let code = match key {
        KeyCode::KeyA => 'a' as u32,
        KeyCode::KeyB => 'b' as u32,
        KeyCode::KeyC => 'c' as u32,
        KeyCode::KeyD => 'd' as u32,
        KeyCode::KeyE => 'e' as u32,
        KeyCode::KeyF => 'f' as u32,
        KeyCode::KeyG => 'g' as u32,
        KeyCode::KeyH => 'h' as u32,
        KeyCode::KeyI => 'i' as u32,
        KeyCode::KeyJ => 'j' as u32,
        KeyCode::KeyK => 'k' as u32,
        KeyCode::KeyL => 'l' as u32,
        KeyCode::KeyM => 'm' as u32,
        KeyCode::KeyN => 'n' as u32,
        KeyCode::KeyO => 'o' as u32,
        KeyCode::KeyP => 'p' as u32,
        KeyCode::KeyQ => 'q' as u32,
        KeyCode::KeyR => 'r' as u32,
        KeyCode::KeyS => 's' as u32,
        KeyCode::KeyT => 't' as u32,
        KeyCode::KeyU => 'u' as u32,
        KeyCode::KeyV => 'v' as u32,
        KeyCode::KeyW => 'w' as u32,
        KeyCode::KeyX => 'x' as u32,
        KeyCode::KeyY => 'y' as u32,
        KeyCode::KeyZ => 'z' as u32,
        KeyCode::Digit0 => '0' as u32,
        KeyCode::Digit1 => '1' as u32,
        KeyCode::Digit2 => '2' as u32,
        KeyCode::Digit3 => '3' as u32,
        KeyCode::Digit4 => '4' as u32,
        KeyCode::Digit5 => '5' as u32,
        KeyCode::Digit6 => '6' as u32,
        KeyCode::Digit7 => '7' as u32,
        KeyCode::Digit8 => '8' as u32,
        KeyCode::Digit9 => '9' as u32,
        KeyCode::Backspace => 8,
        KeyCode::Tab => 9,
        KeyCode::Enter => 13,
        KeyCode::Escape => 27,
        KeyCode::Space => ' ' as u32,
        KeyCode::Quote => '\'' as u32,
        KeyCode::Comma => ',' as u32,
        KeyCode::Minus => '-' as u32,
        KeyCode::Period => '.' as u32,
        KeyCode::Slash => '/' as u32,
        KeyCode::Semicolon => ';' as u32,
        KeyCode::Equal => '=' as u32,
        KeyCode::BracketLeft => '[' as u32,
        KeyCode::Backslash => '\\' as u32,
        KeyCode::BracketRight => ']' as u32,
        KeyCode::Backquote => '`' as u32,
        KeyCode::Delete => 127,
        KeyCode::CapsLock => SCANCODE_MASK | 57,
        KeyCode::F1 => SCANCODE_MASK | 58,
        KeyCode::F2 => SCANCODE_MASK | 59,
        KeyCode::F3 => SCANCODE_MASK | 60,
        KeyCode::F4 => SCANCODE_MASK | 61,
        KeyCode::F5 => SCANCODE_MASK | 62,
        KeyCode::F6 => SCANCODE_MASK | 63,
        KeyCode::F7 => SCANCODE_MASK | 64,
        KeyCode::F8 => SCANCODE_MASK | 65,
        KeyCode::F9 => SCANCODE_MASK | 66,
        KeyCode::F10 => SCANCODE_MASK | 67,
        KeyCode::F11 => SCANCODE_MASK | 68,
        KeyCode::F12 => SCANCODE_MASK | 69,
        KeyCode::PrintScreen => SCANCODE_MASK | 70,
        KeyCode::ScrollLock => SCANCODE_MASK | 71,
        KeyCode::Pause => SCANCODE_MASK | 72,
        KeyCode::Insert => SCANCODE_MASK | 73,
        KeyCode::Home => SCANCODE_MASK | 74,
        KeyCode::PageUp => SCANCODE_MASK | 75,
        KeyCode::End => SCANCODE_MASK | 77,
        KeyCode::PageDown => SCANCODE_MASK | 78,
        KeyCode::ArrowRight => SCANCODE_MASK | 79,
        KeyCode::ArrowLeft => SCANCODE_MASK | 80,
        KeyCode::ArrowDown => SCANCODE_MASK | 81,
        KeyCode::ArrowUp => SCANCODE_MASK | 82,
        KeyCode::NumLock => SCANCODE_MASK | 83,
        KeyCode::NumpadDivide => SCANCODE_MASK | 84,
        KeyCode::NumpadMultiply => SCANCODE_MASK | 85,
        KeyCode::NumpadSubtract => SCANCODE_MASK | 86,
        KeyCode::NumpadAdd => SCANCODE_MASK | 87,
        KeyCode::NumpadEnter => SCANCODE_MASK | 88,
        KeyCode::Numpad1 => SCANCODE_MASK | 89,
        KeyCode::Numpad2 => SCANCODE_MASK | 90,
        KeyCode::Numpad3 => SCANCODE_MASK | 91,
        KeyCode::Numpad4 => SCANCODE_MASK | 92,
        KeyCode::Numpad5 => SCANCODE_MASK | 93,
        KeyCode::Numpad6 => SCANCODE_MASK | 94,
        KeyCode::Numpad7 => SCANCODE_MASK | 95,
        KeyCode::Numpad8 => SCANCODE_MASK | 96,
        KeyCode::Numpad9 => SCANCODE_MASK | 97,
        KeyCode::Numpad0 => SCANCODE_MASK | 98,
        KeyCode::NumpadDecimal => SCANCODE_MASK | 99,
        KeyCode::ContextMenu => SCANCODE_MASK | 101,
        KeyCode::ControlLeft => SCANCODE_MASK | 224,
        KeyCode::ShiftLeft => SCANCODE_MASK | 225,
        KeyCode::AltLeft => SCANCODE_MASK | 226,
        KeyCode::SuperLeft => SCANCODE_MASK | 227,
        KeyCode::ControlRight => SCANCODE_MASK | 228,
        KeyCode::ShiftRight => SCANCODE_MASK | 229,
        KeyCode::AltRight => SCANCODE_MASK | 230,
        KeyCode::SuperRight => SCANCODE_MASK | 231,
        _ => return None,
    };
    Some(code)
}

impl<B: Backend> Session<B> {
    /// block until a key goes down and report it
    ///
    /// Other events that arrived in the same poll are dropped.
    pub fn wait_key_press(&mut self) -> KeySymbol {
        loop {
            for event in self.events.drain(&mut self.backend) {
                if let RawEvent::KeyDown { code, modifiers } = event {
                    let key = KeySymbol::decode(code, modifiers);
                    debug!(code, %key, "key press");
                    return key;
                }
            }
        }
    }

    /// whether `name` went down since the last query for the same key
    ///
    /// `name` is a single character (`"a"`, `"1"`) or the decimal code of an
    /// extended key as returned by `wait_key_press`. Other queries still see
    /// the same events.
    pub fn is_key_pressed(&mut self, name: &str) -> bool {
        let Some(wanted) = code_for_name(name) else {
            debug!(name, "not a key name");
            return false;
        };
        self.events
            .unread(&mut self.backend, Reader::Key(wanted))
            .any(|event| matches!(event, RawEvent::KeyDown { code, .. } if *code == wanted))
    }

    /// whether the left mouse button is currently held
    pub fn is_mouse_pressed(&mut self) -> bool {
        self.events.pump(&mut self.backend);
        self.backend.mouse().left_pressed
    }

    /// block until the left mouse button is pressed
    pub fn wait_mouse_leftclick(&mut self) {
        self.events.clear(&mut self.backend);
        self.wait(CLICK_POLL_SECS);
        while !self.is_mouse_pressed() {
            self.wait(CLICK_POLL_SECS);
        }
    }

    /// pointer position in surface coordinates
    pub fn get_mouse_position(&mut self) -> (i32, i32) {
        self.events.pump(&mut self.backend);
        let mouse = self.backend.mouse();
        (mouse.x, mouse.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MouseState;
    use crate::screen::headless::Headless;
    use std::time::Instant;

    fn session() -> Session<Headless> {
        Session::with_backend(Headless::new(64, 48))
    }

    fn key_down(code: u32, shift: bool, caps_lock: bool) -> RawEvent {
        RawEvent::KeyDown {
            code,
            modifiers: Modifiers { shift, caps_lock },
        }
    }

    #[test]
    fn test_decode() {
        let plain = Modifiers::default();
        let shift = Modifiers {
            shift: true,
            caps_lock: false,
        };
        let caps = Modifiers {
            shift: false,
            caps_lock: true,
        };
        assert_eq!(KeySymbol::decode(97, plain), "a");
        assert_eq!(KeySymbol::decode(97, shift), "A");
        assert_eq!(KeySymbol::decode(97, caps), "A");
        assert_eq!(KeySymbol::decode(49, shift), "1");
        assert_eq!(KeySymbol::decode(27, plain), KeySymbol::Char('\u{1b}'));
        assert_eq!(KeySymbol::decode(1073741904, plain), "1073741904");
        assert_eq!(
            KeySymbol::decode(1073741904, plain),
            KeySymbol::Code(1073741904)
        );
    }

    #[test]
    fn test_platform_codes() {
        assert_eq!(platform_code(KeyCode::KeyA), Some(97));
        assert_eq!(platform_code(KeyCode::Digit0), Some(48));
        assert_eq!(platform_code(KeyCode::Escape), Some(27));
        assert_eq!(platform_code(KeyCode::ArrowLeft), Some(1073741904));
        assert_eq!(platform_code(KeyCode::ArrowRight), Some(1073741903));
    }

    #[test]
    fn test_wait_key_press() {
        let mut s = session();
        s.backend_mut()
            .push_event(RawEvent::MouseMotion { x: 3, y: 4 });
        s.backend_mut().push_event(key_down(97, true, false));
        s.backend_mut().push_event(key_down(98, false, false));
        assert_eq!(s.wait_key_press(), "A");

        // the rest of that poll is gone
        assert!(!s.is_key_pressed("b"));
    }

    #[test]
    fn test_wait_key_press_extended() {
        let mut s = session();
        s.backend_mut()
            .push_event(RawEvent::KeyUp { code: 1073741904 });
        s.backend_mut().push_event(key_down(1073741904, false, false));
        assert_eq!(s.wait_key_press().to_string(), "1073741904");
    }

    #[test]
    fn test_is_key_pressed_does_not_steal() {
        let mut s = session();
        s.backend_mut().push_event(key_down(97, false, false));
        s.backend_mut().push_event(key_down(98, false, false));
        assert!(s.is_key_pressed("a"));
        assert!(s.is_key_pressed("b"));
        assert!(!s.is_key_pressed("c"));
    }

    #[test]
    fn test_is_key_pressed_point_in_time() {
        let mut s = session();
        s.backend_mut().push_event(key_down(97, false, false));
        assert!(s.is_key_pressed("a"));
        // no new key-down since the last look
        assert!(!s.is_key_pressed("a"));

        s.backend_mut().push_event(key_down(1073741906, false, false));
        assert!(s.is_key_pressed("1073741906"));
        assert!(!s.is_key_pressed(""));
        assert!(!s.is_key_pressed("ab"));
    }

    #[test]
    fn test_is_key_pressed_then_wait_key_press() {
        let mut s = session();
        s.backend_mut().push_event(key_down(120, false, false));
        assert!(s.is_key_pressed("x"));
        // looking does not consume
        assert_eq!(s.wait_key_press(), "x");
    }

    #[test]
    fn test_mouse() {
        let mut s = session();
        assert!(!s.is_mouse_pressed());
        s.backend_mut().set_mouse(MouseState {
            left_pressed: true,
            x: 12,
            y: 34,
        });
        assert!(s.is_mouse_pressed());
        assert_eq!(s.get_mouse_position(), (12, 34));
    }

    #[test]
    fn test_wait_mouse_leftclick_debounces() {
        let mut s = session();
        s.backend_mut().set_mouse(MouseState {
            left_pressed: true,
            x: 0,
            y: 0,
        });
        s.backend_mut().push_event(key_down(97, false, false));
        let start = Instant::now();
        s.wait_mouse_leftclick();
        assert!(start.elapsed().as_millis() >= 100);
        assert!(!s.is_key_pressed("a"));
    }
}
