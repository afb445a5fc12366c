use crate::screen::backend::Backend;
use std::collections::{HashMap, VecDeque, vec_deque};
use tracing::{debug, info};

/// number of buffered events kept for non-consuming readers
const EVENT_BUFFER_CAPACITY: usize = 1024;

/// modifier state recorded with a key press
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub caps_lock: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// current pointer state as tracked by the backend
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MouseState {
    pub left_pressed: bool,
    pub x: i32,
    pub y: i32,
}

/// input event as delivered by a backend
///
/// Key codes are platform key codes: printable keys carry their unshifted
/// ASCII code, everything else `0x4000_0000 | scancode`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RawEvent {
    KeyDown { code: u32, modifiers: Modifiers },
    KeyUp { code: u32 },
    MouseDown { button: MouseButton, x: i32, y: i32 },
    MouseUp { button: MouseButton, x: i32, y: i32 },
    MouseMotion { x: i32, y: i32 },
    Quit,
}

/// identity of a non-consuming reader of the event buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reader {
    /// `is_key_pressed` for one platform key code
    Key(u32),
}

/// single drain point for backend events
///
/// Every backend drain appends to one ordered buffer. Readers that only look
/// at events keep their own position in that buffer, so one query never hides
/// events from another. Consuming readers take the whole buffer and reset all
/// positions.
pub struct EventPump {
    /// events not yet consumed, in arrival order
    buffer: VecDeque<RawEvent>,
    /// sequence number of `buffer[0]`
    base: u64,
    /// next unread sequence number per reader
    cursors: HashMap<Reader, u64>,
    /// scratch space for backend drains
    incoming: Vec<RawEvent>,
    /// sticky flag, set once a quit event went through the pump
    quit: bool,
}

impl Default for EventPump {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPump {
    pub fn new() -> EventPump {
        EventPump {
            buffer: VecDeque::new(),
            base: 0,
            cursors: HashMap::new(),
            incoming: Vec::new(),
            quit: false,
        }
    }

    /// move everything the backend has queued into the buffer; never blocks
    pub fn pump<B: Backend>(&mut self, backend: &mut B) {
        self.incoming.clear();
        backend.poll_events(&mut self.incoming);
        for event in self.incoming.drain(..) {
            if event == RawEvent::Quit && !self.quit {
                info!("window close requested");
                self.quit = true;
            }
            self.buffer.push_back(event);
        }

        let overflow = self.buffer.len().saturating_sub(EVENT_BUFFER_CAPACITY);
        if overflow > 0 {
            debug!(dropped = overflow, "event buffer full, dropping oldest events");
            self.buffer.drain(..overflow);
            self.base += overflow as u64;
        }
    }

    /// take every pending event in arrival order
    pub fn drain<B: Backend>(&mut self, backend: &mut B) -> Vec<RawEvent> {
        self.pump(backend);
        let events: Vec<RawEvent> = self.buffer.drain(..).collect();
        self.base += events.len() as u64;
        self.cursors.clear();
        events
    }

    /// discard every pending event
    pub fn clear<B: Backend>(&mut self, backend: &mut B) {
        self.drain(backend);
    }

    /// events `reader` has not seen yet, in arrival order
    ///
    /// The events stay buffered for every other reader.
    pub fn unread<B: Backend>(
        &mut self,
        backend: &mut B,
        reader: Reader,
    ) -> vec_deque::Iter<'_, RawEvent> {
        self.pump(backend);
        let end = self.base + self.buffer.len() as u64;
        let cursor = self.cursors.insert(reader, end).unwrap_or(self.base);
        let skip = (cursor.saturating_sub(self.base) as usize).min(self.buffer.len());
        self.buffer.range(skip..)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// number of buffered events
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::headless::Headless;

    fn key(code: u32) -> RawEvent {
        RawEvent::KeyDown {
            code,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn test_drain_order() {
        let mut backend = Headless::new(16, 16);
        let mut pump = EventPump::new();
        assert!(pump.drain(&mut backend).is_empty());

        backend.push_event(key(97));
        backend.push_event(RawEvent::MouseMotion { x: 1, y: 2 });
        backend.push_event(key(98));
        assert_eq!(
            pump.drain(&mut backend),
            vec![key(97), RawEvent::MouseMotion { x: 1, y: 2 }, key(98)]
        );
        assert!(pump.drain(&mut backend).is_empty());
    }

    #[test]
    fn test_readers_do_not_steal() {
        let mut backend = Headless::new(16, 16);
        let mut pump = EventPump::new();
        backend.push_event(key(97));
        backend.push_event(key(98));

        let seen_a: Vec<RawEvent> = pump.unread(&mut backend, Reader::Key(97)).copied().collect();
        assert_eq!(seen_a, vec![key(97), key(98)]);

        let seen_b: Vec<RawEvent> = pump.unread(&mut backend, Reader::Key(98)).copied().collect();
        assert_eq!(seen_b, vec![key(97), key(98)]);

        // a reader only sees what arrived since its last look
        backend.push_event(key(99));
        let seen_a: Vec<RawEvent> = pump.unread(&mut backend, Reader::Key(97)).copied().collect();
        assert_eq!(seen_a, vec![key(99)]);
        assert_eq!(pump.pending(), 3);

        // consuming resets everyone
        assert_eq!(pump.drain(&mut backend).len(), 3);
        assert_eq!(pump.unread(&mut backend, Reader::Key(98)).count(), 0);
    }

    #[test]
    fn test_buffer_capacity() {
        let mut backend = Headless::new(16, 16);
        let mut pump = EventPump::new();
        for i in 0..(EVENT_BUFFER_CAPACITY as u32 + 10) {
            backend.push_event(key(i));
        }
        pump.pump(&mut backend);
        assert_eq!(pump.pending(), EVENT_BUFFER_CAPACITY);
        let first = pump.unread(&mut backend, Reader::Key(0)).next().copied();
        assert_eq!(first, Some(key(10)));
    }

    #[test]
    fn test_quit_is_sticky() {
        let mut backend = Headless::new(16, 16);
        let mut pump = EventPump::new();
        backend.push_event(RawEvent::Quit);
        pump.clear(&mut backend);
        assert!(pump.quit_requested());
        pump.clear(&mut backend);
        assert!(pump.quit_requested());
    }
}
