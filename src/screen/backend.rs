use crate::bitmap::{AlphaMask, Bitmap, Color, Rect};
use crate::error::Error;
use crate::event::{MouseState, RawEvent};
use std::path::Path;
use std::time::Duration;

/// mutable view of an RGBA surface
pub struct Frame<'a> {
    pub frame: &'a mut [u8],
    pub width: u32,
    pub height: u32,
}

impl Frame<'_> {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let p = self.offset(x, y);
        [
            self.frame[p],
            self.frame[p + 1],
            self.frame[p + 2],
            self.frame[p + 3],
        ]
    }

    pub fn fill(&mut self, color: Color) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color.rgba());
        }
    }

    /// fill a rectangle, returning the part that landed on the surface
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> Option<Rect> {
        let clip = rect.clip(self.width, self.height)?;
        let rgba = color.rgba();
        for y in clip.y as u32..clip.y as u32 + clip.height {
            let start = self.offset(clip.x as u32, y);
            let end = start + clip.width as usize * 4;
            for pixel in self.frame[start..end].chunks_exact_mut(4) {
                pixel.copy_from_slice(&rgba);
            }
        }
        Some(clip)
    }

    /// draw `bitmap` with its top-left corner at (x, y), blending its alpha
    pub fn blit(&mut self, bitmap: &Bitmap, x: i32, y: i32) -> Option<Rect> {
        let clip = Rect::new(x, y, bitmap.width(), bitmap.height()).clip(self.width, self.height)?;
        for py in clip.y..clip.y + clip.height as i32 {
            for px in clip.x..clip.x + clip.width as i32 {
                let [r, g, b, a] = bitmap.pixel((px - x) as u32, (py - y) as u32);
                let p = self.offset(px as u32, py as u32);
                blend(&mut self.frame[p..p + 4], [r, g, b], a);
            }
        }
        Some(clip)
    }

    /// paint `color` through a coverage mask placed at (x, y)
    pub fn blend_mask(&mut self, mask: &AlphaMask, x: i32, y: i32, color: Color) -> Option<Rect> {
        let clip = Rect::new(x, y, mask.width, mask.height).clip(self.width, self.height)?;
        for py in clip.y..clip.y + clip.height as i32 {
            for px in clip.x..clip.x + clip.width as i32 {
                let a = mask.get((px - x) as u32, (py - y) as u32);
                if a > 0 {
                    let p = self.offset(px as u32, py as u32);
                    blend(&mut self.frame[p..p + 4], [color.r, color.g, color.b], a);
                }
            }
        }
        Some(clip)
    }

    /// copy `rect` into a new bitmap with origin (0,0)
    ///
    /// Parts of the rectangle outside the surface stay black.
    pub fn copy_region(&self, rect: Rect) -> Bitmap {
        let mut data = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
        for y in 0..rect.height as i64 {
            for x in 0..rect.width as i64 {
                let sx = rect.x as i64 + x;
                let sy = rect.y as i64 + y;
                if sx >= 0 && sy >= 0 && sx < self.width as i64 && sy < self.height as i64 {
                    data.extend_from_slice(&self.pixel(sx as u32, sy as u32));
                } else {
                    data.extend_from_slice(&Color::BLACK.rgba());
                }
            }
        }
        // the buffer is built to size
        Bitmap::from_rgba(rect.width, rect.height, data)
            .unwrap_or_else(|| Bitmap::filled(rect.width, rect.height, Color::BLACK))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn blend(dst: &mut [u8], src: [u8; 3], alpha: u8) {
    let a = alpha as u16;
    for i in 0..3 {
        dst[i] = ((src[i] as u16 * a + dst[i] as u16 * (255 - a) + 127) / 255) as u8;
    }
    dst[3] = 0xff;
}

/// platform layer the session draws, polls and plays through
pub trait Backend {
    /// the drawing surface
    fn frame(&mut self) -> Frame<'_>;

    /// make the surface visible, limited to `region` when given
    fn present(&mut self, region: Option<Rect>) -> Result<(), Error>;

    /// append every queued input event to `events`, without blocking
    fn poll_events(&mut self, events: &mut Vec<RawEvent>);

    fn mouse(&self) -> MouseState;

    /// time since the backend was created
    fn elapsed(&self) -> Duration;

    fn load_image(&mut self, path: &Path) -> Result<Bitmap, Error> {
        Bitmap::open(path)
    }

    /// stop the current track and play `path` once
    fn play_music(&mut self, path: &Path) -> Result<(), Error>;

    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_buf(width: u32, height: u32) -> Vec<u8> {
        vec![0; (width * height * 4) as usize]
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut buf = frame_buf(8, 8);
        let mut frame = Frame {
            frame: &mut buf,
            width: 8,
            height: 8,
        };
        let drawn = frame.fill_rect(Rect::new(6, -2, 4, 4), Color::WHITE);
        assert_eq!(drawn, Some(Rect::new(6, 0, 2, 2)));
        assert_eq!(frame.pixel(7, 1), [255, 255, 255, 255]);
        assert_eq!(frame.pixel(5, 1), [0, 0, 0, 0]);
        assert_eq!(frame.fill_rect(Rect::new(9, 9, 2, 2), Color::WHITE), None);
    }

    #[test]
    fn test_blit_blends_alpha() {
        let mut buf = frame_buf(4, 4);
        let mut frame = Frame {
            frame: &mut buf,
            width: 4,
            height: 4,
        };
        frame.fill(Color::BLACK);
        let data = vec![
            255, 0, 0, 255, // opaque red
            255, 255, 255, 0, // transparent
        ];
        let bitmap = Bitmap::from_rgba(2, 1, data).unwrap();
        assert_eq!(frame.blit(&bitmap, 1, 1), Some(Rect::new(1, 1, 2, 1)));
        assert_eq!(frame.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(frame.pixel(2, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_copy_region() {
        let mut buf = frame_buf(4, 4);
        let mut frame = Frame {
            frame: &mut buf,
            width: 4,
            height: 4,
        };
        frame.fill_rect(Rect::new(2, 2, 1, 1), Color::rgb(1, 2, 3));
        let region = frame.copy_region(Rect::new(2, 2, 3, 3));
        assert_eq!((region.width(), region.height()), (3, 3));
        assert_eq!(region.pixel(0, 0), [1, 2, 3, 255]);
        assert_eq!(region.pixel(2, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn test_copy_region_off_surface() {
        let mut buf = frame_buf(4, 4);
        let frame = Frame {
            frame: &mut buf,
            width: 4,
            height: 4,
        };
        let region = frame.copy_region(Rect::new(-100_000, 3, 70_000, 2));
        assert_eq!((region.width(), region.height()), (70_000, 2));
        assert_eq!(region.pixel(69_999, 1), [0, 0, 0, 255]);
    }
}
