use crate::error::Error;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// 8-bit RGB colour
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// opaque RGBA pixel as stored in a frame
    pub fn rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xff]
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Color { r, g, b }
    }
}

/// axis-aligned rectangle in surface coordinates (origin top-left)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// intersection with a `width` x `height` surface, `None` if nothing is left
    pub fn clip(&self, width: u32, height: u32) -> Option<Rect> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// decoded RGBA image
#[derive(Clone, Debug)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    /// decode an image file; the format is detected from the content
    pub fn open(path: &Path) -> Result<Bitmap, Error> {
        let image = image::open(path)?.to_rgba8();
        Ok(Bitmap { image })
    }

    /// solid opaque bitmap
    pub fn filled(width: u32, height: u32, color: Color) -> Bitmap {
        Bitmap {
            image: RgbaImage::from_pixel(width, height, image::Rgba(color.rgba())),
        }
    }

    /// wrap raw RGBA data, `None` if the buffer does not match the size
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Bitmap> {
        RgbaImage::from_raw(width, height, data).map(|image| Bitmap { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// resized copy
    pub fn scaled(&self, width: u32, height: u32) -> Bitmap {
        Bitmap {
            image: imageops::resize(&self.image, width, height, FilterType::Nearest),
        }
    }

    /// write to disk; the format follows the file extension
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        // the surface is opaque, and several encoders reject an alpha channel
        DynamicImage::ImageRgba8(self.image.clone())
            .to_rgb8()
            .save(path)?;
        Ok(())
    }
}

/// 8-bit coverage mask produced by the text renderer
#[derive(Clone, Debug, Default)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl AlphaMask {
    pub fn new(width: u32, height: u32) -> AlphaMask {
        AlphaMask {
            width,
            height,
            alpha: vec![0; width as usize * height as usize],
        }
    }

    /// raise coverage at (x, y), ignoring points outside the mask
    pub fn cover(&mut self, x: i64, y: i64, alpha: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let p = (y as usize) * self.width as usize + x as usize;
        self.alpha[p] = self.alpha[p].max(alpha);
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.alpha[y as usize * self.width as usize + x as usize]
    }
}
