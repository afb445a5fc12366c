use crate::bitmap::AlphaMask;
use crate::error::Error;
use bdf_parser::{Font as BdfFont, Property};
use embedded_graphics::Drawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Point, Size};
use embedded_graphics::text::{Baseline, Text};
use std::convert::Infallible;
use std::path::Path;

/// path reported for the built-in font
pub const DEFAULT_FONT: &str = "default";

/// larger font sizes render at this size
pub const MAX_FONT_SIZE: u32 = 1000;

/// built-in faces, smallest first
const BUILTIN_FACES: [&MonoFont<'static>; 9] = [
    &ascii::FONT_4X6,
    &ascii::FONT_5X8,
    &ascii::FONT_6X10,
    &ascii::FONT_6X13,
    &ascii::FONT_7X13,
    &ascii::FONT_8X13,
    &ascii::FONT_9X15,
    &ascii::FONT_9X18,
    &ascii::FONT_10X20,
];

/// renders single lines of text into coverage masks
pub struct TextWriter {
    path: String,
    face: Typeface,
}

enum Typeface {
    Builtin,
    Bdf(Box<BdfFace>),
    TrueType(Box<fontdue::Font>),
}

struct BdfFace {
    font: BdfFont,
    char_size_x: i32,
    char_size_y: i32,
    char_ascent: i32,
}

impl Default for TextWriter {
    fn default() -> Self {
        TextWriter {
            path: String::from(DEFAULT_FONT),
            face: Typeface::Builtin,
        }
    }
}

impl TextWriter {
    /// load a font file: `.bdf` as a bitmap font, anything else as TrueType/OpenType
    pub fn load(path: &str) -> Result<TextWriter, Error> {
        let file = Path::new(path);
        let is_bdf = file
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bdf"));

        let face = if is_bdf {
            let input = std::fs::read_to_string(file)?;
            Typeface::Bdf(Box::new(BdfFace::parse(&input, path)?))
        } else {
            let data = std::fs::read(file)?;
            let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
                .map_err(|err| Error::Font(format!("{path}: {err}")))?;
            Typeface::TrueType(Box::new(font))
        };

        Ok(TextWriter {
            path: String::from(path),
            face,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// rasterize `message` at `size` pixels
    pub fn render(&self, message: &str, size: u32) -> AlphaMask {
        let size = size.clamp(1, MAX_FONT_SIZE);
        match &self.face {
            Typeface::Builtin => render_builtin(message, size),
            Typeface::Bdf(face) => face.render(message, size),
            Typeface::TrueType(font) => render_truetype(font, message, size),
        }
    }

    /// pixel size of `message` as `render` would produce it
    pub fn measure(&self, message: &str, size: u32) -> (u32, u32) {
        let mask = self.render(message, size);
        (mask.width, mask.height)
    }
}

/// largest built-in face not taller than `size`, with the integer scale reaching it
fn builtin_face(size: u32) -> (&'static MonoFont<'static>, u32) {
    let face: &'static MonoFont<'static> = BUILTIN_FACES
        .iter()
        .rev()
        .copied()
        .find(|face| face.character_size.height <= size)
        .unwrap_or(BUILTIN_FACES[0]);
    let scale = (size / face.character_size.height).max(1);
    (face, scale)
}

fn render_builtin(message: &str, size: u32) -> AlphaMask {
    let (face, scale) = builtin_face(size);
    let count = message.chars().count() as u32;
    let width = if count == 0 {
        0
    } else {
        count * face.character_size.width + (count - 1) * face.character_spacing
    };
    let mut mask = AlphaMask::new(width * scale, face.character_size.height * scale);

    let style = MonoTextStyle::new(face, BinaryColor::On);
    let mut target = MaskTarget {
        mask: &mut mask,
        scale,
    };
    let _ = Text::with_baseline(message, Point::zero(), style, Baseline::Top).draw(&mut target);
    mask
}

/// draw target scaling embedded-graphics pixels into a mask
struct MaskTarget<'m> {
    mask: &'m mut AlphaMask,
    scale: u32,
}

impl OriginDimensions for MaskTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.mask.width / self.scale, self.mask.height / self.scale)
    }
}

impl DrawTarget for MaskTarget<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let scale = self.scale as i64;
        for Pixel(point, color) in pixels {
            if color.is_on() {
                for dy in 0..scale {
                    for dx in 0..scale {
                        self.mask
                            .cover(point.x as i64 * scale + dx, point.y as i64 * scale + dy, 0xff);
                    }
                }
            }
        }
        Ok(())
    }
}

impl BdfFace {
    fn parse(input: &str, path: &str) -> Result<BdfFace, Error> {
        let font = BdfFont::parse(input)
            .map_err(|_| Error::Font(format!("{path}: not a valid BDF font")))?;

        let property = |property: Property| {
            font.metadata
                .properties
                .try_get::<i32>(property)
                .into_iter()
                .flatten()
                .next()
        };
        let char_ascent = property(Property::FontAscent)
            .ok_or_else(|| Error::Font(format!("{path}: missing FONT_ASCENT")))?;
        let char_size_y = property(Property::PixelSize).unwrap_or(char_ascent) + 1;
        let char_size_x = property(Property::NormSpace).unwrap_or(char_size_y / 2) + 1;
        if char_size_x <= 0 || char_size_y <= 0 {
            return Err(Error::Font(format!(
                "{path}: bad glyph cell {char_size_x}x{char_size_y}"
            )));
        }

        Ok(BdfFace {
            font,
            char_size_x,
            char_size_y,
            char_ascent,
        })
    }

    fn render(&self, message: &str, size: u32) -> AlphaMask {
        let scale = (size as i32 / self.char_size_y).max(1) as i64;
        let count = message.chars().count() as i64;
        let mut mask = AlphaMask::new(
            (count * self.char_size_x as i64 * scale) as u32,
            (self.char_size_y as i64 * scale) as u32,
        );

        for (pos_x, c) in message.chars().enumerate() {
            let Some(glyph) = self.font.glyphs.get(c).or_else(|| self.font.glyphs.get('?')) else {
                continue;
            };

            let start_x = (self.char_size_x - glyph.bounding_box.size.x) / 2
                + glyph.bounding_box.offset.x;
            let start_y =
                self.char_ascent - glyph.bounding_box.size.y - glyph.bounding_box.offset.y;

            for y in 0..glyph.bounding_box.size.y {
                for x in 0..glyph.bounding_box.size.x {
                    if glyph.pixel(x as usize, y as usize).unwrap_or(false) {
                        let px = pos_x as i64 * self.char_size_x as i64 + (start_x + x) as i64;
                        let py = (start_y + y) as i64;
                        for dy in 0..scale {
                            for dx in 0..scale {
                                mask.cover(px * scale + dx, py * scale + dy, 0xff);
                            }
                        }
                    }
                }
            }
        }
        mask
    }
}

fn render_truetype(font: &fontdue::Font, message: &str, size: u32) -> AlphaMask {
    let px = size as f32;
    let (ascent, descent) = font
        .horizontal_line_metrics(px)
        .map(|line| (line.ascent, line.descent))
        .unwrap_or((px, 0.0));

    let glyphs: Vec<(fontdue::Metrics, Vec<u8>)> =
        message.chars().map(|c| font.rasterize(c, px)).collect();
    let width: f32 = glyphs.iter().map(|(metrics, _)| metrics.advance_width).sum();
    let height = (ascent - descent).ceil().max(1.0) as u32;
    let mut mask = AlphaMask::new(width.ceil().max(0.0) as u32, height);

    let baseline = ascent.round() as i64;
    let mut pen = 0f32;
    for (metrics, coverage) in glyphs {
        let left = pen.round() as i64 + metrics.xmin as i64;
        let top = baseline - (metrics.ymin as i64 + metrics.height as i64);
        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                mask.cover(
                    left + gx as i64,
                    top + gy as i64,
                    coverage[gy * metrics.width + gx],
                );
            }
        }
        pen += metrics.advance_width;
    }
    mask
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 6x8 cell font with a single 4x4 block glyph for 'A'
    fn bdf(pixel_size: i32, norm_space: i32) -> String {
        format!(
            "STARTFONT 2.1
FONT -test-block-medium-r-normal--7-70-75-75-c-50-iso10646-1
SIZE 7 75 75
FONTBOUNDINGBOX 4 4 0 0
STARTPROPERTIES 3
FONT_ASCENT 6
PIXEL_SIZE {pixel_size}
NORM_SPACE {norm_space}
ENDPROPERTIES
CHARS 1
STARTCHAR A
ENCODING 65
SWIDTH 500 0
DWIDTH 6 0
BBX 4 4 0 0
BITMAP
F0
F0
F0
F0
ENDCHAR
ENDFONT
"
        )
    }

    pub(crate) fn write_bdf(dir: &tempfile::TempDir, name: &str, pixel_size: i32) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, bdf(pixel_size, 5)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_builtin_face_selection() {
        let (face, scale) = builtin_face(16);
        assert_eq!(face.character_size.height, 15);
        assert_eq!(scale, 1);

        let (face, scale) = builtin_face(40);
        assert_eq!(face.character_size.height, 20);
        assert_eq!(scale, 2);

        let (face, scale) = builtin_face(2);
        assert_eq!(face.character_size.height, 6);
        assert_eq!(scale, 1);
    }

    #[test]
    fn test_builtin_render() {
        let writer = TextWriter::default();
        assert_eq!(writer.path(), DEFAULT_FONT);

        let mask = writer.render("Hi", 20);
        assert_eq!((mask.width, mask.height), (20, 20));
        assert!(mask.alpha.iter().any(|a| *a == 0xff));

        let (w, h) = writer.measure("Hi", 40);
        assert_eq!((w, h), (40, 40));
        assert_eq!(writer.measure("", 20), (0, 20));
    }

    #[test]
    fn test_load_failures() {
        let dir = tempfile::tempdir().unwrap();
        let ttf = dir.path().join("broken.ttf");
        std::fs::write(&ttf, b"not a font").unwrap();
        assert!(TextWriter::load(ttf.to_str().unwrap()).is_err());

        let bdf = dir.path().join("broken.bdf");
        std::fs::write(&bdf, "STARTFONT nonsense").unwrap();
        assert!(TextWriter::load(bdf.to_str().unwrap()).is_err());

        assert!(TextWriter::load("/does/not/exist.ttf").is_err());
    }

    #[test]
    fn test_bdf_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bdf(&dir, "block.bdf", 7);
        let writer = TextWriter::load(&path).unwrap();
        assert_eq!(writer.path(), path);

        // 6x8 cell, scaled by whole multiples of the cell height
        assert_eq!(writer.measure("AA", 8), (12, 8));
        assert_eq!(writer.measure("AA", 16), (24, 16));

        // glyph centred in the cell, bottom edge on the baseline
        let mask = writer.render("A", 8);
        assert_eq!(mask.get(0, 2), 0);
        assert_eq!(mask.get(1, 2), 0xff);
        assert_eq!(mask.get(4, 5), 0xff);
        assert_eq!(mask.get(5, 5), 0);
        assert_eq!(mask.get(1, 6), 0);
    }

    #[test]
    fn test_bdf_bad_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.bdf");
        std::fs::write(&path, bdf(-1, 5)).unwrap();
        assert!(TextWriter::load(path.to_str().unwrap()).is_err());

        let path = dir.path().join("narrow.bdf");
        std::fs::write(&path, bdf(7, -3)).unwrap();
        assert!(TextWriter::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_size_is_capped() {
        let writer = TextWriter::default();
        assert_eq!(
            writer.measure("Hi", u32::MAX),
            writer.measure("Hi", MAX_FONT_SIZE)
        );
        assert_eq!(writer.measure("Hi", MAX_FONT_SIZE).1, MAX_FONT_SIZE);
    }
}
