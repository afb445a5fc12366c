use crate::bitmap::Bitmap;
use crate::error::Error;
use crate::screen::backend::Backend;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// shared handle to a decoded image
pub type BitmapHandle = Rc<Bitmap>;

/// decoded images by path, kept for the whole session
///
/// Entries are keyed by the path string only; a file that changes on disk
/// after its first load is not picked up again.
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<String, BitmapHandle>,
}

impl ImageCache {
    pub fn new() -> ImageCache {
        ImageCache {
            images: HashMap::new(),
        }
    }

    /// cached bitmap for `path`, decoding it through the backend on first use
    ///
    /// Failed loads are not remembered.
    pub fn get_or_load<B: Backend>(
        &mut self,
        path: &str,
        backend: &mut B,
    ) -> Result<BitmapHandle, Error> {
        if let Some(image) = self.images.get(path) {
            return Ok(Rc::clone(image));
        }

        let image = Rc::new(backend.load_image(Path::new(path))?);
        debug!(path, width = image.width(), height = image.height(), "image cached");
        self.images.insert(String::from(path), Rc::clone(&image));
        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Color;
    use crate::screen::headless::Headless;

    #[test]
    fn test_decodes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        Bitmap::filled(3, 2, Color::rgb(9, 8, 7)).save(&path).unwrap();
        let path = path.to_str().unwrap();

        let mut backend = Headless::new(8, 8);
        let mut cache = ImageCache::new();
        let first = cache.get_or_load(path, &mut backend).unwrap();
        let second = cache.get_or_load(path, &mut backend).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(backend.decodes(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(first.pixel(2, 1), [9, 8, 7, 255]);

        // the file going away does not matter any more
        std::fs::remove_file(path).unwrap();
        assert!(cache.get_or_load(path, &mut backend).is_ok());
        assert_eq!(backend.decodes(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut backend = Headless::new(8, 8);
        let mut cache = ImageCache::new();
        assert!(cache.get_or_load("missing.png", &mut backend).is_err());
        assert!(cache.get_or_load("missing.png", &mut backend).is_err());
        assert_eq!(backend.decodes(), 2);
        assert!(cache.is_empty());
    }
}
