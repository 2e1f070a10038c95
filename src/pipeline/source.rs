use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};

use crate::types::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Produces frames one at a time. `Ok(None)` marks the end of the stream.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// Still images from a directory, in file-name order.
#[derive(Debug)]
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read frame directory {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(anyhow!("no png or jpeg frames found in {}", dir.display()));
        }
        log::info!("found {} frames in {}", paths.len(), dir.display());

        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let index = self.next as u64;
        self.next += 1;

        let rgba = image::open(path)
            .with_context(|| format!("failed to decode frame {}", path.display()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Some(Frame::new(rgba.into_raw(), width, height, index)))
    }
}

/// Pixel-less frames of a fixed size, for streams where only landmarks exist.
#[derive(Debug)]
pub struct BlankFrameSource {
    width: u32,
    height: u32,
    limit: Option<u64>,
    next: u64,
}

impl BlankFrameSource {
    pub fn new(width: u32, height: u32, limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            limit,
            next: 0,
        }
    }
}

impl FrameSource for BlankFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit.is_some_and(|limit| self.next >= limit) {
            return Ok(None);
        }
        let frame = Frame::blank(self.width, self.height, self.next);
        self.next += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_source_stops_at_limit() {
        let mut source = BlankFrameSource::new(64, 48, Some(2));
        let first = source.next_frame().expect("frame").expect("some");
        assert_eq!((first.width, first.height, first.index), (64, 48, 0));
        assert!(source.next_frame().expect("frame").is_some());
        assert!(source.next_frame().expect("frame").is_none());
    }

    #[test]
    fn image_dir_reads_frames_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, shade) in [("b.png", 200u8), ("a.png", 10u8)] {
            let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([shade, shade, shade, 255]));
            img.save(dir.path().join(name)).expect("write frame");
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write note");

        let mut source = ImageDirSource::open(dir.path()).expect("open");
        assert_eq!(source.len(), 2);

        let first = source.next_frame().expect("decode").expect("frame");
        assert_eq!((first.width, first.height), (4, 3));
        assert_eq!(first.rgba[0], 10);
        assert!(first.has_pixels());

        let second = source.next_frame().expect("decode").expect("frame");
        assert_eq!((second.index, second.rgba[0]), (1, 200));
        assert!(source.next_frame().expect("end").is_none());
    }

    #[test]
    fn empty_directory_is_a_setup_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ImageDirSource::open(dir.path()).is_err());
    }
}
