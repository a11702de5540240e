//! Frame sources.
//!
//! A frame source yields one camera's grayscale frames in time order. Lens
//! undistortion is applied afterwards by [`SequencePair`](crate::SequencePair).

use marker_motion_core::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors produced while reading frames.
#[derive(thiserror::Error, Debug)]
pub enum FrameSourceError {
    #[error("could not open frame source {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode frame {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not read video {path}")]
    Video {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("could not open video {0}")]
    NotOpened(PathBuf),
    #[error("frame source {0} contains no frames")]
    Empty(String),
    #[error("frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
}

/// Anything that can produce one camera's frames.
pub trait FrameSource {
    /// Load all frames in time order as 8-bit grayscale.
    fn load_frames(&self) -> Result<Vec<GrayImage>, FrameSourceError>;
}

/// A directory of still images, one file per frame, ordered by file name.
///
/// Any format the `image` crate recognises by extension is accepted;
/// colour frames are converted to luma.
#[derive(Clone, Debug)]
pub struct ImageSequenceSource {
    dir: PathBuf,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted paths of all decodable frame files.
    pub fn frame_paths(&self) -> Result<Vec<PathBuf>, FrameSourceError> {
        let io_err = |source| FrameSourceError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl FrameSource for ImageSequenceSource {
    fn load_frames(&self) -> Result<Vec<GrayImage>, FrameSourceError> {
        let paths = self.frame_paths()?;
        if paths.is_empty() {
            return Err(FrameSourceError::Empty(self.dir.display().to_string()));
        }
        log::debug!("decoding {} frames from {}", paths.len(), self.dir.display());

        let mut frames: Vec<GrayImage> = Vec::with_capacity(paths.len());
        for (index, path) in paths.into_iter().enumerate() {
            let luma = image::open(&path)
                .map_err(|source| FrameSourceError::Decode {
                    path: path.clone(),
                    source,
                })?
                .to_luma8();
            let frame = GrayImage {
                width: luma.width() as usize,
                height: luma.height() as usize,
                data: luma.into_raw(),
            };
            if let Some(first) = frames.first() {
                check_size(index, &frame, first)?;
            }
            frames.push(frame);
        }
        Ok(frames)
    }
}

/// The frame source for one camera's entry in a sequence folder: a video
/// file when video support is enabled, otherwise a directory of stills.
#[cfg(feature = "video")]
pub fn frame_source_at(path: PathBuf) -> Box<dyn FrameSource> {
    if path.is_file() {
        Box::new(crate::video::VideoSource::new(path))
    } else {
        Box::new(ImageSequenceSource::new(path))
    }
}

/// The frame source for one camera's entry in a sequence folder: a
/// directory of stills.
#[cfg(not(feature = "video"))]
pub fn frame_source_at(path: PathBuf) -> Box<dyn FrameSource> {
    Box::new(ImageSequenceSource::new(path))
}

/// Frames that are already decoded.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    frames: Vec<GrayImage>,
}

impl InMemorySource {
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self { frames }
    }
}

impl FrameSource for InMemorySource {
    fn load_frames(&self) -> Result<Vec<GrayImage>, FrameSourceError> {
        let Some(first) = self.frames.first() else {
            return Err(FrameSourceError::Empty("in-memory frames".to_string()));
        };
        for (index, frame) in self.frames.iter().enumerate().skip(1) {
            check_size(index, frame, first)?;
        }
        Ok(self.frames.clone())
    }
}

fn check_size(index: usize, frame: &GrayImage, first: &GrayImage) -> Result<(), FrameSourceError> {
    if frame.width == first.width && frame.height == first.height {
        return Ok(());
    }
    Err(FrameSourceError::SizeMismatch {
        index,
        width: frame.width,
        height: frame.height,
        expected_width: first.width,
        expected_height: first.height,
    })
}
