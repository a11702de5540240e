//! Video container frame source (feature `video`).

use crate::frames::{FrameSource, FrameSourceError};
use marker_motion_core::GrayImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::{Path, PathBuf};

/// Every frame of one video file, decoded through OpenCV's `videoio` and
/// converted to 8-bit luma.
#[derive(Clone, Debug)]
pub struct VideoSource {
    path: PathBuf,
}

impl VideoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn video_err(&self, source: opencv::Error) -> FrameSourceError {
        FrameSourceError::Video {
            path: self.path.clone(),
            source: Box::new(source),
        }
    }
}

impl FrameSource for VideoSource {
    fn load_frames(&self) -> Result<Vec<GrayImage>, FrameSourceError> {
        let mut cap = VideoCapture::from_file(&self.path.to_string_lossy(), videoio::CAP_ANY)
            .map_err(|e| self.video_err(e))?;
        if !cap.is_opened().map_err(|e| self.video_err(e))? {
            return Err(FrameSourceError::NotOpened(self.path.clone()));
        }

        let mut frame = Mat::default();
        let mut gray = Mat::default();
        let mut frames = Vec::new();
        while cap.read(&mut frame).map_err(|e| self.video_err(e))? && !frame.empty() {
            if frame.channels() == 1 {
                frame.copy_to(&mut gray).map_err(|e| self.video_err(e))?;
            } else {
                imgproc::cvt_color(
                    &frame,
                    &mut gray,
                    imgproc::COLOR_BGR2GRAY,
                    0,
                    opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
                )
                .map_err(|e| self.video_err(e))?;
            }
            let data = gray.data_bytes().map_err(|e| self.video_err(e))?.to_vec();
            frames.push(GrayImage {
                width: gray.cols() as usize,
                height: gray.rows() as usize,
                data,
            });
        }
        log::debug!("decoded {} frames from {}", frames.len(), self.path.display());
        Ok(frames)
    }
}
