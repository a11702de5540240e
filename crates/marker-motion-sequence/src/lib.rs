//! Stereo frame sequences with matched initial markers.
//!
//! [`SequencePair`] loads both cameras' frames (undistorted with the rig
//! calibration), reads the initial marker positions, refines them against
//! the first frame with [`refine_subpix`] and sorts camera B's markers so
//! that they correspond to camera A's.
//!
//! Frames and markers come from the [`FrameSource`] and [`MarkerSource`]
//! traits; the defaults read a directory of images and a CSV file. With the
//! `video` feature a camera's entry may also be a video file.

mod correspondence;
mod frames;
mod markers;
mod sequence;
mod subpix;
#[cfg(feature = "video")]
mod video;

pub use correspondence::{CorrespondenceError, CorrespondenceResolver, EpipolarPairResolver, KeepOrder};
pub use frames::{frame_source_at, FrameSource, FrameSourceError, ImageSequenceSource, InMemorySource};
pub use markers::{markers_from_matrix, CsvMarkerSource, InMemoryMarkers, MarkerSource, MARKER_POSITIONS};
pub use sequence::{SequenceError, SequenceLayout, SequencePair};
pub use subpix::{refine_subpix, SubPixParams};
#[cfg(feature = "video")]
pub use video::VideoSource;
