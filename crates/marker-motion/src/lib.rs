//! High-level facade for the `marker-motion-*` workspace.
//!
//! Recovers the 3-D motion of physical markers seen by a calibrated stereo
//! camera pair:
//! 1. [`CalibrationData`] is loaded from a folder of CSV matrices,
//! 2. a [`SequencePair`](sequence::SequencePair) loads both cameras' frames
//!    and matched, sub-pixel initial markers,
//! 3. a [`MarkerTracker`](tracking::MarkerTracker) follows the markers
//!    through each camera's frames,
//! 4. a [`Triangulator`](triangulation::Triangulator) turns matched tracks
//!    into world points, and motion is taken relative to frame 0.
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_motion::{run_to_file, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let out = run_to_file("calib", "sequence", "motion.csv", &PipelineConfig::default())?;
//! println!("{} frames", out.motion.num_frames());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marker_motion::core`: calibration, images, camera pairs, tracks.
//! - `marker_motion::sequence`: frame and marker sources, `SequencePair`.
//! - `marker_motion::tracking`: pyramidal Lucas–Kanade tracking.
//! - `marker_motion::triangulation`: optimal triangulation and motion.

pub use marker_motion_core as core;
pub use marker_motion_sequence as sequence;
pub use marker_motion_tracking as tracking;
pub use marker_motion_triangulation as triangulation;

pub use marker_motion_core::{CalibrationData, Camera, CameraPair, Track2D, Track3D};

mod config;
mod output;
mod pipeline;

pub use config::{ConfigError, PipelineConfig};
pub use output::{format_motion_csv, write_motion_csv, OutputError};
pub use pipeline::{run, run_sequence, run_to_file, PipelineError, PipelineOutput};
