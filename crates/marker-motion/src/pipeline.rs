//! End-to-end run: calibration → sequence → tracking → triangulation → motion.

use crate::config::PipelineConfig;
use crate::output::{write_motion_csv, OutputError};
use crate::sequence::{SequenceError, SequencePair};
use crate::tracking::{MarkerTracker, TrackingResult};
use crate::triangulation::{derive_motion, TriangulationError, Triangulator};
use marker_motion_core::{CalibrationData, Camera, CameraPair, MatrixError, Track3D};
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Any fatal failure of a run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Calibration(#[from] MatrixError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Everything a run produces.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Per-camera tracking with status and residual per observation.
    pub tracking: CameraPair<TrackingResult>,
    /// World-frame marker positions.
    pub positions: Track3D,
    /// Displacement relative to frame 0.
    pub motion: Track3D,
    /// Per-frame RMS reprojection error in pixels; `None` when the world
    /// transform cannot be inverted.
    pub reprojection_error: Option<Vec<f64>>,
}

/// Load calibration and sequence folders and run all stages.
pub fn run(
    calibration_dir: impl AsRef<Path>,
    sequence_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    let calibration_dir = calibration_dir.as_ref();
    log::info!("load calibration data from {}", calibration_dir.display());
    let calibration = Arc::new(CalibrationData::load_dir_with_layout(
        calibration_dir,
        &config.calibration,
    )?);
    log::info!("loaded calibration data");

    let sequence = SequencePair::load_dir_with(
        sequence_dir,
        Arc::clone(&calibration),
        &config.sequence,
        &config.subpix,
    )?;
    log::info!(
        "finished loading sequence with {} frames",
        sequence.num_frames()
    );

    run_sequence(&sequence, config)
}

/// Run tracking, triangulation and motion derivation on a loaded sequence.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(frames = sequence.num_frames(), markers = sequence.num_markers()))
)]
pub fn run_sequence(sequence: &SequencePair, config: &PipelineConfig) -> Result<PipelineOutput, PipelineError> {
    log::info!("start tracking of markers");
    let tracker = MarkerTracker::new(config.tracker);
    let tracking = CameraPair::new((), ()).map(|camera, ()| tracker.track_camera(sequence, camera));
    log::info!("finished tracking of markers");

    log::info!("start triangulation");
    let triangulator = Triangulator::new(Arc::clone(sequence.calibration()));
    let track_a = tracking[Camera::A].positions();
    let track_b = tracking[Camera::B].positions();
    let positions = triangulator.triangulate_sequence(&track_a, &track_b)?;
    let reprojection_error = match triangulator.reprojection_error(&track_a, &track_b, &positions) {
        Ok(errors) => {
            if let Some(worst) = errors.iter().copied().filter(|e| e.is_finite()).reduce(f64::max) {
                log::debug!("worst per-frame reprojection error {worst:.4} px");
            }
            Some(errors)
        }
        Err(err) => {
            log::warn!("skipping reprojection error: {err}");
            None
        }
    };
    log::info!("finished triangulation");

    log::info!("calculate motion of markers");
    let motion = derive_motion(&positions)?;
    log::info!("finished calculation of motion of markers");

    Ok(PipelineOutput {
        tracking,
        positions,
        motion,
        reprojection_error,
    })
}

/// [`run`] followed by writing the motion to `output`.
pub fn run_to_file(
    calibration_dir: impl AsRef<Path>,
    sequence_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    let result = run(calibration_dir, sequence_dir, config)?;
    let output = output.as_ref();
    log::info!("write results to {}", output.display());
    write_motion_csv(output, &result.motion)?;
    log::info!("finished writing results");
    Ok(result)
}
