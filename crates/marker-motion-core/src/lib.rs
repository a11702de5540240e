//! Core types for recovering marker motion with a calibrated stereo rig.
//!
//! This crate holds everything the pipeline stages share and nothing that
//! depends on a concrete image decoder:
//! - [`CalibrationData`]: the immutable rig parameters, loaded from CSV files,
//! - [`CameraPair`]: a two-slot container indexed by [`Camera`],
//! - [`GrayImage`] / [`GrayImageView`] rasters plus bilinear sampling and
//!   lens undistortion,
//! - [`Track2D`] / [`Track3D`] per-frame marker tracks,
//! - epipolar helpers used by correspondence sorting and synthetic rigs.

mod calibration;
mod camera;
mod distortion;
mod epipolar;
mod image;
mod logger;
mod matrix_io;
mod track;

pub use calibration::{CalibrationData, CalibrationLayout, RigMatrix};
pub use camera::{Camera, CameraIndexError, CameraPair};
pub use distortion::{undistort_image, Distortion};
pub use epipolar::{epipolar_residual, fundamental_from_rig, homogeneous, skew};
pub use image::{sample_bilinear, sample_bilinear_clamped, sample_bilinear_u8, GrayImage, GrayImageView};
pub use matrix_io::{check_dimensions, parse_matrix, read_matrix, MatrixError};
pub use track::{Track2D, Track3D};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
