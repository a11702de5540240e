//! Stereo triangulation of marker tracks.
//!
//! Each matched pair is first moved onto the epipolar constraint with the
//! optimal correction of [`correct_match`], then triangulated linearly with
//! [`triangulate_dlt`] in camera-A coordinates and mapped into the world
//! frame. [`derive_motion`] turns the resulting positions into
//! displacements relative to the first frame.

mod correction;
mod dlt;
mod motion;
mod triangulator;

pub use correction::correct_match;
pub use dlt::triangulate_dlt;
pub use motion::derive_motion;
pub use triangulator::{TriangulationError, Triangulator};
