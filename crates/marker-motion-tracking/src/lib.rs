//! Marker tracking across a single camera's frame sequence.
//!
//! [`MarkerTracker`] propagates initial marker positions frame by frame
//! with pyramidal Lucas–Kanade ([`track_markers`]) and reports every
//! estimate together with a [`TrackStatus`] and residual error. Status and
//! error are diagnostics only; downstream stages consume
//! [`TrackingResult::positions`].

mod lk;
mod pyramid;
mod tracker;

pub use lk::{track_markers, TrackStatus, TrackedMarker, TrackerParams};
pub use pyramid::{FloatImage, ImagePyramid};
pub use tracker::{MarkerTracker, TrackingResult};
