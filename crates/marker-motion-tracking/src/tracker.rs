use crate::lk::{track_markers, TrackStatus, TrackedMarker, TrackerParams};
use crate::pyramid::ImagePyramid;
use marker_motion_core::{Camera, GrayImage, Track2D};
use marker_motion_sequence::SequencePair;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Per-frame tracking output for one camera, frame-major.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingResult {
    frames: Vec<Vec<TrackedMarker>>,
}

impl TrackingResult {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[TrackedMarker]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn frames(&self) -> &[Vec<TrackedMarker>] {
        &self.frames
    }

    /// Positions only, in the layout the triangulator consumes.
    pub fn positions(&self) -> Track2D {
        Track2D::new(
            self.frames
                .iter()
                .map(|f| f.iter().map(|m| m.position).collect())
                .collect(),
        )
    }

    /// `(frame, marker)` of every observation that was not tracked cleanly.
    pub fn untracked(&self) -> impl Iterator<Item = (usize, usize, TrackStatus)> + '_ {
        self.frames.iter().enumerate().flat_map(|(f, markers)| {
            markers
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.is_tracked())
                .map(move |(m, marker)| (f, m, marker.status))
        })
    }
}

/// Propagates marker positions through a frame sequence with pyramidal
/// Lucas–Kanade. Frame 0 is taken verbatim from the initial positions.
#[derive(Clone, Debug, Default)]
pub struct MarkerTracker {
    params: TrackerParams,
}

impl MarkerTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Track one camera of a loaded sequence from its sorted initial markers.
    pub fn track_camera(&self, sequence: &SequencePair, camera: Camera) -> TrackingResult {
        log::info!("track markers of {camera}");
        self.track(sequence.frames(camera), &sequence.markers(camera))
    }

    /// Track `initial` (positions in `frames[0]`) through all `frames`.
    ///
    /// Each frame's estimates are the prior for the next, including markers
    /// that were lost. An empty frame list gives an empty result.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(frames = frames.len(), markers = initial.len()))
    )]
    pub fn track(&self, frames: &[GrayImage], initial: &[Point2<f32>]) -> TrackingResult {
        let Some((first, rest)) = frames.split_first() else {
            return TrackingResult::default();
        };

        let min_size = self.params.window_size();
        let mut out = Vec::with_capacity(frames.len());
        out.push(initial.iter().copied().map(TrackedMarker::given).collect::<Vec<_>>());

        let mut prior: Vec<Point2<f32>> = initial.to_vec();
        let mut prev = ImagePyramid::build(&first.view(), self.params.max_level, min_size);
        for (i, frame) in rest.iter().enumerate() {
            let next = ImagePyramid::build(&frame.view(), self.params.max_level, min_size);
            let tracked = track_markers(&prev, &next, &prior, &self.params);

            let lost = tracked.iter().filter(|m| !m.is_tracked()).count();
            if lost > 0 {
                log::debug!("frame {}: {lost} of {} markers not tracked", i + 1, tracked.len());
            }

            prior.clear();
            prior.extend(tracked.iter().map(|m| m.position));
            out.push(tracked);
            prev = next;
        }

        let result = TrackingResult { frames: out };
        let untracked = result.untracked().count();
        if untracked > 0 {
            log::warn!("{untracked} marker observations were not tracked cleanly");
        }
        result
    }
}
