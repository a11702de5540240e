use crate::triangulator::TriangulationError;
use marker_motion_core::Track3D;
use nalgebra::Point3;

/// Displacement of every marker relative to its position in frame 0.
///
/// Frame 0 of the result is exactly zero for finite input. Every frame must
/// hold as many markers as frame 0.
pub fn derive_motion(positions: &Track3D) -> Result<Track3D, TriangulationError> {
    let Some(reference) = positions.frame(0) else {
        return Ok(Track3D::default());
    };

    let mut frames = Vec::with_capacity(positions.num_frames());
    for (f, pts) in positions.frames().iter().enumerate() {
        if pts.len() != reference.len() {
            return Err(TriangulationError::RaggedTrack {
                frame: f,
                expected: reference.len(),
                found: pts.len(),
            });
        }
        frames.push(
            pts.iter()
                .zip(reference)
                .map(|(p, r)| Point3::from(p - r))
                .collect(),
        );
    }
    Ok(Track3D::new(frames))
}
