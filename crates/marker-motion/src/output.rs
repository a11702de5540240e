//! Result file: one `frame,marker,x,y,z` line per observation.

use marker_motion_core::Track3D;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
#[error("could not open file {} for writing result", path.display())]
pub struct OutputError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Render `track` frame-major, coordinates with six decimals.
pub fn format_motion_csv(track: &Track3D) -> String {
    let mut out = String::new();
    for (frame, marker, p) in track.iter_points() {
        let _ = writeln!(out, "{frame},{marker},{:.6},{:.6},{:.6}", p.x, p.y, p.z);
    }
    out
}

/// Write `track` to `path`, replacing any existing file.
pub fn write_motion_csv(path: impl AsRef<Path>, track: &Track3D) -> Result<(), OutputError> {
    let path = path.as_ref();
    fs::write(path, format_motion_csv(track)).map_err(|source| OutputError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn formats_frame_major_rows() {
        let track = Track3D::new(vec![
            vec![Point3::origin(), Point3::origin()],
            vec![Point3::new(0.5, -0.25, 1.0 / 3.0), Point3::new(12.0, 0.0, -1e-7)],
        ]);
        assert_eq!(
            format_motion_csv(&track),
            "0,0,0.000000,0.000000,0.000000\n\
             0,1,0.000000,0.000000,0.000000\n\
             1,0,0.500000,-0.250000,0.333333\n\
             1,1,12.000000,0.000000,-0.000000\n"
        );
    }

    #[test]
    fn unwritable_path_names_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.csv");
        let err = write_motion_csv(&path, &Track3D::default()).unwrap_err();
        assert_eq!(err.path, path);
        assert!(err.to_string().contains("out.csv"));
    }
}
