//! On-disk fixture: a rectified rig watching two stationary X-junction markers.

#![allow(dead_code)]

use marker_motion::core::{fundamental_from_rig, GrayImage};
use nalgebra::{Matrix3, Matrix3x4, Point2, Point3};
use std::fs;
use std::path::Path;

pub const W: usize = 640;
pub const H: usize = 480;

/// Marker positions in world (= camera A) coordinates.
pub fn world_markers() -> [Point3<f64>; 2] {
    [Point3::new(-0.2, -0.1, 2.0), Point3::new(0.25, 0.15, 2.0)]
}

fn csv<const R: usize, const C: usize>(m: &nalgebra::SMatrix<f64, R, C>) -> String {
    let mut out = String::new();
    for r in 0..R {
        let row: Vec<String> = (0..C).map(|c| m[(r, c)].to_string()).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write_calibration(dir: &Path) {
    let k = Matrix3::new(800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0);
    let a_to_b = Matrix3x4::new(
        1.0, 0.0, 0.0, -0.1, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    );
    let f = fundamental_from_rig(&k, &k, &a_to_b).expect("invertible intrinsics");
    let files = [
        ("K1.csv", csv(&k)),
        ("K2.csv", csv(&k)),
        ("D1.csv", "0,0,0,0,0\n".to_string()),
        ("D2.csv", "0,0,0,0,0\n".to_string()),
        ("F.csv", csv(&f)),
        ("T_C1_W.csv", csv(&Matrix3x4::<f64>::identity())),
        ("T_C1_C2.csv", csv(&a_to_b)),
    ];
    for (name, body) in files {
        fs::write(dir.join(name), body).expect("write calibration");
    }
}

/// Checkerboard X-junction markers: a 24 px square around each centre,
/// bright in two opposite quadrants, on a mid-gray background.
fn x_markers(centers: &[Point2<f32>]) -> GrayImage {
    GrayImage::from_fn(W, H, |x, y| {
        let mut acc = 0.0f32;
        for sy in 0..4 {
            for sx in 0..4 {
                let xs = x as f32 + (sx as f32 + 0.5) / 4.0 - 0.5;
                let ys = y as f32 + (sy as f32 + 0.5) / 4.0 - 0.5;
                acc += centers
                    .iter()
                    .find(|c| (xs - c.x).abs() <= 12.0 && (ys - c.y).abs() <= 12.0)
                    .map_or(128.0, |c| if (xs < c.x) == (ys < c.y) { 220.0 } else { 30.0 });
            }
        }
        (acc / 16.0).round() as u8
    })
}

/// `frames` identical frames per camera, markers clicked slightly off and
/// listed in swapped order for camera B.
pub fn write_sequence(dir: &Path, frames: usize) {
    let views = [
        ("MarkerSequence_1", [Point2::new(240.0, 200.0), Point2::new(420.0, 300.0)]),
        ("MarkerSequence_2", [Point2::new(200.0, 200.0), Point2::new(380.0, 300.0)]),
    ];
    for (sub, centers) in views {
        let frames_dir = dir.join(sub);
        fs::create_dir_all(&frames_dir).expect("mkdir");
        let frame = x_markers(&centers);
        for i in 0..frames {
            image::GrayImage::from_raw(W as u32, H as u32, frame.data.clone())
                .expect("buffer size")
                .save(frames_dir.join(format!("frame_{i:03}.png")))
                .expect("save png");
        }
    }
    fs::write(dir.join("markers1.csv"), "240.4,199.6\n419.7,300.5\n").expect("write");
    fs::write(dir.join("markers2.csv"), "380.3,299.6\n199.5,200.4\n").expect("write");
}
