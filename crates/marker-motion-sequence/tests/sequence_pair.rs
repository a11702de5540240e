use marker_motion_core::{
    fundamental_from_rig, CalibrationData, Camera, CameraIndexError, CameraPair, Distortion,
    GrayImage, MatrixError,
};
use marker_motion_sequence::{
    EpipolarPairResolver, FrameSource, InMemoryMarkers, InMemorySource, KeepOrder, MarkerSource,
    SequenceError, SequencePair, SubPixParams,
};
use std::error::Error;
use nalgebra::{Matrix3, Matrix3x4, Point2};
use std::cell::Cell;
use std::sync::Arc;

const W: usize = 640;
const H: usize = 480;

fn rig() -> Arc<CalibrationData> {
    let k = Matrix3::new(800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0);
    let a_to_b = Matrix3x4::new(
        1.0, 0.0, 0.0, -0.1, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    );
    let f = fundamental_from_rig(&k, &k, &a_to_b).expect("invertible intrinsics");
    Arc::new(CalibrationData::new(
        [k, k],
        [Distortion::default(), Distortion::default()],
        f,
        Matrix3x4::identity(),
        a_to_b,
    ))
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

// Markers at (-0.2, -0.1, 2) and (0.25, 0.15, 2) in camera A coordinates.
fn truth() -> CameraPair<[Point2<f32>; 2]> {
    CameraPair::new(
        [Point2::new(240.0, 200.0), Point2::new(420.0, 300.0)],
        [Point2::new(200.0, 200.0), Point2::new(380.0, 300.0)],
    )
}

struct CountingMarkers {
    inner: InMemoryMarkers,
    calls: Cell<usize>,
}

impl MarkerSource for CountingMarkers {
    fn load_markers(&self) -> Result<Vec<Point2<f32>>, MatrixError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.load_markers()
    }
}

#[test]
fn refines_and_sorts_initial_markers() {
    let t = truth();
    let frames_a = InMemorySource::new(vec![x_markers(&t.a); 2]);
    let frames_b = InMemorySource::new(vec![x_markers(&t.b); 2]);
    // Rough clicks, with camera B listed in the opposite order.
    let markers_a = InMemoryMarkers::new(vec![Point2::new(240.6, 199.5), Point2::new(419.3, 300.7)]);
    let markers_b = InMemoryMarkers::new(vec![Point2::new(380.5, 299.4), Point2::new(199.4, 200.6)]);

    let seq = SequencePair::from_sources(
        rig(),
        CameraPair::new(&frames_a as &dyn FrameSource, &frames_b as &dyn FrameSource),
        CameraPair::new(&markers_a as &dyn MarkerSource, &markers_b as &dyn MarkerSource),
        &SubPixParams::default(),
        &EpipolarPairResolver,
    )
    .expect("sequence");

    assert_eq!(seq.num_frames(), 2);
    assert_eq!(seq.num_markers(), 2);
    for camera in Camera::BOTH {
        let got = seq.markers(camera);
        for (g, want) in got.iter().zip(t[camera].iter()) {
            assert!((g - want).norm() < 0.1, "{camera}: {g} vs {want}");
        }
    }
    assert_eq!(seq.markers_at(1).expect("camera B"), seq.markers(Camera::B));
}

#[test]
fn frame_count_mismatch_is_reported_before_markers_are_read() {
    let t = truth();
    let frames_a = InMemorySource::new(vec![x_markers(&t.a); 3]);
    let frames_b = InMemorySource::new(vec![x_markers(&t.b); 2]);
    let markers = CountingMarkers {
        inner: InMemoryMarkers::new(t.a.to_vec()),
        calls: Cell::new(0),
    };

    let err = SequencePair::from_sources(
        rig(),
        CameraPair::new(&frames_a as &dyn FrameSource, &frames_b as &dyn FrameSource),
        CameraPair::new(&markers as &dyn MarkerSource, &markers as &dyn MarkerSource),
        &SubPixParams::default(),
        &EpipolarPairResolver,
    )
    .unwrap_err();

    assert!(matches!(err, SequenceError::FrameCountMismatch { a: 3, b: 2 }));
    assert_eq!(markers.calls.get(), 0);
}

#[test]
fn marker_count_mismatch_is_an_error() {
    let t = truth();
    let frames_a = InMemorySource::new(vec![x_markers(&t.a)]);
    let frames_b = InMemorySource::new(vec![x_markers(&t.b)]);
    let markers_a = InMemoryMarkers::new(t.a.to_vec());
    let markers_b = InMemoryMarkers::new(vec![t.b[0]]);

    let err = SequencePair::from_sources(
        rig(),
        CameraPair::new(&frames_a as &dyn FrameSource, &frames_b as &dyn FrameSource),
        CameraPair::new(&markers_a as &dyn MarkerSource, &markers_b as &dyn MarkerSource),
        &SubPixParams::default(),
        &EpipolarPairResolver,
    )
    .unwrap_err();

    assert!(matches!(err, SequenceError::MarkerCountMismatch { a: 2, b: 1 }));
}

#[test]
fn loads_sequence_folder_from_disk() {
    let _ = env_logger::builder().is_test(true).try_init();
    let t = truth();
    let dir = tempfile::tempdir().expect("tempdir");
    for (camera, sub) in [(Camera::A, "MarkerSequence_1"), (Camera::B, "MarkerSequence_2")] {
        let frames_dir = dir.path().join(sub);
        std::fs::create_dir(&frames_dir).expect("mkdir");
        let frame = x_markers(&t[camera]);
        for i in 0..2 {
            image::GrayImage::from_raw(W as u32, H as u32, frame.data.clone())
                .expect("buffer size")
                .save(frames_dir.join(format!("frame_{i:03}.png")))
                .expect("save png");
        }
    }
    std::fs::write(dir.path().join("markers1.csv"), "240,200\n420,300\n").expect("write");
    std::fs::write(dir.path().join("markers2.csv"), "380,300\n200,200\n").expect("write");

    let seq = SequencePair::load_dir(dir.path(), rig()).expect("load sequence");
    assert_eq!(seq.num_frames(), 2);
    assert_eq!(seq.frames_at(0).expect("camera A").len(), 2);
    assert!(matches!(seq.frames_at(2), Err(CameraIndexError(2))));
    assert!(matches!(seq.markers_at(5), Err(CameraIndexError(5))));
    let b = seq.markers(Camera::B);
    assert!((b[0] - t.b[0]).norm() < 0.1);
}

#[test]
fn missing_marker_file_names_the_camera() {
    let t = truth();
    let dir = tempfile::tempdir().expect("tempdir");
    for (camera, sub) in [(Camera::A, "MarkerSequence_1"), (Camera::B, "MarkerSequence_2")] {
        let frames_dir = dir.path().join(sub);
        std::fs::create_dir(&frames_dir).expect("mkdir");
        let frame = x_markers(&t[camera]);
        image::GrayImage::from_raw(W as u32, H as u32, frame.data)
            .expect("buffer size")
            .save(frames_dir.join("frame_000.png"))
            .expect("save png");
    }
    std::fs::write(dir.path().join("markers1.csv"), "240,200\n420,300\n").expect("write");

    let err = SequencePair::load_dir(dir.path(), rig()).unwrap_err();
    assert!(matches!(
        err,
        SequenceError::Markers {
            camera: Camera::B,
            source: MatrixError::Load { .. }
        }
    ));
    // Each level of the chain names its own context once.
    assert_eq!(err.to_string(), "failed to load markers of camera B");
    let cause = err.source().expect("load error").to_string();
    assert!(cause.contains("markers2.csv"), "{cause}");
    assert!(!err.to_string().contains(&cause));
}

#[test]
fn keep_order_resolver_accepts_any_marker_count() {
    let a = [Point2::new(240.0, 200.0), Point2::new(420.0, 300.0), Point2::new(330.0, 120.0)];
    let b = [Point2::new(380.0, 300.0), Point2::new(200.0, 200.0), Point2::new(290.0, 120.0)];
    let frames_a = InMemorySource::new(vec![x_markers(&a)]);
    let frames_b = InMemorySource::new(vec![x_markers(&b)]);
    let markers_a = InMemoryMarkers::new(a.to_vec());
    let markers_b = InMemoryMarkers::new(b.to_vec());
    let frames = CameraPair::new(&frames_a as &dyn FrameSource, &frames_b as &dyn FrameSource);
    let markers = CameraPair::new(&markers_a as &dyn MarkerSource, &markers_b as &dyn MarkerSource);

    let err = SequencePair::from_sources(rig(), frames, markers, &SubPixParams::default(), &EpipolarPairResolver)
        .unwrap_err();
    assert!(matches!(err, SequenceError::Correspondence(_)));

    let seq = SequencePair::from_sources(rig(), frames, markers, &SubPixParams::default(), &KeepOrder)
        .expect("sequence");
    assert_eq!(seq.num_markers(), 3);
    for (got, want) in seq.markers(Camera::B).iter().zip(b.iter()) {
        assert!((got - want).norm() < 0.1, "{got} vs {want}");
    }
}
