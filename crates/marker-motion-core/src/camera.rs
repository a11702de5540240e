use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the two rig cameras. Camera A is the reconstruction reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Camera {
    A,
    B,
}

impl Camera {
    pub const BOTH: [Camera; 2] = [Camera::A, Camera::B];

    /// Numeric slot, `0` for A and `1` for B.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Camera::A => 0,
            Camera::B => 1,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, CameraIndexError> {
        match index {
            0 => Ok(Camera::A),
            1 => Ok(Camera::B),
            other => Err(CameraIndexError(other)),
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Camera::A => f.write_str("camera A"),
            Camera::B => f.write_str("camera B"),
        }
    }
}

/// Camera index outside `{0, 1}`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("camera index {0} is out of range, there are only two cameras")]
pub struct CameraIndexError(pub usize);

/// Fixed two-slot container holding one value per camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraPair<T> {
    pub a: T,
    pub b: T,
}

impl<T> CameraPair<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Bounds-checked numeric access.
    pub fn get(&self, index: usize) -> Result<&T, CameraIndexError> {
        Camera::from_index(index).map(|camera| &self[camera])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, CameraIndexError> {
        let camera = Camera::from_index(index)?;
        Ok(&mut self[camera])
    }

    pub fn as_ref(&self) -> CameraPair<&T> {
        CameraPair::new(&self.a, &self.b)
    }

    pub fn map<U, F: FnMut(Camera, T) -> U>(self, mut f: F) -> CameraPair<U> {
        CameraPair {
            a: f(Camera::A, self.a),
            b: f(Camera::B, self.b),
        }
    }

    /// Like [`map`](Self::map) but short-circuits on the first error (camera A first).
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<CameraPair<U>, E>
    where
        F: FnMut(Camera, T) -> Result<U, E>,
    {
        let a = f(Camera::A, self.a)?;
        let b = f(Camera::B, self.b)?;
        Ok(CameraPair { a, b })
    }

    pub fn into_array(self) -> [T; 2] {
        [self.a, self.b]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Camera, &T)> {
        [(Camera::A, &self.a), (Camera::B, &self.b)].into_iter()
    }
}

impl<T> Index<Camera> for CameraPair<T> {
    type Output = T;

    #[inline]
    fn index(&self, camera: Camera) -> &T {
        match camera {
            Camera::A => &self.a,
            Camera::B => &self.b,
        }
    }
}

impl<T> IndexMut<Camera> for CameraPair<T> {
    #[inline]
    fn index_mut(&mut self, camera: Camera) -> &mut T {
        match camera {
            Camera::A => &mut self.a,
            Camera::B => &mut self.b,
        }
    }
}
