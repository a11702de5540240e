//! Gaussian image pyramid for coarse-to-fine tracking.

use marker_motion_core::GrayImageView;

const KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Single-channel `f32` raster. Reads outside the image clamp to the border.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn from_gray(img: &GrayImageView<'_>) -> Self {
        Self {
            width: img.width,
            height: img.height,
            data: img.data.iter().map(|&v| v as f32).collect(),
        }
    }

    #[inline]
    fn at(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.data[y * self.width + x]
    }

    /// Bilinear sample at a sub-pixel position.
    #[inline]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as isize, y0 as isize);

        let p00 = self.at(x0, y0);
        let p10 = self.at(x0 + 1, y0);
        let p01 = self.at(x0, y0 + 1);
        let p11 = self.at(x0 + 1, y0 + 1);

        let top = p00 + fx * (p10 - p00);
        let bottom = p01 + fx * (p11 - p01);
        top + fy * (bottom - top)
    }

    /// Blur with the 5-tap binomial kernel and keep every second pixel.
    fn downsample(&self) -> Self {
        let w = self.width.div_ceil(2);
        let h = self.height.div_ceil(2);

        let mut rows = vec![0.0f32; w * self.height];
        for y in 0..self.height {
            for x in 0..w {
                let cx = 2 * x as isize;
                rows[y * w + x] = KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, wk)| wk * self.at(cx + k as isize - 2, y as isize))
                    .sum();
            }
        }

        let mut data = vec![0.0f32; w * h];
        let last = self.height as isize - 1;
        for y in 0..h {
            let cy = 2 * y as isize;
            for x in 0..w {
                data[y * w + x] = KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, wk)| {
                        let yy = (cy + k as isize - 2).clamp(0, last) as usize;
                        wk * rows[yy * w + x]
                    })
                    .sum();
            }
        }
        Self {
            width: w,
            height: h,
            data,
        }
    }
}

/// Level 0 is the full-resolution image; level `l` is downsampled by `2^l`.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<FloatImage>,
}

impl ImagePyramid {
    /// Build up to `max_level` coarser levels, stopping early before a level
    /// would be smaller than `min_size` in either direction.
    pub fn build(img: &GrayImageView<'_>, max_level: usize, min_size: usize) -> Self {
        let mut levels = vec![FloatImage::from_gray(img)];
        while levels.len() <= max_level {
            let Some(last) = levels.last() else { break };
            if last.width.div_ceil(2) < min_size || last.height.div_ceil(2) < min_size {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        Self { levels }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, index: usize) -> Option<&FloatImage> {
        self.levels.get(index)
    }

    pub fn levels(&self) -> &[FloatImage] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use marker_motion_core::GrayImage;

    #[test]
    fn halves_until_window_no_longer_fits() {
        let img = GrayImage::filled(100, 60, 7);
        let pyr = ImagePyramid::build(&img.view(), 5, 11);
        let sizes: Vec<(usize, usize)> = pyr.levels().iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, [(100, 60), (50, 30), (25, 15)]);
    }

    #[test]
    fn respects_max_level() {
        let img = GrayImage::filled(256, 256, 7);
        assert_eq!(ImagePyramid::build(&img.view(), 2, 1).num_levels(), 3);
        assert_eq!(ImagePyramid::build(&img.view(), 0, 1).num_levels(), 1);
    }

    #[test]
    fn constant_image_stays_constant() {
        let img = GrayImage::filled(33, 17, 90);
        let pyr = ImagePyramid::build(&img.view(), 3, 2);
        for level in pyr.levels() {
            for &v in &level.data {
                assert_abs_diff_eq!(v, 90.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn sampling_clamps_and_interpolates() {
        let img = FloatImage {
            width: 2,
            height: 1,
            data: vec![0.0, 10.0],
        };
        assert_eq!(img.sample(0.5, 0.0), 5.0);
        assert_eq!(img.sample(-3.0, 0.0), 0.0);
        assert_eq!(img.sample(7.0, 4.0), 10.0);
    }
}
