//! Composite model input
//!
//! Three per-channel scalograms are resized to a common tile, placed side by
//! side, and the resulting plane is repeated across three color planes.

use std::path::Path;

use image::{GrayImage, Luma};
use ndarray::{s, Array2, Array4};
use tracing::debug;

use crate::cwt::CwtTransformer;
use crate::resample::zoom;
use crate::ScalogramError;

/// Number of signal channels and color planes
pub const CHANNELS: usize = 3;
/// Height of every tile and of the composite
pub const TARGET_HEIGHT: usize = 224;
/// Width of one tile; the composite is `CHANNELS * TARGET_WIDTH` wide
pub const TARGET_WIDTH: usize = 224 / CHANNELS;

/// Side-by-side scalogram plane
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    plane: Array2<f64>,
}

impl CompositeImage {
    pub fn plane(&self) -> &Array2<f64> {
        &self.plane
    }

    pub fn height(&self) -> usize {
        self.plane.nrows()
    }

    pub fn width(&self) -> usize {
        self.plane.ncols()
    }

    /// Model input tensor, shape (1, 3, height, width)
    pub fn to_tensor(&self) -> Array4<f32> {
        Array4::from_shape_fn((1, CHANNELS, self.height(), self.width()), |(_, _, r, c)| {
            self.plane[[r, c]] as f32
        })
    }

    /// Save the plane as an 8-bit grayscale PNG, values clamped to [0, 1]
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ScalogramError> {
        let img = GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let v = self.plane[[y as usize, x as usize]].clamp(0.0, 1.0);
            Luma([(v * 255.0).round() as u8])
        });
        img.save(path.as_ref())?;
        debug!("Saved scalogram to {}", path.as_ref().display());
        Ok(())
    }
}

/// Resize three channel images to (224, 74) each and join them left to right
pub fn assemble(images: &[Array2<f64>]) -> Result<CompositeImage, ScalogramError> {
    if images.len() != CHANNELS {
        return Err(ScalogramError::ChannelCount {
            expected: CHANNELS,
            actual: images.len(),
        });
    }

    let mut plane = Array2::zeros((TARGET_HEIGHT, CHANNELS * TARGET_WIDTH));
    for (i, image) in images.iter().enumerate() {
        let tile = zoom(image, (TARGET_HEIGHT, TARGET_WIDTH))?;
        debug!(
            "Resized channel {} from {:?} to {:?}",
            i + 1,
            image.dim(),
            tile.dim()
        );
        plane
            .slice_mut(s![.., i * TARGET_WIDTH..(i + 1) * TARGET_WIDTH])
            .assign(&tile);
    }

    debug!("Composite shape: {:?}", plane.dim());
    Ok(CompositeImage { plane })
}

/// Transform each channel and assemble the composite
pub fn from_channels(
    transformer: &mut CwtTransformer,
    channels: &[&[f64]],
) -> Result<CompositeImage, ScalogramError> {
    let images = channels
        .iter()
        .enumerate()
        .map(|(i, channel)| {
            debug!("Transforming channel {} ({} samples)", i + 1, channel.len());
            transformer.transform(channel)
        })
        .collect::<Result<Vec<_>, _>>()?;
    assemble(&images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cwt::CwtConfig;
    use proptest::prelude::*;

    #[test]
    fn test_width_truncates() {
        assert_eq!(TARGET_WIDTH, 74);
        let images = vec![Array2::from_elem((10, 10), 0.5); 3];
        let composite = assemble(&images).unwrap();
        assert_eq!((composite.height(), composite.width()), (224, 222));
    }

    #[test]
    fn test_channel_order() {
        let images = vec![
            Array2::from_elem((4, 6), 0.0),
            Array2::from_elem((5, 7), 0.5),
            Array2::from_elem((6, 8), 1.0),
        ];
        let composite = assemble(&images).unwrap();
        let plane = composite.plane();
        assert!(plane[[100, 10]].abs() < 1e-9);
        assert!((plane[[100, 74 + 10]] - 0.5).abs() < 1e-9);
        assert!((plane[[100, 148 + 10]] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_channel_count() {
        let images = vec![Array2::from_elem((4, 4), 0.0); 2];
        assert!(matches!(
            assemble(&images),
            Err(ScalogramError::ChannelCount {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_tensor_planes_identical() {
        let images = vec![
            Array2::from_shape_fn((8, 9), |(r, c)| (r + c) as f64 / 16.0),
            Array2::from_elem((3, 3), 0.2),
            Array2::from_elem((12, 5), 0.9),
        ];
        let tensor = assemble(&images).unwrap().to_tensor();
        assert_eq!(tensor.shape(), &[1, 3, 224, 222]);
        for r in [0, 57, 223] {
            for c in [0, 80, 221] {
                let v = tensor[[0, 0, r, c]];
                assert_eq!(tensor[[0, 1, r, c]], v);
                assert_eq!(tensor[[0, 2, r, c]], v);
            }
        }
    }

    #[test]
    fn test_from_channels_zero_signal() {
        let mut transformer = CwtTransformer::new(CwtConfig::default()).unwrap();
        let signal = vec![0.0; 90];
        let channels: Vec<&[f64]> = signal.chunks(30).collect();
        let composite = from_channels(&mut transformer, &channels).unwrap();
        assert_eq!(composite.width(), 222);
        assert!(composite.plane().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scalogram.png");
        let images = vec![Array2::from_elem((4, 4), 1.0); 3];
        assemble(&images).unwrap().save_png(&path).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (222, 224));
        assert_eq!(img.get_pixel(5, 5)[0], 255);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_composite_width_fixed(
            shapes in proptest::collection::vec((1usize..40, 1usize..60), 3)
        ) {
            let images: Vec<Array2<f64>> = shapes
                .iter()
                .map(|&(r, c)| Array2::from_shape_fn((r, c), |(i, j)| ((i + j) % 3) as f64 / 2.0))
                .collect();
            let composite = assemble(&images).unwrap();
            prop_assert_eq!(composite.width(), 3 * (224 / 3));
            prop_assert_eq!(composite.height(), 224);
        }
    }
}
