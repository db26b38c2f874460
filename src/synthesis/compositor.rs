use image::{DynamicImage, RgbImage};
use ndarray::{Array3, Axis, Zip};
use rand::Rng;

use crate::{
    CompositeResult, IntensityRange,
    error::{Result, SynthesisError},
    image_utils::{mask_to_array, rgb_to_unit_array, unit_array_to_rgb},
};

pub struct ShadowCompositor {
    range: IntensityRange,
}

impl ShadowCompositor {
    pub fn new(range: IntensityRange) -> Result<Self> {
        range.validate()?;
        Ok(Self { range })
    }

    pub fn range(&self) -> IntensityRange {
        self.range
    }

    pub fn sample_intensity<R: Rng>(&self, rng: &mut R) -> f64 {
        let IntensityRange { low, high } = self.range;
        if low == high {
            return low;
        }
        rng.random_range(low..=high)
    }

    // `1 - M / 255`: bright mask pixels become 0, dark ones 1.
    pub fn mask_field(mask: &DynamicImage) -> Array3<f64> {
        mask_to_array(mask).mapv(|v| 1.0 - v / 255.0)
    }

    pub fn attenuation(field: &Array3<f64>, intensity: f64) -> Array3<f64> {
        field.mapv(|m| intensity + (1.0 - intensity) * m)
    }

    pub fn broadcast(
        attenuation: Array3<f64>,
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Array3<f64>> {
        let (h, w, c) = attenuation.dim();

        if (h, w) != (height, width) {
            return Err(SynthesisError::ShapeMismatch(format!(
                "mask is {w}x{h}, document is {width}x{height}"
            )));
        }

        if c == channels {
            return Ok(attenuation);
        }

        if c != 1 {
            return Err(SynthesisError::ShapeMismatch(format!(
                "cannot broadcast a {c}-channel mask to {channels} channels"
            )));
        }

        attenuation
            .broadcast((height, width, channels))
            .map(|view| view.to_owned())
            .ok_or_else(|| {
                SynthesisError::ShapeMismatch(format!(
                    "cannot broadcast a single-channel mask to {channels} channels"
                ))
            })
    }

    pub fn composite(
        &self,
        document: &RgbImage,
        mask: &DynamicImage,
        intensity: f64,
    ) -> Result<CompositeResult> {
        let doc = rgb_to_unit_array(document);
        let (height, width, channels) = doc.dim();

        let field = Self::mask_field(mask);
        let attenuation = Self::broadcast(
            Self::attenuation(&field, intensity),
            height,
            width,
            channels,
        )?;

        let mut shadowed = doc;
        Zip::from(&mut shadowed)
            .and(&attenuation)
            .for_each(|d, &a| *d *= a);

        let adjusted = attenuation.mapv(|a| 1.0 - a);

        debug_assert_eq!(adjusted.len_of(Axis(2)), 3);

        Ok(CompositeResult {
            shadowed: unit_array_to_rgb(&shadowed)?,
            adjusted_mask: unit_array_to_rgb(&adjusted)?,
            intensity,
        })
    }

    pub fn composite_random<R: Rng>(
        &self,
        document: &RgbImage,
        mask: &DynamicImage,
        rng: &mut R,
    ) -> Result<CompositeResult> {
        let intensity = self.sample_intensity(rng);
        log::debug!("Sampled shadow intensity {intensity:.4}");
        self.composite(document, mask, intensity)
    }
}

impl Default for ShadowCompositor {
    fn default() -> Self {
        Self {
            range: IntensityRange::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbaImage, Rgba};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn gray_mask(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    fn gradient_document() -> RgbImage {
        RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        })
    }

    #[test]
    fn test_white_mask_leaves_document_untouched() {
        let compositor = ShadowCompositor::default();
        let document = gradient_document();
        let result = compositor
            .composite(&document, &gray_mask(16, 16, 0), 0.15)
            .unwrap();

        assert_eq!(result.shadowed, document);
        assert!(result.adjusted_mask.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_full_shadow_scales_by_intensity() {
        let compositor = ShadowCompositor::default();
        let document = gradient_document();
        let intensity = 0.37;
        let result = compositor
            .composite(&document, &gray_mask(16, 16, 255), intensity)
            .unwrap();

        for (orig, shadowed) in document.pixels().zip(result.shadowed.pixels()) {
            for c in 0..3 {
                let expected = (orig[c] as f64 * intensity + 1e-9) as u8;
                assert_eq!(shadowed[c], expected);
            }
        }
    }

    #[test]
    fn test_attenuation_bounds() {
        let field = Array3::from_shape_fn((4, 4, 1), |(y, x, _)| (y * 4 + x) as f64 / 15.0);
        let attenuation = ShadowCompositor::attenuation(&field, 0.3);
        assert!(attenuation.iter().all(|&a| a >= 0.3 - 1e-12 && a <= 1.0 + 1e-12));
        assert_eq!(attenuation[[0, 0, 0]], 0.3);
        assert!((attenuation[[3, 3, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_adjusted_mask_inverts_attenuation() {
        let compositor = ShadowCompositor::default();
        let mask = DynamicImage::ImageLuma8(GrayImage::from_fn(16, 16, |x, y| {
            Luma([(x * 16 + y) as u8])
        }));
        let intensity = 0.42;
        let result = compositor
            .composite(&gradient_document(), &mask, intensity)
            .unwrap();
        let attenuation =
            ShadowCompositor::attenuation(&ShadowCompositor::mask_field(&mask), intensity);

        for (x, y, pixel) in result.adjusted_mask.enumerate_pixels() {
            let a = attenuation[[y as usize, x as usize, 0]];
            let recovered = 1.0 - pixel[0] as f64 / 255.0;
            assert!((recovered - a).abs() <= 1.0 / 255.0 + 1e-9);
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn test_four_by_four_half_intensity() {
        let compositor = ShadowCompositor::default();
        let document = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mask = gray_mask(4, 4, 255);
        let result = compositor.composite(&document, &mask, 0.5).unwrap();

        assert!(result.shadowed.pixels().all(|p| p.0 == [127, 127, 127]));
        assert!(result.adjusted_mask.pixels().all(|p| p.0 == [127, 127, 127]));
    }

    #[test]
    fn test_colour_mask_applies_per_channel() {
        let compositor = ShadowCompositor::default();
        let document = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));
        let mask = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 255, 9])));
        let result = compositor.composite(&document, &mask, 0.5).unwrap();

        assert!(result.shadowed.pixels().all(|p| p.0 == [100, 200, 100]));
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let compositor = ShadowCompositor::default();
        let err = compositor
            .composite(&gradient_document(), &gray_mask(8, 16, 0), 0.5)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ShapeMismatch(_)));
    }

    #[test]
    fn test_broadcast_rejects_two_channels() {
        let field = Array3::<f64>::ones((2, 2, 2));
        assert!(ShadowCompositor::broadcast(field, 2, 2, 3).is_err());
    }

    #[test]
    fn test_sampled_intensity_stays_in_range() {
        let compositor = ShadowCompositor::default();
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..10_000 {
            let intensity = compositor.sample_intensity(&mut rng);
            assert!((0.15..=0.8).contains(&intensity));
        }
    }

    #[test]
    fn test_degenerate_range_returns_bound() {
        let compositor = ShadowCompositor::new(IntensityRange::new(0.6, 0.6)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(compositor.sample_intensity(&mut rng), 0.6);
    }
}
