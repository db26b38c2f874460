use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array3;

use crate::error::{Result, SynthesisError};

// Absorbs float representation error before truncation, so that values which are
// mathematically integral (e.g. `200 / 255 * 0.5 * 255`) do not drop by one.
pub const QUANTIZE_EPSILON: f64 = 1e-9;

pub fn unit_to_u8(value: f64) -> u8 {
    (value * 255.0 + QUANTIZE_EPSILON).clamp(0.0, 255.0) as u8
}

pub fn rgb_to_unit_array(image: &RgbImage) -> Array3<f64> {
    let (width, height) = image.dimensions();

    Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
        image.get_pixel(x as u32, y as u32)[c] as f64 / 255.0
    })
}

pub fn unit_array_to_rgb(arr: &Array3<f64>) -> Result<RgbImage> {
    let (height, width, channels) = arr.dim();
    if channels != 3 {
        return Err(SynthesisError::ShapeMismatch(format!(
            "expected 3 channels for an RGB raster, got {channels}"
        )));
    }

    let mut image = RgbImage::new(width as u32, height as u32);

    for y in 0..height {
        for x in 0..width {
            let pixel = Rgb([
                unit_to_u8(arr[[y, x, 0]]),
                unit_to_u8(arr[[y, x, 1]]),
                unit_to_u8(arr[[y, x, 2]]),
            ]);
            image.put_pixel(x as u32, y as u32, pixel);
        }
    }

    Ok(image)
}

// Raw 0-255 channel values of a mask raster. Colour masks keep their three
// channels, everything else collapses to one luma channel. Alpha is dropped.
pub fn mask_to_array(mask: &DynamicImage) -> Array3<f64> {
    if mask.color().has_color() {
        let rgb = mask.to_rgb8();
        let (width, height) = rgb.dimensions();
        Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f64
        })
    } else {
        let gray = mask.to_luma8();
        let (width, height) = gray.dimensions();
        Array3::from_shape_fn((height as usize, width as usize, 1), |(y, x, _)| {
            gray.get_pixel(x as u32, y as u32)[0] as f64
        })
    }
}
