//! Image preprocessing for the human detection network.
//!
use image::{imageops::FilterType, DynamicImage, Rgba32FImage, RgbImage};
use tract_onnx::prelude::*;

/// Width and height of the square network input.
pub const INPUT_SIZE: u32 = 64;

/// Number of color channels of the network input.
pub const INPUT_CHANNELS: usize = 3;

/// Turn a decoded image of any size and color mode into the `(1, 64, 64, 3)` input tensor.
///
/// The image is stretched to 64x64 without keeping its aspect ratio, since the model was
/// trained on stretched inputs. Grayscale is expanded to RGB. Images with alpha are resampled
/// premultiplied before alpha is dropped, so fully transparent areas turn black. Intensities are
/// then scaled to `[0, 1]`.
pub fn preprocess(image: &DynamicImage) -> Tensor {
    let rgb = resize_to_rgb(image);

    tract_ndarray::Array4::from_shape_fn(
        (1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS),
        |(_, y, x, c)| rgb[(x as _, y as _)][c] as f32 / 255.0,
    )
    .into()
}

fn resize_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image
            .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
            .to_rgb8();
    }

    // Resample with premultiplied alpha, colors under transparent pixels must not leak
    let mut premultiplied: Rgba32FImage = image.to_rgba32f();
    for pixel in premultiplied.pixels_mut() {
        let alpha = pixel[3];
        for c in 0..3 {
            pixel[c] *= alpha;
        }
    }

    let mut resized = image::imageops::resize(
        &premultiplied,
        INPUT_SIZE,
        INPUT_SIZE,
        FilterType::CatmullRom,
    );
    for pixel in resized.pixels_mut() {
        let alpha = pixel[3];
        for c in 0..3 {
            pixel[c] = match alpha {
                a if a > 0.0 => (pixel[c] / a).clamp(0.0, 1.0),
                _ => 0.0,
            };
        }
    }

    DynamicImage::ImageRgba32F(resized).to_rgb8()
}
