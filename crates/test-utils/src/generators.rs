//! Synthetic image generators.
//!
//! Map responses in tests are real encoded images so the batch pipeline can
//! decode, crop and save them like server output.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

/// Creates RGBA pixels with a predictable gradient.
///
/// Red grows left to right, green top to bottom, blue is constant.
pub fn create_test_rgba_pixels(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}

/// Encode a gradient image of the given size in `format`.
///
/// # Panics
///
/// Panics if encoding fails, which only happens for formats the `image`
/// crate was built without.
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let pixels = create_test_rgba_pixels(width, height);
    let img = RgbaImage::from_raw(width, height, pixels).expect("buffer matches dimensions");
    let mut out = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut out, format)
            .expect("encode test image"),
        _ => img.write_to(&mut out, format).expect("encode test image"),
    }
    out.into_inner()
}

/// Encode a gradient PNG of the given size.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    create_test_image(width, height, ImageFormat::Png)
}
