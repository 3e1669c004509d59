use common::{Rgb565, BLUE_BITS, GREEN_BITS, RED_BITS, RGBA_BYTES_PER_PIXEL};

use crate::decode::DecodedImage;

/// Progress units one image is worth, spread over its channel bytes.
const UNITS_PER_IMAGE_BYTES: f64 = 400.0;

/// Scales an 8 bit channel down to `bits`, rounding half away from zero.
pub fn quantize_channel(value: u8, bits: u32) -> u8 {
    let max = f64::from((1u16 << bits) - 1);
    (max * f64::from(value) / 255.0).round() as u8
}

pub fn pack(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::from_components(
        quantize_channel(r, RED_BITS),
        quantize_channel(g, GREEN_BITS),
        quantize_channel(b, BLUE_BITS),
    )
}

/// Converts every pixel in scan order, alpha is ignored.
///
/// `report` is called once per pixel with the progress units that pixel is worth, which adds up to
/// 100 units for the whole image.
pub fn quantize(image: &DecodedImage, mut report: impl FnMut(f64)) -> Vec<Rgb565> {
    let bytes = image.pixels();
    let increment = UNITS_PER_IMAGE_BYTES / bytes.len() as f64;

    let mut packed = Vec::with_capacity(image.pixel_count());
    for px in bytes.chunks_exact(RGBA_BYTES_PER_PIXEL) {
        let [r, g, b, _a] = [px[0], px[1], px[2], px[3]];
        packed.push(pack(r, g, b));
        report(increment);
    }
    packed
}
