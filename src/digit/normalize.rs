//! Turns an uploaded drawing into the 28x28 input grid the classifier was trained on.

use image::{imageops::FilterType, DynamicImage, GrayImage, ImageError, ImageReader, Luma};
use std::io::Cursor;

pub const SIDE: u32 = 28;

/// Mean luma above which a canvas counts as untouched.
const BLANK_MEAN_THRESHOLD: f64 = 250.0;
/// Inverted pixels strictly above this become ink.
const INK_THRESHOLD: u8 = 128;

/// Row-major `[1, 28, 28]` grid with every value in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    values: Vec<f32>,
}

impl ImageTensor {
    pub const SHAPE: [usize; 3] = [1, SIDE as usize, SIDE as usize];

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[cfg(test)]
    pub(crate) fn from_values(values: Vec<f32>) -> Self {
        assert_eq!(values.len(), (SIDE * SIDE) as usize);
        Self { values }
    }
}

/// ITU-R 601 luma in 16-bit fixed point, rounded.
fn to_luma601(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471;
        Luma([((weighted + 0x8000) >> 16) as u8])
    })
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
}

/// True when the original image is almost entirely white.
pub fn is_blank(image: &DynamicImage) -> bool {
    let gray = to_luma601(image);
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return true;
    }

    let sum: u64 = gray.as_raw().iter().map(|&v| u64::from(v)).sum();
    sum as f64 / count as f64 > BLANK_MEAN_THRESHOLD
}

/// Grayscale, resize to 28x28, invert, binarize, scale to `[0, 1]`.
pub fn normalize(image: &DynamicImage) -> ImageTensor {
    let gray = to_luma601(image);
    let resized = image::imageops::resize(&gray, SIDE, SIDE, FilterType::CatmullRom);

    let values = resized
        .pixels()
        .map(|p| {
            let inverted = 255 - p.0[0];
            if inverted > INK_THRESHOLD { 1.0 } else { 0.0 }
        })
        .collect();

    ImageTensor { values }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    const PIXELS: usize = (SIDE * SIDE) as usize;

    fn at(tensor: &ImageTensor, row: usize, col: usize) -> f32 {
        tensor.as_slice()[row * SIDE as usize + col]
    }

    pub(crate) fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    /// White canvas with a thick black vertical stroke down the middle.
    pub(crate) fn drawn_digit() -> DynamicImage {
        let mut img = RgbImage::from_pixel(280, 280, Rgb([255, 255, 255]));
        for y in 40..240 {
            for x in 120..160 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn white_canvas_is_blank() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 200, Luma([255])));
        assert!(is_blank(&img));
    }

    #[test]
    fn black_canvas_is_not_blank() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 200, Luma([0])));
        assert!(!is_blank(&img));
    }

    #[test]
    fn drawn_digit_is_not_blank() {
        assert!(!is_blank(&drawn_digit()));
    }

    #[test]
    fn faint_marks_still_count_as_blank() {
        let mut img = GrayImage::from_pixel(100, 100, Luma([255]));
        img.put_pixel(50, 50, Luma([0]));
        assert!(is_blank(&DynamicImage::ImageLuma8(img)));
    }

    #[test]
    fn luma_uses_601_weights() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        img.put_pixel(3, 0, Rgb([255, 255, 255]));

        let gray = to_luma601(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray.as_raw(), &vec![76, 150, 29, 255]);
    }

    #[test]
    fn gray_input_keeps_its_levels() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([200])));
        assert!(to_luma601(&img).as_raw().iter().all(|&v| v == 200));
    }

    #[test]
    fn red_stroke_counts_as_ink() {
        // 601 luma of pure red is 76, inverted 179, above the ink threshold.
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(56, 56, Rgb([255, 0, 0])));
        assert!(normalize(&img).as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn normalized_values_are_binary() {
        let tensor = normalize(&drawn_digit());

        assert_eq!(tensor.as_slice().len(), PIXELS);
        assert!(tensor.as_slice().iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn ink_becomes_foreground() {
        let tensor = normalize(&drawn_digit());

        assert_eq!(at(&tensor, 14, 14), 1.0);
        assert_eq!(at(&tensor, 0, 0), 0.0);
        assert_eq!(at(&tensor, 14, 2), 0.0);
    }

    #[test]
    fn non_square_input_is_stretched() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(90, 30, Luma([0])));
        let tensor = normalize(&img);

        assert_eq!(tensor.as_slice().len(), PIXELS);
        assert!(tensor.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn decode_round_trips_png() {
        let decoded = decode(&png_bytes(&drawn_digit())).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (280, 280));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
