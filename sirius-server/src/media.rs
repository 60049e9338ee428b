use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use sirius_types::AspectRatio;

const JPEG_QUALITY: u8 = 92;

/// Crop parameters: target aspect, zoom factor and normalized pan offsets.
#[derive(Debug, Clone, Copy)]
pub struct CropSpec {
    pub aspect: AspectRatio,
    /// >= 1.0; 1.0 means no zoom. Values below 1 are clamped up.
    pub zoom: f64,
    /// 0..1 per axis, 0.5 = centered. Clamped into range.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CropSpec {
    pub fn centered(aspect: AspectRatio) -> Self {
        Self {
            aspect,
            zoom: 1.0,
            offset_x: 0.5,
            offset_y: 0.5,
        }
    }
}

/// A re-encoded crop result
pub struct CroppedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Source crop rectangle for the given raster and spec: the largest rect of
/// the target ratio that fits, shrunk by the zoom factor and positioned by
/// the pan offsets. Always stays inside the source bounds.
pub fn crop_rect(src_w: u32, src_h: u32, spec: &CropSpec) -> (u32, u32, u32, u32) {
    let target = spec.aspect.ratio();
    let zoom = spec.zoom.max(1.0);
    let ox = spec.offset_x.clamp(0.0, 1.0);
    let oy = spec.offset_y.clamp(0.0, 1.0);

    let (src_wf, src_hf) = (f64::from(src_w), f64::from(src_h));
    let source_ratio = src_wf / src_hf;

    let (mut crop_w, mut crop_h) = if source_ratio > target {
        // Too wide: full height, trim the sides
        (target * src_hf, src_hf)
    } else {
        // Too tall: full width, trim top/bottom
        (src_wf, src_wf / target)
    };

    crop_w /= zoom;
    crop_h /= zoom;

    let crop_w = (crop_w.round() as u32).clamp(1, src_w);
    let crop_h = (crop_h.round() as u32).clamp(1, src_h);

    let x = (ox * f64::from(src_w - crop_w)).round() as u32;
    let y = (oy * f64::from(src_h - crop_h)).round() as u32;

    (x, y, crop_w, crop_h)
}

/// Crop image bytes to the spec and re-encode as JPEG.
///
/// Pure and synchronous per file; the output raster is scaled down to the
/// aspect's maximum width, never up. Callers pass non-image payloads through
/// untouched instead of calling this.
pub fn crop_to_aspect(bytes: &[u8], spec: &CropSpec) -> Result<CroppedImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode image for cropping")?;
    let (src_w, src_h) = img.dimensions();

    let (x, y, crop_w, crop_h) = crop_rect(src_w, src_h, spec);
    let cropped = img.crop_imm(x, y, crop_w, crop_h);

    let max_w = spec.aspect.max_output_width();
    let resized = if crop_w > max_w {
        let out_h = ((f64::from(crop_h) * f64::from(max_w) / f64::from(crop_w)).round() as u32)
            .max(1);
        cropped.resize_exact(max_w, out_h, FilterType::Triangle)
    } else {
        cropped
    };

    let rgb = resized.to_rgb8();
    let (out_w, out_h) = rgb.dimensions();

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .context("Failed to encode cropped image")?;

    Ok(CroppedImage {
        bytes: out,
        width: out_w,
        height: out_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("Failed to encode test image");
        out
    }

    #[test]
    fn test_center_square_crop_of_landscape_source() {
        let bytes = encode_test_png(4000, 3000);
        let result = crop_to_aspect(&bytes, &CropSpec::centered(AspectRatio::Square))
            .expect("Failed to crop");

        assert_eq!(result.width, result.height, "1:1 output must be square");
        assert!(result.width <= 1080);
    }

    #[test]
    fn test_wide_crop_never_upscales() {
        let bytes = encode_test_png(640, 360);
        let result = crop_to_aspect(&bytes, &CropSpec::centered(AspectRatio::Wide))
            .expect("Failed to crop");

        assert_eq!(result.width, 640, "small sources keep their size");
        assert_eq!(result.height, 360);
    }

    #[test]
    fn test_zoom_shrinks_crop_rect() {
        let spec = CropSpec {
            aspect: AspectRatio::Square,
            zoom: 2.0,
            offset_x: 0.5,
            offset_y: 0.5,
        };
        let (x, y, w, h) = crop_rect(4000, 3000, &spec);
        assert_eq!((w, h), (1500, 1500));
        assert_eq!((x, y), (1250, 750));
    }

    #[test]
    fn test_offsets_are_clamped() {
        let spec = CropSpec {
            aspect: AspectRatio::Square,
            zoom: 1.0,
            offset_x: 7.0,
            offset_y: -3.0,
        };
        let (x, y, w, h) = crop_rect(4000, 3000, &spec);
        assert_eq!((w, h), (3000, 3000));
        assert_eq!(x, 1000, "offset 7.0 clamps to the right edge");
        assert_eq!(y, 0, "offset -3.0 clamps to the top edge");
    }

    #[test]
    fn test_sub_unit_zoom_clamps_to_one() {
        let a = crop_rect(1920, 1080, &CropSpec::centered(AspectRatio::Wide));
        let b = crop_rect(
            1920,
            1080,
            &CropSpec {
                zoom: 0.25,
                ..CropSpec::centered(AspectRatio::Wide)
            },
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_image_bytes_error() {
        assert!(crop_to_aspect(b"not an image", &CropSpec::centered(AspectRatio::Square)).is_err());
    }

    proptest! {
        #[test]
        fn prop_crop_rect_stays_in_bounds(
            src_w in 1u32..6000,
            src_h in 1u32..6000,
            zoom in 0.0f64..8.0,
            ox in -2.0f64..3.0,
            oy in -2.0f64..3.0,
        ) {
            let spec = CropSpec {
                aspect: AspectRatio::Square,
                zoom,
                offset_x: ox,
                offset_y: oy,
            };
            let (x, y, w, h) = crop_rect(src_w, src_h, &spec);
            prop_assert!(w >= 1 && h >= 1);
            prop_assert!(x + w <= src_w);
            prop_assert!(y + h <= src_h);
        }
    }
}
