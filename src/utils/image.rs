//! Image decoding helpers

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use crate::error::{Result, ScreeningError};

/// Decode an encoded image (PNG, JPEG, ...) and apply its EXIF orientation.
///
/// Phone cameras often store a rotation tag instead of rotating pixels; the
/// spiral must reach the model upright.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(ScreeningError::decode_msg("image data is empty"));
    }

    let image = image::load_from_memory(data)
        .map_err(|e| ScreeningError::decode("cannot decode image data", e))?;

    Ok(apply_exif_orientation(data, image))
}

/// Read and decode an image file.
pub fn load_image_file(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        ScreeningError::decode(format!("cannot read image {}", path.display()), e)
    })?;
    decode_image(&data)
}

/// EXIF orientation tag (1..=8), if the container carries one.
fn exif_orientation(data: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)
}

fn apply_exif_orientation(data: &[u8], image: DynamicImage) -> DynamicImage {
    let Some(orientation @ 2..=8) = exif_orientation(data) else {
        return image;
    };
    debug!("Applying EXIF orientation {}", orientation);

    // Each tag is a clockwise rotation, then an optional mirror.
    let rotated = match orientation {
        3 | 4 => image.rotate180(),
        5 | 6 => image.rotate90(),
        7 | 8 => image.rotate270(),
        _ => image,
    };
    if matches!(orientation, 2 | 4 | 5 | 7) {
        rotated.fliph()
    } else {
        rotated
    }
}
