//! EXIF orientation lookup.

use exif::{In, Reader, Tag};
use tracing::debug;

use super::{ImageHandle, Orientation};

/// Read the EXIF orientation of an encoded image.
///
/// Returns `Orientation::Normal` if the file cannot be opened, carries no
/// EXIF data, or the orientation tag is missing or not a pure rotation.
pub fn read_orientation(handle: &ImageHandle) -> Orientation {
    let mut reader = match handle.open() {
        Ok(reader) => reader,
        Err(e) => {
            debug!(%handle, error = %e, "Could not open image for EXIF, assuming normal orientation");
            return Orientation::Normal;
        }
    };

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(%handle, error = %e, "Could not read EXIF, assuming normal orientation");
            return Orientation::Normal;
        }
    };

    let raw = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0));
    let orientation = raw.map(Orientation::from_exif).unwrap_or_default();
    debug!(%handle, exif_value = ?raw, ?orientation, "Read EXIF orientation");
    orientation
}
