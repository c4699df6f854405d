//! PDF page rotation functionality

use super::PageRange;
use crate::document::Document;
use crate::error::{PdfError, Result};

/// Rotation angle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAngle {
    /// No rotation (0 degrees)
    None,
    /// 90 degrees clockwise
    Clockwise90,
    /// 180 degrees
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Clockwise270,
}

impl RotationAngle {
    /// Create from degrees; any multiple of 90, including negative ones.
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(RotationAngle::None),
            90 => Ok(RotationAngle::Clockwise90),
            180 => Ok(RotationAngle::Rotate180),
            270 => Ok(RotationAngle::Clockwise270),
            _ => Err(PdfError::InvalidRotation(degrees)),
        }
    }

    /// Convert to degrees
    pub fn to_degrees(self) -> i64 {
        match self {
            RotationAngle::None => 0,
            RotationAngle::Clockwise90 => 90,
            RotationAngle::Rotate180 => 180,
            RotationAngle::Clockwise270 => 270,
        }
    }

    /// Combine two rotations
    pub fn combine(self, other: RotationAngle) -> RotationAngle {
        match (self.to_degrees() + other.to_degrees()).rem_euclid(360) {
            90 => RotationAngle::Clockwise90,
            180 => RotationAngle::Rotate180,
            270 => RotationAngle::Clockwise270,
            _ => RotationAngle::None,
        }
    }
}

/// Rotate the pages selected by `pages` in place.
///
/// The angle and every selected index are validated before any page is
/// touched.
pub fn rotate_pages(document: &mut Document, pages: &PageRange, degrees: i64) -> Result<()> {
    let angle = RotationAngle::from_degrees(degrees)?;
    let indices = pages.get_indices(document.page_count()?)?;
    document.rotate_pages(&indices, angle.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::test_helpers::{build_pdf, PdfSource};

    #[test]
    fn test_rotation_angle_from_degrees() {
        assert_eq!(RotationAngle::from_degrees(0).unwrap(), RotationAngle::None);
        assert_eq!(RotationAngle::from_degrees(450).unwrap(), RotationAngle::Clockwise90);
        assert_eq!(RotationAngle::from_degrees(-90).unwrap(), RotationAngle::Clockwise270);
        assert_eq!(
            RotationAngle::from_degrees(30).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_combine() {
        assert_eq!(
            RotationAngle::Clockwise270.combine(RotationAngle::Rotate180),
            RotationAngle::Clockwise90
        );
        assert_eq!(
            RotationAngle::Clockwise90.combine(RotationAngle::Clockwise270),
            RotationAngle::None
        );
    }

    #[test]
    fn test_rotate_selected_pages() {
        let mut doc =
            Document::parse(build_pdf(&PdfSource::pages(&[b"", b"", b""]))).unwrap();
        rotate_pages(&mut doc, &PageRange::List(vec![0, 2]), -90).unwrap();
        let rotations: Vec<i64> = doc.pages().unwrap().iter().map(|p| p.rotation()).collect();
        assert_eq!(rotations, vec![270, 0, 270]);
    }

    #[test]
    fn test_rotate_out_of_range_changes_nothing() {
        let mut doc = Document::parse(build_pdf(&PdfSource::pages(&[b"", b""]))).unwrap();
        let err = rotate_pages(&mut doc, &PageRange::Range(0, 4), 90).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(doc.page(0).unwrap().rotation(), 0);
    }
}
