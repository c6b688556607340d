use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};

use super::TagContainer;
use crate::error::PhotoError;

/// Replace the EXIF APP1 segment of a JPEG with `container`.
///
/// Every other segment and the entropy-coded image data are copied through
/// unchanged.
pub fn embed(image: Vec<u8>, container: &TagContainer) -> Result<Vec<u8>, PhotoError> {
    let mut jpeg =
        Jpeg::from_bytes(Bytes::from(image)).map_err(|e| PhotoError::Container(e.to_string()))?;
    let tiff = container.to_tiff()?;
    jpeg.set_exif(Some(Bytes::from(tiff)));
    Ok(jpeg.encoder().bytes().to_vec())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metadata::{Coordinate, TagGroup, DATE_TIME_ORIGINAL};
    use exif::{In, Reader, Tag, Value};
    use std::io::Cursor;

    /// A real 16x16 baseline JPEG without any EXIF block.
    pub(crate) fn plain_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_fn(16, 16, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 128]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Jpeg)
            .unwrap();
        buf.into_inner()
    }

    /// A JPEG carrying the given EXIF fields.
    pub(crate) fn jpeg_with(container: &TagContainer) -> Vec<u8> {
        embed(plain_jpeg(), container).unwrap()
    }

    fn scan_data(jpeg: &[u8]) -> Vec<u8> {
        let parsed = Jpeg::from_bytes(Bytes::copy_from_slice(jpeg)).unwrap();
        parsed
            .segments()
            .iter()
            .filter(|s| s.marker() != 0xE1)
            .flat_map(|s| s.contents().to_vec())
            .collect()
    }

    #[test]
    fn test_embed_into_plain_jpeg() {
        let mut c = TagContainer::empty();
        c.set_coordinate(Coordinate {
            latitude: 35.6978689,
            longitude: 139.7731628,
        });
        let out = jpeg_with(&c);

        let exif = Reader::new().read_from_container(&mut Cursor::new(&out)).unwrap();
        let lat_ref = exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY).unwrap();
        assert!(matches!(&lat_ref.value, Value::Ascii(v) if v[0] == b"N"));
        let lon = exif.get_field(Tag::GPSLongitude, In::PRIMARY).unwrap();
        match &lon.value {
            Value::Rational(r) => {
                assert_eq!((r[0].num, r[0].denom), (139, 1));
                assert_eq!((r[1].num, r[1].denom), (46, 1));
                assert_eq!(r[2].denom, 10000);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_keeps_other_tags_and_image_data() {
        let mut c = TagContainer::empty();
        c.set(TagGroup::Primary, Tag::Model.number(), Value::Ascii(vec![b"X100".to_vec()]));
        c.set(
            TagGroup::Exif,
            DATE_TIME_ORIGINAL,
            Value::Ascii(vec![b"2025:09:13 17:05:00".to_vec()]),
        );
        let original = jpeg_with(&c);

        let mut container = TagContainer::read(&original);
        assert!(!container.has_gps());
        container.set_coordinate(Coordinate {
            latitude: -1.0,
            longitude: -2.0,
        });
        let rewritten = embed(original.clone(), &container).unwrap();

        let reread = TagContainer::read(&rewritten);
        assert!(reread.has_gps());
        assert_eq!(reread.ascii(TagGroup::Primary, Tag::Model.number()), Some(&b"X100"[..]));
        assert_eq!(
            reread.ascii(TagGroup::Exif, DATE_TIME_ORIGINAL),
            Some(&b"2025:09:13 17:05:00"[..])
        );
        assert_eq!(scan_data(&original), scan_data(&rewritten));
    }

    #[test]
    fn test_rejects_non_jpeg() {
        let err = embed(b"GIF89a....".to_vec(), &TagContainer::empty()).unwrap_err();
        assert!(matches!(err, PhotoError::Container(_)));
    }
}
