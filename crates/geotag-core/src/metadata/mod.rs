//! The EXIF block of a photo as a typed map of tag group -> tag id -> value.

pub mod geo;
pub mod jpeg;

use std::collections::BTreeMap;
use std::io::Cursor;

use exif::{Context, Field, In, Reader, Tag, Value};

pub use geo::{Axis, GeoDegrees};

/// `DateTime` in the primary IFD.
pub const DATE_TIME: u16 = 0x0132;
/// `DateTimeOriginal` in the Exif IFD.
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const GPS_LATITUDE_REF: u16 = 0x0001;
pub const GPS_LATITUDE: u16 = 0x0002;
pub const GPS_LONGITUDE_REF: u16 = 0x0003;
pub const GPS_LONGITUDE: u16 = 0x0004;

/// A signed decimal-degree position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Partitions of the EXIF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagGroup {
    /// IFD0 TIFF tags: make, model, orientation, `DateTime`, ...
    Primary,
    Exif,
    Gps,
    Interop,
    /// IFD1 TIFF tags describing the embedded thumbnail.
    Thumbnail,
}

impl TagGroup {
    pub const ALL: [TagGroup; 5] = [
        TagGroup::Primary,
        TagGroup::Exif,
        TagGroup::Gps,
        TagGroup::Interop,
        TagGroup::Thumbnail,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn of(field: &Field) -> Option<Self> {
        match field.tag.context() {
            Context::Tiff if field.ifd_num == In::PRIMARY => Some(TagGroup::Primary),
            Context::Tiff if field.ifd_num == In::THUMBNAIL => Some(TagGroup::Thumbnail),
            Context::Exif => Some(TagGroup::Exif),
            Context::Gps => Some(TagGroup::Gps),
            Context::Interop => Some(TagGroup::Interop),
            _ => None,
        }
    }

    fn tag(self, id: u16) -> (Tag, In) {
        match self {
            TagGroup::Primary => (Tag(Context::Tiff, id), In::PRIMARY),
            TagGroup::Thumbnail => (Tag(Context::Tiff, id), In::THUMBNAIL),
            TagGroup::Exif => (Tag(Context::Exif, id), In::PRIMARY),
            TagGroup::Gps => (Tag(Context::Gps, id), In::PRIMARY),
            TagGroup::Interop => (Tag(Context::Interop, id), In::PRIMARY),
        }
    }
}

pub type TagMap = BTreeMap<u16, Value>;

/// Image data of the IFD1 thumbnail, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    /// A JPEG stream (`JPEGInterchangeFormat`).
    Jpeg(Vec<u8>),
    /// Uncompressed TIFF strips (`StripOffsets` / `StripByteCounts`).
    Strips(Vec<Vec<u8>>),
}

/// Parsed EXIF block. An unreadable block is an [`empty`](Self::empty)
/// container, never an error.
#[derive(Debug, Clone)]
pub struct TagContainer {
    groups: [TagMap; 5],
    thumbnail: Option<Thumbnail>,
    little_endian: bool,
}

impl Default for TagContainer {
    fn default() -> Self {
        Self::empty()
    }
}

/// Tags describing the block's own layout. They are rebuilt on write.
fn is_structural(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::ExifIFDPointer
            | Tag::GPSInfoIFDPointer
            | Tag::InteropIFDPointer
            | Tag::JPEGInterchangeFormat
            | Tag::JPEGInterchangeFormatLength
            | Tag::StripOffsets
            | Tag::StripByteCounts
            | Tag::TileOffsets
            | Tag::TileByteCounts
    )
}

impl TagContainer {
    /// All groups present, all empty.
    pub fn empty() -> Self {
        Self {
            groups: Default::default(),
            thumbnail: None,
            little_endian: false,
        }
    }

    /// Read the EXIF block out of an image file's bytes (JPEG, TIFF, ...).
    /// Missing or corrupt metadata yields an empty container.
    pub fn read(image: &[u8]) -> Self {
        match Reader::new().read_from_container(&mut Cursor::new(image)) {
            Ok(exif) => Self::from_exif(&exif),
            Err(e) => {
                tracing::debug!("no readable EXIF block: {e}");
                Self::empty()
            }
        }
    }

    /// Parse a bare TIFF-structured EXIF block.
    pub fn from_tiff(tiff: Vec<u8>) -> Result<Self, exif::Error> {
        Reader::new().read_raw(tiff).map(|exif| Self::from_exif(&exif))
    }

    fn from_exif(exif: &exif::Exif) -> Self {
        let mut container = Self::empty();
        container.little_endian = exif.little_endian();

        for field in exif.fields() {
            if is_structural(field.tag) {
                continue;
            }
            if let Value::Unknown(..) = field.value {
                tracing::debug!(tag = %field.tag, "dropping field of unknown type");
                continue;
            }
            if let Some(group) = TagGroup::of(field) {
                container.groups[group.index()].insert(field.tag.number(), field.value.clone());
            }
        }

        container.thumbnail = jpeg_thumbnail(exif).or_else(|| strip_thumbnail(exif));
        if container.thumbnail.is_none() && !container.group(TagGroup::Thumbnail).is_empty() {
            tracing::debug!("thumbnail image data unreadable, dropping IFD1");
            container.groups[TagGroup::Thumbnail.index()].clear();
        }
        container
    }

    pub fn group(&self, group: TagGroup) -> &TagMap {
        &self.groups[group.index()]
    }

    pub fn get(&self, group: TagGroup, id: u16) -> Option<&Value> {
        self.group(group).get(&id)
    }

    pub fn set(&mut self, group: TagGroup, id: u16, value: Value) {
        self.groups[group.index()].insert(id, value);
    }

    /// First string of an ASCII field.
    pub fn ascii(&self, group: TagGroup, id: u16) -> Option<&[u8]> {
        match self.get(group, id)? {
            Value::Ascii(strings) => strings.first().map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(BTreeMap::is_empty)
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn set_thumbnail(&mut self, thumbnail: Option<Thumbnail>) {
        self.thumbnail = thumbnail;
    }

    /// Whether any GPS tag is present.
    pub fn has_gps(&self) -> bool {
        !self.group(TagGroup::Gps).is_empty()
    }

    /// Replace the four GPS position entries, leaving every other tag alone.
    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        let lat = GeoDegrees::from_decimal(coordinate.latitude, Axis::Latitude);
        let lon = GeoDegrees::from_decimal(coordinate.longitude, Axis::Longitude);
        self.set(TagGroup::Gps, GPS_LATITUDE_REF, lat.reference_value());
        self.set(TagGroup::Gps, GPS_LATITUDE, lat.rational_value());
        self.set(TagGroup::Gps, GPS_LONGITUDE_REF, lon.reference_value());
        self.set(TagGroup::Gps, GPS_LONGITUDE, lon.rational_value());
    }

    /// Decode the GPS position, if a complete one is present.
    pub fn gps_coordinate(&self) -> Option<Coordinate> {
        let axis = |ref_id, value_id| {
            let reference = *self.ascii(TagGroup::Gps, ref_id)?.first()?;
            let dms = match self.get(TagGroup::Gps, value_id)? {
                Value::Rational(r) if r.len() >= 3 => {
                    [(r[0].num, r[0].denom), (r[1].num, r[1].denom), (r[2].num, r[2].denom)]
                }
                _ => return None,
            };
            GeoDegrees::from_parts(dms, reference as char).map(|g| g.to_decimal())
        };
        Some(Coordinate {
            latitude: axis(GPS_LATITUDE_REF, GPS_LATITUDE)?,
            longitude: axis(GPS_LONGITUDE_REF, GPS_LONGITUDE)?,
        })
    }

    /// Serialize to a TIFF-structured EXIF block, keeping the byte order the
    /// block was read with.
    pub fn to_tiff(&self) -> Result<Vec<u8>, exif::Error> {
        let fields: Vec<Field> = TagGroup::ALL
            .iter()
            .flat_map(|&group| {
                self.group(group).iter().map(move |(&id, value)| {
                    let (tag, ifd_num) = group.tag(id);
                    Field {
                        tag,
                        ifd_num,
                        value: value.clone(),
                    }
                })
            })
            .collect();
        let strips: Vec<&[u8]> = match &self.thumbnail {
            Some(Thumbnail::Strips(strips)) => strips.iter().map(Vec::as_slice).collect(),
            _ => Vec::new(),
        };

        let mut writer = exif::experimental::Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        match &self.thumbnail {
            Some(Thumbnail::Jpeg(jpeg)) => writer.set_jpeg(jpeg, In::THUMBNAIL),
            Some(Thumbnail::Strips(_)) => writer.set_strips(&strips, In::THUMBNAIL),
            None => {}
        }

        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, self.little_endian)?;
        Ok(buf.into_inner())
    }
}

/// The IFD1 JPEG thumbnail, sliced out of the raw block.
fn jpeg_thumbnail(exif: &exif::Exif) -> Option<Thumbnail> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let thumbnail = exif.buf().get(offset..offset.checked_add(len)?);
    if thumbnail.is_none() {
        tracing::debug!(offset, len, "thumbnail points outside the EXIF block, dropping it");
    }
    thumbnail.map(|t| Thumbnail::Jpeg(t.to_vec()))
}

/// The IFD1 strip thumbnail. All strips must lie inside the raw block.
fn strip_thumbnail(exif: &exif::Exif) -> Option<Thumbnail> {
    let offsets = exif.get_field(Tag::StripOffsets, In::THUMBNAIL)?.value.iter_uint()?;
    let counts = exif.get_field(Tag::StripByteCounts, In::THUMBNAIL)?.value.iter_uint()?;
    if offsets.len() != counts.len() || offsets.len() == 0 {
        return None;
    }
    let buf = exif.buf();
    offsets
        .zip(counts)
        .map(|(offset, len)| {
            let start = offset as usize;
            buf.get(start..start.checked_add(len as usize)?).map(<[u8]>::to_vec)
        })
        .collect::<Option<Vec<_>>>()
        .map(Thumbnail::Strips)
}
