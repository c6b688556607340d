use exif::{Rational, Value};

/// Denominator used for the seconds component: four decimal places.
pub const SECONDS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn references(self) -> (char, char) {
        match self {
            Axis::Latitude => ('N', 'S'),
            Axis::Longitude => ('E', 'W'),
        }
    }
}

/// One coordinate axis as EXIF stores it: degrees, minutes and seconds as
/// unsigned `num/denom` pairs plus a hemisphere letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoDegrees {
    pub degrees: (u32, u32),
    pub minutes: (u32, u32),
    pub seconds: (u32, u32),
    pub reference: char,
}

impl GeoDegrees {
    /// Encode a signed decimal degree value.
    ///
    /// Degrees and minutes are whole numbers over 1. Seconds are rounded to
    /// four decimal places and stored over 10000. A seconds value that rounds
    /// up to 60 is stored as-is, not carried into the minutes.
    pub fn from_decimal(value: f64, axis: Axis) -> Self {
        let (positive, negative) = axis.references();
        let reference = if value < 0.0 { negative } else { positive };

        let abs = value.abs();
        let degrees = abs.trunc();
        let minutes_f = (abs - degrees) * 60.0;
        let minutes = minutes_f.trunc();
        let seconds = (minutes_f - minutes) * 60.0;

        Self {
            degrees: (degrees as u32, 1),
            minutes: (minutes as u32, 1),
            seconds: (
                (seconds * SECONDS_DENOMINATOR as f64).round() as u32,
                SECONDS_DENOMINATOR,
            ),
            reference,
        }
    }

    /// Build from raw EXIF parts. Rejects unknown hemisphere letters and zero
    /// denominators.
    pub fn from_parts(dms: [(u32, u32); 3], reference: char) -> Option<Self> {
        if !matches!(reference, 'N' | 'S' | 'E' | 'W') || dms.iter().any(|&(_, d)| d == 0) {
            return None;
        }
        Some(Self {
            degrees: dms[0],
            minutes: dms[1],
            seconds: dms[2],
            reference,
        })
    }

    /// Back to signed decimal degrees.
    pub fn to_decimal(&self) -> f64 {
        let part = |(n, d): (u32, u32)| n as f64 / d as f64;
        let abs = part(self.degrees) + part(self.minutes) / 60.0 + part(self.seconds) / 3600.0;
        if matches!(self.reference, 'S' | 'W') {
            -abs
        } else {
            abs
        }
    }

    pub fn reference_value(&self) -> Value {
        Value::Ascii(vec![vec![self.reference as u8]])
    }

    pub fn rational_value(&self) -> Value {
        let r = |(num, denom): (u32, u32)| Rational { num, denom };
        Value::Rational(vec![r(self.degrees), r(self.minutes), r(self.seconds)])
    }
}
