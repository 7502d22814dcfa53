//! Well-known binary LineString / MultiLineString codec
//!
//! Layout of a LineString:
//!
//! ```text
//! byte    order   0 = big endian (XDR), 1 = little endian (NDR)
//! u32     type    2 (LineString) or 5 (MultiLineString), plus Z markers
//! [u32    srid]   only when the EWKB SRID flag is set
//! u32     count
//! count × (f64 x, f64 y [, f64 z])
//! ```
//!
//! Z is signalled either ISO style (type + 1000) or EWKB style
//! (`0x8000_0000`). x is longitude, y latitude, z elevation in meters.

use crate::error::{Error, Result};
use crate::geo::GeoPoint;

const WKB_LINE_STRING: u32 = 2;
const WKB_MULTI_LINE_STRING: u32 = 5;

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const EWKB_FLAGS: u32 = EWKB_Z_FLAG | EWKB_M_FLAG | EWKB_SRID_FLAG;

/// Byte order marker of a WKB geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0 => Ok(Self::BigEndian),
            1 => Ok(Self::LittleEndian),
            other => Err(Error::MalformedGeometry(format!(
                "unknown byte order flag {}",
                other
            ))),
        }
    }

    fn flag(self) -> u8 {
        match self {
            Self::BigEndian => 0,
            Self::LittleEndian => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    LineString,
    MultiLineString,
}

#[derive(Debug, Clone, Copy)]
struct Header {
    order: ByteOrder,
    kind: Kind,
    has_z: bool,
}

/// Decode a WKB LineString or MultiLineString into path points
///
/// MultiLineString members are flattened in encounter order. The payload
/// must be consumed exactly; trailing bytes are an error.
pub fn decode(payload: &[u8]) -> Result<Vec<GeoPoint>> {
    let mut reader = Reader::new(payload);
    let header = reader.header()?;

    let points = match header.kind {
        Kind::LineString => reader.line_string_body(header)?,
        Kind::MultiLineString => {
            let parts = reader.u32(header.order)?;
            let mut points = Vec::new();
            for index in 0..parts {
                let member = reader.header()?;
                if member.kind != Kind::LineString {
                    return Err(Error::MalformedGeometry(format!(
                        "MultiLineString member {} is not a LineString",
                        index
                    )));
                }
                points.extend(reader.line_string_body(member)?);
            }
            points
        }
    };

    if reader.remaining() != 0 {
        return Err(Error::MalformedGeometry(format!(
            "{} trailing bytes after declared coordinates",
            reader.remaining()
        )));
    }

    Ok(points)
}

/// Encode a path as an ISO WKB LineString
///
/// Emits the Z variant when any point carries an elevation; points
/// without one are written with elevation 0.
pub fn encode_line_string(points: &[GeoPoint], order: ByteOrder) -> Vec<u8> {
    let has_z = points.iter().any(|p| p.elevation_m.is_some());
    let dims = if has_z { 3 } else { 2 };
    let type_code = if has_z {
        WKB_LINE_STRING + 1000
    } else {
        WKB_LINE_STRING
    };

    let mut out = Vec::with_capacity(9 + points.len() * dims * 8);
    out.push(order.flag());
    put_u32(&mut out, type_code, order);
    put_u32(&mut out, points.len() as u32, order);
    for p in points {
        put_f64(&mut out, p.lng, order);
        put_f64(&mut out, p.lat, order);
        if has_z {
            put_f64(&mut out, p.elevation_m.unwrap_or(0.0), order);
        }
    }
    out
}

fn put_u32(out: &mut Vec<u8>, value: u32, order: ByteOrder) {
    match order {
        ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn put_f64(out: &mut Vec<u8>, value: f64, order: ByteOrder) {
    match order {
        ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let bytes: [u8; N] = self
            .buf
            .get(self.pos..end)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                Error::MalformedGeometry(format!(
                    "payload truncated at byte {} (needed {} more)",
                    self.pos, N
                ))
            })?;
        self.pos = end;
        Ok(bytes)
    }

    fn u32(&mut self, order: ByteOrder) -> Result<u32> {
        let bytes = self.take::<4>()?;
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        })
    }

    fn f64(&mut self, order: ByteOrder) -> Result<f64> {
        let bytes = self.take::<8>()?;
        Ok(match order {
            ByteOrder::BigEndian => f64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
        })
    }

    fn header(&mut self) -> Result<Header> {
        let [flag] = self.take::<1>()?;
        let order = ByteOrder::from_flag(flag)?;
        let raw = self.u32(order)?;

        if raw & EWKB_M_FLAG != 0 {
            return Err(Error::MalformedGeometry(
                "measured (M) geometries are not supported".to_string(),
            ));
        }
        let ewkb_z = raw & EWKB_Z_FLAG != 0;
        if raw & EWKB_SRID_FLAG != 0 {
            // SRID is informational; coordinates are taken as WGS84
            self.u32(order)?;
        }

        let base = raw & !EWKB_FLAGS;
        let (iso_dims, geometry) = (base / 1000, base % 1000);
        let has_z = match (iso_dims, ewkb_z) {
            (0, z) => z,
            (1, false) => true,
            (2, _) | (3, _) => {
                return Err(Error::MalformedGeometry(
                    "measured (M) geometries are not supported".to_string(),
                ))
            }
            _ => {
                return Err(Error::MalformedGeometry(format!(
                    "unsupported geometry type code {:#x}",
                    raw
                )))
            }
        };

        let kind = match geometry {
            WKB_LINE_STRING => Kind::LineString,
            WKB_MULTI_LINE_STRING => Kind::MultiLineString,
            other => {
                return Err(Error::MalformedGeometry(format!(
                    "unsupported geometry type {}",
                    geometry_name(other)
                )))
            }
        };

        Ok(Header { order, kind, has_z })
    }

    fn line_string_body(&mut self, header: Header) -> Result<Vec<GeoPoint>> {
        let count = self.u32(header.order)? as usize;
        let dims = if header.has_z { 3 } else { 2 };
        let needed = count
            .checked_mul(dims * 8)
            .ok_or_else(|| Error::MalformedGeometry("coordinate count overflows".to_string()))?;
        if needed > self.remaining() {
            return Err(Error::MalformedGeometry(format!(
                "declared {} coordinates need {} bytes, only {} remain",
                count,
                needed,
                self.remaining()
            )));
        }

        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let lng = self.f64(header.order)?;
            let lat = self.f64(header.order)?;
            let elevation_m = if header.has_z {
                Some(self.f64(header.order)?)
            } else {
                None
            };
            let point = GeoPoint {
                lat,
                lng,
                elevation_m,
            };
            if !point.is_valid() {
                return Err(Error::MalformedGeometry(format!(
                    "coordinate out of range: lat {}, lng {}",
                    lat, lng
                )));
            }
            points.push(point);
        }
        Ok(points)
    }
}

fn geometry_name(code: u32) -> String {
    match code {
        1 => "Point".to_string(),
        3 => "Polygon".to_string(),
        4 => "MultiPoint".to_string(),
        6 => "MultiPolygon".to_string(),
        7 => "GeometryCollection".to_string(),
        other => format!("code {}", other),
    }
}
