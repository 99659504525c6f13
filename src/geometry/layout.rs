//! Fixed-offset little-endian layout of a `geography` value.
//!
//! ```text
//! offset  size        field
//! 0       4           SRID (4326)
//! 4       2           tag
//! 6       16          point: latitude f64, longitude f64     (total 22)
//! 6       32          line segment: two points               (total 38)
//! 6       4           point array: count n                   (total >= 26)
//! 10      16·n        points
//! 10+16n  5           tail numobj: u32 count, u8 kind (1 lines, 2 rings)
//! +5      5           tail reserved: u32, u8
//! +10     5·(count-1) sub-object start indices: u32, u8
//! ```

use crate::error::{GeocellError, Result};
use crate::types::SpatialPoint;
use smallvec::SmallVec;

pub const SRID_4326: u32 = 4326;

pub const TAG_POINT: u16 = 0x0C01;
pub const TAG_MULTIPOLYGON: u16 = 0x0401;
pub const TAG_LINESEGMENT: u16 = 0x1401;
pub const TAG_LINESTRING: u16 = 0x0002;

pub const HEADER_SIZE: usize = 6;
pub const POINT_SIZE: usize = 16;
pub const POINT_VALUE_SIZE: usize = HEADER_SIZE + POINT_SIZE;
pub const LINESEGMENT_VALUE_SIZE: usize = HEADER_SIZE + 2 * POINT_SIZE;
pub const POINTARRAY_OFFSET: usize = HEADER_SIZE + 4;
pub const MIN_POINTARRAY_SIZE: usize = POINTARRAY_OFFSET + POINT_SIZE;

const NUM_SIZE: usize = 5;
const TAIL_FIXED_SIZE: usize = 2 * NUM_SIZE;

/// `numobj` kind byte for line strings.
pub const TAIL_LINES: u8 = 1;
/// `numobj` kind byte for rings.
pub const TAIL_RINGS: u8 = 2;

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| GeocellError::parse(format!("truncated u16 at offset {}", offset)))
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| GeocellError::parse(format!("truncated u32 at offset {}", offset)))
}

/// Decode one 16-byte point from a slice already known to hold it.
#[inline]
pub(crate) fn decode_point(chunk: &[u8]) -> SpatialPoint {
    let mut lat = [0u8; 8];
    let mut lon = [0u8; 8];
    lat.copy_from_slice(&chunk[..8]);
    lon.copy_from_slice(&chunk[8..16]);
    SpatialPoint::new(f64::from_le_bytes(lat), f64::from_le_bytes(lon))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub srid: u32,
    pub tag: u16,
}

pub fn read_header(data: &[u8]) -> Result<Header> {
    if data.len() < HEADER_SIZE {
        return Err(GeocellError::parse(format!(
            "geography value of {} bytes is shorter than its header",
            data.len()
        )));
    }
    let header = Header {
        srid: read_u32(data, 0)?,
        tag: read_u16(data, 4)?,
    };
    if header.srid != SRID_4326 {
        return Err(GeocellError::parse(format!(
            "unsupported SRID {}, expected {}",
            header.srid, SRID_4326
        )));
    }
    Ok(header)
}

/// Sub-object table following a point array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tail {
    pub count: u32,
    pub kind: u8,
    /// Start index of every sub-object after the first.
    pub starts: SmallVec<[u32; 8]>,
}

/// Read the tail at `offset`, `None` when no tail is present.
pub fn read_tail(data: &[u8], offset: usize) -> Result<Option<Tail>> {
    if data.len() < offset + TAIL_FIXED_SIZE {
        return Ok(None);
    }
    let count = read_u32(data, offset)?;
    let kind = data[offset + 4];
    let table = offset + TAIL_FIXED_SIZE;
    let entries = count.saturating_sub(1) as usize;
    if data.len() < table + entries * NUM_SIZE {
        return Err(GeocellError::parse(format!(
            "tail declares {} sub-objects but only {} bytes follow",
            count,
            data.len() - table
        )));
    }
    let starts = (0..entries)
        .map(|i| read_u32(data, table + i * NUM_SIZE))
        .collect::<Result<SmallVec<[u32; 8]>>>()?;
    Ok(Some(Tail {
        count,
        kind,
        starts,
    }))
}

fn push_header(out: &mut Vec<u8>, tag: u16) {
    out.extend_from_slice(&SRID_4326.to_le_bytes());
    out.extend_from_slice(&tag.to_le_bytes());
}

fn push_point(out: &mut Vec<u8>, p: &SpatialPoint) {
    out.extend_from_slice(&p.latitude.to_le_bytes());
    out.extend_from_slice(&p.longitude.to_le_bytes());
}

fn push_num(out: &mut Vec<u8>, num: u32, tag: u8) {
    out.extend_from_slice(&num.to_le_bytes());
    out.push(tag);
}

pub fn encode_point(p: &SpatialPoint) -> Vec<u8> {
    let mut out = Vec::with_capacity(POINT_VALUE_SIZE);
    push_header(&mut out, TAG_POINT);
    push_point(&mut out, p);
    out
}

pub fn encode_line_segment(a: &SpatialPoint, b: &SpatialPoint) -> Vec<u8> {
    let mut out = Vec::with_capacity(LINESEGMENT_VALUE_SIZE);
    push_header(&mut out, TAG_LINESEGMENT);
    push_point(&mut out, a);
    push_point(&mut out, b);
    out
}

pub fn encode_linestring(points: &[SpatialPoint]) -> Vec<u8> {
    let mut out = Vec::with_capacity(POINTARRAY_OFFSET + points.len() * POINT_SIZE);
    push_header(&mut out, TAG_LINESTRING);
    push_num_points(&mut out, points.len());
    points.iter().for_each(|p| push_point(&mut out, p));
    out
}

fn push_num_points(out: &mut Vec<u8>, n: usize) {
    out.extend_from_slice(&(n as u32).to_le_bytes());
}

/// Point array with a tail listing `parts` of the given kind.
pub fn encode_parts(parts: &[Vec<SpatialPoint>], kind: u8) -> Vec<u8> {
    let total: usize = parts.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(
        POINTARRAY_OFFSET + total * POINT_SIZE + TAIL_FIXED_SIZE + parts.len() * NUM_SIZE,
    );
    push_header(&mut out, TAG_MULTIPOLYGON);
    push_num_points(&mut out, total);
    for p in parts.iter().flatten() {
        push_point(&mut out, p);
    }
    push_num(&mut out, parts.len() as u32, kind);
    push_num(&mut out, 0, if parts.len() == 1 { TAIL_LINES } else { kind });
    let mut start = 0u32;
    for part in parts.iter().take(parts.len().saturating_sub(1)) {
        start += part.len() as u32;
        push_num(&mut out, start, kind);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_layout() {
        let bytes = encode_point(&SpatialPoint::new(1.5, -2.5));
        assert_eq!(bytes.len(), POINT_VALUE_SIZE);
        assert_eq!(&bytes[..4], &[0xE6, 0x10, 0, 0]);
        assert_eq!(&bytes[4..6], &[0x01, 0x0C]);
        assert_eq!(decode_point(&bytes[HEADER_SIZE..]), SpatialPoint::new(1.5, -2.5));
    }

    #[test]
    fn test_header_rejects_srid() {
        let mut bytes = encode_point(&SpatialPoint::new(0.0, 0.0));
        bytes[0] = 0;
        assert!(matches!(read_header(&bytes), Err(GeocellError::Parse(_))));
        assert!(read_header(&bytes[..5]).is_err());
    }

    #[test]
    fn test_tail_layout() {
        let ring = |n: usize| vec![SpatialPoint::new(0.0, 0.0); n];
        let bytes = encode_parts(&[ring(5), ring(4), ring(6)], TAIL_RINGS);
        let tail_at = POINTARRAY_OFFSET + 15 * POINT_SIZE;
        assert_eq!(read_u32(&bytes, HEADER_SIZE).unwrap(), 15);
        let fifth = POINTARRAY_OFFSET + 5 * POINT_SIZE;
        assert_eq!(decode_point(&bytes[fifth..fifth + POINT_SIZE]), SpatialPoint::new(0.0, 0.0));
        let tail = read_tail(&bytes, tail_at).unwrap().unwrap();
        assert_eq!(tail.count, 3);
        assert_eq!(tail.kind, TAIL_RINGS);
        assert_eq!(tail.starts.as_slice(), &[5, 9]);
        assert_eq!(bytes.len(), tail_at + 10 + 2 * 5);
        assert!(read_tail(&bytes[..bytes.len() - 1], tail_at).is_err());
        assert_eq!(read_tail(&bytes[..tail_at + 3], tail_at).unwrap(), None);
    }
}
