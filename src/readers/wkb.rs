//! ISO well-known binary encoding of basin outlines for the table output.

use geo::{LineString, MultiPolygon};

const LITTLE_ENDIAN: u8 = 1;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;

/// Encodes a multipolygon as little-endian 2D WKB.
pub fn encode_multipolygon(shape: &MultiPolygon<f64>) -> Vec<u8> {
    let points: usize = shape
        .0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .map(|ring| ring.0.len())
        .sum();
    let mut out = Vec::with_capacity(9 + shape.0.len() * 9 + points * 16);

    write_header(&mut out, WKB_MULTIPOLYGON);
    write_u32(&mut out, shape.0.len());
    for polygon in &shape.0 {
        write_header(&mut out, WKB_POLYGON);
        write_u32(&mut out, 1 + polygon.interiors().len());
        write_ring(&mut out, polygon.exterior());
        for ring in polygon.interiors() {
            write_ring(&mut out, ring);
        }
    }
    out
}

fn write_header(out: &mut Vec<u8>, geometry_type: u32) {
    out.push(LITTLE_ENDIAN);
    out.extend_from_slice(&geometry_type.to_le_bytes());
}

fn write_u32(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&(value as u32).to_le_bytes());
}

fn write_ring(out: &mut Vec<u8>, ring: &LineString<f64>) {
    write_u32(out, ring.0.len());
    for coord in &ring.0 {
        out.extend_from_slice(&coord.x.to_le_bytes());
        out.extend_from_slice(&coord.y.to_le_bytes());
    }
}
