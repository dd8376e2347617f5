//! Deserializer of GTX vertical grids.
//!
//! A 40 bytes big-endian header, south latitude, west longitude,
//! latitude and longitude spacing (f64, degree), rows and columns (i32),
//! followed by `rows * cols` big-endian f32 offsets in meters, rows from south to north.
use crate::grid::{Grid, GridKind, Lattice, Nodes, Shift};

const HEADER: usize = 40;
const NO_DATA: f32 = -88.8888;

#[inline]
fn f64_at(buf: &[u8], offset: usize) -> f64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_be_bytes(b)
}

#[inline]
fn i32_at(buf: &[u8], offset: usize) -> i32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_be_bytes(b)
}

pub(crate) fn parse(buf: &[u8]) -> Result<Grid, &'static str> {
    if buf.len() < HEADER {
        return Err("truncated gtx header");
    }

    let south = f64_at(buf, 0);
    let mut west = f64_at(buf, 8);
    let dphi = f64_at(buf, 16);
    let dlam = f64_at(buf, 24);
    let rows = i32_at(buf, 32);
    let cols = i32_at(buf, 36);

    let (rows, cols) = match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(rows), Ok(cols)) => (rows, cols),
        _ => return Err("negative gtx dimension"),
    };

    // west longitude is often given in 0 to 360
    if west >= 180.0 {
        west -= 360.0;
    }

    let count = rows.checked_mul(cols).ok_or("gtx dimension overflow")?;
    let body = &buf[HEADER..];
    if count.checked_mul(4).map_or(true, |n| body.len() < n) {
        return Err("truncated gtx data");
    }

    let nodes = body
        .chunks_exact(4)
        .take(count)
        .map(|chunk| {
            let v = f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if (v - NO_DATA).abs() < 1e-4 || !v.is_finite() {
                Shift::MISSING
            } else {
                Shift::vertical(v as f64)
            }
        })
        .collect();

    let lattice = Lattice {
        west: west.to_radians(),
        south: south.to_radians(),
        dlam: dlam.to_radians(),
        dphi: dphi.to_radians(),
        cols,
        rows,
    };

    Grid::new(GridKind::Vertical, lattice, Nodes::Dense(nodes))
}
