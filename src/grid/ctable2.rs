//! Deserializer of CTable2 horizontal grids.
//!
//! A 160 bytes little-endian header, then `lim_lam * lim_phi` pairs of f32
//! `(dlam, dphi)` in radians, rows from south to north.
//! The longitude shift is stored positive west.
use crate::grid::{Grid, GridKind, Lattice, Nodes, Shift};

pub(crate) const MAGIC: &[u8] = b"CTABLE V2";

const HEADER: usize = 160;

#[inline]
fn f64_at(buf: &[u8], offset: usize) -> f64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_le_bytes(b)
}

#[inline]
fn i32_at(buf: &[u8], offset: usize) -> i32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_le_bytes(b)
}

pub(crate) fn parse(buf: &[u8]) -> Result<Grid, &'static str> {
    if buf.len() < HEADER {
        return Err("truncated ctable2 header");
    }
    if !buf.starts_with(MAGIC) {
        return Err("not a ctable2 file");
    }

    // id[16] and description[64] precede
    let west = f64_at(buf, 80);
    let south = f64_at(buf, 88);
    let dlam = f64_at(buf, 96);
    let dphi = f64_at(buf, 104);

    let (cols, rows) = match (usize::try_from(i32_at(buf, 112)), usize::try_from(i32_at(buf, 116))) {
        (Ok(cols), Ok(rows)) => (cols, rows),
        _ => return Err("negative ctable2 dimension"),
    };

    let count = cols.checked_mul(rows).ok_or("ctable2 dimension overflow")?;
    let body = &buf[HEADER..];
    if count.checked_mul(8).map_or(true, |n| body.len() < n) {
        return Err("truncated ctable2 data");
    }

    let nodes = body
        .chunks_exact(8)
        .take(count)
        .map(|chunk| {
            let lam = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let phi = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            if lam.is_finite() && phi.is_finite() {
                Shift::horizontal(-(lam as f64), phi as f64)
            } else {
                Shift::MISSING
            }
        })
        .collect();

    let lattice = Lattice {
        west,
        south,
        dlam,
        dphi,
        cols,
        rows,
    };

    Grid::new(GridKind::Horizontal, lattice, Nodes::Dense(nodes))
}
