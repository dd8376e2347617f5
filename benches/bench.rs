//! Notes
//! 1. Every bench transforms 10,000 points
//! 2. The grid has a single cell, this is *unrealistic*
//!    because the real world par file has ~10,000 nodes.
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridtrans::grid::{Grid, ParFormat};
use gridtrans::{Context, Coord, Lp, ParamList, Pj};

const SEMIDYNA_EXE: &str = "54401005  -0.00622   0.01516    0.0946
54401055  -0.00620   0.01529   0.08972
54401100  -0.00663   0.01492   0.10374
54401150  -0.00664   0.01506   0.10087";

const N: usize = 100;

fn grid() -> Grid {
    let text = "\n".repeat(15) + "MeshCode dB(sec)  dL(sec) dH(m)\n" + SEMIDYNA_EXE;
    Grid::from_par(&text, ParFormat::SemiDynaEXE).unwrap()
}

/// `N * N` points spread over the grid.
fn points(grid: &Grid) -> Vec<Lp> {
    let extent = grid.extent();
    let step = |lo: f64, hi: f64, i: usize| lo + (hi - lo) * (i as f64 + 0.5) / N as f64;

    (0..N)
        .flat_map(|i| {
            (0..N).map(move |j| {
                Lp::new(
                    step(extent.west, extent.east, i),
                    step(extent.south, extent.north, j),
                )
            })
        })
        .collect()
}

fn bench_grid(c: &mut Criterion) {
    let grid = grid();
    let ps = points(&grid);

    c.bench_function("grid_hvalue", |b| {
        b.iter(|| {
            ps.iter()
                .map(|p| grid.hvalue(black_box(p)).unwrap())
                .collect::<Vec<_>>()
        })
    });

    c.bench_function("grid_vvalue", |b| {
        b.iter(|| {
            ps.iter()
                .map(|p| grid.vvalue(black_box(p)).unwrap())
                .collect::<Vec<_>>()
        })
    });

    let shifted: Vec<_> = ps
        .iter()
        .map(|p| {
            let shift = grid.hvalue(p).unwrap();
            Lp::new(p.lam + shift.lam, p.phi + shift.phi)
        })
        .collect();

    c.bench_function("grid_hinverse", |b| {
        b.iter(|| {
            shifted
                .iter()
                .map(|p| grid.hinverse(black_box(p)).unwrap())
                .collect::<Vec<_>>()
        })
    });
}

fn bench_trans(c: &mut Criterion) {
    let ctx = Context::new();
    let utm = Pj::new(
        &ctx,
        &ParamList::new()
            .set("proj", "utm")
            .set("zone", 54)
            .set("ellps", "GRS80"),
    )
    .unwrap();

    let ps: Vec<_> = points(&grid())
        .into_iter()
        .map(|p| Coord::new(p.lam, p.phi, 0.0, 0.0))
        .collect();

    c.bench_function("utm_forward", |b| {
        b.iter(|| {
            ps.iter()
                .map(|p| utm.fwd4d(black_box(*p)))
                .collect::<Vec<_>>()
        })
    });

    let projected: Vec<_> = ps.iter().map(|p| utm.fwd4d(*p)).collect();
    c.bench_function("utm_inverse", |b| {
        b.iter(|| {
            projected
                .iter()
                .map(|p| utm.inv4d(black_box(*p)))
                .collect::<Vec<_>>()
        })
    });

    let pipeline = Pj::new(
        &ctx,
        &ParamList::new()
            .set("proj", "pipeline")
            .set("ellps", "GRS80")
            .step(ParamList::new().set("proj", "cart"))
            .step(ParamList::new().set("proj", "cart").flag("inv"))
            .step(ParamList::new().set("proj", "utm").set("zone", 54)),
    )
    .unwrap();

    c.bench_function("pipeline_forward", |b| {
        b.iter(|| {
            ps.iter()
                .map(|p| pipeline.fwd4d(black_box(*p)))
                .collect::<Vec<_>>()
        })
    });
}

criterion_group!(benches, bench_grid, bench_trans);
criterion_main!(benches);
