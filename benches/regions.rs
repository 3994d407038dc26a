//! Benchmarks for region coalescing, the spatial index, and buffer writes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use retrocell::spatial::QuadTree;
use retrocell::video::{coalesce, CellAttributes, DosColor, Region, VideoBuffer};

fn scattered_regions(count: usize) -> Vec<Region> {
    // Deterministic pseudo-scatter across an 80x25 screen.
    (0..count)
        .map(|i| {
            let x = ((i * 37) % 76) as i32;
            let y = ((i * 13) % 22) as i32;
            Region::new(x, y, 4, 2)
        })
        .collect()
}

fn row_of_cells(count: usize) -> Vec<Region> {
    (0..count).map(|i| Region::cell(i as i32, 0)).collect()
}

fn bench_coalesce(c: &mut Criterion) {
    let scattered = scattered_regions(64);
    c.bench_function("coalesce/scattered_64", |b| {
        b.iter(|| coalesce(black_box(scattered.clone())))
    });

    let row = row_of_cells(80);
    c.bench_function("coalesce/adjacent_row_80", |b| {
        b.iter(|| coalesce(black_box(row.clone())))
    });
}

fn bench_quadtree(c: &mut Criterion) {
    let regions = scattered_regions(100);

    c.bench_function("quadtree/insert_100", |b| {
        b.iter(|| {
            let mut tree = QuadTree::new(Region::new(0, 0, 80, 25));
            for region in &regions {
                tree.insert(black_box(*region));
            }
            tree
        })
    });

    let mut tree = QuadTree::new(Region::new(0, 0, 80, 25));
    for region in &regions {
        tree.insert(*region);
    }
    let query = Region::new(30, 10, 10, 5);
    c.bench_function("quadtree/retrieve", |b| {
        b.iter(|| tree.retrieve(black_box(&query)))
    });
    c.bench_function("quadtree/merge_regions", |b| b.iter(|| tree.merge_regions()));
}

fn bench_buffer_writes(c: &mut Criterion) {
    let attrs = CellAttributes::new(DosColor::White, DosColor::Blue);

    c.bench_function("buffer/unbatched_row_80", |b| {
        b.iter(|| {
            let mut buffer = VideoBuffer::new(80, 25);
            for x in 0..80 {
                buffer.write_char(x, 12, black_box("X"), attrs);
            }
            buffer.flush()
        })
    });

    c.bench_function("buffer/batched_row_80", |b| {
        b.iter(|| {
            let mut buffer = VideoBuffer::new(80, 25);
            buffer.begin_batch();
            for x in 0..80 {
                buffer.write_char(x, 12, black_box("X"), attrs);
            }
            buffer.end_batch();
            buffer.flush()
        })
    });
}

criterion_group!(benches, bench_coalesce, bench_quadtree, bench_buffer_writes);
criterion_main!(benches);
