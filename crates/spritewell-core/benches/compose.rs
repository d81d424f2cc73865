use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use spritewell_core::compositing::{compose, encode_png};
use spritewell_core::prelude::*;

fn generate_images(count: usize, min_size: u32, max_size: u32) -> Vec<RgbaImage> {
    let span = max_size - min_size + 1;
    (0..count)
        .map(|i| {
            let w = min_size + (i as u32 * 7) % span;
            let h = min_size + (i as u32 * 13) % span;
            RgbaImage::from_pixel(w, h, Rgba([i as u8, 128, 255 - i as u8, 255]))
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack_layout");

    for count in [50, 200, 1000] {
        let sizes: Vec<(u32, u32)> = generate_images(count, 16, 64)
            .iter()
            .map(|i| i.dimensions())
            .collect();
        group.throughput(Throughput::Elements(count as u64));

        for mode in [PackMode::Vertical, PackMode::Horizontal] {
            let packer = StackPacker::new(mode, 2);
            group.bench_with_input(
                BenchmarkId::new(mode.tag(), count),
                &sizes,
                |b, sizes| {
                    b.iter(|| {
                        let positions: Vec<Pos> = (0..sizes.len())
                            .map(|i| packer.position(sizes, i as isize))
                            .collect();
                        black_box((positions, packer.extent(sizes)))
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_encode");
    group.sample_size(20);

    for count in [10, 50, 100] {
        let images = generate_images(count, 16, 64);
        let sizes: Vec<(u32, u32)> = images.iter().map(|i| i.dimensions()).collect();
        let packer = StackPacker::new(PackMode::Vertical, 2);
        let positions: Vec<Pos> = (0..count)
            .map(|i| packer.position(&sizes, i as isize))
            .collect();
        let extent = packer.extent(&sizes);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("compose", count), &images, |b, images| {
            b.iter(|| black_box(compose(images, &positions, extent).expect("compose")));
        });

        let canvas = compose(&images, &positions, extent).expect("compose");
        group.bench_with_input(BenchmarkId::new("encode_png", count), &canvas, |b, canvas| {
            b.iter(|| black_box(encode_png(canvas).expect("encode")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout, bench_compose);
criterion_main!(benches);
