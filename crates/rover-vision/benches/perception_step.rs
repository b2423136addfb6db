use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rover_vision::core::RgbImage;
use rover_vision::{Perception, PerceptionParams, RoverPose};

fn striped_frame(w: usize, h: usize) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let rgb = match (x / 16 + y / 16) % 3 {
                0 => [210, 200, 190],
                1 => [40, 30, 30],
                _ => [180, 160, 20],
            };
            img.put_pixel(x, y, rgb);
        }
    }
    img
}

fn bench_step(c: &mut Criterion) {
    let perception =
        Perception::new(PerceptionParams::default(), 320, 160).expect("reference calibration");
    let frame = striped_frame(320, 160);
    let pose = RoverPose::new(99.7, 85.6, 56.8);

    c.bench_function("perception_step_320x160", |b| {
        let mut state = perception.new_state();
        b.iter(|| {
            let report = perception
                .step(black_box(&frame.view()), &pose, &mut state)
                .expect("valid frame");
            black_box(report)
        })
    });

    c.bench_function("perception_analyze_320x160", |b| {
        b.iter(|| {
            perception
                .analyze(black_box(&frame.view()), &pose)
                .expect("valid frame")
        })
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
