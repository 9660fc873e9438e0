use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use digipot_core::quadrature::{EncoderPin, QuadratureDecoder};
use digipot_core::{Event, PotController};
use digipot_traits::{Level, Timestamp};

// Raw edges for `n` clicks with pseudo-random direction and optional bounce
fn synth_edges(n: usize, seed: u32) -> Vec<(EncoderPin, Level, Timestamp)> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let cw = [
        (EncoderPin::B, Level::High),
        (EncoderPin::A, Level::High),
        (EncoderPin::B, Level::Low),
        (EncoderPin::A, Level::Low),
    ];
    let ccw = [
        (EncoderPin::A, Level::High),
        (EncoderPin::B, Level::High),
        (EncoderPin::A, Level::Low),
        (EncoderPin::B, Level::Low),
    ];
    let mut out = Vec::with_capacity(n * 6);
    let mut t = 0u64;
    for _ in 0..n {
        let r = next();
        let seq = if r & 1 == 0 { cw } else { ccw };
        for (i, (pin, level)) in seq.into_iter().enumerate() {
            out.push((pin, level, Timestamp::from_micros(t)));
            t += 250;
            // occasional contact bounce on the first edge
            if i == 0 && r & 6 == 0 {
                out.push((pin, level.inverted(), Timestamp::from_micros(t)));
                out.push((pin, level, Timestamp::from_micros(t + 20)));
                t += 40;
            }
        }
        t += 20_000;
    }
    out
}

pub fn bench_decoder(c: &mut Criterion) {
    let mut g = c.benchmark_group("quadrature");
    // BENCH_SAMPLE_SIZE=10 cargo bench -p digipot_core --bench decoder
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(10));
    }
    let edges = synth_edges(1_000, 0xC0FFEE);

    g.bench_function("decode_1k_clicks", |b| {
        b.iter_batched(
            QuadratureDecoder::new,
            |mut d| {
                let mut count = 0usize;
                for &(pin, level, t) in &edges {
                    if d.on_edge(pin, level, t).is_some() {
                        count += 1;
                    }
                }
                black_box(count)
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("dispatch_1k_clicks", |b| {
        b.iter_batched(
            || PotController::builder().try_build().expect("controller"),
            |mut ctl| {
                for &(pin, level, timestamp) in &edges {
                    black_box(ctl.dispatch(Event::RotationEdge {
                        pin,
                        level,
                        timestamp,
                    }));
                }
                black_box(ctl.menu_selection())
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(benches, bench_decoder);
criterion_main!(benches);
