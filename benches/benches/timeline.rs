use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use paramline_engine::{ManualClock, NullSink, ParamSpec, Timeline, Unit};

fn dense_timeline(segments: usize) -> Timeline<NullSink, ManualClock> {
    let mut timeline = Timeline::with_clock(
        ParamSpec::new("cutoff", Unit::Frequency),
        NullSink::new(),
        ManualClock::new(0.0),
    );
    for segment in 0..segments {
        let time = segment as f64 * 0.01;
        let value = 200.0 + (segment % 32) as f64 * 50.0;
        match segment % 4 {
            0 => timeline.set_value_at_time(value, time),
            1 => timeline.linear_ramp_to_value_at_time(value, time),
            2 => timeline.exponential_ramp_to_value_at_time(value, time),
            _ => timeline.set_target_at_time(value, time, 0.004),
        }
        .expect("schedule segment");
    }
    timeline
}

fn value_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline");
    group.measurement_time(Duration::from_secs(5));

    let timeline = dense_timeline(4_096);
    group.bench_function("value_at_4096_events", |b| {
        let mut time = 0.0;
        b.iter(|| {
            time = (time + 0.0037) % 40.96;
            black_box(timeline.value_at(black_box(time)).expect("value"));
        });
    });

    group.bench_function("render_block_48k_256", |b| {
        let mut block = vec![0.0; 256];
        b.iter(|| {
            timeline
                .render_block(black_box(12.0), 48_000.0, &mut block)
                .expect("render");
            black_box(&block);
        });
    });

    group.finish();
}

fn scheduling(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline_scheduling");

    group.bench_function("set_inside_ramps_1024", |b| {
        b.iter_batched(
            || dense_timeline(1_024),
            |mut timeline| {
                for step in 0..64 {
                    let time = step as f64 * 0.157;
                    timeline
                        .set_value_at_time(300.0, time)
                        .expect("set inside ramp");
                }
                timeline
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("cancel_and_hold_1024", |b| {
        b.iter_batched(
            || dense_timeline(1_024),
            |mut timeline| {
                timeline.cancel_and_hold_at_time(5.005).expect("hold");
                timeline
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, value_lookup, scheduling);
criterion_main!(benches);
