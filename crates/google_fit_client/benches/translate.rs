use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use google_fit_client::MetricFamily;
use google_fit_client::model::{Bucket, DataPoint, DataSet, PlatformValue, ReadResult};
use google_fit_client::translate::{DailyShape, IntervalShape, translate};
use std::hint::black_box;

const STEPS: &str = "com.google.step_count.delta";

/// Four weeks of 30-minute buckets, one step point each.
fn month_of_buckets() -> ReadResult {
    let width = 1_800_000i64;
    ReadResult::Buckets(
        (0..1344i64)
            .map(|i| Bucket {
                start_ms: i * width,
                end_ms: (i + 1) * width,
                data_sets: vec![DataSet::new(
                    STEPS,
                    vec![
                        DataPoint::new(STEPS, i * width, (i + 1) * width)
                            .with_field("steps", PlatformValue::Int(i % 500)),
                    ],
                )],
            })
            .collect(),
    )
}

fn bench_translate(c: &mut Criterion) {
    let result = month_of_buckets();
    let interval = IntervalShape { tz: Utc };
    let daily = DailyShape {
        metric: MetricFamily::Steps,
        tz: Utc,
    };
    c.bench_function("translate_interval_month", |b| {
        b.iter(|| translate(black_box(&result), &interval).expect("translate"))
    });
    c.bench_function("translate_daily_month", |b| {
        b.iter(|| translate(black_box(&result), &daily).expect("translate"))
    });
}

criterion_group!(benches, bench_translate);
criterion_main!(benches);
