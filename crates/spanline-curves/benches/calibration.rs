//! Benchmarks for span calibration.
//!
//! Run with: cargo bench -p spanline-curves

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use spanline_core::{Currency, Date, Frequency};
use spanline_curves::prelude::*;
use spanline_math::spline::CalibrationDetail;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn spot() -> Date {
    Date::from_ymd(2025, 1, 2).unwrap()
}

fn usd_specs(swap_count: i32) -> Vec<StretchSpec> {
    let mut cash = StretchSpec::new("cash");
    for (months, quote) in [(1, 0.0430), (3, 0.0435), (6, 0.0438), (12, 0.0425)] {
        let maturity = spot().add_months(months).unwrap();
        cash = cash.with_instrument(
            Deposit::new(format!("DEP-{months}M"), spot(), maturity).unwrap(),
            quote,
        );
    }
    let mut swaps = StretchSpec::new("swaps");
    for years in 2..2 + swap_count {
        let quote = 0.040 + 0.0005 * f64::from(years);
        swaps = swaps.with_instrument(
            Swap::regular(format!("SWP-{years}Y"), spot(), years, Frequency::SemiAnnual).unwrap(),
            quote,
        );
    }
    vec![cash, swaps]
}

// =============================================================================
// CALIBRATION
// =============================================================================

fn bench_calibration(c: &mut Criterion) {
    let mut group = c.benchmark_group("span_calibration");
    let context = ValuationContext::new(spot(), Currency::USD);

    for swap_count in [5, 10, 28] {
        let specs = usd_specs(swap_count);
        for detail in [CalibrationDetail::Full, CalibrationDetail::ShapeOnly] {
            let config = CurveConfig::default().with_detail(detail);
            group.bench_with_input(
                BenchmarkId::new(format!("{detail:?}"), swap_count),
                &specs,
                |b, specs| {
                    b.iter(|| {
                        CalibratedCurve::calibrate(
                            black_box(config.clone()),
                            context,
                            black_box(specs.clone()),
                        )
                        .unwrap()
                    });
                },
            );
        }
    }
    group.finish();
}

// =============================================================================
// QUERIES
// =============================================================================

fn bench_queries(c: &mut Criterion) {
    let context = ValuationContext::new(spot(), Currency::USD);
    let curve = CalibratedCurve::calibrate(CurveConfig::default(), context, usd_specs(10)).unwrap();
    let date = spot().add_days(2000);

    c.bench_function("discount_factor", |b| {
        b.iter(|| curve.discount_factor(black_box(date)).unwrap());
    });
    c.bench_function("jacobian_df_to_quotes", |b| {
        b.iter(|| curve.jacobian_df_to_quotes(black_box(date)).unwrap());
    });
    c.bench_function("parallel_bump", |b| {
        b.iter(|| curve.bumped(black_box(&CurveBump::parallel(1.0))).unwrap());
    });
}

criterion_group!(benches, bench_calibration, bench_queries);
criterion_main!(benches);
