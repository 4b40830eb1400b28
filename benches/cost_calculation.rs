use chrono::{DateTime, Duration};
use clusage_core::{TokenBreakdown, UsageRecord};
use clusage_pricing::{CostCalculator, CostOptions, ModelPricing, ModelTier};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const MODELS: &[Option<&str>] = &[Some("Opus 4.5"), Some("Sonnet 4.5"), Some("Haiku 4.5"), None];

fn create_test_records(count: usize) -> Vec<UsageRecord> {
    let base = DateTime::parse_from_rfc3339("2026-10-18T00:00:00+09:00").unwrap();
    (0..count)
        .map(|i| {
            let mut record = UsageRecord::new(base + Duration::minutes(i as i64), 0.5, 0.3);
            record.model = MODELS[i % MODELS.len()].map(str::to_string);
            // Every tenth record has no token data and is skipped
            if i % 10 != 0 {
                record.tokens = Some(TokenBreakdown::new(
                    (i * 100) as u64,
                    (i * 50) as u64,
                    (i * 10) as u64,
                    (i * 5) as u64,
                ));
            }
            record
        })
        .collect()
}

fn benchmark_cost_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_calculation");
    let pricing: ModelPricing = ModelTier::from_model_name(Some("Sonnet 4.5")).pricing();

    group.bench_function("calculate_from_pricing", |b| {
        let tokens = TokenBreakdown::new(10_000, 5_000, 1_000, 500);
        b.iter(|| CostCalculator::calculate_from_pricing(black_box(&tokens), black_box(&pricing)));
    });

    group.bench_function("calculate_large_tokens", |b| {
        let tokens = TokenBreakdown::new(1_000_000, 500_000, 100_000, 50_000);
        b.iter(|| CostCalculator::calculate_from_pricing(black_box(&tokens), black_box(&pricing)));
    });

    group.bench_function("tier_lookup", |b| {
        b.iter(|| {
            for model in MODELS {
                black_box(ModelTier::from_model_name(black_box(*model)));
            }
        });
    });

    group.finish();
}

fn benchmark_batch_cost_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_cost_calculation");

    for count in [100, 1_000, 10_000] {
        let records = create_test_records(count);
        group.bench_function(format!("total_cost_{count}_records"), |b| {
            b.iter(|| CostCalculator::calculate_total_cost(black_box(&records), CostOptions::default()));
        });
    }

    let records = create_test_records(1_000);
    group.bench_function("total_cost_with_krw", |b| {
        b.iter(|| CostCalculator::calculate_total_cost(black_box(&records), CostOptions::krw(1_380.0)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_cost_calculation, benchmark_batch_cost_calculation);
criterion_main!(benches);
