//! Benchmarks for widget building over large dashboard snapshots

#![allow(clippy::cast_precision_loss, missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sdrcrm_core::types::{BreakdownData, BreakdownItem, MonthlyStat, MySummary, UserTarget};
use sdrcrm_core::utils::format_inr;
use sdrcrm_views::dashboard::widgets::{self, Ranking};
use sdrcrm_views::{DashboardSnapshot, Slice};
use std::hint::black_box;

fn snapshot(rows: usize) -> DashboardSnapshot {
    let items: Vec<BreakdownItem> = (0..rows)
        .map(|i| BreakdownItem {
            name: format!("Product {i}"),
            count: (i % 17) as u64,
            total_amount: ((i * 7919) % 100_000) as f64,
        })
        .collect();

    DashboardSnapshot {
        monthly: Slice::Loaded(
            (0..24)
                .map(|m| MonthlyStat {
                    month: format!("M{m}"),
                    revenue: (m * 1000) as f64,
                    count: m as u64,
                })
                .collect(),
        ),
        breakdown: Slice::Loaded(BreakdownData {
            by_product: items.clone(),
            by_partner: items.clone(),
            by_salesperson: items,
        }),
        my_summary: Slice::Loaded(MySummary {
            targets: (0..rows)
                .map(|i| UserTarget {
                    name: format!("User {i}"),
                    target: 100_000.0,
                    achieved: (i * 13) as f64,
                    ..UserTarget::default()
                })
                .collect(),
            ..MySummary::default()
        }),
        ..DashboardSnapshot::default()
    }
}

/// Sorting and paging the breakdown tables
fn bench_ranked(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranked");

    for rows in [10, 100, 1_000, 10_000] {
        let snap = snapshot(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("products_page_1", rows), &snap, |b, snap| {
            b.iter(|| widgets::ranked(black_box(snap), Ranking::Products, 1, 10));
        });
    }

    group.finish();
}

/// Every widget over one snapshot, as a dashboard render does
fn bench_full_render(c: &mut Criterion) {
    let snap = snapshot(500);

    c.bench_function("full_render", |b| {
        b.iter(|| {
            let snap = black_box(&snap);
            (
                widgets::kpi_cards(snap),
                widgets::revenue_trend(snap),
                widgets::ranked(snap, Ranking::Products, 1, 5),
                widgets::ranked(snap, Ranking::Partners, 1, 5),
                widgets::ranked(snap, Ranking::Salespeople, 1, 5),
                widgets::targets(snap, 1, 10),
            )
        });
    });
}

fn bench_format_inr(c: &mut Criterion) {
    c.bench_function("format_inr", |b| {
        b.iter(|| format_inr(black_box(12_345_678.9)));
    });
}

criterion_group!(benches, bench_ranked, bench_full_render, bench_format_inr);
criterion_main!(benches);
