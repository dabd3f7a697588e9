//! Criterion benchmarks for the render path.
//!
//! Benchmarks:
//! 1. Encoding resolution + CSV parse of a Shift_JIS export
//! 2. Classify + select over a full table
//! 3. Template expansion at the 200-trade cap

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tradeplot_core::{classify_and_select, load_table, render, MAX_WINDOW};

const INSTRUMENT: &str = "米国NQ100ミニ";

const TEMPLATE: &str = include_str!("../tests/fixtures/trade_plotter.pine");

// ── Helpers ──────────────────────────────────────────────────────────

fn make_export(n: usize) -> String {
    let mut csv =
        String::from("約定日時,銘柄名,取引区分,売買区分,約定数量,約定単価,実現損益（円貨）\n");
    for i in 0..n {
        let ts = format!(
            "2024/{:02}/{:02} {:02}:{:02}:00",
            1 + (i / 1440) % 12,
            1 + (i / 60) % 24,
            9 + (i / 60) % 12,
            i % 60
        );
        if i % 2 == 0 {
            csv.push_str(&format!("{ts},{INSTRUMENT},CFD新規,買,1,{},\n", 18000 + i));
        } else {
            let pnl = if i % 3 == 0 { -250.5 } else { 500.0 };
            csv.push_str(&format!("{ts},{INSTRUMENT},CFD決済,売,1,{},{pnl}\n", 18000 + i));
        }
    }
    csv
}

fn shift_jis(text: &str) -> Vec<u8> {
    encoding_rs::SHIFT_JIS.encode(text).0.into_owned()
}

// ── 1. Load ──────────────────────────────────────────────────────────

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_table");
    for n in [200usize, 2000] {
        let bytes = shift_jis(&make_export(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &bytes, |b, bytes| {
            b.iter(|| load_table(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

// ── 2. Classify + select ─────────────────────────────────────────────

fn bench_select(c: &mut Criterion) {
    let loaded = load_table(&shift_jis(&make_export(2000))).unwrap();
    c.bench_function("classify_and_select_2000", |b| {
        b.iter(|| classify_and_select(black_box(&loaded.table), INSTRUMENT, 1, MAX_WINDOW).unwrap())
    });
}

// ── 3. Expand ────────────────────────────────────────────────────────

fn bench_expand(c: &mut Criterion) {
    let loaded = load_table(&shift_jis(&make_export(MAX_WINDOW))).unwrap();
    let selection = classify_and_select(&loaded.table, INSTRUMENT, 1, MAX_WINDOW).unwrap();
    c.bench_function("expand_200", |b| {
        b.iter(|| render(black_box(TEMPLATE), black_box(&selection.trades), INSTRUMENT).unwrap())
    });
}

criterion_group!(benches, bench_load, bench_select, bench_expand);
criterion_main!(benches);
