//! # Progress Benchmarks
//!
//! Summary and roster statistics over growing rosters.
//!
//! Run with: `cargo bench -p clearance-core`

use chrono::NaiveDate;
use clearance_core::formats::{roster_from_blob, roster_to_blob};
use clearance_core::{
    Decision, DepartmentId, DepartmentSet, FixedClock, ProgressEngine, Roster, StudentRecord,
    summarize,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Build `size` applied students, each with a different number of approvals.
fn create_roster(size: usize) -> Roster {
    let engine = ProgressEngine::new(FixedClock(
        NaiveDate::from_ymd_opt(2024, 12, 3).expect("valid date"),
    ));
    let form = clearance_core::ApplicationForm {
        name: "Bench Student".to_string(),
        reg_no: "CS/2020/000".to_string(),
        course: "BSc Computer Science".to_string(),
        email: "bench@student.mksu.ac.ke".to_string(),
        phone: "+254700000000".to_string(),
    };

    let records = (0..size)
        .map(|i| {
            let record = StudentRecord::new(format!("STU{:05}", i), DepartmentSet::Extended);
            let record = engine.record_payment(&record, 5500, "BENCH001").expect("pay");
            let mut record = engine.record_application(&record, &form).expect("apply");
            for dept in DepartmentId::ALL.iter().take(i % 9) {
                record = engine
                    .apply_approval(&record, *dept, Decision::Approved, "Registrar", None)
                    .expect("approve");
            }
            record
        })
        .collect();
    Roster::new(records)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for size in [10, 100, 1000].iter() {
        let roster = create_roster(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &roster, |b, roster| {
            b.iter(|| {
                for record in roster.records() {
                    black_box(summarize(record));
                }
            });
        });
    }

    group.finish();
}

fn bench_roster_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_stats");

    for size in [10, 100, 1000].iter() {
        let roster = create_roster(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &roster, |b, roster| {
            b.iter(|| black_box(roster.stats()));
        });
    }

    group.finish();
}

fn bench_roster_blob(c: &mut Criterion) {
    let roster = create_roster(200);
    let blob = roster_to_blob(roster.records()).expect("encode");

    c.bench_function("roster_blob_decode_200", |b| {
        b.iter(|| black_box(roster_from_blob(&blob).expect("decode")));
    });
}

criterion_group!(benches, bench_summarize, bench_roster_stats, bench_roster_blob);
criterion_main!(benches);
