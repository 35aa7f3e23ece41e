//! Aggregator fan-out with scripted adapters

mod common;

use std::time::{Duration, Instant};

use breach_lookup::{ErrorKind, Query, SourceKind};

use common::{aggregator, fakes_with_one_record, Behavior, FakeAdapter};

fn query() -> Query {
    Query::parse("89991234567", "phone").unwrap()
}

#[tokio::test]
async fn every_source_reports_once_in_dispatch_order() {
    let fakes = fakes_with_one_record();
    let report = aggregator(&fakes).aggregate(&query()).await;

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["ITP", "Dyxless", "LeakOsint", "Usersbox", "Vektor"]);
    assert_eq!(report.total_leaks, 5);
    assert_eq!(report.found_sources, 5);
    assert!(fakes.iter().all(|f| f.call_count() == 1));
}

#[tokio::test]
async fn totals_are_a_reduction_over_results() {
    let fakes = vec![
        FakeAdapter::with_one_record(SourceKind::Itp),
        FakeAdapter::new(SourceKind::Dyxless, Behavior::Unauthorized),
        FakeAdapter::new(
            SourceKind::LeakOsint,
            Behavior::Respond(serde_json::json!({"List": {}})),
        ),
        FakeAdapter::with_one_record(SourceKind::Usersbox),
        FakeAdapter::new(SourceKind::Vektor, Behavior::Timeout),
    ];
    let report = aggregator(&fakes).aggregate(&query()).await;

    assert_eq!(report.results.len(), 5);
    let expected_total: usize = report
        .results
        .iter()
        .filter(|r| r.ok)
        .map(|r| r.count)
        .sum();
    assert_eq!(report.total_leaks, expected_total);
    assert_eq!(report.total_leaks, 2);
    assert_eq!(
        report.found_sources,
        report.results.iter().filter(|r| r.found).count()
    );
    for result in &report.results {
        assert_eq!(result.found, result.ok && result.count > 0, "{}", result.name);
    }

    let dyxless = report.result("Dyxless").unwrap();
    assert_eq!(dyxless.error.as_ref().unwrap().kind, ErrorKind::Auth);
    let leakosint = report.result("LeakOsint").unwrap();
    assert!(leakosint.ok && !leakosint.found);
}

#[tokio::test]
async fn slow_source_does_not_hold_back_the_others() {
    let timeout = Duration::from_millis(400);
    let mut fakes: Vec<FakeAdapter> = SourceKind::ALL[..4]
        .iter()
        .map(|kind| FakeAdapter::with_one_record(*kind).with_delay(Duration::from_millis(20)))
        .collect();
    fakes.push(FakeAdapter::new(SourceKind::Vektor, Behavior::Timeout).with_delay(timeout));

    let started = Instant::now();
    let report = aggregator(&fakes).aggregate(&query()).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= timeout);
    assert!(elapsed < timeout * 2, "search took {:?}", elapsed);

    let vektor = report.result("Vektor").unwrap();
    assert!(!vektor.ok);
    assert_eq!(vektor.error.as_ref().unwrap().kind, ErrorKind::Transient);
    assert_eq!(report.found_sources, 4);
}

#[tokio::test]
async fn sources_run_concurrently() {
    let delay = Duration::from_millis(300);
    let fakes: Vec<FakeAdapter> = SourceKind::ALL
        .into_iter()
        .map(|kind| FakeAdapter::with_one_record(kind).with_delay(delay))
        .collect();

    let started = Instant::now();
    aggregator(&fakes).aggregate(&query()).await;

    // sequential dispatch would take five times the delay
    assert!(started.elapsed() < delay * 3);
}

#[tokio::test]
async fn panicking_adapter_becomes_internal_error() {
    let fakes = vec![
        FakeAdapter::with_one_record(SourceKind::Itp),
        FakeAdapter::new(SourceKind::Dyxless, Behavior::Panic),
        FakeAdapter::with_one_record(SourceKind::LeakOsint),
        FakeAdapter::with_one_record(SourceKind::Usersbox),
        FakeAdapter::with_one_record(SourceKind::Vektor),
    ];
    let report = aggregator(&fakes).aggregate(&query()).await;

    assert_eq!(report.results.len(), 5);
    let dyxless = report.result("Dyxless").unwrap();
    assert!(!dyxless.ok);
    assert_eq!(dyxless.error.as_ref().unwrap().kind, ErrorKind::Internal);
    assert_eq!(report.found_sources, 4);
    assert_eq!(report.total_leaks, 4);
}

#[tokio::test]
async fn all_sources_failing_still_yields_a_report() {
    let fakes: Vec<FakeAdapter> = SourceKind::ALL
        .into_iter()
        .map(|kind| FakeAdapter::new(kind, Behavior::Unauthorized))
        .collect();
    let report = aggregator(&fakes).aggregate(&query()).await;

    assert_eq!(report.results.len(), 5);
    assert_eq!(report.total_leaks, 0);
    assert_eq!(report.found_sources, 0);
    assert!(report.results.iter().all(|r| r.error.is_some()));

    let summary = report.summary_input();
    assert_eq!(summary.len(), 5);
    assert!(summary.iter().all(|s| !s.ok && s.error.is_some()));
}
