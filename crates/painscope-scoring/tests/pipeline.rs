use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use painscope_core::{PipelineConfig, RawSignal, Recommendation};
use painscope_scoring::{
    fingerprint, normalize, DedupIndex, DuplicateReason, InstanceLedger, Pipeline, SeenSignal,
};

fn signal(source: &str, external_id: &str, title: &str, body: &str, day: u32) -> RawSignal {
    RawSignal {
        external_id: external_id.to_string(),
        source: source.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        url: Some(format!("https://{source}.example/{external_id}")),
        created_at: Some(Utc.with_ymd_and_hms(2025, 5, day, 15, 30, 0).unwrap()),
        engagement: 3,
    }
}

fn complaint(source: &str, n: usize, day: u32) -> RawSignal {
    signal(
        source,
        &format!("{day}-{n}"),
        &format!("How do you reconcile Stripe payouts? (#{n} on day {day})"),
        "Our startup wastes hours every week copying payouts into a spreadsheet. \
         It is frustrating and the accounting tools we pay for cannot do it.",
        day,
    )
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
}

fn pipeline() -> Pipeline {
    Pipeline::from_config(PipelineConfig::default()).unwrap()
}

#[test]
fn whitespace_and_case_variants_share_a_fingerprint() {
    let empty = normalize("").unwrap();
    assert_eq!(
        fingerprint(&normalize("Hello   world").unwrap(), &empty),
        fingerprint(&normalize("hello world").unwrap(), &empty)
    );
    assert_eq!(
        fingerprint(&normalize("Hello\u{a0}world").unwrap(), &empty),
        fingerprint(&normalize(" hello world ").unwrap(), &empty)
    );
}

#[test]
fn same_signal_twice_yields_one_instance() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let mut ledger = InstanceLedger::new();
    let raw = complaint("reddit", 1, 10);

    let first = p.ingest(std::slice::from_ref(&raw), &mut index);
    assert_eq!(first.accepted.len(), 1);
    p.score_new(&first.accepted, &mut ledger).unwrap();

    let second = p.ingest(std::slice::from_ref(&raw), &mut index);
    assert!(second.accepted.is_empty());
    assert_eq!(second.duplicates.len(), 1);
    assert_eq!(second.duplicates[0].1, DuplicateReason::SameExternalId);
    p.score_new(&second.accepted, &mut ledger).unwrap();

    assert_eq!(ledger.len(), 1);
    assert!(ledger.get("reddit:1-10", "heuristics_v1").is_some());
}

#[test]
fn reposted_content_under_new_id_is_rejected_for_same_source() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let original = signal("reddit", "a", "Export is broken", "Nothing works.", 3);
    let repost = signal("reddit", "b", "export  is BROKEN", "nothing works.", 4);
    let report = p.ingest(&[original, repost], &mut index);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.duplicates[0].1, DuplicateReason::SameContent);
}

#[test]
fn index_seeded_from_storage_rejects_known_content() {
    let p = pipeline();
    let raw = complaint("reddit", 1, 10);

    let mut first_index = DedupIndex::new();
    let report = p.ingest(std::slice::from_ref(&raw), &mut first_index);
    let seen: Vec<SeenSignal> = report.accepted.iter().map(SeenSignal::from).collect();

    let mut restored = DedupIndex::from_seen(&seen);
    let again = p.ingest(&[raw], &mut restored);
    assert!(again.accepted.is_empty());
}

#[test]
fn empty_cluster_gets_insufficient_data() {
    let p = pipeline();
    let assignments = BTreeMap::from([(5_i64, Vec::new())]);
    let analyses = p.analyze(&[], &assignments, may(20)).unwrap();
    assert_eq!(analyses.len(), 1);
    let analysis = &analyses[0];
    assert!(!analysis.aggregate.valid);
    assert_eq!(
        analysis.recommendation.recommendation,
        Recommendation::InsufficientData
    );
    assert!(analysis.recommendation.top_positive_factors.is_empty());
}

#[test]
fn spiking_cluster_breaks_out() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let mut raw = Vec::new();
    for (day, count) in [(1, 5), (2, 5), (3, 20)] {
        raw.extend((0..count).map(|n| complaint("reddit", n, day)));
    }
    raw.extend((0..4).map(|n| complaint("hackernews", 100 + n, 3)));

    let report = p.ingest(&raw, &mut index);
    assert_eq!(report.accepted.len(), 34);
    let scored = p.score(&report.accepted).unwrap();

    let assignments = BTreeMap::from([(
        1_i64,
        scored.iter().map(|s| s.instance.signal_id.clone()).collect::<Vec<_>>(),
    )]);
    let analyses = p.analyze(&scored, &assignments, may(3)).unwrap();
    let analysis = &analyses[0];

    let point = &analysis.trend.point;
    assert_eq!(point.date, may(3));
    assert_eq!(point.volume, 24);
    assert!(point.growth_rate > 0.0);
    assert!(point.breakout_flag);

    assert!(analysis.aggregate.valid);
    assert_eq!(analysis.aggregate.instance_count, 34);
    assert_eq!(analysis.aggregate.source_count, 2);
    assert_eq!(analysis.aggregate.persona.label(), "founder");
    assert_ne!(
        analysis.recommendation.recommendation,
        Recommendation::InsufficientData
    );
    assert!(analysis
        .recommendation
        .top_positive_factors
        .iter()
        .any(|f| f.starts_with("breakout")));
}

#[test]
fn analysis_is_reproducible() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let raw: Vec<RawSignal> = (0..12_u32).map(|n| complaint("reddit", n as usize, 1 + n % 6)).collect();
    let report = p.ingest(&raw, &mut index);
    let scored = p.score(&report.accepted).unwrap();
    let assignments: BTreeMap<i64, Vec<String>> = BTreeMap::from([
        (1_i64, scored[..6].iter().map(|s| s.instance.signal_id.clone()).collect()),
        (2_i64, scored[6..].iter().map(|s| s.instance.signal_id.clone()).collect()),
    ]);

    let first = p.analyze(&scored, &assignments, may(10)).unwrap();
    let second = p.analyze(&scored, &assignments, may(10)).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.iter().map(|a| a.cluster_id).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn unscored_assignment_is_skipped() {
    let p = pipeline();
    let assignments = BTreeMap::from([(9_i64, vec!["reddit:missing".to_string()])]);
    let analyses = p.analyze(&[], &assignments, may(1)).unwrap();
    assert!(!analyses[0].aggregate.valid);
}

#[test]
fn payloads_serialize_with_boundary_field_names() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let report = p.ingest(&[complaint("reddit", 1, 2)], &mut index);
    let scored = p.score(&report.accepted).unwrap();
    let assignments = BTreeMap::from([(1_i64, vec![scored[0].instance.signal_id.clone()])]);
    let analysis = p.analyze(&scored, &assignments, may(2)).unwrap().remove(0);

    let rec = serde_json::to_value(&analysis.recommendation).unwrap();
    for key in [
        "recommendation",
        "reasoning_summary",
        "top_positive_factors",
        "top_risk_factors",
    ] {
        assert!(rec.get(key).is_some(), "missing {key}");
    }

    let point = serde_json::to_value(&analysis.trend.point).unwrap();
    assert_eq!(point["date"], "2025-05-02");
    for key in ["volume", "growth_rate", "velocity", "breakout_flag"] {
        assert!(point.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn repeated_assignment_ids_count_once() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let raw: Vec<RawSignal> = (1..=3).map(|day| complaint("reddit", 0, day)).collect();
    let report = p.ingest(&raw, &mut index);
    let scored = p.score(&report.accepted).unwrap();
    let id = |i: usize| scored[i].instance.signal_id.clone();
    let assignments = BTreeMap::from([(1_i64, vec![id(0), id(1), id(2), id(2), id(2)])]);

    let analysis = p.analyze(&scored, &assignments, may(3)).unwrap().remove(0);
    assert_eq!(analysis.aggregate.instance_count, 3);
    assert_eq!(analysis.trend.point.volume, 1);
    assert!(!analysis.trend.point.breakout_flag);
    assert_eq!(analysis.trend.point.growth_rate, 0.0);
}

#[test]
fn signals_after_as_of_do_not_count() {
    let p = pipeline();
    let mut index = DedupIndex::new();
    let raw: Vec<RawSignal> = (1..=3).map(|day| complaint("reddit", 0, day)).collect();
    let report = p.ingest(&raw, &mut index);
    let scored = p.score(&report.accepted).unwrap();
    let assignments = BTreeMap::from([(
        1_i64,
        scored.iter().map(|s| s.instance.signal_id.clone()).collect::<Vec<_>>(),
    )]);

    let analysis = p.analyze(&scored, &assignments, may(2)).unwrap().remove(0);
    assert_eq!(analysis.aggregate.instance_count, 2);
    assert_eq!(analysis.trend.point.date, may(2));
}
