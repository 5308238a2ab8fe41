use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};

use super::*;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn member(id: &str, pain_score: f64, days_old: u32, persona: Persona) -> ClusterMember {
    let created = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
        - chrono::Duration::days(i64::from(days_old));
    let mut breakdown = BTreeMap::new();
    breakdown.insert("base".to_string(), 0.05);
    breakdown.insert("pain_keywords".to_string(), pain_score - 0.05);
    ClusterMember {
        instance: PainInstance {
            signal_id: format!("reddit:{id}"),
            algo_version: "heuristics_v1".to_string(),
            pain_score,
            breakdown,
            breakdown_hash: String::new(),
        },
        features: FeatureVector {
            money_hits: 1,
            workaround_hits: 1,
            ..FeatureVector::default()
        },
        persona,
        source: "reddit".to_string(),
        created_at: Some(created),
    }
}

fn aggregate(members: &[ClusterMember]) -> ClusterAggregate {
    aggregate_cluster(
        42,
        members,
        as_of(),
        &VersionPolicy::Strict,
        &FreshnessConfig::default(),
    )
    .unwrap()
}

#[test]
fn empty_cluster_is_insufficient() {
    let agg = aggregate(&[]);
    assert!(!agg.valid);
    assert_eq!(agg.cluster_id, 42);
    assert_eq!(agg.instance_count, 0);
    assert_eq!(agg.persona, Persona::Unknown);
}

#[test]
fn single_member_aggregate() {
    let agg = aggregate(&[member("a", 0.6, 0, Persona::Founder)]);
    assert!(agg.valid);
    assert_eq!(agg.algo_version.as_deref(), Some("heuristics_v1"));
    assert_eq!(agg.instance_count, 1);
    assert_eq!(agg.source_count, 1);
    assert!((agg.weighted_mean_pain - 0.6).abs() < 1e-12);
    let expected = 100.0 * (0.8 * 0.6 + 0.2 * log_norm(1.0, 200.0));
    assert!((agg.severity - expected).abs() < 1e-9);
    assert_eq!(agg.persona, Persona::Founder);
    assert!((agg.persona_confidence - 1.0).abs() < 1e-12);
}

#[test]
fn recent_members_outweigh_old_ones() {
    let agg = aggregate(&[
        member("fresh", 0.9, 0, Persona::Founder),
        member("stale", 0.1, 200, Persona::Founder),
    ]);
    // the stale member sits on the floor weight
    assert!(agg.weighted_mean_pain > 0.8);
}

#[test]
fn adding_a_high_scoring_member_never_lowers_scores() {
    let base = vec![
        member("a", 0.4, 3, Persona::Operator),
        member("b", 0.7, 10, Persona::Operator),
    ];
    let before = aggregate(&base);

    let mut grown = base.clone();
    grown.push(member("c", before.weighted_mean_pain, 60, Persona::Founder));
    let after = aggregate(&grown);

    assert!(after.severity + 1e-9 >= before.severity);
    assert!(after.monetizability + 1e-9 >= before.monetizability);
}

#[test]
fn repeated_instance_key_counts_once() {
    let a = member("a", 0.6, 0, Persona::Founder);
    let agg = aggregate(&[a.clone(), a.clone(), a]);
    assert_eq!(agg.instance_count, 1);
    assert_eq!(agg, aggregate(&[member("a", 0.6, 0, Persona::Founder)]));
}

#[test]
fn strict_policy_refuses_mixed_versions() {
    let mut other = member("b", 0.5, 0, Persona::Founder);
    other.instance.algo_version = "heuristics_v2".to_string();
    let result = aggregate_cluster(
        42,
        &[member("a", 0.5, 0, Persona::Founder), other],
        as_of(),
        &VersionPolicy::Strict,
        &FreshnessConfig::default(),
    );
    assert!(matches!(
        result,
        Err(ScoringError::VersionMismatch { ref expected, ref found })
            if expected == "heuristics_v1" && found == "heuristics_v2"
    ));
}

#[test]
fn pinned_policy_drops_other_versions() {
    let mut other = member("b", 0.9, 0, Persona::Founder);
    other.instance.algo_version = "heuristics_v2".to_string();
    let agg = aggregate_cluster(
        42,
        &[member("a", 0.5, 0, Persona::Founder), other],
        as_of(),
        &VersionPolicy::Pin("heuristics_v1".to_string()),
        &FreshnessConfig::default(),
    )
    .unwrap();
    assert_eq!(agg.instance_count, 1);
    assert!((agg.weighted_mean_pain - 0.5).abs() < 1e-12);
}

#[test]
fn pin_matching_nothing_is_insufficient() {
    let agg = aggregate_cluster(
        42,
        &[member("a", 0.5, 0, Persona::Founder)],
        as_of(),
        &VersionPolicy::Pin("heuristics_v9".to_string()),
        &FreshnessConfig::default(),
    )
    .unwrap();
    assert!(!agg.valid);
}

#[test]
fn factor_contributions_are_weighted_means() {
    let agg = aggregate(&[
        member("a", 0.45, 0, Persona::Founder),
        member("b", 0.25, 0, Persona::Founder),
    ]);
    assert!((agg.factor_contributions["base"] - 0.05).abs() < 1e-12);
    assert!((agg.factor_contributions["pain_keywords"] - 0.30).abs() < 1e-12);
    let total: f64 = agg.factor_contributions.values().sum();
    assert!((total - agg.weighted_mean_pain).abs() < 1e-9);
}

#[test]
fn sources_are_counted_once() {
    let mut hn = member("b", 0.5, 0, Persona::Founder);
    hn.source = "hackernews".to_string();
    hn.instance.signal_id = "hackernews:b".to_string();
    let agg = aggregate(&[
        member("a", 0.5, 0, Persona::Founder),
        member("c", 0.5, 0, Persona::Founder),
        hn,
    ]);
    assert_eq!(agg.source_count, 2);
}

#[test]
fn undated_members_use_undated_weight() {
    let mut undated = member("b", 0.2, 0, Persona::Founder);
    undated.created_at = None;
    let agg = aggregate(&[member("a", 0.8, 0, Persona::Founder), undated]);
    // weights 1.0 and 0.5
    assert!((agg.weighted_mean_pain - (0.8 + 0.1) / 1.5).abs() < 1e-12);
}

#[test]
fn scores_stay_within_bounds() {
    let members: Vec<_> = (0..500)
        .map(|i| {
            let mut m = member(&i.to_string(), 1.0, 0, Persona::Founder);
            m.features.money_hits = 100;
            m.features.workaround_hits = 100;
            m
        })
        .collect();
    let agg = aggregate(&members);
    assert!(agg.severity <= 100.0);
    assert!(agg.monetizability <= 100.0);
}

#[test]
fn log_norm_is_bounded() {
    assert_eq!(log_norm(0.0, 10.0), 0.0);
    assert_eq!(log_norm(-3.0, 10.0), 0.0);
    assert!((log_norm(10.0, 10.0) - 1.0).abs() < 1e-12);
    assert_eq!(log_norm(1_000.0, 10.0), 1.0);
    assert_eq!(log_norm(5.0, 0.0), 0.0);
}

#[test]
fn members_created_after_as_of_are_left_out() {
    let mut future = member("later", 0.9, 0, Persona::Founder);
    future.created_at = Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
    assert!(!aggregate(&[future.clone()]).valid);

    let with_future = aggregate(&[member("a", 0.4, 1, Persona::Founder), future]);
    let without = aggregate(&[member("a", 0.4, 1, Persona::Founder)]);
    assert_eq!(with_future.instance_count, 1);
    assert!((with_future.severity - without.severity).abs() < 1e-12);
}

fn with_sentiment(id: &str, sentiment: f64, days_old: u32) -> ClusterMember {
    let mut m = member(id, 0.5, days_old, Persona::Founder);
    m.features.sentiment = sentiment;
    m
}

#[test]
fn unanimous_sentiment_has_no_contradiction() {
    let members = [
        with_sentiment("a", -0.6, 0),
        with_sentiment("b", -0.6, 0),
        with_sentiment("c", -0.6, 1),
    ];
    let refs: Vec<&ClusterMember> = members.iter().collect();
    assert!(contradiction_index(&refs).abs() < 1e-9);
    assert_eq!(contradiction_index(&[]), 0.0);
}

#[test]
fn split_sentiment_is_contradictory() {
    let members = [with_sentiment("a", 1.0, 0), with_sentiment("b", -1.0, 0)];
    let refs: Vec<&ClusterMember> = members.iter().collect();
    // variance 1.0 and a perfect split, all on one day
    assert!((contradiction_index(&refs) - 85.0).abs() < 1e-9);
}

#[test]
fn daily_swings_add_volatility() {
    let members = [with_sentiment("a", 0.05, 1), with_sentiment("b", 0.05, 0)];
    let steady: Vec<&ClusterMember> = members.iter().collect();
    assert_eq!(contradiction_index(&steady), 0.0);

    let swinging = [with_sentiment("a", -0.05, 1), with_sentiment("b", 0.05, 0)];
    let refs: Vec<&ClusterMember> = swinging.iter().collect();
    // variance 0.0025, nothing outside the neutral band, one delta of 0.1
    let expected = 100.0 * (0.55 * 0.0025 + 0.15 * 0.05);
    assert!((contradiction_index(&refs) - expected).abs() < 1e-9);
}

#[test]
fn confidence_needs_size_sources_and_agreement() {
    assert!((cluster_confidence(2, 1, 0.0, 100.0) - 25.0 / 3.0).abs() < 1e-9);
    assert!((cluster_confidence(30, 3, 1.0, 0.0) - 100.0).abs() < 1e-12);
    assert!((cluster_confidence(15, 1, 0.5, 50.0) - (12.5 + 25.0 / 3.0 + 12.5 + 12.5)).abs() < 1e-9);
}

#[test]
fn aggregate_carries_contradiction_and_confidence() {
    let agg = aggregate(&[
        with_sentiment("a", 0.8, 0),
        with_sentiment("b", -0.8, 1),
        with_sentiment("c", -0.8, 2),
    ]);
    assert!(agg.contradiction > 0.0);
    assert!(agg.confidence > 0.0 && agg.confidence <= 100.0);
    let expected = cluster_confidence(3, 1, agg.persona_confidence, agg.contradiction);
    assert!((agg.confidence - expected).abs() < 1e-12);
}
