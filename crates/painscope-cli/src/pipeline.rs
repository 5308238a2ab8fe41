//! Ingest, score and analyze handlers.

use std::path::Path;

use chrono::NaiveDate;
use painscope_core::{ContentFingerprint, RawSignal};
use painscope_scoring::{
    ClusterAnalysis, DedupIndex, IngestReport, InstanceLedger, Pipeline, ScoredSignal, SeenSignal,
};

use crate::input::{read_assignments, read_jsonl, resolve_as_of, Assignments};

/// Load previously stored `(source, external_id, fingerprint)` records.
///
/// Records whose fingerprint is not a 64-char hex digest are skipped with a
/// warning so one bad row cannot poison the index.
fn load_seen(path: &Path) -> anyhow::Result<Vec<SeenSignal>> {
    let rows: Vec<SeenSignal> = read_jsonl(path)?;
    let total = rows.len();
    let seen: Vec<SeenSignal> = rows
        .into_iter()
        .filter(|row| {
            let valid = ContentFingerprint::from_hex(row.fingerprint.as_str()).is_some();
            if !valid {
                tracing::warn!(
                    source = %row.source,
                    external_id = %row.external_id,
                    "stored fingerprint is malformed; skipping"
                );
            }
            valid
        })
        .collect();
    tracing::debug!(loaded = seen.len(), skipped = total - seen.len(), "seeded dedup index");
    Ok(seen)
}

fn ingest(
    pipeline: &Pipeline,
    signals: &[RawSignal],
    existing: Option<&Path>,
) -> anyhow::Result<IngestReport> {
    let mut index = match existing {
        Some(path) => DedupIndex::from_seen(&load_seen(path)?),
        None => DedupIndex::new(),
    };
    Ok(pipeline.ingest(signals, &mut index))
}

/// Human-readable ingest outcome for stderr, one line per duplicate,
/// rejection and cross-source match, then a summary.
fn report_lines(report: &IngestReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (signal_id, reason) in &report.duplicates {
        lines.push(format!("duplicate  {signal_id:<32} {reason:?}"));
    }
    for (signal_id, err) in &report.rejected {
        lines.push(format!("rejected   {signal_id:<32} {err}"));
    }
    for (signal_id, sources) in &report.cross_source {
        lines.push(format!("also on    {signal_id:<32} {}", sources.join(", ")));
    }
    lines.push(format!(
        "{} accepted, {} duplicates, {} rejected, {} seen on other sources",
        report.accepted.len(),
        report.duplicates.len(),
        report.rejected.len(),
        report.cross_source.len()
    ));
    lines
}

/// Normalize and dedup a batch, printing one fingerprint record per
/// accepted signal. The output can be appended to the `--existing` file of
/// the next run.
///
/// # Errors
///
/// Returns an error if either input file cannot be read or parsed.
pub(crate) fn run_ingest(
    pipeline: &Pipeline,
    signals_path: &Path,
    existing: Option<&Path>,
) -> anyhow::Result<()> {
    let signals: Vec<RawSignal> = read_jsonl(signals_path)?;
    let report = ingest(pipeline, &signals, existing)?;

    for accepted in &report.accepted {
        println!("{}", serde_json::to_string(&SeenSignal::from(accepted))?);
    }
    for line in report_lines(&report) {
        eprintln!("{line}");
    }
    Ok(())
}

fn score_file(pipeline: &Pipeline, signals: &[RawSignal]) -> anyhow::Result<Vec<ScoredSignal>> {
    let report = ingest(pipeline, signals, None)?;
    let mut ledger = InstanceLedger::new();
    Ok(pipeline.score_new(&report.accepted, &mut ledger)?)
}

/// Score a batch and print one pain instance per line.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a breakdown cannot be
/// hashed.
pub(crate) fn run_score(pipeline: &Pipeline, signals_path: &Path) -> anyhow::Result<()> {
    let signals: Vec<RawSignal> = read_jsonl(signals_path)?;
    for scored in score_file(pipeline, &signals)? {
        println!("{}", serde_json::to_string(&scored.instance)?);
    }
    Ok(())
}

/// Run the whole pipeline over a batch and an assignment map.
///
/// # Errors
///
/// Returns an error if an input cannot be read, a cluster mixes scorer
/// versions, or a trend history is inconsistent.
pub(crate) fn run_analyze(
    pipeline: &Pipeline,
    signals_path: &Path,
    assignments_path: &Path,
    as_of: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let signals: Vec<RawSignal> = read_jsonl(signals_path)?;
    let assignments = read_assignments(assignments_path)?;
    let as_of = resolve_as_of(as_of, &signals);

    let scored = score_file(pipeline, &signals)?;
    let analyses = pipeline.analyze(&scored, &assignments.members, as_of)?;

    if json {
        for analysis in &analyses {
            println!("{}", serde_json::to_string(analysis)?);
        }
    } else {
        print_table(&analyses, &assignments, as_of);
    }
    Ok(())
}

fn print_table(analyses: &[ClusterAnalysis], assignments: &Assignments, as_of: NaiveDate) {
    if analyses.is_empty() {
        println!("no clusters assigned");
        return;
    }

    println!("as of {as_of}");
    println!(
        "{:<10}{:<8}{:<10}{:<12}{:<12}{:<10}RECOMMENDATION",
        "CLUSTER", "N", "SEVERITY", "MONETIZE", "PERSONA", "BREAKOUT"
    );
    for a in analyses {
        println!(
            "{:<10}{:<8}{:<10.3}{:<12.3}{:<12}{:<10}{}",
            a.cluster_id,
            a.aggregate.instance_count,
            a.aggregate.severity,
            a.aggregate.monetizability,
            a.aggregate.persona.label(),
            if a.trend.point.breakout_flag { "yes" } else { "no" },
            a.recommendation.recommendation,
        );
    }
    println!();
    for a in analyses {
        let label = assignments
            .titles
            .get(&a.cluster_id)
            .cloned()
            .unwrap_or_else(|| format!("cluster:{}", a.cluster_id));
        println!("{label}: {}", a.recommendation.reasoning_summary);
    }
}
