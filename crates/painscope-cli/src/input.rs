//! File readers for the batch subcommands.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use painscope_core::{PainCluster, RawSignal};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Parse a JSON Lines file. Blank lines are skipped; a malformed line
/// fails the whole read with its line number.
pub(crate) fn read_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_jsonl(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub(crate) fn parse_jsonl<T: DeserializeOwned>(raw: &str) -> anyhow::Result<Vec<T>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Cluster membership as produced by the external clustering step.
#[derive(Debug, Default)]
pub(crate) struct Assignments {
    pub(crate) members: BTreeMap<i64, Vec<String>>,
    pub(crate) titles: BTreeMap<i64, String>,
}

#[derive(Debug, Deserialize)]
struct AssignedCluster {
    #[serde(flatten)]
    cluster: PainCluster,
    signal_ids: Vec<String>,
}

/// Either a list of clusters with their members, or a bare object mapping
/// cluster id to member signal ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssignmentFile {
    Clusters(Vec<AssignedCluster>),
    Map(BTreeMap<String, Vec<String>>),
}

pub(crate) fn read_assignments(path: &Path) -> anyhow::Result<Assignments> {
    let raw: AssignmentFile = read_json(path)?;
    parse_assignments(raw)
}

fn parse_assignments(raw: AssignmentFile) -> anyhow::Result<Assignments> {
    let mut out = Assignments::default();
    match raw {
        AssignmentFile::Clusters(clusters) => {
            for AssignedCluster { cluster, signal_ids } in clusters {
                if out.members.insert(cluster.id, signal_ids).is_some() {
                    anyhow::bail!("cluster {} is listed twice", cluster.id);
                }
                out.titles.insert(cluster.id, cluster.title);
            }
        }
        AssignmentFile::Map(map) => {
            for (key, ids) in map {
                // JSON object keys are strings.
                let cluster_id = key
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("cluster id '{key}' is not an integer"))?;
                out.members.insert(cluster_id, ids);
            }
        }
    }
    Ok(out)
}

/// The evaluation date: explicit, else the newest signal's day, else today.
pub(crate) fn resolve_as_of(explicit: Option<NaiveDate>, signals: &[RawSignal]) -> NaiveDate {
    explicit
        .or_else(|| {
            signals
                .iter()
                .filter_map(|s| s.created_at)
                .max()
                .map(|t| t.date_naive())
        })
        .unwrap_or_else(|| Utc::now().date_naive())
}
