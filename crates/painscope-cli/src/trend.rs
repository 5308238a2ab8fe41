//! Trend handler over stored daily metrics.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use painscope_core::{DailyMetric, TrendConfig, TrendPoint};
use painscope_scoring::compute_trend_series;
use serde::Serialize;

use crate::input::read_json;

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct SeriesRow<'a> {
    pub(crate) cluster_id: i64,
    pub(crate) formula_version: &'a str,
    #[serde(flatten)]
    pub(crate) point: TrendPoint,
}

/// Split a metrics dump into one history per `(cluster_id, formula_version)`.
///
/// Rows after `as_of` are dropped; a zero row is appended at `as_of` when
/// the history stops short of it so silent days count as zero volume.
pub(crate) fn group_histories(
    metrics: Vec<DailyMetric>,
    as_of: Option<NaiveDate>,
) -> BTreeMap<(i64, String), Vec<DailyMetric>> {
    let mut grouped: BTreeMap<(i64, String), Vec<DailyMetric>> = BTreeMap::new();
    for row in metrics {
        if as_of.is_some_and(|d| row.date > d) {
            continue;
        }
        grouped
            .entry((row.cluster_id, row.formula_version.clone()))
            .or_default()
            .push(row);
    }
    if let Some(as_of) = as_of {
        for ((cluster_id, formula_version), history) in &mut grouped {
            if !history.iter().any(|row| row.date == as_of) {
                history.push(DailyMetric::zero(*cluster_id, as_of, formula_version));
            }
        }
    }
    grouped
}

/// Print every day's trend payload for every cluster in the metrics file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a history holds two rows
/// for the same day.
pub(crate) fn run_trend(
    config: &TrendConfig,
    metrics_path: &Path,
    as_of: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let metrics: Vec<DailyMetric> = read_json(metrics_path)?;
    let grouped = group_histories(metrics, as_of);
    if grouped.is_empty() {
        println!("no daily metrics found");
        return Ok(());
    }

    for ((cluster_id, formula_version), history) in &grouped {
        let series = compute_trend_series(history, config)?;
        tracing::debug!(cluster_id, %formula_version, days = series.len(), "trend series computed");
        for point in series {
            let row = SeriesRow {
                cluster_id: *cluster_id,
                formula_version,
                point,
            };
            println!("{}", serde_json::to_string(&row)?);
        }
    }
    Ok(())
}
