//! Trend engine: daily rollups, growth, velocity, breakout and freshness.
//!
//! Histories are always processed in date order with gaps filled by
//! zero-volume days, so rates stay comparable across sparse clusters.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use painscope_core::{
    DailyMetric, FreshnessConfig, OpportunityWindow, TrendConfig, TrendPoint, TrendReport,
    WindowTrend,
};

use crate::error::ScoringError;

const BREAKOUT_SPAN_DAYS: usize = 7;
const HALF_LIFE_MIN_DAYS: usize = 10;
const HALF_LIFE_FADE_RATIO: f64 = 0.7;
const SATURATION_SPAN_DAYS: usize = 7;

/// Exponential decay with a hard floor: `max(floor, exp(-lambda * age))`.
///
/// Negative or NaN ages count as zero.
#[must_use]
pub fn freshness_weight(age_days: f64, config: &FreshnessConfig) -> f64 {
    let age = age_days.max(0.0);
    (-config.decay_lambda * age).exp().max(config.floor)
}

/// Weight of an instance created at `created_at`, seen from `as_of`.
///
/// Undated instances get the configured undated weight.
#[must_use]
pub fn instance_weight(
    created_at: Option<DateTime<Utc>>,
    as_of: NaiveDate,
    config: &FreshnessConfig,
) -> f64 {
    match created_at {
        #[allow(clippy::cast_precision_loss)]
        Some(ts) => freshness_weight((as_of - ts.date_naive()).num_days() as f64, config),
        None => config.undated_weight,
    }
}

/// One instance as seen by the daily rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub created_at: Option<DateTime<Utc>>,
    pub source: String,
    pub engagement: u64,
    pub pain_score: f64,
}

/// The metric row for `day`. Observations dated on other days, or not at
/// all, are ignored.
#[must_use]
pub fn compute_daily(
    cluster_id: i64,
    day: NaiveDate,
    formula_version: &str,
    observations: &[DailyObservation],
) -> DailyMetric {
    let mut row = DailyMetric::zero(cluster_id, day, formula_version);
    let mut sources = BTreeSet::new();
    let mut score_sum = 0.0;

    for obs in observations
        .iter()
        .filter(|o| o.created_at.is_some_and(|ts| ts.date_naive() == day))
    {
        row.frequency += 1;
        row.engagement = row.engagement.saturating_add(obs.engagement);
        score_sum += obs.pain_score;
        sources.insert(obs.source.as_str());
    }

    if row.frequency > 0 {
        #[allow(clippy::cast_precision_loss)]
        let avg = score_sum / row.frequency as f64;
        row.avg_score = avg;
    }
    row.source_count = u64::try_from(sources.len()).unwrap_or(u64::MAX);
    row
}

/// Group observations by UTC day into rows sorted by date. Undated
/// observations are skipped; days with no observations produce no row.
#[must_use]
pub fn aggregate_daily(
    cluster_id: i64,
    formula_version: &str,
    observations: &[DailyObservation],
) -> Vec<DailyMetric> {
    let days: BTreeSet<NaiveDate> = observations
        .iter()
        .filter_map(|o| o.created_at.map(|ts| ts.date_naive()))
        .collect();

    days.into_iter()
        .map(|day| compute_daily(cluster_id, day, formula_version, observations))
        .collect()
}

/// Sort a history by date and fill missing days with zero rows.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidHistory`] if rows belong to different
/// clusters or formula versions, or if a date appears twice.
pub fn densify(history: &[DailyMetric]) -> Result<Vec<DailyMetric>, ScoringError> {
    let Some(first) = history.first() else {
        return Ok(Vec::new());
    };
    let by_date = index_history(first.cluster_id, &first.formula_version, history)?;
    let (Some(&start), Some(&end)) = (by_date.keys().next(), by_date.keys().next_back()) else {
        return Ok(Vec::new());
    };
    Ok(fill_range(first.cluster_id, &first.formula_version, &by_date, start, end))
}

fn index_history<'a>(
    cluster_id: i64,
    formula_version: &str,
    history: &'a [DailyMetric],
) -> Result<BTreeMap<NaiveDate, &'a DailyMetric>, ScoringError> {
    let mut by_date = BTreeMap::new();
    for row in history {
        if row.cluster_id != cluster_id {
            return Err(ScoringError::InvalidHistory(format!(
                "row for cluster {} in history of cluster {cluster_id}",
                row.cluster_id
            )));
        }
        if row.formula_version != formula_version {
            return Err(ScoringError::InvalidHistory(format!(
                "formula version '{}' mixed with '{formula_version}'",
                row.formula_version
            )));
        }
        if by_date.insert(row.date, row).is_some() {
            return Err(ScoringError::InvalidHistory(format!(
                "duplicate row for {}",
                row.date
            )));
        }
    }
    Ok(by_date)
}

fn fill_range(
    cluster_id: i64,
    formula_version: &str,
    by_date: &BTreeMap<NaiveDate, &DailyMetric>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyMetric> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| {
            by_date.get(&d).map_or_else(
                || DailyMetric::zero(cluster_id, d, formula_version),
                |row| (*row).clone(),
            )
        })
        .collect()
}

/// Relative change; zero when the baseline is zero.
fn relative_change(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn volumes(dense: &[DailyMetric]) -> Vec<f64> {
    dense.iter().map(|row| row.frequency as f64).collect()
}

/// Growth of day `i` against the mean of up to `baseline_days` preceding days.
fn daily_growth(volumes: &[f64], i: usize, baseline_days: usize) -> f64 {
    let start = i.saturating_sub(baseline_days);
    let preceding = &volumes[start..i];
    if preceding.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let baseline = preceding.iter().sum::<f64>() / preceding.len() as f64;
    relative_change(volumes[i], baseline)
}

/// Per-day trend points over a window of daily metrics.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidHistory`] for an inconsistent history.
pub fn compute_trend_series(
    window: &[DailyMetric],
    config: &TrendConfig,
) -> Result<Vec<TrendPoint>, ScoringError> {
    let dense = densify(window)?;
    Ok(series_from_dense(&dense, config))
}

fn series_from_dense(dense: &[DailyMetric], config: &TrendConfig) -> Vec<TrendPoint> {
    let vols = volumes(dense);
    let baseline_days = config.baseline_days() as usize;

    let mut points = Vec::with_capacity(dense.len());
    let mut previous_growth = None;
    for (i, row) in dense.iter().enumerate() {
        let growth_rate = daily_growth(&vols, i, baseline_days);
        let velocity = previous_growth.map_or(0.0, |prev| growth_rate - prev);
        previous_growth = Some(growth_rate);
        points.push(TrendPoint {
            date: row.date,
            volume: row.frequency,
            growth_rate,
            velocity,
            breakout_flag: is_breakout(growth_rate, velocity, row.frequency, config),
        });
    }
    points
}

/// Pure threshold over one day's computed values.
#[must_use]
pub fn is_breakout(growth_rate: f64, velocity: f64, volume: u64, config: &TrendConfig) -> bool {
    growth_rate >= config.breakout_growth
        && velocity >= config.breakout_velocity
        && volume >= config.breakout_min_volume
}

/// The trend point for the last day of the window.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidHistory`] for an empty or inconsistent
/// history.
pub fn compute_trend(window: &[DailyMetric], config: &TrendConfig) -> Result<TrendPoint, ScoringError> {
    compute_trend_series(window, config)?
        .pop()
        .ok_or_else(|| ScoringError::InvalidHistory("empty history".to_string()))
}

/// Sum of the `len` values ending just before `end` (exclusive). Days
/// before the start of the history count as zero.
fn window_sum(vols: &[f64], end: usize, len: usize) -> f64 {
    vols[end.saturating_sub(len)..end].iter().sum()
}

fn window_growth(vols: &[f64], end: usize, days: usize) -> (f64, f64, f64) {
    let recent = window_sum(vols, end, days);
    let baseline = window_sum(vols, end.saturating_sub(days), days);
    (recent, baseline, relative_change(recent, baseline))
}

/// Growth over each configured fixed window, ending at the last day.
///
/// Recent volume covers the last `w` days, baseline the `w` days before.
/// Velocity is growth now minus growth one day earlier.
#[must_use]
pub fn compute_windows(dense: &[DailyMetric], windows: &[u32]) -> Vec<WindowTrend> {
    let vols = volumes(dense);
    let end = vols.len();
    windows
        .iter()
        .map(|&w| {
            let days = w as usize;
            let (recent, baseline, growth_rate) = window_growth(&vols, end, days);
            let (_, _, previous_growth) = window_growth(&vols, end.saturating_sub(1), days);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (recent_volume, baseline_volume) = (recent as u64, baseline as u64);
            WindowTrend {
                window_days: w,
                recent_volume,
                baseline_volume,
                growth_rate,
                velocity: if end > 1 { growth_rate - previous_growth } else { 0.0 },
            }
        })
        .collect()
}

/// Last-7-days mean against the previous 7, mapped to `0..=100`.
///
/// Needs 14 days of history; a zero baseline scores 0.
#[must_use]
pub fn breakout_score(dense: &[DailyMetric]) -> f64 {
    let vols = volumes(dense);
    if vols.len() < BREAKOUT_SPAN_DAYS * 2 {
        return 0.0;
    }
    let end = vols.len();
    #[allow(clippy::cast_precision_loss)]
    let span = BREAKOUT_SPAN_DAYS as f64;
    let recent = window_sum(&vols, end, BREAKOUT_SPAN_DAYS) / span;
    let previous = window_sum(&vols, end - BREAKOUT_SPAN_DAYS, BREAKOUT_SPAN_DAYS) / span;
    if previous <= 0.0 {
        return 0.0;
    }
    ((recent / previous - 1.0) * 100.0).clamp(0.0, 100.0)
}

/// Days from the peak until volume first fell to half of it.
///
/// Only defined for fading clusters: at least 10 days of history, a
/// non-zero peak and a last day below 70% of that peak.
#[must_use]
pub fn estimate_half_life_days(dense: &[DailyMetric]) -> Option<f64> {
    let vols = volumes(dense);
    if vols.len() < HALF_LIFE_MIN_DAYS {
        return None;
    }
    let (peak_idx, peak) = vols
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0_f64), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    let last = *vols.last()?;
    if peak <= 0.0 || last >= HALF_LIFE_FADE_RATIO * peak {
        return None;
    }
    let half = peak / 2.0;
    vols[peak_idx..]
        .iter()
        .position(|&v| v <= half)
        .and_then(|offset| u32::try_from(offset).ok())
        .map(f64::from)
}

/// How far growth has stalled after a rise, `0..=100`.
///
/// Compares three consecutive weeks `a`, `b`, `c` ending at the last day.
/// Needs 21 days and a non-zero first week. A rise followed by a flat or
/// falling week scores by the size of that fall; a rise that slowed to
/// under a quarter of its pace scores by how much it slowed.
#[must_use]
pub fn saturation_score(dense: &[DailyMetric]) -> f64 {
    let vols = volumes(dense);
    let span = SATURATION_SPAN_DAYS;
    if vols.len() < span * 3 {
        return 0.0;
    }
    let end = vols.len();
    let a = window_sum(&vols, end - 2 * span, span);
    let b = window_sum(&vols, end - span, span);
    let c = window_sum(&vols, end, span);
    if a <= 0.0 {
        return 0.0;
    }
    let g1 = (b - a) / a;
    let g2 = relative_change(c, b);

    let stalled = if g1 > 0.0 && g2 <= 0.0 {
        g2.abs().min(1.0)
    } else if g1 > 0.0 && g2 > 0.0 && g2 < g1 * 0.25 {
        ((g1 - g2) / g1).min(1.0)
    } else {
        0.0
    };
    100.0 * stalled
}

/// Growth of the shortest configured window mapped to `0..=100`.
///
/// Growth is clamped to `[-1, 1]` first, so flat or unknown growth is 50.
#[must_use]
pub fn momentum_score(windows: &[WindowTrend]) -> f64 {
    let growth = windows.first().map_or(0.0, |w| w.growth_rate);
    let growth = if growth.is_finite() { growth.clamp(-1.0, 1.0) } else { 0.0 };
    100.0 * (0.5 + 0.5 * growth)
}

fn half_life_modifier(half_life_days: Option<f64>) -> f64 {
    match half_life_days {
        None => 0.0,
        Some(d) if d <= 0.0 => -0.10,
        Some(d) if d < 7.0 => -0.08,
        Some(d) if d < 14.0 => -0.04,
        Some(d) if d < 30.0 => 0.0,
        Some(d) if d < 60.0 => 0.03,
        Some(_) => 0.06,
    }
}

/// Timing score and status from breakout, saturation and momentum
/// (all `0..=100`), nudged by the half-life when one is known.
#[must_use]
pub fn opportunity_window(
    breakout: f64,
    saturation: f64,
    momentum: f64,
    half_life_days: Option<f64>,
) -> (f64, OpportunityWindow) {
    let norm = |x: f64| (x / 100.0).clamp(0.0, 1.0);
    let ratio = 0.45 * norm(breakout) + 0.35 * norm(momentum) + 0.20 * (1.0 - norm(saturation));
    let score = 100.0 * (ratio + half_life_modifier(half_life_days)).clamp(0.0, 1.0);

    let status = if breakout >= 65.0 && saturation <= 35.0 && momentum >= 55.0 {
        OpportunityWindow::Early
    } else if saturation >= 65.0 && breakout <= 40.0 {
        OpportunityWindow::Saturating
    } else if saturation <= 65.0 && breakout >= 40.0 {
        OpportunityWindow::Peak
    } else {
        OpportunityWindow::Unknown
    };
    (score, status)
}

/// Full trend view of one cluster as of `as_of`.
///
/// Rows after `as_of` are ignored. The history is padded with zero days up
/// to `as_of`, so a cluster that went quiet shows falling growth instead of
/// its last active day.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidHistory`] if any row belongs to another
/// cluster or formula version, or a date repeats.
pub fn trend_report(
    cluster_id: i64,
    formula_version: &str,
    history: &[DailyMetric],
    as_of: NaiveDate,
    config: &TrendConfig,
) -> Result<TrendReport, ScoringError> {
    let by_date = index_history(cluster_id, formula_version, history)?;
    let start = by_date
        .keys()
        .next()
        .copied()
        .filter(|d| *d <= as_of)
        .unwrap_or(as_of);
    let dense = fill_range(cluster_id, formula_version, &by_date, start, as_of);

    let series = series_from_dense(&dense, config);
    let point = series
        .last()
        .cloned()
        .ok_or_else(|| ScoringError::InvalidHistory("empty history".to_string()))?;

    let windows = compute_windows(&dense, &config.windows);
    let breakout = breakout_score(&dense);
    let half_life_days = estimate_half_life_days(&dense);
    let saturation = saturation_score(&dense);
    let momentum = momentum_score(&windows);
    let (window_score, window) = opportunity_window(breakout, saturation, momentum, half_life_days);

    Ok(TrendReport {
        cluster_id,
        formula_version: formula_version.to_string(),
        point,
        windows,
        breakout_score: breakout,
        half_life_days,
        saturation_score: saturation,
        momentum_score: momentum,
        opportunity_window_score: window_score,
        opportunity_window: window,
    })
}

#[cfg(test)]
#[path = "trend_test.rs"]
mod tests;
