//! Recommendation synthesis from a cluster aggregate and its trend report.

use std::cmp::Ordering;

use painscope_core::{
    BuildSignalRecommendation, Calibration, ClusterAggregate, OpportunityWindow, Persona,
    Recommendation, TrendPoint, TrendReport,
};

/// Magnitude reported for a cluster seen on only one source.
const SINGLE_SOURCE_RISK: f64 = 0.2;

/// The scorer's constant floor. Present in every instance, so it says
/// nothing about a cluster.
const BASE_FACTOR: &str = "base";

/// One ranked explanation for or against building.
#[derive(Debug, Clone, PartialEq)]
struct Factor {
    name: String,
    /// Non-negative strength used for ranking.
    magnitude: f64,
    phrase: String,
}

#[derive(Debug, Default)]
struct Factors {
    positive: Vec<Factor>,
    risk: Vec<Factor>,
}

impl Factors {
    fn push(&mut self, name: &str, signed: f64, phrase: String) {
        if !signed.is_finite() || signed == 0.0 {
            return;
        }
        let factor = Factor {
            name: name.to_string(),
            magnitude: signed.abs(),
            phrase,
        };
        if signed > 0.0 {
            self.positive.push(factor);
        } else {
            self.risk.push(factor);
        }
    }
}

fn percent(x: f64) -> String {
    format!("{:+.0}%", x * 100.0)
}

fn candidate_factors(
    aggregate: &ClusterAggregate,
    report: &TrendReport,
    cal: &Calibration,
) -> Factors {
    let mut factors = Factors::default();
    let point = &report.point;

    for (name, &value) in &aggregate.factor_contributions {
        if name == BASE_FACTOR {
            continue;
        }
        let label = name.replace('_', " ");
        let phrase = if value >= 0.0 {
            format!("{label} contributes {value:.2} to the mean pain score")
        } else {
            format!("{label} takes {:.2} off the mean pain score", -value)
        };
        factors.push(name, value, phrase);
    }

    let growth = point.growth_rate.clamp(-1.0, 1.0);
    factors.push(
        "growth",
        growth,
        format!("daily volume {} against the trailing baseline", percent(point.growth_rate)),
    );

    let velocity = point.velocity.clamp(-1.0, 1.0);
    let direction = if velocity >= 0.0 { "accelerating" } else { "decelerating" };
    factors.push(
        "velocity",
        velocity,
        format!("growth is {direction} ({:+.2} since the previous day)", point.velocity),
    );

    if point.breakout_flag {
        factors.push(
            "breakout",
            1.0,
            format!("breakout on {} with {} mentions", point.date, point.volume),
        );
    }

    match report.opportunity_window {
        OpportunityWindow::Early => factors.push(
            "opportunity_window",
            report.opportunity_window_score / 100.0,
            format!(
                "early opportunity window ({:.0}/100)",
                report.opportunity_window_score
            ),
        ),
        OpportunityWindow::Saturating => factors.push(
            "saturation",
            -report.saturation_score / 100.0,
            format!(
                "attention is saturating ({:.0}/100) after a rise",
                report.saturation_score
            ),
        ),
        OpportunityWindow::Peak | OpportunityWindow::Unknown => {}
    }

    if aggregate.contradiction > cal.high_contradiction {
        factors.push(
            "contradiction",
            -aggregate.contradiction / 100.0,
            format!(
                "members disagree about this pain (contradiction {:.0}/100)",
                aggregate.contradiction
            ),
        );
    }

    if aggregate.confidence < cal.low_confidence {
        factors.push(
            "cluster_confidence",
            (aggregate.confidence - cal.low_confidence) / 100.0,
            format!("low cluster reliability ({:.0}/100)", aggregate.confidence),
        );
    } else if aggregate.confidence >= cal.high_confidence {
        factors.push(
            "cluster_confidence",
            aggregate.confidence / 100.0,
            format!("well-corroborated cluster ({:.0}/100)", aggregate.confidence),
        );
    }

    if aggregate.persona_confidence < cal.low_persona_confidence {
        factors.push(
            "persona_confidence",
            aggregate.persona_confidence - cal.low_persona_confidence,
            format!(
                "unclear audience ({} at {:.0}% confidence)",
                aggregate.persona,
                aggregate.persona_confidence * 100.0
            ),
        );
    }

    if aggregate.source_count == 1 {
        factors.push(
            "single_source",
            -SINGLE_SOURCE_RISK,
            "only one source reports this pain".to_string(),
        );
    }

    factors
}

/// Most significant first; equal magnitudes in factor-name order.
fn rank(mut factors: Vec<Factor>, limit: usize) -> Vec<Factor> {
    factors.sort_by(|a, b| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    factors.truncate(limit);
    factors
}

/// Tier from the decision boundaries alone, before any risk downgrade or
/// confidence cap.
#[must_use]
pub fn classify(
    aggregate: &ClusterAggregate,
    report: &TrendReport,
    cal: &Calibration,
) -> Recommendation {
    if !aggregate.valid {
        return Recommendation::InsufficientData;
    }
    let point = &report.point;
    let sev = aggregate.severity;
    let monet = aggregate.monetizability;
    let growth = point.growth_rate;
    let breakout = point.breakout_flag;

    let strong = &cal.strong_build;
    if sev >= strong.min_severity
        && monet >= strong.min_monetizability
        && (growth >= strong.min_growth || breakout)
    {
        return Recommendation::StrongBuild;
    }

    let investigate = &cal.investigate;
    if sev >= investigate.min_severity
        && (monet >= investigate.min_monetizability || breakout || growth >= investigate.min_growth)
    {
        return Recommendation::Investigate;
    }

    if sev >= cal.monitor_min_severity || growth > 0.0 {
        Recommendation::Monitor
    } else {
        Recommendation::Ignore
    }
}

fn summary(
    recommendation: Recommendation,
    aggregate: &ClusterAggregate,
    point: &TrendPoint,
    downgraded_by: Option<usize>,
    capped_at_confidence: Option<f64>,
) -> String {
    let lead = match recommendation {
        Recommendation::InsufficientData => {
            return "Not enough scored instances to judge this cluster.".to_string();
        }
        Recommendation::StrongBuild => "Strong build signal",
        Recommendation::Investigate => "Worth investigating",
        Recommendation::Monitor => "Keep monitoring",
        Recommendation::Ignore => "Low priority",
    };

    let mut text = format!(
        "{lead}: severity {:.0}/100, monetizability {:.0}/100, growth {} across {} instances",
        aggregate.severity,
        aggregate.monetizability,
        percent(point.growth_rate),
        aggregate.instance_count,
    );
    if point.breakout_flag {
        text.push_str(", breaking out");
    }
    if aggregate.persona != Persona::Unknown {
        text.push_str(&format!(". Mostly affects: {}", aggregate.persona));
    }
    text.push('.');
    if let Some(risks) = downgraded_by {
        text.push_str(&format!(
            " Downgraded from {} because of {risks} significant risks.",
            Recommendation::StrongBuild
        ));
    }
    if let Some(confidence) = capped_at_confidence {
        text.push_str(&format!(
            " Capped at {} because cluster confidence is {confidence:.0}/100.",
            Recommendation::Monitor
        ));
    }
    text
}

/// Combine a cluster aggregate and its trend report into a verdict.
///
/// An invalid aggregate always yields [`Recommendation::InsufficientData`]
/// with no factors. A cluster whose confidence is below
/// `min_build_confidence` is never recommended above
/// [`Recommendation::Monitor`].
#[must_use]
pub fn synthesize(
    aggregate: &ClusterAggregate,
    report: &TrendReport,
    cal: &Calibration,
) -> BuildSignalRecommendation {
    let point = &report.point;
    if !aggregate.valid {
        return BuildSignalRecommendation {
            recommendation: Recommendation::InsufficientData,
            reasoning_summary: summary(
                Recommendation::InsufficientData,
                aggregate,
                point,
                None,
                None,
            ),
            top_positive_factors: Vec::new(),
            top_risk_factors: Vec::new(),
        };
    }

    let factors = candidate_factors(aggregate, report, cal);
    let significant_risks = factors
        .risk
        .iter()
        .filter(|f| f.magnitude >= cal.risk_magnitude)
        .count();

    let mut recommendation = classify(aggregate, report, cal);
    let mut downgraded_by = None;
    if recommendation == Recommendation::StrongBuild && significant_risks >= cal.risk_downgrade_count {
        recommendation = Recommendation::Investigate;
        downgraded_by = Some(significant_risks);
    }
    let mut capped_at_confidence = None;
    if matches!(
        recommendation,
        Recommendation::StrongBuild | Recommendation::Investigate
    ) && aggregate.confidence < cal.min_build_confidence
    {
        recommendation = Recommendation::Monitor;
        capped_at_confidence = Some(aggregate.confidence);
    }

    let phrases = |list: Vec<Factor>| -> Vec<String> {
        rank(list, cal.top_factors).into_iter().map(|f| f.phrase).collect()
    };

    BuildSignalRecommendation {
        recommendation,
        reasoning_summary: summary(
            recommendation,
            aggregate,
            point,
            downgraded_by,
            capped_at_confidence,
        ),
        top_positive_factors: phrases(factors.positive),
        top_risk_factors: phrases(factors.risk),
    }
}

#[cfg(test)]
#[path = "recommend_test.rs"]
mod tests;
