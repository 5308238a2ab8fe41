//! Rule-based persona inference.
//!
//! Each instance casts one vote from marker phrases in its text. A cluster's
//! persona is the most-voted label, with deterministic tie-breaking.

use std::collections::BTreeMap;

use painscope_core::Persona;

const STRONG_WEIGHT: u32 = 3;
const WEAK_WEIGHT: u32 = 1;

struct PersonaMarkers {
    persona: Persona,
    strong: &'static [&'static str],
    weak: &'static [&'static str],
}

const MARKERS: &[PersonaMarkers] = &[
    PersonaMarkers {
        persona: Persona::EnterpriseEmployee,
        strong: &["my company", "our it department", "procurement", "compliance team", "at work we"],
        weak: &["enterprise", "manager", "corporate", "stakeholders", "sso"],
    },
    PersonaMarkers {
        persona: Persona::Founder,
        strong: &["my saas", "my startup", "our startup", "founder", "mrr", "my customers"],
        weak: &["launch", "churn", "pricing page", "bootstrapped", "investors"],
    },
    PersonaMarkers {
        persona: Persona::Freelancer,
        strong: &["freelance", "my clients", "upwork", "fiverr", "contractor"],
        weak: &["invoice", "hourly rate", "client", "side gig"],
    },
    PersonaMarkers {
        persona: Persona::Hobbyist,
        strong: &["homelab", "home lab", "side project", "for fun", "hobby"],
        weak: &["just learning", "beginner", "tutorial", "weekend"],
    },
    PersonaMarkers {
        persona: Persona::Operator,
        strong: &["on call", "on-call", "our ops team", "sysadmin", "my team runs"],
        weak: &["ops", "downtime", "incident", "workflow", "runbook"],
    },
];

/// Raw marker score per persona for one folded text. Personas with no
/// hits are absent.
#[must_use]
pub fn persona_scores(folded: &str) -> BTreeMap<Persona, u32> {
    let mut scores = BTreeMap::new();
    for markers in MARKERS {
        let strong = markers.strong.iter().filter(|m| folded.contains(**m)).count();
        let weak = markers.weak.iter().filter(|m| folded.contains(**m)).count();
        let total = u32::try_from(strong)
            .unwrap_or(u32::MAX)
            .saturating_mul(STRONG_WEIGHT)
            .saturating_add(u32::try_from(weak).unwrap_or(u32::MAX).saturating_mul(WEAK_WEIGHT));
        if total > 0 {
            scores.insert(markers.persona, total);
        }
    }
    scores
}

/// The persona one instance votes for. Ties go to the lexically first
/// label; no marker hits at all yields [`Persona::Unknown`].
#[must_use]
pub fn classify(folded: &str) -> Persona {
    persona_scores(folded)
        .into_iter()
        // BTreeMap iterates in label order; keep the first maximum.
        .fold(None, |best: Option<(Persona, u32)>, (persona, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((persona, score)),
        })
        .map_or(Persona::Unknown, |(persona, _)| persona)
}

/// One instance's contribution to the cluster persona.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonaVote {
    pub persona: Persona,
    /// Freshness weight times pain score.
    pub weighted_score: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    votes: usize,
    mass: f64,
}

/// Cluster-level persona and its confidence.
///
/// Most votes wins. Ties are broken by the higher total weighted score,
/// then by lexical label. `unknown` votes only count when no instance
/// voted for a concrete persona, in which case confidence is zero.
/// Confidence is the winner's share of the weighted score mass among
/// concrete votes (vote share if that mass is zero).
#[must_use]
pub fn infer_cluster_persona(votes: &[PersonaVote]) -> (Persona, f64) {
    let mut tallies: BTreeMap<Persona, Tally> = BTreeMap::new();
    for vote in votes.iter().filter(|v| v.persona != Persona::Unknown) {
        let tally = tallies.entry(vote.persona).or_default();
        tally.votes += 1;
        tally.mass += vote.weighted_score.max(0.0);
    }

    let mut winner: Option<(Persona, Tally)> = None;
    for (&persona, &tally) in &tallies {
        let better = match winner {
            None => true,
            Some((_, best)) => {
                tally.votes > best.votes || (tally.votes == best.votes && tally.mass > best.mass)
            }
        };
        if better {
            winner = Some((persona, tally));
        }
    }

    let Some((persona, tally)) = winner else {
        return (Persona::Unknown, 0.0);
    };

    let total_mass: f64 = tallies.values().map(|t| t.mass).sum();
    #[allow(clippy::cast_precision_loss)]
    let confidence = if total_mass > 0.0 {
        tally.mass / total_mass
    } else {
        let total_votes: usize = tallies.values().map(|t| t.votes).sum();
        tally.votes as f64 / total_votes as f64
    };
    (persona, confidence.clamp(0.0, 1.0))
}
