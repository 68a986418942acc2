//! Conflict resolution between candidates proposed in the same round.
//!
//! Groups are merged in priority order: a candidate only joins the accepted
//! set when it is compatible with every candidate accepted before it.
use crate::dominance::Dominance;

use super::candidate::Candidate;

/// Merges candidate groups, highest priority first.
pub fn merge(groups: impl IntoIterator<Item = Vec<Candidate>>, flat: bool) -> Vec<Candidate> {
    let mut accepted = Vec::new();
    for group in groups {
        merge_into(&mut accepted, group, flat);
    }
    accepted
}

/// Merges a lower priority group into an already accepted set.
pub fn merge_into(accepted: &mut Vec<Candidate>, candidates: Vec<Candidate>, flat: bool) {
    for candidate in candidates {
        if accepted
            .iter()
            .all(|existing| compatible(existing, &candidate, flat))
        {
            accepted.push(candidate);
        }
    }
}

/// Whether `b` may live in the same forest as `a`.
///
/// Nesting is only accepted when the nested candidate does not clash with any
/// component of the one that contains it, recursively.
pub fn compatible(a: &Candidate, b: &Candidate, flat: bool) -> bool {
    match Dominance::of(a.reference(), b.reference()) {
        Dominance::None => true,
        Dominance::Share => false,
        Dominance::Exact => a.weight() != b.weight(),
        Dominance::Part | Dominance::Contain if flat => false,
        Dominance::Part => a
            .components()
            .all(|(_, component)| compatible(component, b, false)),
        Dominance::Contain => b
            .components()
            .all(|(_, component)| compatible(a, component, false)),
    }
}
