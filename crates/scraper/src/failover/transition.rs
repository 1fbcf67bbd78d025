//! Pure failover step: which alternate a binding moves to next.

use crate::models::{CronBinding, Transition};

/// Plan the next step for `binding`.
///
/// The job's position `S` in its alternate chain is the sequence of the entry
/// for its current provider. When that provider appears at several sequences,
/// the smallest one other than the job's current sequence wins. The job then
/// moves to the alternate with the smallest sequence above `S`, or is
/// exhausted when there is none.
pub fn plan_transition(binding: &CronBinding) -> Transition {
    let Some(anchor) = anchor_sequence(binding) else {
        return Transition::Exhausted;
    };

    binding
        .alternates
        .iter()
        .filter(|entry| entry.sequence > anchor)
        .min_by_key(|entry| entry.sequence)
        .map_or(Transition::Exhausted, |entry| Transition::Switch {
            provider_id: entry.provider_id,
            sequence: entry.sequence,
        })
}

/// The sequence the job is considered to be at, `S`.
///
/// A provider missing from the chain falls back to the job's own sequence;
/// an exhausted job has no position at all.
fn anchor_sequence(binding: &CronBinding) -> Option<i32> {
    let matching: Vec<i32> = binding
        .alternates
        .iter()
        .filter(|entry| entry.provider_id == binding.current_provider_id)
        .map(|entry| entry.sequence)
        .collect();

    match matching.as_slice() {
        [] if binding.is_exhausted() => None,
        [] => Some(binding.current_sequence),
        [only] => Some(*only),
        [first, ..] => Some(
            matching
                .iter()
                .copied()
                .filter(|sequence| *sequence != binding.current_sequence)
                .min()
                .unwrap_or(*first),
        ),
    }
}
