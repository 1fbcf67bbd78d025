//! Property-based tests for the failover transition planner.
//!
//! Each generated binding has one alternate per provider, so the job's
//! position in its chain is unambiguous.

use proptest::prelude::*;
use repricer_scraper::{plan_transition, AlternateEntry, CronBinding, Transition};

// =============================================================================
// Generators
// =============================================================================

/// A binding whose alternates use distinct providers and sequences, currently
/// bound to one of them.
fn arb_binding() -> impl Strategy<Value = CronBinding> {
    (
        prop::collection::btree_set(0i32..50, 1..8),
        any::<prop::sample::Index>(),
        any::<bool>(),
    )
        .prop_map(|(sequences, pick, reversed)| {
            let mut alternates: Vec<AlternateEntry> = sequences
                .iter()
                .enumerate()
                .map(|(i, sequence)| AlternateEntry::new(i as i64 + 1, *sequence))
                .collect();
            if reversed {
                alternates.reverse();
            }
            let current = pick.get(&alternates).clone();

            CronBinding {
                job_id: 1,
                job_name: "nightly-catalog".to_string(),
                current_provider_id: current.provider_id,
                current_sequence: current.sequence,
                alternates,
            }
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// The planner picks the alternate with the smallest sequence above the
    /// current one, or exhausts the job when there is none.
    #[test]
    fn prop_switch_targets_next_higher_sequence(binding in arb_binding()) {
        let expected = binding
            .alternates
            .iter()
            .filter(|entry| entry.sequence > binding.current_sequence)
            .min_by_key(|entry| entry.sequence);

        match (plan_transition(&binding), expected) {
            (Transition::Switch { provider_id, sequence }, Some(entry)) => {
                prop_assert_eq!(provider_id, entry.provider_id);
                prop_assert_eq!(sequence, entry.sequence);
            }
            (Transition::Exhausted, None) => {}
            (transition, entry) => {
                prop_assert!(false, "unexpected {:?} for {:?}", transition, entry);
            }
        }
    }

    /// Walking the chain visits strictly increasing sequences and ends on the
    /// last alternate before exhausting.
    #[test]
    fn prop_chain_walk_terminates(binding in arb_binding()) {
        let mut current = binding.clone();
        let mut steps = 0;

        loop {
            match plan_transition(&current) {
                transition @ Transition::Switch { sequence, .. } => {
                    prop_assert!(sequence > current.current_sequence);
                    current = current.apply(transition);
                    steps += 1;
                    prop_assert!(steps <= binding.alternates.len());
                }
                Transition::Exhausted => break,
            }
        }

        let last = binding.alternates.iter().map(|entry| entry.sequence).max();
        prop_assert_eq!(Some(current.current_sequence), last);

        let exhausted = current.apply(Transition::Exhausted);
        prop_assert!(exhausted.is_exhausted());
        prop_assert_eq!(exhausted.current_provider_id, current.current_provider_id);
    }
}
