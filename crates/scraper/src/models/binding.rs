use serde::{Deserialize, Serialize};

use super::types::{JobId, ProviderId};

/// Sequence value marking a job whose alternate chain is used up.
pub const EXHAUSTED_SEQUENCE: i32 = -1;

/// One slot in a job's ordered fallback chain.
///
/// The same provider may appear at several sequences when it is reused after
/// rotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateEntry {
    pub provider_id: ProviderId,
    pub sequence: i32,
}

impl AlternateEntry {
    pub fn new(provider_id: ProviderId, sequence: i32) -> Self {
        Self {
            provider_id,
            sequence,
        }
    }
}

/// A scheduled job and the provider it is currently bound to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronBinding {
    pub job_id: JobId,
    pub job_name: String,
    pub current_provider_id: ProviderId,

    /// Position in `alternates`, or [`EXHAUSTED_SEQUENCE`]
    pub current_sequence: i32,

    #[serde(default)]
    pub alternates: Vec<AlternateEntry>,
}

/// The state change computed for a binding by one failover step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Move the job to the given alternate.
    Switch {
        provider_id: ProviderId,
        sequence: i32,
    },
    /// No alternate left; the job keeps its last provider.
    Exhausted,
}

impl CronBinding {
    /// True once the job has run out of alternates.
    pub fn is_exhausted(&self) -> bool {
        self.current_sequence == EXHAUSTED_SEQUENCE
    }

    pub fn has_alternates(&self) -> bool {
        !self.alternates.is_empty()
    }

    /// The binding after `transition`.
    ///
    /// An exhausted binding keeps pointing at its past provider.
    pub fn apply(&self, transition: Transition) -> Self {
        match transition {
            Transition::Switch {
                provider_id,
                sequence,
            } => Self {
                current_provider_id: provider_id,
                current_sequence: sequence,
                ..self.clone()
            },
            Transition::Exhausted => Self {
                current_sequence: EXHAUSTED_SEQUENCE,
                ..self.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding() -> CronBinding {
        CronBinding {
            job_id: 9,
            job_name: "nightly-catalog".to_string(),
            current_provider_id: 1,
            current_sequence: 0,
            alternates: vec![AlternateEntry::new(1, 0), AlternateEntry::new(2, 1)],
        }
    }

    #[test]
    fn test_apply_switch() {
        let next = binding().apply(Transition::Switch {
            provider_id: 2,
            sequence: 1,
        });
        assert_eq!(next.current_provider_id, 2);
        assert_eq!(next.current_sequence, 1);
        assert!(!next.is_exhausted());
    }

    #[test]
    fn test_apply_exhausted_keeps_provider() {
        let next = binding().apply(Transition::Exhausted);
        assert_eq!(next.current_provider_id, 1);
        assert_eq!(next.current_sequence, EXHAUSTED_SEQUENCE);
        assert!(next.is_exhausted());
    }
}
