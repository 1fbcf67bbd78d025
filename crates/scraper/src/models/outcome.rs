use serde::{Deserialize, Serialize};

use super::types::JobId;

/// Result of one failover attempt for one job.
///
/// Not persisted; serialized as-is into the notification webhooks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOutcome {
    pub job_id: JobId,
    pub job_name: String,
    pub previous_provider_name: String,

    /// `None` when the job ran out of alternates
    pub new_provider_name: Option<String>,

    pub threshold_reached: bool,
}

impl SwitchOutcome {
    /// Outcome for a job that moved to a new provider.
    pub fn changed(
        job_id: JobId,
        job_name: impl Into<String>,
        previous_provider_name: impl Into<String>,
        new_provider_name: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            job_name: job_name.into(),
            previous_provider_name: previous_provider_name.into(),
            new_provider_name: Some(new_provider_name.into()),
            threshold_reached: false,
        }
    }

    /// Outcome for a job with no alternate left.
    pub fn exhausted(
        job_id: JobId,
        job_name: impl Into<String>,
        previous_provider_name: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            job_name: job_name.into(),
            previous_provider_name: previous_provider_name.into(),
            new_provider_name: None,
            threshold_reached: true,
        }
    }
}
