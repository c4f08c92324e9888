use crate::pipeline::{Envelope, PipelineError, Transform};
use amr_core::domain::{RawReading, RecordError};
use serde::Deserialize;

/// What to do with a reading that lacks a phase current or voltage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredFieldPolicy {
    /// Reject the whole row.
    #[default]
    Reject,
    /// Treat the missing value as 0, like the legacy dashboard did.
    DefaultToZero,
}

/// Pure required-field check of a `RawReading`.
///
/// Under `Reject` the first missing required field fails the row. Under
/// `DefaultToZero` every missing required field is set to 0.
pub fn check_required_fields(
    mut env: Envelope<RawReading>,
    policy: RequiredFieldPolicy,
) -> Result<Envelope<RawReading>, PipelineError> {
    let missing = env.payload.missing_required();
    let Some(&first) = missing.first() else {
        return Ok(env);
    };

    match policy {
        RequiredFieldPolicy::Reject => {
            let err = RecordError::MissingRequiredField {
                location_id: env.payload.location_id.clone(),
                field: first,
            };
            Err(PipelineError::Transform {
                row: env.row,
                reason: err.to_string(),
            })
        }
        RequiredFieldPolicy::DefaultToZero => {
            tracing::debug!(
                row = env.row,
                location_id = %env.payload.location_id,
                missing = missing.len(),
                "required fields defaulted to 0"
            );
            for field in missing {
                env.payload.set(field, 0.0);
            }
            Ok(env)
        }
    }
}

#[derive(Clone, Default)]
pub struct RequiredFieldCheck {
    policy: RequiredFieldPolicy,
}

impl RequiredFieldCheck {
    pub fn new(policy: RequiredFieldPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait::async_trait]
impl Transform<RawReading, RawReading> for RequiredFieldCheck {
    /// Rejections surface as `PipelineError::Transform`; the sink counts them.
    async fn apply(&self, input: Envelope<RawReading>) -> Result<Envelope<RawReading>, PipelineError> {
        check_required_fields(input, self.policy)
    }
}
