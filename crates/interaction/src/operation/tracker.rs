//! Stage-order validation for a single interaction.

use mal_encoding::error::standard;
use mal_encoding::{Attribute, InteractionError, StandardError};

use super::stage::*;

/// Stage observed out of the order its pattern allows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageViolation {
	#[error("{pattern} has no stage {stage}")]
	UnsupportedStage { pattern: InteractionType, stage: u8 },
	#[error("{pattern} stage {stage} received, expected one of {expected:?}")]
	OutOfOrder {
		pattern: InteractionType,
		stage: u8,
		expected: &'static [u8],
	},
	#[error("{pattern} stage {stage} received after the interaction completed")]
	AfterCompletion { pattern: InteractionType, stage: u8 },
	#[error("{pattern} stage {stage} cannot carry an error")]
	ErrorNotAllowed { pattern: InteractionType, stage: u8 },
}

impl From<StageViolation> for InteractionError {
	fn from(violation: StageViolation) -> Self {
		InteractionError::new(StandardError::with_extra(
			standard::INCORRECT_STATE,
			Attribute::String(violation.to_string()),
		))
	}
}

/// Follows one interaction stage by stage and rejects illegal sequences.
///
/// Error messages end the interaction. PROGRESS updates may repeat. A PUBSUB
/// tracker follows a single exchange: one request and its ack, or a lone
/// PUBLISH or NOTIFY.
#[derive(Debug, Clone)]
pub struct InteractionTracker {
	pattern: InteractionType,
	last: Option<u8>,
	complete: bool,
}

impl InteractionTracker {
	pub fn new(pattern: InteractionType) -> Self {
		Self {
			pattern,
			last: None,
			complete: false,
		}
	}

	pub fn pattern(&self) -> InteractionType {
		self.pattern
	}

	/// Last accepted stage.
	pub fn last_stage(&self) -> Option<u8> {
		self.last
	}

	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// Stages that may legally arrive next. Empty once complete.
	pub fn expected(&self) -> &'static [u8] {
		if self.complete {
			return &[];
		}
		match (self.pattern, self.last) {
			(InteractionType::PubSub, None) => &[
				PUBSUB_REGISTER_STAGE,
				PUBSUB_PUBLISH_REGISTER_STAGE,
				PUBSUB_PUBLISH_STAGE,
				PUBSUB_NOTIFY_STAGE,
				PUBSUB_DEREGISTER_STAGE,
				PUBSUB_PUBLISH_DEREGISTER_STAGE,
			],
			(_, None) => &[1],
			(InteractionType::Submit, Some(SUBMIT_STAGE)) => &[SUBMIT_ACK_STAGE],
			(InteractionType::Request, Some(REQUEST_STAGE)) => &[REQUEST_RESPONSE_STAGE],
			(InteractionType::Invoke, Some(INVOKE_STAGE)) => &[INVOKE_ACK_STAGE],
			(InteractionType::Invoke, Some(INVOKE_ACK_STAGE)) => &[INVOKE_RESPONSE_STAGE],
			(InteractionType::Progress, Some(PROGRESS_STAGE)) => &[PROGRESS_ACK_STAGE],
			(InteractionType::Progress, Some(PROGRESS_ACK_STAGE | PROGRESS_UPDATE_STAGE)) => {
				&[PROGRESS_UPDATE_STAGE, PROGRESS_RESPONSE_STAGE]
			}
			(InteractionType::PubSub, Some(PUBSUB_REGISTER_STAGE)) => &[PUBSUB_REGISTER_ACK_STAGE],
			(InteractionType::PubSub, Some(PUBSUB_PUBLISH_REGISTER_STAGE)) => {
				&[PUBSUB_PUBLISH_REGISTER_ACK_STAGE]
			}
			(InteractionType::PubSub, Some(PUBSUB_DEREGISTER_STAGE)) => {
				&[PUBSUB_DEREGISTER_ACK_STAGE]
			}
			(InteractionType::PubSub, Some(PUBSUB_PUBLISH_DEREGISTER_STAGE)) => {
				&[PUBSUB_PUBLISH_DEREGISTER_ACK_STAGE]
			}
			_ => &[],
		}
	}

	/// Records an incoming or outgoing stage. `is_error` marks an error
	/// message sent in place of the stage's normal body.
	pub fn observe(&mut self, stage: u8, is_error: bool) -> Result<(), StageViolation> {
		let pattern = self.pattern;
		let info = pattern
			.stage_info(stage)
			.map_err(|_| StageViolation::UnsupportedStage { pattern, stage })?;
		if self.complete {
			return Err(StageViolation::AfterCompletion { pattern, stage });
		}
		let expected = self.expected();
		if !expected.contains(&stage) {
			return Err(StageViolation::OutOfOrder {
				pattern,
				stage,
				expected,
			});
		}
		if is_error && !info.may_carry_error {
			return Err(StageViolation::ErrorNotAllowed { pattern, stage });
		}

		self.last = Some(stage);
		self.complete = is_error || self.expected().is_empty();
		Ok(())
	}
}
