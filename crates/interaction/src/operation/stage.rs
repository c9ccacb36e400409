//! Stage numbers and per-pattern stage metadata.

use std::fmt;

use mal_encoding::{MalError, Result};

pub const SEND_STAGE: u8 = 1;

pub const SUBMIT_STAGE: u8 = 1;
pub const SUBMIT_ACK_STAGE: u8 = 2;

pub const REQUEST_STAGE: u8 = 1;
pub const REQUEST_RESPONSE_STAGE: u8 = 2;

pub const INVOKE_STAGE: u8 = 1;
pub const INVOKE_ACK_STAGE: u8 = 2;
pub const INVOKE_RESPONSE_STAGE: u8 = 3;

pub const PROGRESS_STAGE: u8 = 1;
pub const PROGRESS_ACK_STAGE: u8 = 2;
pub const PROGRESS_UPDATE_STAGE: u8 = 3;
pub const PROGRESS_RESPONSE_STAGE: u8 = 4;

pub const PUBSUB_REGISTER_STAGE: u8 = 1;
pub const PUBSUB_REGISTER_ACK_STAGE: u8 = 2;
pub const PUBSUB_PUBLISH_REGISTER_STAGE: u8 = 3;
pub const PUBSUB_PUBLISH_REGISTER_ACK_STAGE: u8 = 4;
pub const PUBSUB_PUBLISH_STAGE: u8 = 5;
pub const PUBSUB_NOTIFY_STAGE: u8 = 6;
pub const PUBSUB_DEREGISTER_STAGE: u8 = 7;
pub const PUBSUB_DEREGISTER_ACK_STAGE: u8 = 8;
pub const PUBSUB_PUBLISH_DEREGISTER_STAGE: u8 = 9;
pub const PUBSUB_PUBLISH_DEREGISTER_ACK_STAGE: u8 = 10;

/// The six interaction patterns; the discriminant is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InteractionType {
	Send = 1,
	Submit = 2,
	Request = 3,
	Invoke = 4,
	Progress = 5,
	PubSub = 6,
}

impl InteractionType {
	pub const ALL: [InteractionType; 6] = [
		Self::Send,
		Self::Submit,
		Self::Request,
		Self::Invoke,
		Self::Progress,
		Self::PubSub,
	];

	#[inline]
	pub const fn tag(self) -> u8 {
		self as u8
	}

	pub fn from_tag(tag: u8) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.tag() == tag)
	}

	pub const fn name(self) -> &'static str {
		match self {
			Self::Send => "SEND",
			Self::Submit => "SUBMIT",
			Self::Request => "REQUEST",
			Self::Invoke => "INVOKE",
			Self::Progress => "PROGRESS",
			Self::PubSub => "PUBSUB",
		}
	}

	/// Static description of every stage of this pattern, in stage order.
	pub fn stages(self) -> &'static [StageInfo] {
		match self {
			Self::Send => SEND,
			Self::Submit => SUBMIT,
			Self::Request => REQUEST,
			Self::Invoke => INVOKE,
			Self::Progress => PROGRESS,
			Self::PubSub => PUBSUB,
		}
	}

	/// Metadata of one stage, or `ArgumentError` if the pattern has no such stage.
	pub fn stage_info(self, stage: u8) -> Result<&'static StageInfo> {
		usize::from(stage)
			.checked_sub(1)
			.and_then(|idx| self.stages().get(idx))
			.ok_or_else(|| MalError::argument(format!("{self} has no stage {stage}")))
	}
}

impl fmt::Display for InteractionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Pattern-level facts about a stage, independent of any operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInfo {
	pub number: u8,
	pub name: &'static str,
	/// Sent by the party that starts the exchange rather than the one answering.
	pub consumer_initiated: bool,
	/// An error message may be sent in place of this stage.
	pub may_carry_error: bool,
}

const fn info(
	number: u8,
	name: &'static str,
	consumer_initiated: bool,
	may_carry_error: bool,
) -> StageInfo {
	StageInfo {
		number,
		name,
		consumer_initiated,
		may_carry_error,
	}
}

const SEND: &[StageInfo] = &[info(SEND_STAGE, "SEND", true, false)];

const SUBMIT: &[StageInfo] = &[
	info(SUBMIT_STAGE, "SUBMIT", true, false),
	info(SUBMIT_ACK_STAGE, "SUBMIT_ACK", false, true),
];

const REQUEST: &[StageInfo] = &[
	info(REQUEST_STAGE, "REQUEST", true, false),
	info(REQUEST_RESPONSE_STAGE, "REQUEST_RESPONSE", false, true),
];

const INVOKE: &[StageInfo] = &[
	info(INVOKE_STAGE, "INVOKE", true, false),
	info(INVOKE_ACK_STAGE, "INVOKE_ACK", false, true),
	info(INVOKE_RESPONSE_STAGE, "INVOKE_RESPONSE", false, true),
];

const PROGRESS: &[StageInfo] = &[
	info(PROGRESS_STAGE, "PROGRESS", true, false),
	info(PROGRESS_ACK_STAGE, "PROGRESS_ACK", false, true),
	info(PROGRESS_UPDATE_STAGE, "PROGRESS_UPDATE", false, true),
	info(PROGRESS_RESPONSE_STAGE, "PROGRESS_RESPONSE", false, true),
];

const PUBSUB: &[StageInfo] = &[
	info(PUBSUB_REGISTER_STAGE, "REGISTER", true, false),
	info(PUBSUB_REGISTER_ACK_STAGE, "REGISTER_ACK", false, true),
	info(PUBSUB_PUBLISH_REGISTER_STAGE, "PUBLISH_REGISTER", true, false),
	info(PUBSUB_PUBLISH_REGISTER_ACK_STAGE, "PUBLISH_REGISTER_ACK", false, true),
	info(PUBSUB_PUBLISH_STAGE, "PUBLISH", true, true),
	info(PUBSUB_NOTIFY_STAGE, "NOTIFY", false, true),
	info(PUBSUB_DEREGISTER_STAGE, "DEREGISTER", true, false),
	info(PUBSUB_DEREGISTER_ACK_STAGE, "DEREGISTER_ACK", false, false),
	info(PUBSUB_PUBLISH_DEREGISTER_STAGE, "PUBLISH_DEREGISTER", true, false),
	info(PUBSUB_PUBLISH_DEREGISTER_ACK_STAGE, "PUBLISH_DEREGISTER_ACK", false, false),
];
