//! Operations and their interaction patterns.
//!
//! # Role
//!
//! An [`Operation`] couples identity (number, name, flags) with an
//! [`InteractionPattern`] describing the body of every message stage. The stage
//! table is expanded once at construction so stage queries are plain indexing.
//!
//! # Invariants
//!
//! - Stage numbers are 1-based and contiguous for every pattern.
//! - An operation's owning service is fixed when the service is built and
//!   cannot be reassigned.

mod stage;
mod tracker;

use std::sync::{Arc, Weak};

use mal_encoding::structures::{ENTITY_KEY_LIST, IDENTIFIER_LIST, SUBSCRIPTION, UPDATE_HEADER_LIST};
use mal_encoding::{AttributeKind, MalError, Result, ShortForm};

pub use stage::*;
pub use tracker::{InteractionTracker, StageViolation};

use crate::service::{Service, ServiceKey};

/// One field of a message body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationField {
	name: String,
	nullable: bool,
	type_id: Option<ShortForm>,
}

impl OperationField {
	/// Field of a concrete type.
	pub fn typed(name: impl Into<String>, nullable: bool, type_id: ShortForm) -> Self {
		Self {
			name: name.into(),
			nullable,
			type_id: Some(type_id),
		}
	}

	/// Field whose concrete type travels with the value.
	pub fn abstract_field(name: impl Into<String>, nullable: bool) -> Self {
		Self {
			name: name.into(),
			nullable,
			type_id: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_nullable(&self) -> bool {
		self.nullable
	}

	/// Declared short form; `None` for abstract fields.
	pub fn type_id(&self) -> Option<ShortForm> {
		self.type_id
	}

	pub fn is_abstract(&self) -> bool {
		self.type_id.is_none()
	}
}

/// Pattern plus the caller-declared bodies of its message stages.
///
/// Empty stages (acks without payload) are implied by the pattern. The fixed
/// publish/subscribe bodies are supplied by the library; a PUBSUB operation
/// only declares the content fields of its updates.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionPattern {
	Send {
		send: Vec<OperationField>,
	},
	Submit {
		submit: Vec<OperationField>,
	},
	Request {
		request: Vec<OperationField>,
		response: Vec<OperationField>,
	},
	Invoke {
		invoke: Vec<OperationField>,
		ack: Vec<OperationField>,
		response: Vec<OperationField>,
	},
	Progress {
		progress: Vec<OperationField>,
		ack: Vec<OperationField>,
		update: Vec<OperationField>,
		response: Vec<OperationField>,
	},
	PubSub {
		update_contents: Vec<OperationField>,
	},
}

impl InteractionPattern {
	pub fn interaction_type(&self) -> InteractionType {
		match self {
			Self::Send { .. } => InteractionType::Send,
			Self::Submit { .. } => InteractionType::Submit,
			Self::Request { .. } => InteractionType::Request,
			Self::Invoke { .. } => InteractionType::Invoke,
			Self::Progress { .. } => InteractionType::Progress,
			Self::PubSub { .. } => InteractionType::PubSub,
		}
	}

	/// Expands the declaration into one field list per stage, in stage order.
	fn into_stage_fields(self) -> Vec<Vec<OperationField>> {
		match self {
			Self::Send { send } => vec![send],
			Self::Submit { submit } => vec![submit, Vec::new()],
			Self::Request { request, response } => vec![request, response],
			Self::Invoke {
				invoke,
				ack,
				response,
			} => vec![invoke, ack, response],
			Self::Progress {
				progress,
				ack,
				update,
				response,
			} => vec![progress, ack, update, response],
			Self::PubSub { update_contents } => pubsub_stage_fields(update_contents),
		}
	}
}

fn pubsub_stage_fields(contents: Vec<OperationField>) -> Vec<Vec<OperationField>> {
	let headers = || OperationField::typed("updateHeaders", false, UPDATE_HEADER_LIST);
	let identifier = AttributeKind::Identifier.short_form();

	let publish: Vec<_> = std::iter::once(headers())
		.chain(contents.iter().cloned())
		.collect();
	let notify: Vec<_> = [
		OperationField::typed("subscriptionId", false, identifier),
		headers(),
	]
	.into_iter()
	.chain(contents)
	.collect();

	vec![
		vec![OperationField::typed("subscription", false, SUBSCRIPTION)],
		Vec::new(),
		vec![OperationField::typed("entityKeys", false, ENTITY_KEY_LIST)],
		Vec::new(),
		publish,
		notify,
		vec![OperationField::typed("subscriptionIds", false, IDENTIFIER_LIST)],
		Vec::new(),
		Vec::new(),
		Vec::new(),
	]
}

/// Everything needed to build an [`Operation`] except its owning service.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDecl {
	pub number: u16,
	pub name: String,
	pub replayable: bool,
	pub capability_set: u16,
	pub pattern: InteractionPattern,
}

impl OperationDecl {
	pub fn new(number: u16, name: impl Into<String>, pattern: InteractionPattern) -> Self {
		Self {
			number,
			name: name.into(),
			replayable: false,
			capability_set: 0,
			pattern,
		}
	}

	pub fn replayable(mut self, replayable: bool) -> Self {
		self.replayable = replayable;
		self
	}

	pub fn capability_set(mut self, capability_set: u16) -> Self {
		self.capability_set = capability_set;
		self
	}
}

/// One stage of one operation: pattern metadata plus the message body.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStage {
	info: &'static StageInfo,
	fields: Vec<OperationField>,
}

impl OperationStage {
	pub fn number(&self) -> u8 {
		self.info.number
	}

	pub fn name(&self) -> &'static str {
		self.info.name
	}

	pub fn is_consumer_initiated(&self) -> bool {
		self.info.consumer_initiated
	}

	pub fn may_carry_error(&self) -> bool {
		self.info.may_carry_error
	}

	pub fn fields(&self) -> &[OperationField] {
		&self.fields
	}
}

/// A service operation with its expanded stage table.
#[derive(Debug)]
pub struct Operation {
	number: u16,
	name: String,
	replayable: bool,
	capability_set: u16,
	interaction_type: InteractionType,
	stages: Vec<OperationStage>,
	service_key: ServiceKey,
	service: Weak<Service>,
}

impl Operation {
	pub(crate) fn new(decl: OperationDecl, service_key: ServiceKey, service: Weak<Service>) -> Self {
		let interaction_type = decl.pattern.interaction_type();
		let stages = interaction_type
			.stages()
			.iter()
			.zip(decl.pattern.into_stage_fields())
			.map(|(info, fields)| OperationStage { info, fields })
			.collect();
		Self {
			number: decl.number,
			name: decl.name,
			replayable: decl.replayable,
			capability_set: decl.capability_set,
			interaction_type,
			stages,
			service_key,
			service,
		}
	}

	pub fn number(&self) -> u16 {
		self.number
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_replayable(&self) -> bool {
		self.replayable
	}

	pub fn capability_set(&self) -> u16 {
		self.capability_set
	}

	pub fn interaction_type(&self) -> InteractionType {
		self.interaction_type
	}

	pub fn service_key(&self) -> ServiceKey {
		self.service_key
	}

	/// Owning service, or `None` once the service has been dropped.
	pub fn service(&self) -> Option<Arc<Service>> {
		self.service.upgrade()
	}

	pub fn stages(&self) -> &[OperationStage] {
		&self.stages
	}

	/// Stage `stage` of this operation's pattern.
	///
	/// Fails with [`MalError::Argument`] for a stage the pattern does not have.
	pub fn operation_stage(&self, stage: u8) -> Result<&OperationStage> {
		usize::from(stage)
			.checked_sub(1)
			.and_then(|idx| self.stages.get(idx))
			.ok_or_else(|| {
				MalError::argument(format!(
					"operation {} ({}) has no stage {stage}",
					self.name, self.interaction_type
				))
			})
	}

	pub fn fields_on_stage(&self, stage: u8) -> Result<&[OperationField]> {
		self.operation_stage(stage).map(OperationStage::fields)
	}

	/// Fresh tracker for one interaction of this operation.
	pub fn tracker(&self) -> InteractionTracker {
		InteractionTracker::new(self.interaction_type)
	}
}
