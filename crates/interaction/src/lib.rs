//! Interaction model of the Message Abstraction Layer.
//!
//! Areas group services, services group operations, and every operation
//! follows one of six interaction patterns whose stages and message bodies
//! are fixed when the operation is built. [`MalRegistry`] holds the loaded
//! areas, the standard error names and the element factories decoders use.

/// Area definitions.
pub mod area;
/// The shared registry context.
pub mod context;
/// MAL area start-up helper.
pub mod helper;
/// Operations, interaction patterns and stage tracking.
pub mod operation;
/// Service definitions.
pub mod service;

pub use area::Area;
pub use context::MalRegistry;
pub use helper::MalHelper;
pub use operation::{
	InteractionPattern, InteractionTracker, InteractionType, Operation, OperationDecl,
	OperationField, OperationStage, StageInfo, StageViolation,
};
pub use service::{Service, ServiceKey};
