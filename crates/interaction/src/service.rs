//! Services: numbered groups of operations within an area.

use std::fmt;
use std::sync::Arc;

use mal_encoding::{ElementDescriptor, MalError, Result};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::operation::{Operation, OperationDecl};

/// (area number, service number, service version).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey {
	pub area: u16,
	pub service: u16,
	pub version: u8,
}

impl ServiceKey {
	pub const fn new(area: u16, service: u16, version: u8) -> Self {
		Self {
			area,
			service,
			version,
		}
	}
}

impl fmt::Display for ServiceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{} v{}", self.area, self.service, self.version)
	}
}

/// Immutable service definition. Operations are indexed by number at
/// construction and each one points back to this service.
pub struct Service {
	key: ServiceKey,
	name: String,
	elements: Vec<ElementDescriptor>,
	operations: Vec<Arc<Operation>>,
	by_number: FxHashMap<u16, usize>,
}

impl Service {
	/// Builds the service and its operations.
	///
	/// Fails with [`MalError::Argument`] if two operations share a number.
	pub fn new(
		key: ServiceKey,
		name: impl Into<String>,
		elements: Vec<ElementDescriptor>,
		operations: Vec<OperationDecl>,
	) -> Result<Arc<Self>> {
		let name = name.into();
		let mut seen = FxHashSet::default();
		for decl in &operations {
			if !seen.insert(decl.number) {
				return Err(MalError::argument(format!(
					"service {name} ({key}) declares operation number {} twice",
					decl.number
				)));
			}
		}

		let by_number = operations
			.iter()
			.enumerate()
			.map(|(idx, decl)| (decl.number, idx))
			.collect();

		Ok(Arc::new_cyclic(|weak| Self {
			key,
			name,
			elements,
			operations: operations
				.into_iter()
				.map(|decl| Arc::new(Operation::new(decl, key, weak.clone())))
				.collect(),
			by_number,
		}))
	}

	pub fn key(&self) -> ServiceKey {
		self.key
	}

	pub fn area_number(&self) -> u16 {
		self.key.area
	}

	pub fn number(&self) -> u16 {
		self.key.service
	}

	pub fn version(&self) -> u8 {
		self.key.version
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Element factories this service contributes when its area is loaded.
	pub fn elements(&self) -> &[ElementDescriptor] {
		&self.elements
	}

	pub fn operations(&self) -> &[Arc<Operation>] {
		&self.operations
	}

	pub fn operation_by_number(&self, number: u16) -> Option<&Arc<Operation>> {
		self.by_number
			.get(&number)
			.and_then(|&idx| self.operations.get(idx))
	}

	pub fn operation_by_name(&self, name: &str) -> Option<&Arc<Operation>> {
		self.operations.iter().find(|op| op.name() == name)
	}
}

impl fmt::Debug for Service {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Service")
			.field("key", &self.key)
			.field("name", &self.name)
			.field("elements", &self.elements.len())
			.field("operations", &self.operations.len())
			.finish()
	}
}
