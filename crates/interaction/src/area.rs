//! Areas: versioned, numbered collections of services and element types.

use std::fmt;
use std::sync::Arc;

use mal_encoding::{ElementDescriptor, MalError, Result};
use rustc_hash::FxHashMap;

use crate::service::Service;

/// Immutable area definition with a service index built at construction.
pub struct Area {
	number: u16,
	name: String,
	version: u8,
	elements: Vec<ElementDescriptor>,
	services: Vec<Arc<Service>>,
	by_number: FxHashMap<u16, usize>,
}

impl Area {
	/// Fails with [`MalError::Argument`] if two services share a number or a
	/// service belongs to another area or version.
	pub fn new(
		number: u16,
		name: impl Into<String>,
		version: u8,
		elements: Vec<ElementDescriptor>,
		services: Vec<Arc<Service>>,
	) -> Result<Self> {
		let name = name.into();
		let mut by_number = FxHashMap::default();
		for (idx, service) in services.iter().enumerate() {
			if service.area_number() != number || service.version() != version {
				return Err(MalError::argument(format!(
					"service {} ({}) does not belong to area {name} {number} v{version}",
					service.name(),
					service.key()
				)));
			}
			if by_number.insert(service.number(), idx).is_some() {
				return Err(MalError::argument(format!(
					"area {name} declares service number {} twice",
					service.number()
				)));
			}
		}
		Ok(Self {
			number,
			name,
			version,
			elements,
			services,
			by_number,
		})
	}

	pub fn number(&self) -> u16 {
		self.number
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> u8 {
		self.version
	}

	/// Area-level element factories.
	pub fn elements(&self) -> &[ElementDescriptor] {
		&self.elements
	}

	pub fn services(&self) -> &[Arc<Service>] {
		&self.services
	}

	pub fn service_by_number(&self, number: u16) -> Option<&Arc<Service>> {
		self.by_number
			.get(&number)
			.and_then(|&idx| self.services.get(idx))
	}

	pub fn service_by_name(&self, name: &str) -> Option<&Arc<Service>> {
		self.services.iter().find(|s| s.name() == name)
	}

	/// Area and service element factories, area first.
	pub fn all_elements(&self) -> impl Iterator<Item = &ElementDescriptor> + '_ {
		self.elements
			.iter()
			.chain(self.services.iter().flat_map(|s| s.elements().iter()))
	}
}

impl fmt::Debug for Area {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Area")
			.field("number", &self.number)
			.field("name", &self.name)
			.field("version", &self.version)
			.field("elements", &self.elements.len())
			.field("services", &self.services)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::service::ServiceKey;

	fn service(area: u16, number: u16, version: u8) -> Arc<Service> {
		Service::new(
			ServiceKey::new(area, number, version),
			format!("S{number}"),
			Vec::new(),
			Vec::new(),
		)
		.unwrap()
	}

	#[test]
	fn services_are_indexed_by_number() {
		let area = Area::new(
			200,
			"Example",
			1,
			Vec::new(),
			vec![service(200, 1, 1), service(200, 4, 1)],
		)
		.unwrap();
		assert_eq!(area.service_by_number(4).map(|s| s.name()), Some("S4"));
		assert!(area.service_by_number(2).is_none());
		assert_eq!(area.service_by_name("S1").map(|s| s.number()), Some(1));
	}

	#[test]
	fn rejects_duplicate_and_foreign_services() {
		let dup = Area::new(
			200,
			"Example",
			1,
			Vec::new(),
			vec![service(200, 1, 1), service(200, 1, 1)],
		);
		assert!(matches!(dup, Err(MalError::Argument(_))));

		let foreign = Area::new(200, "Example", 1, Vec::new(), vec![service(201, 1, 1)]);
		assert!(matches!(foreign, Err(MalError::Argument(_))));

		let wrong_version = Area::new(200, "Example", 2, Vec::new(), vec![service(200, 1, 1)]);
		assert!(matches!(wrong_version, Err(MalError::Argument(_))));
	}
}
