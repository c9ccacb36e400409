//! Injectable registry of areas, error names and element factories.
//!
//! # Role
//!
//! [`MalRegistry`] is the single piece of shared state a MAL runtime needs.
//! It is created once, populated by area helpers at start-up and then read
//! from every thread that encodes, decodes or dispatches messages.
//!
//! # Invariants
//!
//! - Reads never block: areas and error names are published as immutable
//!   snapshots through [`ArcSwap`].
//! - Writes are linearizable: each registration rebuilds the snapshot and
//!   publishes it with compare-and-swap, retrying on contention, so no
//!   concurrent registration is lost.
//! - `(number, version)` maps to exactly one area instance and a name maps to
//!   exactly one area number across versions.
//! - A loaded area and its element factories land together: if the factories
//!   are rejected the area is withdrawn again. Loads are serialized among
//!   themselves; lookups never wait for them.

use std::sync::Arc;

use arc_swap::ArcSwap;
use mal_encoding::{ElementFactoryRegistry, ErrorNumber, MalConfig, MalError, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::area::Area;
use crate::operation::Operation;
use crate::service::Service;

#[derive(Clone, Default)]
struct AreaTable {
	by_key: FxHashMap<(u16, u8), Arc<Area>>,
	numbers_by_name: FxHashMap<Arc<str>, u16>,
}

#[derive(Clone, Default)]
struct ErrorTable {
	names: FxHashMap<ErrorNumber, Arc<str>>,
}

/// Areas, error names and element factories of one MAL runtime.
pub struct MalRegistry {
	areas: ArcSwap<AreaTable>,
	errors: ArcSwap<ErrorTable>,
	factories: Arc<ElementFactoryRegistry>,
	loading: Mutex<()>,
}

impl Default for MalRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for MalRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MalRegistry")
			.field("areas", &self.areas.load().by_key.len())
			.field("errors", &self.errors.load().names.len())
			.field("factories", &self.factories)
			.finish()
	}
}

impl MalRegistry {
	pub fn new() -> Self {
		Self::with_factories(Arc::new(ElementFactoryRegistry::new()))
	}

	pub fn from_config(config: &MalConfig) -> Self {
		Self::with_factories(Arc::new(ElementFactoryRegistry::from_config(config)))
	}

	pub fn with_factories(factories: Arc<ElementFactoryRegistry>) -> Self {
		Self {
			areas: ArcSwap::from_pointee(AreaTable::default()),
			errors: ArcSwap::from_pointee(ErrorTable::default()),
			factories,
			loading: Mutex::new(()),
		}
	}

	/// Factory registry handed to decoders.
	pub fn element_factories(&self) -> &Arc<ElementFactoryRegistry> {
		&self.factories
	}

	/// Registers an area under `(number, version)`.
	///
	/// Re-registering the same instance is a no-op. A different instance under
	/// an occupied key, or a name already bound to another number, is a
	/// [`MalError::RegistrationConflict`].
	pub fn register_area(&self, area: Arc<Area>) -> Result<()> {
		self.publish_area(area).map(|_| ())
	}

	/// Returns whether the area was newly published.
	fn publish_area(&self, area: Arc<Area>) -> Result<bool> {
		let key = (area.number(), area.version());
		loop {
			let old = self.areas.load_full();

			if let Some(existing) = old.by_key.get(&key) {
				if Arc::ptr_eq(existing, &area) {
					return Ok(false);
				}
				warn!(
					area = area.name(),
					number = key.0,
					version = key.1,
					"conflicting area registration"
				);
				return Err(MalError::conflict(format!(
					"area {} v{} is already registered as {}",
					key.0,
					key.1,
					existing.name()
				)));
			}
			if let Some(&bound) = old.numbers_by_name.get(area.name())
				&& bound != area.number()
			{
				warn!(area = area.name(), bound, number = area.number(), "area name rebound");
				return Err(MalError::conflict(format!(
					"area name {} is bound to number {bound}, not {}",
					area.name(),
					area.number()
				)));
			}

			let mut next = (*old).clone();
			next.numbers_by_name
				.entry(Arc::from(area.name()))
				.or_insert(area.number());
			next.by_key.insert(key, area.clone());

			let prev = self.areas.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				debug!(
					area = area.name(),
					number = key.0,
					version = key.1,
					services = area.services().len(),
					"registered area"
				);
				return Ok(true);
			}
			// Lost the race; retry against the newer snapshot.
		}
	}

	/// Registers an area and, the first time, the element factories of the
	/// area and of all its services.
	///
	/// All or nothing: when a factory is rejected the area is withdrawn and
	/// the factory registry is left as it was, so the load can be retried.
	pub fn load_area(&self, area: Arc<Area>) -> Result<()> {
		let _loading = self.loading.lock();
		self.load_locked(area)
	}

	/// Returns the area registered under `(number, version)`, loading the one
	/// built by `build` if there is none yet.
	pub fn get_or_load_area<F>(&self, number: u16, version: u8, build: F) -> Result<Arc<Area>>
	where
		F: FnOnce() -> Result<Area>,
	{
		let _loading = self.loading.lock();
		if let Some(existing) = self.lookup_area_by_number(number, version) {
			return Ok(existing);
		}
		let area = Arc::new(build()?);
		if (area.number(), area.version()) != (number, version) {
			return Err(MalError::argument(format!(
				"built area {} v{} where {number} v{version} was requested",
				area.number(),
				area.version()
			)));
		}
		self.load_locked(area.clone())?;
		Ok(area)
	}

	fn load_locked(&self, area: Arc<Area>) -> Result<()> {
		if !self.publish_area(area.clone())? {
			return Ok(());
		}
		if let Err(err) = self.factories.register_all(area.all_elements().cloned()) {
			self.withdraw_area(&area);
			return Err(err);
		}
		Ok(())
	}

	/// Removes `area` if it is still the instance registered under its key.
	fn withdraw_area(&self, area: &Arc<Area>) {
		let key = (area.number(), area.version());
		loop {
			let old = self.areas.load_full();
			if !old.by_key.get(&key).is_some_and(|current| Arc::ptr_eq(current, area)) {
				return;
			}

			let mut next = (*old).clone();
			next.by_key.remove(&key);
			if !next.by_key.keys().any(|&(number, _)| number == key.0) {
				next.numbers_by_name.remove(area.name());
			}

			let prev = self.areas.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				warn!(
					area = area.name(),
					number = key.0,
					version = key.1,
					"withdrew area after its element factories were rejected"
				);
				return;
			}
		}
	}

	pub fn lookup_area(&self, name: &str, version: u8) -> Option<Arc<Area>> {
		let areas = self.areas.load();
		let number = *areas.numbers_by_name.get(name)?;
		areas.by_key.get(&(number, version)).cloned()
	}

	pub fn lookup_area_by_number(&self, number: u16, version: u8) -> Option<Arc<Area>> {
		self.areas.load().by_key.get(&(number, version)).cloned()
	}

	/// Resolves a service through its area.
	pub fn lookup_service(&self, area: u16, version: u8, service: u16) -> Option<Arc<Service>> {
		self.lookup_area_by_number(area, version)?
			.service_by_number(service)
			.cloned()
	}

	/// Resolves an operation from the numbers carried in a message header.
	pub fn lookup_operation(
		&self,
		area: u16,
		version: u8,
		service: u16,
		operation: u16,
	) -> Option<Arc<Operation>> {
		self.lookup_service(area, version, service)?
			.operation_by_number(operation)
			.cloned()
	}

	/// Binds an error number to a name.
	///
	/// The same pair again is a no-op; a different name for a registered
	/// number is a [`MalError::RegistrationConflict`]; zero is a
	/// [`MalError::Argument`].
	pub fn register_error(&self, number: u32, name: &str) -> Result<()> {
		let number = ErrorNumber::new(number)?;
		loop {
			let old = self.errors.load_full();
			match old.names.get(&number) {
				Some(existing) if &**existing == name => return Ok(()),
				Some(existing) => {
					warn!(
						%number,
						existing = &**existing,
						error_name = name,
						"conflicting error registration"
					);
					return Err(MalError::conflict(format!(
						"error {number} is already registered as {existing}"
					)));
				}
				None => {}
			}

			let mut next = (*old).clone();
			next.names.insert(number, Arc::from(name));
			let prev = self.errors.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				debug!(%number, error_name = name, "registered error");
				return Ok(());
			}
		}
	}

	pub fn lookup_error(&self, number: u32) -> Option<Arc<str>> {
		let number = ErrorNumber::new(number).ok()?;
		self.errors.load().names.get(&number).cloned()
	}
}

#[cfg(test)]
mod tests;
