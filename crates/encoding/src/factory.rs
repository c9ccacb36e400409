//! Element Factory Registry.
//!
//! Maps a [`ShortForm`] to a zero-argument constructor of an empty element.
//! Decoders consult it whenever a value's concrete type is only known from the
//! short form read off the wire. Writes happen when areas and services are
//! loaded; afterwards the map is read-mostly.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::attribute::{Attribute, AttributeKind};
use crate::config::MalConfig;
use crate::element::{Element, ElementList, HeterogeneousList};
use crate::error::{MalError, Result};
use crate::short_form::ShortForm;

/// Shared constructor of a fresh, empty element.
pub type ElementFactory = Arc<dyn Fn() -> Box<dyn Element> + Send + Sync>;

/// How a second registration under an occupied short form is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
	/// Fail with [`MalError::RegistrationConflict`].
	#[default]
	Reject,
	/// Keep the existing factory.
	FirstWins,
	/// Replace the existing factory.
	LastWins,
}

/// A short form paired with its factory, the unit of bulk registration.
#[derive(Clone)]
pub struct ElementDescriptor {
	pub short_form: ShortForm,
	pub factory: ElementFactory,
}

impl ElementDescriptor {
	pub fn new(short_form: ShortForm, factory: ElementFactory) -> Self {
		Self {
			short_form,
			factory,
		}
	}

	/// Descriptor for a concrete element type, built from its `Default`.
	pub fn of<T: Element + Default>() -> Self {
		Self {
			short_form: T::default().short_form(),
			factory: Arc::new(|| Box::new(T::default()) as Box<dyn Element>),
		}
	}

	/// Descriptor for the homogeneous list of `item` elements.
	pub fn list(item: ShortForm) -> Self {
		let item = item.to_element_form();
		Self {
			short_form: item.to_list_form(),
			factory: Arc::new(move || Box::new(ElementList::new(item)) as Box<dyn Element>),
		}
	}

	/// Descriptor for a single attribute kind.
	pub fn attribute(kind: AttributeKind) -> Self {
		Self {
			short_form: kind.short_form(),
			factory: Arc::new(move || Box::new(Attribute::empty(kind)) as Box<dyn Element>),
		}
	}
}

impl fmt::Debug for ElementDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementDescriptor")
			.field("short_form", &self.short_form)
			.finish_non_exhaustive()
	}
}

/// Concurrent short form → factory map.
pub struct ElementFactoryRegistry {
	factories: RwLock<FxHashMap<ShortForm, ElementFactory>>,
	policy: DuplicatePolicy,
}

impl Default for ElementFactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ElementFactoryRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementFactoryRegistry")
			.field("len", &self.len())
			.field("policy", &self.policy)
			.finish()
	}
}

impl ElementFactoryRegistry {
	pub fn new() -> Self {
		Self::with_policy(DuplicatePolicy::default())
	}

	pub fn with_policy(policy: DuplicatePolicy) -> Self {
		Self {
			factories: RwLock::new(FxHashMap::default()),
			policy,
		}
	}

	pub fn from_config(config: &MalConfig) -> Self {
		Self::with_policy(config.registry.factory_duplicates)
	}

	pub fn policy(&self) -> DuplicatePolicy {
		self.policy
	}

	/// Registers `factory` under `short_form`.
	///
	/// The reserved heterogeneous-list short form cannot be registered; an
	/// occupied short form is resolved by the registry's [`DuplicatePolicy`].
	pub fn register(&self, short_form: ShortForm, factory: ElementFactory) -> Result<()> {
		self.register_all([ElementDescriptor::new(short_form, factory)])
	}

	pub fn register_descriptor(&self, descriptor: ElementDescriptor) -> Result<()> {
		self.register_all([descriptor])
	}

	/// Registers a batch of descriptors as one unit.
	///
	/// Every entry is checked against the map and against earlier entries of
	/// the same batch before anything is inserted: on error the map is left
	/// untouched.
	pub fn register_all<I>(&self, descriptors: I) -> Result<()>
	where
		I: IntoIterator<Item = ElementDescriptor>,
	{
		let mut factories = self.factories.write();
		let mut staged: FxHashMap<ShortForm, ElementFactory> = FxHashMap::default();
		for ElementDescriptor {
			short_form,
			factory,
		} in descriptors
		{
			if short_form.is_heterogeneous_list() {
				return Err(MalError::argument(
					"cannot register a factory for the reserved short form 0",
				));
			}
			let occupied = factories.contains_key(&short_form) || staged.contains_key(&short_form);
			if occupied && !self.admit_duplicate(short_form)? {
				continue;
			}
			staged.insert(short_form, factory);
		}

		let count = staged.len();
		factories.extend(staged);
		debug!(count, "registered element factories");
		Ok(())
	}

	/// Whether a factory for an occupied `short_form` replaces the old one.
	fn admit_duplicate(&self, short_form: ShortForm) -> Result<bool> {
		match self.policy {
			DuplicatePolicy::Reject => {
				warn!(%short_form, "rejected duplicate element factory");
				Err(MalError::conflict(format!(
					"element factory already registered for {short_form}"
				)))
			}
			DuplicatePolicy::FirstWins => {
				debug!(%short_form, "kept existing element factory");
				Ok(false)
			}
			DuplicatePolicy::LastWins => {
				debug!(%short_form, "replaced element factory");
				Ok(true)
			}
		}
	}

	/// Registers `T` together with the homogeneous list of `T`.
	pub fn register_element<T: Element + Default>(&self) -> Result<()> {
		let element = ElementDescriptor::of::<T>();
		let list = ElementDescriptor::list(element.short_form);
		self.register_all([element, list])
	}

	pub fn lookup(&self, short_form: ShortForm) -> Option<ElementFactory> {
		self.factories.read().get(&short_form).cloned()
	}

	/// Like [`lookup`](Self::lookup), for callers that cannot proceed without
	/// a factory.
	pub fn require(&self, short_form: ShortForm) -> Result<ElementFactory> {
		self.lookup(short_form).ok_or_else(|| missing(short_form))
	}

	/// Removes a factory, returning whether one was registered.
	pub fn deregister(&self, short_form: ShortForm) -> bool {
		let removed = self.factories.write().remove(&short_form).is_some();
		if removed {
			debug!(%short_form, "deregistered element factory");
		}
		removed
	}

	/// Builds a fresh, empty element for `short_form`.
	///
	/// Short form 0 always yields an empty [`HeterogeneousList`].
	pub fn create_element(&self, short_form: ShortForm) -> Result<Box<dyn Element>> {
		if short_form.is_heterogeneous_list() {
			return Ok(Box::new(HeterogeneousList::new()));
		}
		let factory = self.require(short_form)?;
		Ok(factory())
	}

	pub fn contains(&self, short_form: ShortForm) -> bool {
		self.factories.read().contains_key(&short_form)
	}

	pub fn len(&self) -> usize {
		self.factories.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.factories.read().is_empty()
	}
}

fn missing(short_form: ShortForm) -> MalError {
	MalError::not_found(format!(
		"no element factory for short form {:#x} ({short_form})",
		short_form.raw()
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn integer() -> ShortForm {
		AttributeKind::Integer.short_form()
	}

	fn integer_factory() -> ElementFactory {
		Arc::new(|| Box::new(Attribute::Integer(7)) as Box<dyn Element>)
	}

	#[test]
	fn reserved_short_form_is_rejected() {
		let registry = ElementFactoryRegistry::new();
		let err = registry
			.register_descriptor(ElementDescriptor::new(
				ShortForm::HETEROGENEOUS_LIST,
				Arc::new(|| Box::new(HeterogeneousList::new()) as Box<dyn Element>),
			))
			.unwrap_err();
		assert!(matches!(err, MalError::Argument(_)));
	}

	#[test]
	fn duplicate_policies() {
		let reject = ElementFactoryRegistry::new();
		reject
			.register_descriptor(ElementDescriptor::attribute(AttributeKind::Integer))
			.unwrap();
		assert!(matches!(
			reject.register_descriptor(ElementDescriptor::attribute(AttributeKind::Integer)),
			Err(MalError::RegistrationConflict(_))
		));

		let replacement = integer_factory();

		let first = ElementFactoryRegistry::with_policy(DuplicatePolicy::FirstWins);
		first
			.register_descriptor(ElementDescriptor::attribute(AttributeKind::Integer))
			.unwrap();
		first.register(integer(), replacement.clone()).unwrap();
		let made = first.create_element(integer()).unwrap();
		assert_eq!(made.downcast_ref::<Attribute>(), Some(&Attribute::Integer(0)));

		let last = ElementFactoryRegistry::with_policy(DuplicatePolicy::LastWins);
		last
			.register_descriptor(ElementDescriptor::attribute(AttributeKind::Integer))
			.unwrap();
		last.register(integer(), replacement).unwrap();
		let made = last.create_element(integer()).unwrap();
		assert_eq!(made.downcast_ref::<Attribute>(), Some(&Attribute::Integer(7)));
	}

	#[test]
	fn zero_creates_heterogeneous_list_without_registration() {
		let registry = ElementFactoryRegistry::new();
		let made = registry.create_element(ShortForm::HETEROGENEOUS_LIST).unwrap();
		assert!(made.is::<HeterogeneousList>());
	}

	#[test]
	fn missing_factory_reports_decomposition() {
		let registry = ElementFactoryRegistry::new();
		let sf = ShortForm::new(200, 1, 1, 42).unwrap();
		let err = registry.create_element(sf).unwrap_err();
		let MalError::NotFound(msg) = err else {
			panic!("expected NotFound, got {err:?}");
		};
		assert!(msg.contains("area=200 service=1 version=1 number=42"), "{msg}");
	}

	#[test]
	fn rejected_batch_leaves_registry_unchanged() {
		let registry = ElementFactoryRegistry::new();
		registry
			.register_descriptor(ElementDescriptor::attribute(AttributeKind::Boolean))
			.unwrap();

		let within_batch = registry.register_all([
			ElementDescriptor::attribute(AttributeKind::Long),
			ElementDescriptor::attribute(AttributeKind::Long),
			ElementDescriptor::attribute(AttributeKind::Short),
		]);
		assert!(matches!(within_batch, Err(MalError::RegistrationConflict(_))));

		let against_map = registry.register_all([
			ElementDescriptor::attribute(AttributeKind::Short),
			ElementDescriptor::attribute(AttributeKind::Boolean),
		]);
		assert!(matches!(against_map, Err(MalError::RegistrationConflict(_))));

		let reserved = registry.register_all([
			ElementDescriptor::attribute(AttributeKind::Short),
			ElementDescriptor::new(ShortForm::HETEROGENEOUS_LIST, integer_factory()),
		]);
		assert!(matches!(reserved, Err(MalError::Argument(_))));

		assert_eq!(registry.len(), 1);
		assert!(!registry.contains(AttributeKind::Long.short_form()));
		assert!(!registry.contains(AttributeKind::Short.short_form()));
	}

	#[test]
	fn duplicates_within_a_batch_follow_the_policy() {
		let first = ElementFactoryRegistry::with_policy(DuplicatePolicy::FirstWins);
		first
			.register_all([
				ElementDescriptor::attribute(AttributeKind::Integer),
				ElementDescriptor::new(integer(), integer_factory()),
			])
			.unwrap();
		let made = first.create_element(integer()).unwrap();
		assert_eq!(made.downcast_ref::<Attribute>(), Some(&Attribute::Integer(0)));

		let last = ElementFactoryRegistry::with_policy(DuplicatePolicy::LastWins);
		last.register_all([
			ElementDescriptor::attribute(AttributeKind::Integer),
			ElementDescriptor::new(integer(), integer_factory()),
		])
		.unwrap();
		let made = last.create_element(integer()).unwrap();
		assert_eq!(made.downcast_ref::<Attribute>(), Some(&Attribute::Integer(7)));
	}

	#[test]
	fn list_descriptor_builds_lists_of_the_item_type() {
		let registry = ElementFactoryRegistry::new();
		registry
			.register_descriptor(ElementDescriptor::list(integer()))
			.unwrap();
		let made = registry.create_element(integer().to_list_form()).unwrap();
		let list = made.downcast_ref::<ElementList>().unwrap();
		assert_eq!(list.item_short_form(), integer());
		assert_eq!(made.short_form(), integer().to_list_form());
	}

	#[test]
	fn deregister_removes_entry() {
		let registry = ElementFactoryRegistry::new();
		registry
			.register_descriptor(ElementDescriptor::attribute(AttributeKind::Blob))
			.unwrap();
		assert!(registry.deregister(AttributeKind::Blob.short_form()));
		assert!(!registry.deregister(AttributeKind::Blob.short_form()));
		assert!(registry.lookup(AttributeKind::Blob.short_form()).is_none());
		assert!(registry.is_empty());
	}
}
