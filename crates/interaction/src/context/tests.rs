use std::thread;

use mal_encoding::structures::{UPDATE_TYPE, UpdateType};
use mal_encoding::{DuplicatePolicy, ElementDescriptor, ShortForm};

use super::*;
use crate::helper::MalHelper;
use crate::operation::{InteractionPattern, OperationDecl};
use crate::service::ServiceKey;

fn area(number: u16, name: &str, version: u8) -> Arc<Area> {
	Arc::new(Area::new(number, name, version, Vec::new(), Vec::new()).unwrap())
}

#[test]
fn same_instance_registers_idempotently() {
	let registry = MalRegistry::new();
	let example = area(200, "Example", 1);
	registry.register_area(example.clone()).unwrap();
	registry.register_area(example.clone()).unwrap();
	assert!(Arc::ptr_eq(&registry.lookup_area("Example", 1).unwrap(), &example));
	assert!(Arc::ptr_eq(
		&registry.lookup_area_by_number(200, 1).unwrap(),
		&example
	));
}

#[test]
fn different_instance_under_same_key_conflicts() {
	let registry = MalRegistry::new();
	registry.register_area(area(200, "Example", 1)).unwrap();
	assert!(matches!(
		registry.register_area(area(200, "Example", 1)),
		Err(MalError::RegistrationConflict(_))
	));
}

#[test]
fn name_binds_to_one_number_across_versions() {
	let registry = MalRegistry::new();
	registry.register_area(area(200, "Example", 1)).unwrap();
	registry.register_area(area(200, "Example", 2)).unwrap();
	assert!(matches!(
		registry.register_area(area(201, "Example", 3)),
		Err(MalError::RegistrationConflict(_))
	));
	assert_eq!(registry.lookup_area("Example", 2).map(|a| a.version()), Some(2));
	assert!(registry.lookup_area("Example", 3).is_none());
	assert!(registry.lookup_area_by_number(201, 3).is_none());
	assert!(registry.lookup_area("Missing", 1).is_none());
}

#[test]
fn error_table_policy() {
	let registry = MalRegistry::new();
	registry.register_error(70000, "MY_ERROR").unwrap();
	registry.register_error(70000, "MY_ERROR").unwrap();
	assert!(matches!(
		registry.register_error(70000, "OTHER"),
		Err(MalError::RegistrationConflict(_))
	));
	assert!(matches!(
		registry.register_error(0, "ZERO"),
		Err(MalError::Argument(_))
	));
	assert_eq!(registry.lookup_error(70000).as_deref(), Some("MY_ERROR"));
	assert_eq!(registry.lookup_error(70001), None);
	assert_eq!(registry.lookup_error(0), None);
}

#[test]
fn concurrent_registrations_are_not_lost() {
	let registry = Arc::new(MalRegistry::new());
	let handles: Vec<_> = (0..8u16)
		.map(|t| {
			let registry = Arc::clone(&registry);
			thread::spawn(move || {
				for i in 0..16u16 {
					let number = 1000 + t * 16 + i;
					registry
						.register_area(area(number, &format!("A{number}"), 1))
						.unwrap();
					registry
						.register_error(u32::from(number), &format!("E{number}"))
						.unwrap();
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	for number in 1000..1000 + 8 * 16 {
		assert!(registry.lookup_area_by_number(number, 1).is_some(), "area {number}");
		assert_eq!(
			registry.lookup_error(u32::from(number)).as_deref(),
			Some(format!("E{number}").as_str())
		);
	}
}

fn demo_area() -> Arc<Area> {
	let service = Service::new(
		ServiceKey::new(200, 1, 1),
		"Demo",
		vec![ElementDescriptor::of::<UpdateType>()],
		vec![OperationDecl::new(
			3,
			"Do",
			InteractionPattern::Submit { submit: Vec::new() },
		)],
	)
	.unwrap();
	let element = ShortForm::new(200, 0, 1, 1).unwrap();
	Arc::new(
		Area::new(
			200,
			"Example",
			1,
			vec![ElementDescriptor::list(element)],
			vec![service],
		)
		.unwrap(),
	)
}

#[test]
fn load_area_registers_factories_once() {
	let registry = MalRegistry::new();
	let example = demo_area();
	registry.load_area(example.clone()).unwrap();
	registry.load_area(example).unwrap();

	let factories = registry.element_factories();
	assert_eq!(factories.len(), 2);
	assert!(factories.contains(ShortForm::new(200, 0, 1, -1).unwrap()));
	assert!(factories.contains(UPDATE_TYPE));
}

#[test]
fn lookup_operation_resolves_header_numbers() {
	let registry = MalRegistry::new();
	registry.load_area(demo_area()).unwrap();

	let op = registry.lookup_operation(200, 1, 1, 3).unwrap();
	assert_eq!(op.name(), "Do");
	assert_eq!(op.service().map(|s| s.name().to_owned()), Some("Demo".into()));
	assert!(registry.lookup_operation(200, 1, 1, 4).is_none());
	assert!(registry.lookup_operation(200, 1, 2, 3).is_none());
	assert!(registry.lookup_operation(200, 2, 1, 3).is_none());
}

#[test]
fn config_policy_reaches_factory_registry() {
	let config = MalConfig::from_toml("[registry]\nfactory-duplicates = \"first-wins\"").unwrap();
	let registry = MalRegistry::from_config(&config);
	assert_eq!(registry.element_factories().policy(), DuplicatePolicy::FirstWins);
}

#[test]
fn rejected_factories_withdraw_the_area() {
	let registry = MalRegistry::new();
	MalHelper::init(&registry).unwrap();
	let baseline = registry.element_factories().len();
	let own_list = ShortForm::new(200, 0, 1, -1).unwrap();
	let example = demo_area();

	for _ in 0..2 {
		assert!(matches!(
			registry.load_area(example.clone()),
			Err(MalError::RegistrationConflict(_))
		));
		assert!(registry.lookup_area("Example", 1).is_none());
		assert!(registry.lookup_area_by_number(200, 1).is_none());
		assert!(registry.lookup_operation(200, 1, 1, 3).is_none());
		assert!(!registry.element_factories().contains(own_list));
		assert_eq!(registry.element_factories().len(), baseline);
	}

	assert!(registry.element_factories().deregister(UPDATE_TYPE));
	registry.load_area(example.clone()).unwrap();
	assert!(Arc::ptr_eq(&registry.lookup_area("Example", 1).unwrap(), &example));
	assert!(registry.element_factories().contains(own_list));
}

#[test]
fn withdrawn_area_keeps_other_versions_name_binding() {
	let registry = MalRegistry::new();
	registry.register_area(area(200, "Example", 2)).unwrap();
	registry
		.element_factories()
		.register_element::<UpdateType>()
		.unwrap();

	assert!(registry.load_area(demo_area()).is_err());
	assert_eq!(registry.lookup_area("Example", 2).map(|a| a.version()), Some(2));
	assert!(registry.lookup_area("Example", 1).is_none());
}

#[test]
fn get_or_load_area_builds_once() {
	let registry = MalRegistry::new();
	let first = registry
		.get_or_load_area(200, 1, || Area::new(200, "Example", 1, Vec::new(), Vec::new()))
		.unwrap();
	let second = registry
		.get_or_load_area(200, 1, || panic!("area already registered"))
		.unwrap();
	assert!(Arc::ptr_eq(&first, &second));

	assert!(matches!(
		registry.get_or_load_area(201, 1, || Area::new(202, "Other", 1, Vec::new(), Vec::new())),
		Err(MalError::Argument(_))
	));
	assert!(registry.lookup_area_by_number(202, 1).is_none());
}
