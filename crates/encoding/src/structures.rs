//! Structures of the MAL area used by the publish/subscribe pattern.

use crate::attribute::{Attribute, AttributeKind, Identifier, Time, Uri};
use crate::codec::{Decoder, Encoder};
use crate::element::Element;
use crate::error::{MalError, Result};
use crate::factory::ElementDescriptor;
use crate::short_form::ShortForm;

pub const MAL_AREA_NUMBER: u16 = 1;
pub const MAL_AREA_VERSION: u8 = 1;
pub const MAL_AREA_NAME: &str = "MAL";

const fn mal_type(number: i32) -> ShortForm {
	ShortForm::constant(MAL_AREA_NUMBER, 0, MAL_AREA_VERSION, number)
}

pub const IDENTIFIER_LIST: ShortForm = AttributeKind::Identifier.short_form().to_list_form();
pub const UPDATE_TYPE: ShortForm = mal_type(22);
pub const SUBSCRIPTION: ShortForm = mal_type(23);
pub const ENTITY_REQUEST: ShortForm = mal_type(24);
pub const ENTITY_KEY: ShortForm = mal_type(25);
pub const ENTITY_KEY_LIST: ShortForm = ENTITY_KEY.to_list_form();
pub const UPDATE_HEADER: ShortForm = mal_type(26);
pub const UPDATE_HEADER_LIST: ShortForm = UPDATE_HEADER.to_list_form();
pub const NAMED_VALUE: ShortForm = mal_type(29);

/// Element and list factories of every MAL area type.
pub fn mal_elements() -> Vec<ElementDescriptor> {
	let mut descriptors = Vec::with_capacity(2 * (AttributeKind::ALL.len() + 6));
	for kind in AttributeKind::ALL {
		descriptors.push(ElementDescriptor::attribute(kind));
		descriptors.push(ElementDescriptor::list(kind.short_form()));
	}
	for element in [
		ElementDescriptor::of::<UpdateType>(),
		ElementDescriptor::of::<Subscription>(),
		ElementDescriptor::of::<EntityRequest>(),
		ElementDescriptor::of::<EntityKey>(),
		ElementDescriptor::of::<UpdateHeader>(),
		ElementDescriptor::of::<NamedValue>(),
	] {
		let list = ElementDescriptor::list(element.short_form);
		descriptors.push(element);
		descriptors.push(list);
	}
	descriptors
}

fn encode_list<T: Element>(encoder: &mut dyn Encoder, items: &[T]) -> Result<()> {
	let mut list = encoder.create_list_encoder(items.len())?;
	for item in items {
		list.item(|enc| {
			enc.encode_presence_flag(true)?;
			item.encode(enc)
		})?;
	}
	list.close()
}

fn decode_list<T: Element + Default>(decoder: &mut dyn Decoder) -> Result<Vec<T>> {
	let mut list = decoder.create_list_decoder()?;
	let mut items = Vec::with_capacity(list.size().min(1024));
	while list.has_next() {
		let item = list.item(|dec| dec.decode_nullable_typed::<T>())?;
		items.push(item.ok_or_else(|| MalError::encoding("null item in a non-nullable list"))?);
	}
	list.close()?;
	Ok(items)
}

fn encode_identifiers(encoder: &mut dyn Encoder, items: &[Identifier]) -> Result<()> {
	let mut list = encoder.create_list_encoder(items.len())?;
	for item in items {
		list.item(|enc| enc.encode_nullable_identifier(Some(item)))?;
	}
	list.close()
}

fn decode_identifiers(decoder: &mut dyn Decoder) -> Result<Vec<Identifier>> {
	let mut list = decoder.create_list_decoder()?;
	let mut items = Vec::with_capacity(list.size().min(1024));
	while list.has_next() {
		let item = list.item(|dec| dec.decode_nullable_identifier())?;
		items.push(item.ok_or_else(|| MalError::encoding("null identifier in a domain"))?);
	}
	list.close()?;
	Ok(items)
}

/// Kind of change an update reports. Written as its ordinal in a `UOctet`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UpdateType {
	#[default]
	Creation,
	Update,
	Modification,
	Deletion,
}

impl UpdateType {
	pub const ALL: [UpdateType; 4] = [
		Self::Creation,
		Self::Update,
		Self::Modification,
		Self::Deletion,
	];

	pub fn ordinal(self) -> u8 {
		self as u8
	}

	pub fn from_ordinal(ordinal: u8) -> Option<Self> {
		Self::ALL.get(ordinal as usize).copied()
	}
}

impl Element for UpdateType {
	fn short_form(&self) -> ShortForm {
		UPDATE_TYPE
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_uoctet(self.ordinal())
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		let ordinal = decoder.decode_uoctet()?;
		*self = Self::from_ordinal(ordinal)
			.ok_or_else(|| MalError::encoding(format!("invalid UpdateType ordinal {ordinal}")))?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::default())
	}
}

/// Four-part key identifying a published entity. Absent sub-keys act as
/// wildcards in subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntityKey {
	pub first_sub_key: Option<Identifier>,
	pub second_sub_key: Option<i64>,
	pub third_sub_key: Option<i64>,
	pub fourth_sub_key: Option<i64>,
}

impl Element for EntityKey {
	fn short_form(&self) -> ShortForm {
		ENTITY_KEY
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_nullable_identifier(self.first_sub_key.as_ref())?;
		encoder.encode_nullable_long(self.second_sub_key)?;
		encoder.encode_nullable_long(self.third_sub_key)?;
		encoder.encode_nullable_long(self.fourth_sub_key)
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.first_sub_key = decoder.decode_nullable_identifier()?;
		self.second_sub_key = decoder.decode_nullable_long()?;
		self.third_sub_key = decoder.decode_nullable_long()?;
		self.fourth_sub_key = decoder.decode_nullable_long()?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::default())
	}
}

/// Metadata accompanying every published update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateHeader {
	pub timestamp: Time,
	pub source_uri: Uri,
	pub update_type: UpdateType,
	pub key: EntityKey,
}

impl Element for UpdateHeader {
	fn short_form(&self) -> ShortForm {
		UPDATE_HEADER
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_time(self.timestamp)?;
		encoder.encode_uri(&self.source_uri)?;
		self.update_type.encode(encoder)?;
		self.key.encode(encoder)
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.timestamp = decoder.decode_time()?;
		self.source_uri = decoder.decode_uri()?;
		self.update_type.decode(decoder)?;
		self.key.decode(decoder)
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::default())
	}
}

/// One entity filter of a subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRequest {
	pub sub_domain: Option<Vec<Identifier>>,
	pub all_areas: bool,
	pub all_services: bool,
	pub all_operations: bool,
	pub only_on_change: bool,
	pub entity_keys: Vec<EntityKey>,
}

impl Element for EntityRequest {
	fn short_form(&self) -> ShortForm {
		ENTITY_REQUEST
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_presence_flag(self.sub_domain.is_some())?;
		if let Some(domain) = &self.sub_domain {
			encode_identifiers(encoder, domain)?;
		}
		encoder.encode_boolean(self.all_areas)?;
		encoder.encode_boolean(self.all_services)?;
		encoder.encode_boolean(self.all_operations)?;
		encoder.encode_boolean(self.only_on_change)?;
		encode_list(encoder, &self.entity_keys)
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.sub_domain = if decoder.decode_presence_flag()? {
			Some(decode_identifiers(decoder)?)
		} else {
			None
		};
		self.all_areas = decoder.decode_boolean()?;
		self.all_services = decoder.decode_boolean()?;
		self.all_operations = decoder.decode_boolean()?;
		self.only_on_change = decoder.decode_boolean()?;
		self.entity_keys = decode_list(decoder)?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::default())
	}
}

/// A consumer's registration with a broker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subscription {
	pub subscription_id: Identifier,
	pub entities: Vec<EntityRequest>,
}

impl Element for Subscription {
	fn short_form(&self) -> ShortForm {
		SUBSCRIPTION
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_identifier(&self.subscription_id)?;
		encode_list(encoder, &self.entities)
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.subscription_id = decoder.decode_identifier()?;
		self.entities = decode_list(decoder)?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::default())
	}
}

/// Name and loosely typed value pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValue {
	pub name: Option<Identifier>,
	pub value: Option<Attribute>,
}

impl Element for NamedValue {
	fn short_form(&self) -> ShortForm {
		NAMED_VALUE
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_nullable_identifier(self.name.as_ref())?;
		encoder.encode_nullable_attribute(self.value.as_ref())
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.name = decoder.decode_nullable_identifier()?;
		self.value = decoder.decode_nullable_attribute()?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::default())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::codec::stream::{TokenDecoder, TokenEncoder};
	use crate::factory::ElementFactoryRegistry;

	fn registry() -> Arc<ElementFactoryRegistry> {
		let registry = ElementFactoryRegistry::new();
		registry.register_all(mal_elements()).unwrap();
		Arc::new(registry)
	}

	#[test]
	fn structure_numbers() {
		assert_eq!(UPDATE_TYPE.unpack(), (1, 0, 1, 22));
		assert_eq!(SUBSCRIPTION.type_number(), 23);
		assert_eq!(ENTITY_KEY.type_number(), 25);
		assert_eq!(UPDATE_HEADER.type_number(), 26);
		assert_eq!(NAMED_VALUE.type_number(), 29);
		assert_eq!(IDENTIFIER_LIST.type_number(), -6);
		assert_eq!(UPDATE_HEADER_LIST.to_element_form(), UPDATE_HEADER);
	}

	#[test]
	fn mal_elements_register_without_conflict() {
		let registry = registry();
		assert_eq!(registry.len(), 2 * (AttributeKind::ALL.len() + 6));
		assert!(registry.contains(ENTITY_KEY_LIST));
		assert!(registry.contains(IDENTIFIER_LIST));
	}

	#[test]
	fn subscription_survives_abstract_round_trip() {
		let subscription = Subscription {
			subscription_id: "sub-1".into(),
			entities: vec![EntityRequest {
				sub_domain: Some(vec!["spacecraft".into(), "aocs".into()]),
				all_areas: true,
				only_on_change: true,
				entity_keys: vec![EntityKey {
					first_sub_key: Some("*".into()),
					second_sub_key: Some(0),
					..EntityKey::default()
				}],
				..EntityRequest::default()
			}],
		};

		let mut tokens = TokenEncoder::new();
		let enc: &mut dyn Encoder = &mut tokens;
		enc.encode_abstract_element(&subscription).unwrap();

		let mut decoder = TokenDecoder::new(tokens.into_tokens(), registry());
		let dec: &mut dyn Decoder = &mut decoder;
		let decoded = dec.decode_abstract_element().unwrap();
		assert_eq!(decoded.downcast_ref::<Subscription>(), Some(&subscription));
		assert!(decoder.is_exhausted());
	}

	#[test]
	fn update_header_and_named_value() {
		let header = UpdateHeader {
			timestamp: Time(1_700_000_000_000),
			source_uri: "malbus://provider".into(),
			update_type: UpdateType::Deletion,
			key: EntityKey::default(),
		};
		let named = NamedValue {
			name: Some("gain".into()),
			value: Some(Attribute::Double(0.5)),
		};

		let mut tokens = TokenEncoder::new();
		let enc: &mut dyn Encoder = &mut tokens;
		enc.encode_element(&header).unwrap();
		enc.encode_element(&named).unwrap();

		let mut decoder = TokenDecoder::new(tokens.into_tokens(), registry());
		let dec: &mut dyn Decoder = &mut decoder;
		assert_eq!(dec.decode_typed::<UpdateHeader>().unwrap(), header);
		assert_eq!(dec.decode_typed::<NamedValue>().unwrap(), named);
	}

	#[test]
	fn invalid_update_type_ordinal_fails() {
		let mut tokens = TokenEncoder::new();
		tokens.encode_uoctet(9).unwrap();
		let mut decoder = TokenDecoder::new(tokens.into_tokens(), registry());
		let dec: &mut dyn Decoder = &mut decoder;
		assert!(matches!(
			dec.decode_typed::<UpdateType>(),
			Err(MalError::Encoding(_))
		));
	}
}
