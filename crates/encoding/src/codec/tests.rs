use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::stream::{Token, TokenDecoder, TokenEncoder};
use super::*;
use crate::config::CodecLimits;
use crate::element::{ElementList, HeterogeneousList};
use crate::structures::{EntityKey, mal_elements};

fn factories() -> Arc<ElementFactoryRegistry> {
	let registry = ElementFactoryRegistry::new();
	registry.register_all(mal_elements()).unwrap();
	Arc::new(registry)
}

fn boxed(element: impl Element) -> Option<Box<dyn Element>> {
	Some(Box::new(element))
}

fn boundary_values() -> Vec<Attribute> {
	vec![
		Attribute::Blob(Blob::default()),
		Attribute::Blob(Blob(vec![0, 0xFF, 7])),
		Attribute::Boolean(false),
		Attribute::Boolean(true),
		Attribute::Duration(Duration(0.0)),
		Attribute::Duration(Duration(-1.5)),
		Attribute::Float(f32::MAX),
		Attribute::Double(f64::MIN_POSITIVE),
		Attribute::Identifier(Identifier::default()),
		Attribute::Octet(-1),
		Attribute::Octet(i8::MIN),
		Attribute::UOctet(u8::MAX),
		Attribute::Short(-1),
		Attribute::UShort(u16::MAX),
		Attribute::Integer(0),
		Attribute::Integer(i32::MIN),
		Attribute::UInteger(u32::MAX),
		Attribute::Long(-1),
		Attribute::Long(i64::MAX),
		Attribute::ULong(u64::MAX),
		Attribute::String(String::new()),
		Attribute::String("ünïcödé".into()),
		Attribute::Time(Time(0)),
		Attribute::FineTime(FineTime(u64::MAX)),
		Attribute::Uri(Uri::default()),
		Attribute::ObjectRef(ObjectRef {
			domain: vec!["a".into(), "b".into()],
			type_short_form: AttributeKind::Integer.short_form(),
			key: "k".into(),
			version: u32::MAX,
		}),
	]
}

#[test]
fn every_kind_round_trips_present_and_absent() {
	let values = boundary_values();
	let covered: std::collections::BTreeSet<_> = values.iter().map(Attribute::kind).collect();
	assert_eq!(covered.len(), AttributeKind::ALL.len());

	let mut tokens = TokenEncoder::new();
	let enc: &mut dyn Encoder = &mut tokens;
	for value in &values {
		enc.encode_nullable_attribute(Some(value)).unwrap();
		enc.encode_nullable_attribute(None).unwrap();
		enc.encode_presence_flag(true).unwrap();
		value.encode_value(enc).unwrap();
	}

	let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
	let dec: &mut dyn Decoder = &mut decoder;
	for value in &values {
		assert_eq!(dec.decode_nullable_attribute().unwrap().as_ref(), Some(value));
		assert_eq!(dec.decode_nullable_attribute().unwrap(), None);
		let element = dec.decode_nullable_element(value).unwrap().unwrap();
		assert_eq!(element.downcast_ref::<Attribute>(), Some(value));
	}
	assert!(decoder.is_exhausted());
}

#[test]
fn nullable_primitives_write_only_a_flag_when_absent() {
	let mut tokens = TokenEncoder::new();
	tokens.encode_nullable_ulong(None).unwrap();
	tokens.encode_nullable_ulong(Some(u64::MAX)).unwrap();
	tokens.encode_nullable_string(Some("")).unwrap();
	tokens.encode_nullable_blob(None).unwrap();
	assert_eq!(
		tokens.tokens(),
		&[
			Token::Presence(false),
			Token::Presence(true),
			Token::ULong(u64::MAX),
			Token::Presence(true),
			Token::String(String::new()),
			Token::Presence(false),
		]
	);

	let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
	assert_eq!(decoder.decode_nullable_ulong().unwrap(), None);
	assert_eq!(decoder.decode_nullable_ulong().unwrap(), Some(u64::MAX));
	assert_eq!(decoder.decode_nullable_string().unwrap(), Some(String::new()));
	assert_eq!(decoder.decode_nullable_blob().unwrap(), None);
}

#[test]
fn abstract_element_materialises_through_factories() {
	let key = EntityKey {
		first_sub_key: Some("ATT".into()),
		second_sub_key: None,
		third_sub_key: Some(-1),
		fourth_sub_key: Some(0),
	};
	let mut tokens = TokenEncoder::new();
	let enc: &mut dyn Encoder = &mut tokens;
	enc.encode_abstract_element(&key).unwrap();
	enc.encode_nullable_abstract_element(None).unwrap();

	let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let decoded = dec.decode_abstract_element().unwrap();
	assert_eq!(decoded.short_form(), key.short_form());
	assert_eq!(decoded.downcast_ref::<EntityKey>(), Some(&key));
	assert!(dec.decode_nullable_abstract_element().unwrap().is_none());
}

#[test]
fn unknown_short_form_is_not_found_with_decomposition() {
	let unknown = ShortForm::new(200, 1, 1, 42).unwrap();
	let tokens = vec![Token::Long(unknown.raw())];
	let mut decoder = TokenDecoder::new(tokens, factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let err = dec.decode_abstract_element().unwrap_err();
	let MalError::NotFound(msg) = &err else {
		panic!("expected NotFound, got {err:?}");
	};
	assert!(msg.contains("area=200"), "{msg}");
	assert!(msg.contains("service=1"), "{msg}");
	assert!(msg.contains("version=1"), "{msg}");
	assert!(msg.contains("number=42"), "{msg}");
}

#[test]
fn unknown_attribute_tag_is_an_encoding_failure() {
	for tag in [0u8, 20, 255] {
		let mut decoder = TokenDecoder::new(vec![Token::UOctet(tag)], factories());
		let dec: &mut dyn Decoder = &mut decoder;
		assert!(matches!(dec.decode_attribute(), Err(MalError::Encoding(_))));
	}
}

#[test]
fn type_mismatch_and_truncation_are_encoding_failures() {
	let mut decoder = TokenDecoder::new(vec![Token::Integer(1)], factories());
	assert!(matches!(decoder.decode_long(), Err(MalError::Encoding(_))));
	assert!(matches!(decoder.decode_long(), Err(MalError::Encoding(_))));
}

#[test]
fn list_encoder_enforces_announced_size() {
	let mut tokens = TokenEncoder::new();
	let enc: &mut dyn Encoder = &mut tokens;

	let mut list = enc.create_list_encoder(1).unwrap();
	list.item(|e| e.encode_integer(1)).unwrap();
	assert!(matches!(
		list.item(|e| e.encode_integer(2)),
		Err(MalError::Argument(_))
	));
	list.close().unwrap();

	let mut short = enc.create_list_encoder(2).unwrap();
	short.item(|e| e.encode_integer(1)).unwrap();
	assert!(matches!(short.close(), Err(MalError::Argument(_))));
}

#[test]
fn list_decoder_refuses_to_overrun() {
	let tokens = vec![Token::ListSize(1), Token::Integer(5), Token::ListEnd];
	let mut decoder = TokenDecoder::new(tokens, factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let mut list = dec.create_list_decoder().unwrap();
	assert_eq!(list.size(), 1);
	assert_eq!(list.item(|d| d.decode_integer()).unwrap(), 5);
	assert!(!list.has_next());
	assert!(matches!(
		list.item(|d| d.decode_integer()),
		Err(MalError::Encoding(_))
	));
	list.close().unwrap();

	let tokens = vec![Token::ListSize(2), Token::Integer(5)];
	let mut decoder = TokenDecoder::new(tokens, factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let mut list = dec.create_list_decoder().unwrap();
	list.item(|d| d.decode_integer()).unwrap();
	assert!(matches!(list.close(), Err(MalError::Encoding(_))));
}

#[test]
fn homogeneous_list_keeps_null_items() {
	let integer = AttributeKind::Integer.short_form();
	let list = ElementList::with_items(
		integer,
		vec![
			boxed(Attribute::Integer(1)),
			None,
			boxed(Attribute::Integer(-3)),
		],
	);

	let mut tokens = TokenEncoder::new();
	let enc: &mut dyn Encoder = &mut tokens;
	enc.encode_abstract_element(&list).unwrap();

	let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let decoded = dec.decode_abstract_element().unwrap();
	assert_eq!(decoded.short_form(), integer.to_list_form());
	let decoded = decoded.downcast_ref::<ElementList>().unwrap();
	assert_eq!(decoded, &list);
	let present: Vec<_> = decoded.iter_as::<Attribute>().cloned().collect();
	assert_eq!(present, vec![Attribute::Integer(1), Attribute::Integer(-3)]);
}

#[test]
fn heterogeneous_list_tags_every_item() {
	let list = HeterogeneousList::from_items(vec![
		boxed(Attribute::Boolean(true)),
		None,
		boxed(EntityKey::default()),
	]);

	let mut tokens = TokenEncoder::new();
	let enc: &mut dyn Encoder = &mut tokens;
	enc.encode_abstract_element(&list).unwrap();
	assert_eq!(tokens.tokens()[0], Token::Long(0));

	let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let decoded = dec.decode_abstract_element().unwrap();
	assert_eq!(decoded.downcast_ref::<HeterogeneousList>(), Some(&list));
}

#[test]
fn homogeneous_list_of_heterogeneous_lists() {
	let inner = HeterogeneousList::from_items(vec![boxed(Attribute::Short(-2)), None]);

	let mut tokens = TokenEncoder::new();
	{
		let enc: &mut dyn Encoder = &mut tokens;
		let mut list = enc.create_list_encoder(2).unwrap();
		list.item(|e| e.encode_nullable_element(Some(&inner))).unwrap();
		list.item(|e| e.encode_nullable_element(None)).unwrap();
		list.close().unwrap();
	}

	let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
	let dec: &mut dyn Decoder = &mut decoder;
	let items = dec
		.decode_homogeneous_list(ShortForm::HETEROGENEOUS_LIST)
		.unwrap();
	assert_eq!(items.len(), 2);
	assert_eq!(
		items[0].as_deref().and_then(|e| e.downcast_ref::<HeterogeneousList>()),
		Some(&inner)
	);
	assert!(items[1].is_none());
	assert!(decoder.is_exhausted());
}

#[test]
fn decoder_limits_reject_oversized_values() {
	let limits = CodecLimits {
		max_list_len: 2,
		max_string_len: 3,
		max_blob_len: 1,
	};
	let mut decoder =
		TokenDecoder::with_limits(vec![Token::ListSize(3)], factories(), limits);
	assert!(matches!(decoder.decode_list_size(), Err(MalError::Encoding(_))));

	let mut decoder =
		TokenDecoder::with_limits(vec![Token::String("abcd".into())], factories(), limits);
	assert!(matches!(decoder.decode_string(), Err(MalError::Encoding(_))));

	let mut decoder =
		TokenDecoder::with_limits(vec![Token::Blob(vec![1, 2])], factories(), limits);
	assert!(matches!(decoder.decode_blob(), Err(MalError::Encoding(_))));
}

proptest! {
	#[test]
	fn prop_integers_round_trip(long in any::<i64>(), ushort in any::<u16>(), octet in any::<i8>()) {
		let mut tokens = TokenEncoder::new();
		tokens.encode_long(long).unwrap();
		tokens.encode_nullable_ushort(Some(ushort)).unwrap();
		tokens.encode_octet(octet).unwrap();

		let mut decoder = TokenDecoder::new(tokens.into_tokens(), factories());
		prop_assert_eq!(decoder.decode_long().unwrap(), long);
		prop_assert_eq!(decoder.decode_nullable_ushort().unwrap(), Some(ushort));
		prop_assert_eq!(decoder.decode_octet().unwrap(), octet);
		prop_assert!(decoder.is_exhausted());
	}
}
