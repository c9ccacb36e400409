//! Encoder/decoder contract between the type machinery and a wire format.
//!
//! A concrete wire technology implements [`Encoder`] and [`Decoder`] for the
//! attribute kinds plus a presence flag; everything else (nullable values,
//! concrete and abstract elements, tagged attributes, lists) is provided on
//! top of those primitives by the inherent methods on `dyn Encoder` and
//! `dyn Decoder`, so every format handles them identically.
//!
//! Non-nullable methods take plain values: absence cannot be expressed. The
//! nullable variants write a presence flag and the value only when present.
//! Every decode failure is [`MalError::Encoding`](crate::MalError::Encoding)
//! and aborts the whole decode.

mod list;
pub mod stream;

pub use list::{ListDecoder, ListEncoder};

use crate::attribute::{
	Attribute, AttributeKind, Blob, Duration, FineTime, Identifier, ObjectRef, Time, Uri,
};
use crate::element::Element;
use crate::error::{MalError, Result};
use crate::factory::ElementFactoryRegistry;
use crate::short_form::ShortForm;

macro_rules! nullable_encoders {
	($($nullable:ident => $plain:ident($ty:ty);)*) => {
		$(
			#[doc = concat!("Presence flag, then [`Encoder::", stringify!($plain), "`] if present.")]
			fn $nullable(&mut self, value: Option<$ty>) -> Result<()> {
				self.encode_presence_flag(value.is_some())?;
				match value {
					Some(v) => self.$plain(v),
					None => Ok(()),
				}
			}
		)*
	};
}

macro_rules! nullable_decoders {
	($($nullable:ident => $plain:ident -> $ty:ty;)*) => {
		$(
			#[doc = concat!("Presence flag, then [`Decoder::", stringify!($plain), "`] if present.")]
			fn $nullable(&mut self) -> Result<Option<$ty>> {
				if self.decode_presence_flag()? {
					self.$plain().map(Some)
				} else {
					Ok(None)
				}
			}
		)*
	};
}

/// Write side of a wire format.
pub trait Encoder {
	/// Marks whether a nullable value follows.
	fn encode_presence_flag(&mut self, present: bool) -> Result<()>;

	fn encode_boolean(&mut self, value: bool) -> Result<()>;
	fn encode_float(&mut self, value: f32) -> Result<()>;
	fn encode_double(&mut self, value: f64) -> Result<()>;
	fn encode_octet(&mut self, value: i8) -> Result<()>;
	fn encode_uoctet(&mut self, value: u8) -> Result<()>;
	fn encode_short(&mut self, value: i16) -> Result<()>;
	fn encode_ushort(&mut self, value: u16) -> Result<()>;
	fn encode_integer(&mut self, value: i32) -> Result<()>;
	fn encode_uinteger(&mut self, value: u32) -> Result<()>;
	fn encode_long(&mut self, value: i64) -> Result<()>;
	fn encode_ulong(&mut self, value: u64) -> Result<()>;
	fn encode_string(&mut self, value: &str) -> Result<()>;
	fn encode_blob(&mut self, value: &Blob) -> Result<()>;
	fn encode_duration(&mut self, value: Duration) -> Result<()>;
	fn encode_time(&mut self, value: Time) -> Result<()>;
	fn encode_fine_time(&mut self, value: FineTime) -> Result<()>;
	fn encode_identifier(&mut self, value: &Identifier) -> Result<()>;
	fn encode_uri(&mut self, value: &Uri) -> Result<()>;

	/// Domain, type short form, key, version.
	fn encode_object_ref(&mut self, value: &ObjectRef) -> Result<()> {
		self.encode_list_size(value.domain.len())?;
		for segment in &value.domain {
			self.encode_identifier(segment)?;
		}
		self.encode_list_end()?;
		self.encode_short_form(value.type_short_form)?;
		self.encode_identifier(&value.key)?;
		self.encode_uinteger(value.version)
	}

	fn encode_short_form(&mut self, value: ShortForm) -> Result<()> {
		self.encode_long(value.raw())
	}

	fn encode_attribute_tag(&mut self, kind: AttributeKind) -> Result<()> {
		self.encode_uoctet(kind.tag())
	}

	/// Announces the number of items of a list about to be written.
	fn encode_list_size(&mut self, len: usize) -> Result<()> {
		let len = u32::try_from(len)
			.map_err(|_| MalError::argument(format!("list of {len} items exceeds u32")))?;
		self.encode_uinteger(len)
	}

	/// Marks the end of a list. Most formats need no terminator.
	fn encode_list_end(&mut self) -> Result<()> {
		Ok(())
	}

	nullable_encoders! {
		encode_nullable_boolean => encode_boolean(bool);
		encode_nullable_float => encode_float(f32);
		encode_nullable_double => encode_double(f64);
		encode_nullable_octet => encode_octet(i8);
		encode_nullable_uoctet => encode_uoctet(u8);
		encode_nullable_short => encode_short(i16);
		encode_nullable_ushort => encode_ushort(u16);
		encode_nullable_integer => encode_integer(i32);
		encode_nullable_uinteger => encode_uinteger(u32);
		encode_nullable_long => encode_long(i64);
		encode_nullable_ulong => encode_ulong(u64);
		encode_nullable_string => encode_string(&str);
		encode_nullable_blob => encode_blob(&Blob);
		encode_nullable_duration => encode_duration(Duration);
		encode_nullable_time => encode_time(Time);
		encode_nullable_fine_time => encode_fine_time(FineTime);
		encode_nullable_identifier => encode_identifier(&Identifier);
		encode_nullable_uri => encode_uri(&Uri);
		encode_nullable_object_ref => encode_object_ref(&ObjectRef);
	}
}

/// Read side of a wire format.
pub trait Decoder {
	/// Registry used to materialise abstractly typed elements.
	fn element_factories(&self) -> &ElementFactoryRegistry;

	/// Reads the flag written by [`Encoder::encode_presence_flag`].
	fn decode_presence_flag(&mut self) -> Result<bool>;

	fn decode_boolean(&mut self) -> Result<bool>;
	fn decode_float(&mut self) -> Result<f32>;
	fn decode_double(&mut self) -> Result<f64>;
	fn decode_octet(&mut self) -> Result<i8>;
	fn decode_uoctet(&mut self) -> Result<u8>;
	fn decode_short(&mut self) -> Result<i16>;
	fn decode_ushort(&mut self) -> Result<u16>;
	fn decode_integer(&mut self) -> Result<i32>;
	fn decode_uinteger(&mut self) -> Result<u32>;
	fn decode_long(&mut self) -> Result<i64>;
	fn decode_ulong(&mut self) -> Result<u64>;
	fn decode_string(&mut self) -> Result<String>;
	fn decode_blob(&mut self) -> Result<Blob>;
	fn decode_duration(&mut self) -> Result<Duration>;
	fn decode_time(&mut self) -> Result<Time>;
	fn decode_fine_time(&mut self) -> Result<FineTime>;
	fn decode_identifier(&mut self) -> Result<Identifier>;
	fn decode_uri(&mut self) -> Result<Uri>;

	fn decode_object_ref(&mut self) -> Result<ObjectRef> {
		let segments = self.decode_list_size()?;
		let mut domain = Vec::with_capacity(segments.min(64));
		for _ in 0..segments {
			domain.push(self.decode_identifier()?);
		}
		self.decode_list_end()?;
		Ok(ObjectRef {
			domain,
			type_short_form: self.decode_short_form()?,
			key: self.decode_identifier()?,
			version: self.decode_uinteger()?,
		})
	}

	fn decode_short_form(&mut self) -> Result<ShortForm> {
		self.decode_long().map(ShortForm::from_raw)
	}

	fn decode_attribute_tag(&mut self) -> Result<AttributeKind> {
		let tag = self.decode_uoctet()?;
		AttributeKind::from_tag(tag)
			.ok_or_else(|| MalError::encoding(format!("unknown attribute tag {tag}")))
	}

	fn decode_list_size(&mut self) -> Result<usize> {
		self.decode_uinteger().map(|len| len as usize)
	}

	fn decode_list_end(&mut self) -> Result<()> {
		Ok(())
	}

	nullable_decoders! {
		decode_nullable_boolean => decode_boolean -> bool;
		decode_nullable_float => decode_float -> f32;
		decode_nullable_double => decode_double -> f64;
		decode_nullable_octet => decode_octet -> i8;
		decode_nullable_uoctet => decode_uoctet -> u8;
		decode_nullable_short => decode_short -> i16;
		decode_nullable_ushort => decode_ushort -> u16;
		decode_nullable_integer => decode_integer -> i32;
		decode_nullable_uinteger => decode_uinteger -> u32;
		decode_nullable_long => decode_long -> i64;
		decode_nullable_ulong => decode_ulong -> u64;
		decode_nullable_string => decode_string -> String;
		decode_nullable_blob => decode_blob -> Blob;
		decode_nullable_duration => decode_duration -> Duration;
		decode_nullable_time => decode_time -> Time;
		decode_nullable_fine_time => decode_fine_time -> FineTime;
		decode_nullable_identifier => decode_identifier -> Identifier;
		decode_nullable_uri => decode_uri -> Uri;
		decode_nullable_object_ref => decode_object_ref -> ObjectRef;
	}
}

impl<'a> dyn Encoder + 'a {
	/// Delegates to the element's own encoding.
	pub fn encode_element(&mut self, element: &dyn Element) -> Result<()> {
		element.encode(self)
	}

	pub fn encode_nullable_element(&mut self, element: Option<&dyn Element>) -> Result<()> {
		self.encode_presence_flag(element.is_some())?;
		match element {
			Some(element) => element.encode(self),
			None => Ok(()),
		}
	}

	/// Writes the element's short form, then the element.
	pub fn encode_abstract_element(&mut self, element: &dyn Element) -> Result<()> {
		self.encode_short_form(element.short_form())?;
		element.encode(self)
	}

	pub fn encode_nullable_abstract_element(&mut self, element: Option<&dyn Element>) -> Result<()> {
		self.encode_presence_flag(element.is_some())?;
		match element {
			Some(element) => self.encode_abstract_element(element),
			None => Ok(()),
		}
	}

	/// Writes the attribute's kind tag, then its value.
	pub fn encode_attribute(&mut self, attribute: &Attribute) -> Result<()> {
		self.encode_attribute_tag(attribute.kind())?;
		attribute.encode_value(self)
	}

	pub fn encode_nullable_attribute(&mut self, attribute: Option<&Attribute>) -> Result<()> {
		self.encode_presence_flag(attribute.is_some())?;
		match attribute {
			Some(attribute) => self.encode_attribute(attribute),
			None => Ok(()),
		}
	}

	/// Announces `len` items and returns a sub-encoder that writes them.
	pub fn create_list_encoder(&mut self, len: usize) -> Result<ListEncoder<'_>> {
		self.encode_list_size(len)?;
		Ok(ListEncoder::new(self, len))
	}
}

impl<'a> dyn Decoder + 'a {
	/// Decodes into a fresh instance of the prototype's concrete type.
	pub fn decode_element(&mut self, prototype: &dyn Element) -> Result<Box<dyn Element>> {
		let mut element = prototype.create_element();
		element.decode(self)?;
		Ok(element)
	}

	pub fn decode_nullable_element(
		&mut self,
		prototype: &dyn Element,
	) -> Result<Option<Box<dyn Element>>> {
		if self.decode_presence_flag()? {
			self.decode_element(prototype).map(Some)
		} else {
			Ok(None)
		}
	}

	/// Decodes a statically known element type.
	pub fn decode_typed<T: Element + Default>(&mut self) -> Result<T> {
		let mut element = T::default();
		element.decode(self)?;
		Ok(element)
	}

	pub fn decode_nullable_typed<T: Element + Default>(&mut self) -> Result<Option<T>> {
		if self.decode_presence_flag()? {
			self.decode_typed().map(Some)
		} else {
			Ok(None)
		}
	}

	/// Reads a short form, materialises it through the factory registry and
	/// decodes into it. Short form 0 yields a
	/// [`HeterogeneousList`](crate::element::HeterogeneousList).
	pub fn decode_abstract_element(&mut self) -> Result<Box<dyn Element>> {
		let short_form = self.decode_short_form()?;
		let mut element = self.element_factories().create_element(short_form)?;
		element.decode(self)?;
		Ok(element)
	}

	pub fn decode_nullable_abstract_element(&mut self) -> Result<Option<Box<dyn Element>>> {
		if self.decode_presence_flag()? {
			self.decode_abstract_element().map(Some)
		} else {
			Ok(None)
		}
	}

	/// Reads a kind tag and dispatches to the matching primitive decode.
	pub fn decode_attribute(&mut self) -> Result<Attribute> {
		let kind = self.decode_attribute_tag()?;
		Attribute::decode_value(kind, self)
	}

	pub fn decode_nullable_attribute(&mut self) -> Result<Option<Attribute>> {
		if self.decode_presence_flag()? {
			self.decode_attribute().map(Some)
		} else {
			Ok(None)
		}
	}

	/// Reads a list size and returns a sub-decoder over its items.
	pub fn create_list_decoder(&mut self) -> Result<ListDecoder<'_>> {
		let len = self.decode_list_size()?;
		Ok(ListDecoder::new(self, len))
	}

	/// Decodes nullable items of a type known from context: no per-item
	/// short form is read. Items of short form 0 are heterogeneous lists.
	pub fn decode_homogeneous_list(
		&mut self,
		item_short_form: ShortForm,
	) -> Result<Vec<Option<Box<dyn Element>>>> {
		let prototype = self.element_factories().create_element(item_short_form)?;
		let mut list = self.create_list_decoder()?;
		let mut items = Vec::with_capacity(list.size().min(1024));
		while list.has_next() {
			let item = list.item(|dec| {
				if !dec.decode_presence_flag()? {
					return Ok(None);
				}
				let mut element = prototype.create_element();
				element.decode(dec)?;
				Ok(Some(element))
			})?;
			items.push(item);
		}
		list.close()?;
		Ok(items)
	}

	/// Decodes nullable items that each carry their own short form.
	pub fn decode_heterogeneous_list(&mut self) -> Result<Vec<Option<Box<dyn Element>>>> {
		let mut list = self.create_list_decoder()?;
		let mut items = Vec::with_capacity(list.size().min(1024));
		while list.has_next() {
			items.push(list.item(|dec| dec.decode_nullable_abstract_element())?);
		}
		list.close()?;
		Ok(items)
	}
}

#[cfg(test)]
mod tests;
