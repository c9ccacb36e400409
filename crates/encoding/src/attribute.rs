//! Attribute kinds and their value types.
//!
//! Attributes are the primitive values of the MAL area. Each kind has a fixed
//! type number that doubles as the one-byte tag written before a loosely typed
//! [`Attribute`] value.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::codec::{Decoder, Encoder};
use crate::element::Element;
use crate::error::Result;
use crate::short_form::ShortForm;
use crate::structures::{MAL_AREA_NUMBER, MAL_AREA_VERSION};

/// Attribute kind; the discriminant is the MAL type number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AttributeKind {
	Blob = 1,
	Boolean = 2,
	Duration = 3,
	Float = 4,
	Double = 5,
	Identifier = 6,
	Octet = 7,
	UOctet = 8,
	Short = 9,
	UShort = 10,
	Integer = 11,
	UInteger = 12,
	Long = 13,
	ULong = 14,
	String = 15,
	Time = 16,
	FineTime = 17,
	Uri = 18,
	ObjectRef = 19,
}

impl AttributeKind {
	/// All kinds in tag order.
	pub const ALL: [AttributeKind; 19] = [
		Self::Blob,
		Self::Boolean,
		Self::Duration,
		Self::Float,
		Self::Double,
		Self::Identifier,
		Self::Octet,
		Self::UOctet,
		Self::Short,
		Self::UShort,
		Self::Integer,
		Self::UInteger,
		Self::Long,
		Self::ULong,
		Self::String,
		Self::Time,
		Self::FineTime,
		Self::Uri,
		Self::ObjectRef,
	];

	#[inline]
	pub const fn tag(self) -> u8 {
		self as u8
	}

	pub const fn from_tag(tag: u8) -> Option<Self> {
		if tag == 0 || tag as usize > Self::ALL.len() {
			return None;
		}
		Some(Self::ALL[tag as usize - 1])
	}

	#[inline]
	pub const fn short_form(self) -> ShortForm {
		ShortForm::constant(MAL_AREA_NUMBER, 0, MAL_AREA_VERSION, self as i32)
	}

	pub fn from_short_form(sf: ShortForm) -> Option<Self> {
		if sf.area() != MAL_AREA_NUMBER || sf.service() != 0 || sf.version() != MAL_AREA_VERSION {
			return None;
		}
		u8::try_from(sf.type_number()).ok().and_then(Self::from_tag)
	}

	pub const fn name(self) -> &'static str {
		match self {
			Self::Blob => "Blob",
			Self::Boolean => "Boolean",
			Self::Duration => "Duration",
			Self::Float => "Float",
			Self::Double => "Double",
			Self::Identifier => "Identifier",
			Self::Octet => "Octet",
			Self::UOctet => "UOctet",
			Self::Short => "Short",
			Self::UShort => "UShort",
			Self::Integer => "Integer",
			Self::UInteger => "UInteger",
			Self::Long => "Long",
			Self::ULong => "ULong",
			Self::String => "String",
			Self::Time => "Time",
			Self::FineTime => "FineTime",
			Self::Uri => "URI",
			Self::ObjectRef => "ObjectRef",
		}
	}
}

impl fmt::Display for AttributeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Opaque byte blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl Blob {
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl From<Vec<u8>> for Blob {
	fn from(bytes: Vec<u8>) -> Self {
		Self(bytes)
	}
}

impl From<&[u8]> for Blob {
	fn from(bytes: &[u8]) -> Self {
		Self(bytes.to_vec())
	}
}

/// Relative time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Duration(pub f64);

impl Duration {
	pub fn as_secs_f64(self) -> f64 {
		self.0
	}
}

impl From<std::time::Duration> for Duration {
	fn from(d: std::time::Duration) -> Self {
		Self(d.as_secs_f64())
	}
}

/// Coarse absolute time: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Time(pub u64);

impl Time {
	pub fn now() -> Self {
		Self::from(SystemTime::now())
	}

	pub fn as_millis(self) -> u64 {
		self.0
	}
}

impl From<SystemTime> for Time {
	fn from(t: SystemTime) -> Self {
		let since = t.duration_since(UNIX_EPOCH).unwrap_or_default();
		Self(u64::try_from(since.as_millis()).unwrap_or(u64::MAX))
	}
}

/// Fine absolute time: nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FineTime(pub u64);

impl FineTime {
	pub fn now() -> Self {
		Self::from(SystemTime::now())
	}

	pub fn as_nanos(self) -> u64 {
		self.0
	}
}

impl From<SystemTime> for FineTime {
	fn from(t: SystemTime) -> Self {
		let since = t.duration_since(UNIX_EPOCH).unwrap_or_default();
		Self(u64::try_from(since.as_nanos()).unwrap_or(u64::MAX))
	}
}

macro_rules! string_attribute {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(pub String);

		impl $name {
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl From<&str> for $name {
			fn from(s: &str) -> Self {
				Self(s.to_owned())
			}
		}

		impl From<String> for $name {
			fn from(s: String) -> Self {
				Self(s)
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}
	};
}

string_attribute!(
	/// Short name used as a key, e.g. a domain segment or subscription id.
	Identifier
);
string_attribute!(
	/// Uniform resource identifier of a provider, consumer or broker.
	Uri
);

/// Typed reference to a versioned object held by some provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
	pub domain: Vec<Identifier>,
	/// Short form of the referenced object's type.
	pub type_short_form: ShortForm,
	pub key: Identifier,
	pub version: u32,
}

impl Default for ObjectRef {
	fn default() -> Self {
		Self {
			domain: Vec::new(),
			type_short_form: ShortForm::HETEROGENEOUS_LIST,
			key: Identifier::default(),
			version: 0,
		}
	}
}

/// Tagged union over every attribute kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
	Blob(Blob),
	Boolean(bool),
	Duration(Duration),
	Float(f32),
	Double(f64),
	Identifier(Identifier),
	Octet(i8),
	UOctet(u8),
	Short(i16),
	UShort(u16),
	Integer(i32),
	UInteger(u32),
	Long(i64),
	ULong(u64),
	String(String),
	Time(Time),
	FineTime(FineTime),
	Uri(Uri),
	ObjectRef(ObjectRef),
}

impl Attribute {
	pub fn kind(&self) -> AttributeKind {
		match self {
			Self::Blob(_) => AttributeKind::Blob,
			Self::Boolean(_) => AttributeKind::Boolean,
			Self::Duration(_) => AttributeKind::Duration,
			Self::Float(_) => AttributeKind::Float,
			Self::Double(_) => AttributeKind::Double,
			Self::Identifier(_) => AttributeKind::Identifier,
			Self::Octet(_) => AttributeKind::Octet,
			Self::UOctet(_) => AttributeKind::UOctet,
			Self::Short(_) => AttributeKind::Short,
			Self::UShort(_) => AttributeKind::UShort,
			Self::Integer(_) => AttributeKind::Integer,
			Self::UInteger(_) => AttributeKind::UInteger,
			Self::Long(_) => AttributeKind::Long,
			Self::ULong(_) => AttributeKind::ULong,
			Self::String(_) => AttributeKind::String,
			Self::Time(_) => AttributeKind::Time,
			Self::FineTime(_) => AttributeKind::FineTime,
			Self::Uri(_) => AttributeKind::Uri,
			Self::ObjectRef(_) => AttributeKind::ObjectRef,
		}
	}

	/// Empty (zero) value of a kind, the instance a factory hands to a decoder.
	pub fn empty(kind: AttributeKind) -> Self {
		match kind {
			AttributeKind::Blob => Self::Blob(Blob::default()),
			AttributeKind::Boolean => Self::Boolean(false),
			AttributeKind::Duration => Self::Duration(Duration::default()),
			AttributeKind::Float => Self::Float(0.0),
			AttributeKind::Double => Self::Double(0.0),
			AttributeKind::Identifier => Self::Identifier(Identifier::default()),
			AttributeKind::Octet => Self::Octet(0),
			AttributeKind::UOctet => Self::UOctet(0),
			AttributeKind::Short => Self::Short(0),
			AttributeKind::UShort => Self::UShort(0),
			AttributeKind::Integer => Self::Integer(0),
			AttributeKind::UInteger => Self::UInteger(0),
			AttributeKind::Long => Self::Long(0),
			AttributeKind::ULong => Self::ULong(0),
			AttributeKind::String => Self::String(String::new()),
			AttributeKind::Time => Self::Time(Time::default()),
			AttributeKind::FineTime => Self::FineTime(FineTime::default()),
			AttributeKind::Uri => Self::Uri(Uri::default()),
			AttributeKind::ObjectRef => Self::ObjectRef(ObjectRef::default()),
		}
	}

	/// Writes the value only, without a kind tag.
	pub fn encode_value(&self, encoder: &mut dyn Encoder) -> Result<()> {
		match self {
			Self::Blob(v) => encoder.encode_blob(v),
			Self::Boolean(v) => encoder.encode_boolean(*v),
			Self::Duration(v) => encoder.encode_duration(*v),
			Self::Float(v) => encoder.encode_float(*v),
			Self::Double(v) => encoder.encode_double(*v),
			Self::Identifier(v) => encoder.encode_identifier(v),
			Self::Octet(v) => encoder.encode_octet(*v),
			Self::UOctet(v) => encoder.encode_uoctet(*v),
			Self::Short(v) => encoder.encode_short(*v),
			Self::UShort(v) => encoder.encode_ushort(*v),
			Self::Integer(v) => encoder.encode_integer(*v),
			Self::UInteger(v) => encoder.encode_uinteger(*v),
			Self::Long(v) => encoder.encode_long(*v),
			Self::ULong(v) => encoder.encode_ulong(*v),
			Self::String(v) => encoder.encode_string(v),
			Self::Time(v) => encoder.encode_time(*v),
			Self::FineTime(v) => encoder.encode_fine_time(*v),
			Self::Uri(v) => encoder.encode_uri(v),
			Self::ObjectRef(v) => encoder.encode_object_ref(v),
		}
	}

	/// Reads a value of a known kind, without a kind tag.
	pub fn decode_value(kind: AttributeKind, decoder: &mut dyn Decoder) -> Result<Self> {
		Ok(match kind {
			AttributeKind::Blob => Self::Blob(decoder.decode_blob()?),
			AttributeKind::Boolean => Self::Boolean(decoder.decode_boolean()?),
			AttributeKind::Duration => Self::Duration(decoder.decode_duration()?),
			AttributeKind::Float => Self::Float(decoder.decode_float()?),
			AttributeKind::Double => Self::Double(decoder.decode_double()?),
			AttributeKind::Identifier => Self::Identifier(decoder.decode_identifier()?),
			AttributeKind::Octet => Self::Octet(decoder.decode_octet()?),
			AttributeKind::UOctet => Self::UOctet(decoder.decode_uoctet()?),
			AttributeKind::Short => Self::Short(decoder.decode_short()?),
			AttributeKind::UShort => Self::UShort(decoder.decode_ushort()?),
			AttributeKind::Integer => Self::Integer(decoder.decode_integer()?),
			AttributeKind::UInteger => Self::UInteger(decoder.decode_uinteger()?),
			AttributeKind::Long => Self::Long(decoder.decode_long()?),
			AttributeKind::ULong => Self::ULong(decoder.decode_ulong()?),
			AttributeKind::String => Self::String(decoder.decode_string()?),
			AttributeKind::Time => Self::Time(decoder.decode_time()?),
			AttributeKind::FineTime => Self::FineTime(decoder.decode_fine_time()?),
			AttributeKind::Uri => Self::Uri(decoder.decode_uri()?),
			AttributeKind::ObjectRef => Self::ObjectRef(decoder.decode_object_ref()?),
		})
	}
}

impl Element for Attribute {
	fn short_form(&self) -> ShortForm {
		self.kind().short_form()
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		self.encode_value(encoder)
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		*self = Self::decode_value(self.kind(), decoder)?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::empty(self.kind()))
	}
}

macro_rules! attribute_from {
	($($variant:ident($ty:ty)),* $(,)?) => {
		$(
			impl From<$ty> for Attribute {
				fn from(v: $ty) -> Self {
					Self::$variant(v.into())
				}
			}
		)*
	};
}

attribute_from!(
	Blob(Blob),
	Boolean(bool),
	Duration(Duration),
	Float(f32),
	Double(f64),
	Identifier(Identifier),
	Octet(i8),
	UOctet(u8),
	Short(i16),
	UShort(u16),
	Integer(i32),
	UInteger(u32),
	Long(i64),
	ULong(u64),
	String(String),
	String(&str),
	Time(Time),
	FineTime(FineTime),
	Uri(Uri),
	ObjectRef(ObjectRef),
);
