//! Packed numeric type identity.
//!
//! A [`ShortForm`] is the wire-stable identifier of every element type. Its
//! bit layout is part of the interoperability contract between independently
//! built peers and must never change:
//!
//! ```text
//!  63          48 47          32 31      24 23                     0
//! +--------------+--------------+----------+------------------------+
//! | area (u16)   | service (u16)| version  | type number (i24, 2's) |
//! +--------------+--------------+----------+------------------------+
//! ```
//!
//! The list form of an element type negates its 24-bit type number and keeps
//! every other bit, so the two forms convert without a registry lookup. The
//! raw value `0` is reserved for heterogeneous lists whose items carry their
//! own short form.

use std::fmt;

use crate::error::{MalError, Result};

const TYPE_BITS: u32 = 24;
const TYPE_MASK: i64 = (1 << TYPE_BITS) - 1;
const VERSION_SHIFT: u32 = 24;
const SERVICE_SHIFT: u32 = 32;
const AREA_SHIFT: u32 = 48;

/// Smallest representable type number.
pub const MIN_TYPE_NUMBER: i32 = -(1 << (TYPE_BITS - 1));
/// Largest representable type number.
pub const MAX_TYPE_NUMBER: i32 = (1 << (TYPE_BITS - 1)) - 1;

/// Packed (area, service, version, type number) identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortForm(i64);

impl ShortForm {
	/// Reserved identifier of a list whose items are individually tagged.
	pub const HETEROGENEOUS_LIST: ShortForm = ShortForm(0);

	/// Packs the components, rejecting out-of-range type numbers and the
	/// reserved all-zero identifier.
	pub fn new(area: u16, service: u16, version: u8, type_number: i32) -> Result<Self> {
		if !(MIN_TYPE_NUMBER..=MAX_TYPE_NUMBER).contains(&type_number) {
			return Err(MalError::argument(format!(
				"type number {type_number} outside {MIN_TYPE_NUMBER}..={MAX_TYPE_NUMBER}"
			)));
		}
		let packed = Self::pack(area, service, version, type_number);
		if packed == Self::HETEROGENEOUS_LIST {
			return Err(MalError::argument(
				"short form 0 is reserved for heterogeneous lists",
			));
		}
		Ok(packed)
	}

	/// Compile-time constructor for well-known identifiers.
	///
	/// # Panics
	///
	/// Panics (at compile time when used in a `const`) on an out-of-range or
	/// zero type number.
	pub const fn constant(area: u16, service: u16, version: u8, type_number: i32) -> Self {
		assert!(type_number >= MIN_TYPE_NUMBER && type_number <= MAX_TYPE_NUMBER);
		assert!(type_number != 0);
		Self::pack(area, service, version, type_number)
	}

	const fn pack(area: u16, service: u16, version: u8, type_number: i32) -> Self {
		Self(
			((area as i64) << AREA_SHIFT)
				| ((service as i64) << SERVICE_SHIFT)
				| ((version as i64) << VERSION_SHIFT)
				| (type_number as i64 & TYPE_MASK),
		)
	}

	/// Wraps a raw identifier read from the wire. Every 64-bit value decomposes.
	#[inline]
	pub const fn from_raw(raw: i64) -> Self {
		Self(raw)
	}

	/// Returns the packed value.
	#[inline]
	pub const fn raw(self) -> i64 {
		self.0
	}

	/// Area number.
	#[inline]
	pub const fn area(self) -> u16 {
		(self.0 >> AREA_SHIFT) as u16
	}

	/// Service number, zero for area-level types.
	#[inline]
	pub const fn service(self) -> u16 {
		(self.0 >> SERVICE_SHIFT) as u16
	}

	/// Area or service version.
	#[inline]
	pub const fn version(self) -> u8 {
		(self.0 >> VERSION_SHIFT) as u8
	}

	/// Signed type number, sign-extended from 24 bits.
	#[inline]
	pub const fn type_number(self) -> i32 {
		let field = (self.0 & TYPE_MASK) as i32;
		(field << (32 - TYPE_BITS)) >> (32 - TYPE_BITS)
	}

	/// Decomposes into `(area, service, version, type_number)`.
	pub const fn unpack(self) -> (u16, u16, u8, i32) {
		(self.area(), self.service(), self.version(), self.type_number())
	}

	#[inline]
	pub const fn is_heterogeneous_list(self) -> bool {
		self.0 == 0
	}

	/// True for list forms (negative type number).
	#[inline]
	pub const fn is_list(self) -> bool {
		self.type_number() < 0
	}

	/// List form of an element form. Idempotent on list forms.
	pub const fn to_list_form(self) -> Self {
		if self.type_number() < 0 {
			return self;
		}
		self.with_negated_type()
	}

	/// Element form of a list form. Idempotent on element forms.
	pub const fn to_element_form(self) -> Self {
		if self.type_number() >= 0 {
			return self;
		}
		self.with_negated_type()
	}

	const fn with_negated_type(self) -> Self {
		let negated = (-(self.type_number() as i64)) & TYPE_MASK;
		Self((self.0 & !TYPE_MASK) | negated)
	}
}

impl fmt::Debug for ShortForm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ShortForm({:#018x}; {self})", self.0)
	}
}

impl fmt::Display for ShortForm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_heterogeneous_list() {
			return f.write_str("heterogeneous-list");
		}
		write!(
			f,
			"area={} service={} version={} number={}",
			self.area(),
			self.service(),
			self.version(),
			self.type_number()
		)
	}
}

impl From<ShortForm> for i64 {
	fn from(sf: ShortForm) -> Self {
		sf.raw()
	}
}
