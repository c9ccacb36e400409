//! Error model.
//!
//! [`MalError`] is the local failure type of every operation in this crate and
//! its dependents. Only [`InteractionError`] is meant to cross the wire: a
//! layer servicing an inbound message translates local failures with
//! [`MalError::to_interaction_error`] before replying.

use std::fmt;
use std::num::NonZeroU32;

use crate::attribute::Attribute;
use crate::codec::{Decoder, Encoder};
use crate::element::Element;

/// Result alias used throughout the MAL crates.
pub type Result<T, E = MalError> = std::result::Result<T, E>;

/// Local failure kinds. None of these are serialized as-is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MalError {
	/// Invalid or missing call argument; a wiring bug in the caller.
	#[error("invalid argument: {0}")]
	Argument(String),
	/// Inconsistent re-registration of an area, error number or factory.
	#[error("registration conflict: {0}")]
	RegistrationConflict(String),
	/// A lookup that had to succeed did not.
	#[error("not found: {0}")]
	NotFound(String),
	/// Malformed, truncated or otherwise undecodable data.
	#[error("encoding failure: {0}")]
	Encoding(String),
	/// Application-level error destined for a remote peer.
	#[error(transparent)]
	Interaction(#[from] InteractionError),
}

impl MalError {
	pub fn argument(msg: impl Into<String>) -> Self {
		Self::Argument(msg.into())
	}

	pub fn conflict(msg: impl Into<String>) -> Self {
		Self::RegistrationConflict(msg.into())
	}

	pub fn not_found(msg: impl Into<String>) -> Self {
		Self::NotFound(msg.into())
	}

	pub fn encoding(msg: impl Into<String>) -> Self {
		Self::Encoding(msg.into())
	}

	/// Translates a local failure into the standard error reported to a peer.
	///
	/// The local message travels as a `String` attribute in the extra
	/// information so the peer sees the same diagnostic.
	pub fn to_interaction_error(&self) -> InteractionError {
		let number = match self {
			Self::Interaction(err) => return err.clone(),
			Self::Encoding(_) => standard::BAD_ENCODING,
			Self::NotFound(_) => standard::UNKNOWN,
			Self::Argument(_) | Self::RegistrationConflict(_) => standard::INTERNAL,
		};
		InteractionError::new(StandardError::with_extra(
			number,
			Attribute::String(self.to_string()),
		))
	}
}

/// Non-zero MAL error number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorNumber(NonZeroU32);

impl ErrorNumber {
	/// Validates a raw error number. Zero is a contract violation.
	pub fn new(number: u32) -> Result<Self> {
		NonZeroU32::new(number)
			.map(Self)
			.ok_or_else(|| MalError::argument("error number must be non-zero"))
	}

	pub const fn from_nonzero(number: NonZeroU32) -> Self {
		Self(number)
	}

	const fn constant(number: u32) -> Self {
		match NonZeroU32::new(number) {
			Some(n) => Self(n),
			None => panic!("error number must be non-zero"),
		}
	}

	#[inline]
	pub const fn get(self) -> u32 {
		self.0.get()
	}
}

impl fmt::Debug for ErrorNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ErrorNumber({})", self.0)
	}
}

impl fmt::Display for ErrorNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl TryFrom<u32> for ErrorNumber {
	type Error = MalError;

	fn try_from(number: u32) -> Result<Self> {
		Self::new(number)
	}
}

/// Error number plus opaque extra information.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardError {
	number: ErrorNumber,
	extra_information: Option<Box<dyn Element>>,
}

impl StandardError {
	/// Builds an error from a raw number, rejecting zero.
	pub fn new(number: u32, extra_information: Option<Box<dyn Element>>) -> Result<Self> {
		Ok(Self {
			number: ErrorNumber::new(number)?,
			extra_information,
		})
	}

	pub fn from_number(number: ErrorNumber) -> Self {
		Self {
			number,
			extra_information: None,
		}
	}

	pub fn with_extra(number: ErrorNumber, extra: impl Element) -> Self {
		Self {
			number,
			extra_information: Some(Box::new(extra)),
		}
	}

	pub fn number(&self) -> ErrorNumber {
		self.number
	}

	pub fn extra_information(&self) -> Option<&dyn Element> {
		self.extra_information.as_deref()
	}

	/// Writes the error as an `UInteger` number followed by the nullable,
	/// abstractly typed extra information.
	pub fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		encoder.encode_uinteger(self.number.get())?;
		encoder.encode_nullable_abstract_element(self.extra_information.as_deref())
	}

	pub fn decode(decoder: &mut dyn Decoder) -> Result<Self> {
		let raw = decoder.decode_uinteger()?;
		let number = ErrorNumber::new(raw)
			.map_err(|_| MalError::encoding("standard error with number 0"))?;
		let extra_information = decoder.decode_nullable_abstract_element()?;
		Ok(Self {
			number,
			extra_information,
		})
	}
}

impl fmt::Display for StandardError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "standard error {}", self.number)?;
		if let Some(name) = standard::name_of(self.number) {
			write!(f, " ({name})")?;
		}
		match &self.extra_information {
			Some(extra) => write!(f, ": {extra:?}"),
			None => Ok(()),
		}
	}
}

/// Application or protocol error meant to be transmitted to a remote peer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("interaction error: {error}")]
pub struct InteractionError {
	error: StandardError,
}

impl InteractionError {
	pub fn new(error: StandardError) -> Self {
		Self { error }
	}

	pub fn standard_error(&self) -> &StandardError {
		&self.error
	}

	pub fn number(&self) -> ErrorNumber {
		self.error.number()
	}

	pub fn into_standard_error(self) -> StandardError {
		self.error
	}
}

impl From<StandardError> for InteractionError {
	fn from(error: StandardError) -> Self {
		Self::new(error)
	}
}

/// The MAL standard error catalogue.
pub mod standard {
	use super::ErrorNumber;

	macro_rules! catalogue {
		($($(#[$meta:meta])* $name:ident = $number:literal;)*) => {
			$(
				$(#[$meta])*
				pub const $name: ErrorNumber = ErrorNumber::constant($number);
			)*

			/// Every standard error with its registered name.
			pub const CATALOGUE: &[(ErrorNumber, &str)] = &[$(($name, stringify!($name))),*];
		};
	}

	catalogue! {
		/// Confirmed communication error.
		DELIVERY_FAILED = 65536;
		/// Unconfirmed communication error.
		DELIVERY_TIMEDOUT = 65537;
		/// Message queued somewhere awaiting contact.
		DELIVERY_DELAYED = 65538;
		/// Destination cannot be contacted.
		DESTINATION_UNKNOWN = 65539;
		/// Destination middleware reports destination application does not exist.
		DESTINATION_TRANSIENT = 65540;
		/// Destination lost halfway through conversation.
		DESTINATION_LOST = 65541;
		/// Failed to authenticate the message.
		AUTHENTICATION_FAIL = 65542;
		/// Failed to authorise the message.
		AUTHORISATION_FAIL = 65543;
		/// Failed to encrypt or decrypt the message.
		ENCRYPTION_FAIL = 65544;
		/// Destination does not support the service area.
		UNSUPPORTED_AREA = 65545;
		/// Destination does not support the operation.
		UNSUPPORTED_OPERATION = 65546;
		/// Destination does not support the area version.
		UNSUPPORTED_VERSION = 65547;
		/// Destination was unable to decode the message.
		BAD_ENCODING = 65548;
		/// Unknown internal error.
		INTERNAL = 65549;
		/// Operation specific.
		UNKNOWN = 65550;
		/// Stage received out of sequence for the interaction.
		INCORRECT_STATE = 65551;
		/// Maximum number of subscriptions or providers reached.
		TOO_MANY = 65552;
		/// The component is being shut down.
		SHUTDOWN = 65553;
	}

	/// Name of a standard error number, if it is one.
	pub fn name_of(number: ErrorNumber) -> Option<&'static str> {
		CATALOGUE
			.iter()
			.find(|(n, _)| *n == number)
			.map(|(_, name)| *name)
	}
}
