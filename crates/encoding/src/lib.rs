//! Typed encoding core of the Message Abstraction Layer.
//!
//! Every message type carries a [`ShortForm`], a packed numeric identity that
//! survives the trip across the wire. Decoders turn a short form back into a
//! concrete [`Element`] through the [`ElementFactoryRegistry`], and concrete
//! wire formats plug in by implementing [`Encoder`] and [`Decoder`].

/// Attribute kinds and their value types.
pub mod attribute;
/// Encoder/decoder contract, list sub-codecs and the token-stream codec.
pub mod codec;
/// TOML configuration.
pub mod config;
/// The element trait and generic lists.
pub mod element;
/// Local errors, standard errors and the standard error catalogue.
pub mod error;
/// Short form to factory registry.
pub mod factory;
/// Packed type identity.
pub mod short_form;
/// MAL area structures and constants.
pub mod structures;

pub use attribute::{
	Attribute, AttributeKind, Blob, Duration, FineTime, Identifier, ObjectRef, Time, Uri,
};
pub use codec::{Decoder, Encoder, ListDecoder, ListEncoder};
pub use config::{CodecLimits, ConfigError, MalConfig, RegistryConfig};
pub use element::{Element, ElementList, HeterogeneousList};
pub use error::{ErrorNumber, InteractionError, MalError, Result, StandardError};
pub use factory::{DuplicatePolicy, ElementDescriptor, ElementFactory, ElementFactoryRegistry};
pub use short_form::ShortForm;
