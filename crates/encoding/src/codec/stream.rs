//! Reference token-stream codec.
//!
//! [`TokenEncoder`] records one [`Token`] per logical value and
//! [`TokenDecoder`] replays them, checking that every read asks for the kind
//! of value that was written. No byte layout is involved; real wire formats
//! implement the same traits over their own representation.

use std::sync::Arc;

use tracing::trace;

use super::{Decoder, Encoder};
use crate::attribute::{Blob, Duration, FineTime, Identifier, Time, Uri};
use crate::config::CodecLimits;
use crate::error::{MalError, Result};
use crate::factory::ElementFactoryRegistry;

/// One logical value of an encoded stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	Presence(bool),
	Boolean(bool),
	Float(f32),
	Double(f64),
	Octet(i8),
	UOctet(u8),
	Short(i16),
	UShort(u16),
	Integer(i32),
	UInteger(u32),
	Long(i64),
	ULong(u64),
	String(String),
	Blob(Vec<u8>),
	Duration(f64),
	Time(u64),
	FineTime(u64),
	Identifier(String),
	Uri(String),
	ListSize(u32),
	ListEnd,
}

impl Token {
	fn name(&self) -> &'static str {
		match self {
			Self::Presence(_) => "presence flag",
			Self::Boolean(_) => "Boolean",
			Self::Float(_) => "Float",
			Self::Double(_) => "Double",
			Self::Octet(_) => "Octet",
			Self::UOctet(_) => "UOctet",
			Self::Short(_) => "Short",
			Self::UShort(_) => "UShort",
			Self::Integer(_) => "Integer",
			Self::UInteger(_) => "UInteger",
			Self::Long(_) => "Long",
			Self::ULong(_) => "ULong",
			Self::String(_) => "String",
			Self::Blob(_) => "Blob",
			Self::Duration(_) => "Duration",
			Self::Time(_) => "Time",
			Self::FineTime(_) => "FineTime",
			Self::Identifier(_) => "Identifier",
			Self::Uri(_) => "URI",
			Self::ListSize(_) => "list size",
			Self::ListEnd => "list end",
		}
	}
}

/// Records values as tokens.
#[derive(Debug, Default)]
pub struct TokenEncoder {
	tokens: Vec<Token>,
}

impl TokenEncoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	pub fn into_tokens(self) -> Vec<Token> {
		self.tokens
	}

	fn push(&mut self, token: Token) -> Result<()> {
		self.tokens.push(token);
		Ok(())
	}
}

impl Encoder for TokenEncoder {
	fn encode_presence_flag(&mut self, present: bool) -> Result<()> {
		self.push(Token::Presence(present))
	}

	fn encode_boolean(&mut self, value: bool) -> Result<()> {
		self.push(Token::Boolean(value))
	}

	fn encode_float(&mut self, value: f32) -> Result<()> {
		self.push(Token::Float(value))
	}

	fn encode_double(&mut self, value: f64) -> Result<()> {
		self.push(Token::Double(value))
	}

	fn encode_octet(&mut self, value: i8) -> Result<()> {
		self.push(Token::Octet(value))
	}

	fn encode_uoctet(&mut self, value: u8) -> Result<()> {
		self.push(Token::UOctet(value))
	}

	fn encode_short(&mut self, value: i16) -> Result<()> {
		self.push(Token::Short(value))
	}

	fn encode_ushort(&mut self, value: u16) -> Result<()> {
		self.push(Token::UShort(value))
	}

	fn encode_integer(&mut self, value: i32) -> Result<()> {
		self.push(Token::Integer(value))
	}

	fn encode_uinteger(&mut self, value: u32) -> Result<()> {
		self.push(Token::UInteger(value))
	}

	fn encode_long(&mut self, value: i64) -> Result<()> {
		self.push(Token::Long(value))
	}

	fn encode_ulong(&mut self, value: u64) -> Result<()> {
		self.push(Token::ULong(value))
	}

	fn encode_string(&mut self, value: &str) -> Result<()> {
		self.push(Token::String(value.to_owned()))
	}

	fn encode_blob(&mut self, value: &Blob) -> Result<()> {
		self.push(Token::Blob(value.0.clone()))
	}

	fn encode_duration(&mut self, value: Duration) -> Result<()> {
		self.push(Token::Duration(value.0))
	}

	fn encode_time(&mut self, value: Time) -> Result<()> {
		self.push(Token::Time(value.0))
	}

	fn encode_fine_time(&mut self, value: FineTime) -> Result<()> {
		self.push(Token::FineTime(value.0))
	}

	fn encode_identifier(&mut self, value: &Identifier) -> Result<()> {
		self.push(Token::Identifier(value.0.clone()))
	}

	fn encode_uri(&mut self, value: &Uri) -> Result<()> {
		self.push(Token::Uri(value.0.clone()))
	}

	fn encode_list_size(&mut self, len: usize) -> Result<()> {
		let len = u32::try_from(len)
			.map_err(|_| MalError::argument(format!("list of {len} items exceeds u32")))?;
		self.push(Token::ListSize(len))
	}

	fn encode_list_end(&mut self) -> Result<()> {
		self.push(Token::ListEnd)
	}
}

/// Replays a token stream, materialising abstract elements through a shared
/// factory registry.
pub struct TokenDecoder {
	tokens: Vec<Token>,
	position: usize,
	factories: Arc<ElementFactoryRegistry>,
	limits: CodecLimits,
}

macro_rules! expect_token {
	($self:ident, $variant:ident) => {
		match $self.next_token()? {
			Token::$variant(v) => Ok(v),
			other => Err($self.mismatch(stringify!($variant), &other)),
		}
	};
}

impl TokenDecoder {
	pub fn new(tokens: Vec<Token>, factories: Arc<ElementFactoryRegistry>) -> Self {
		Self::with_limits(tokens, factories, CodecLimits::default())
	}

	pub fn with_limits(
		tokens: Vec<Token>,
		factories: Arc<ElementFactoryRegistry>,
		limits: CodecLimits,
	) -> Self {
		Self {
			tokens,
			position: 0,
			factories,
			limits,
		}
	}

	/// True once every token has been consumed.
	pub fn is_exhausted(&self) -> bool {
		self.position >= self.tokens.len()
	}

	pub fn remaining(&self) -> usize {
		self.tokens.len().saturating_sub(self.position)
	}

	fn next_token(&mut self) -> Result<Token> {
		let token = self.tokens.get(self.position).cloned().ok_or_else(|| {
			MalError::encoding(format!("unexpected end of stream at token {}", self.position))
		})?;
		self.position += 1;
		Ok(token)
	}

	fn mismatch(&self, expected: &str, found: &Token) -> MalError {
		MalError::encoding(format!(
			"expected {expected} at token {}, found {}",
			self.position - 1,
			found.name()
		))
	}

	fn check_len(&self, what: &str, len: usize, max: usize) -> Result<()> {
		if len > max {
			trace!(what, len, max, "codec limit exceeded");
			return Err(MalError::encoding(format!(
				"{what} of {len} exceeds configured limit {max}"
			)));
		}
		Ok(())
	}
}

impl Decoder for TokenDecoder {
	fn element_factories(&self) -> &ElementFactoryRegistry {
		&self.factories
	}

	fn decode_presence_flag(&mut self) -> Result<bool> {
		expect_token!(self, Presence)
	}

	fn decode_boolean(&mut self) -> Result<bool> {
		expect_token!(self, Boolean)
	}

	fn decode_float(&mut self) -> Result<f32> {
		expect_token!(self, Float)
	}

	fn decode_double(&mut self) -> Result<f64> {
		expect_token!(self, Double)
	}

	fn decode_octet(&mut self) -> Result<i8> {
		expect_token!(self, Octet)
	}

	fn decode_uoctet(&mut self) -> Result<u8> {
		expect_token!(self, UOctet)
	}

	fn decode_short(&mut self) -> Result<i16> {
		expect_token!(self, Short)
	}

	fn decode_ushort(&mut self) -> Result<u16> {
		expect_token!(self, UShort)
	}

	fn decode_integer(&mut self) -> Result<i32> {
		expect_token!(self, Integer)
	}

	fn decode_uinteger(&mut self) -> Result<u32> {
		expect_token!(self, UInteger)
	}

	fn decode_long(&mut self) -> Result<i64> {
		expect_token!(self, Long)
	}

	fn decode_ulong(&mut self) -> Result<u64> {
		expect_token!(self, ULong)
	}

	fn decode_string(&mut self) -> Result<String> {
		let value = expect_token!(self, String)?;
		self.check_len("string", value.len(), self.limits.max_string_len)?;
		Ok(value)
	}

	fn decode_blob(&mut self) -> Result<Blob> {
		let value = expect_token!(self, Blob)?;
		self.check_len("blob", value.len(), self.limits.max_blob_len)?;
		Ok(Blob(value))
	}

	fn decode_duration(&mut self) -> Result<Duration> {
		expect_token!(self, Duration).map(Duration)
	}

	fn decode_time(&mut self) -> Result<Time> {
		expect_token!(self, Time).map(Time)
	}

	fn decode_fine_time(&mut self) -> Result<FineTime> {
		expect_token!(self, FineTime).map(FineTime)
	}

	fn decode_identifier(&mut self) -> Result<Identifier> {
		let value = expect_token!(self, Identifier)?;
		self.check_len("identifier", value.len(), self.limits.max_string_len)?;
		Ok(Identifier(value))
	}

	fn decode_uri(&mut self) -> Result<Uri> {
		let value = expect_token!(self, Uri)?;
		self.check_len("URI", value.len(), self.limits.max_string_len)?;
		Ok(Uri(value))
	}

	fn decode_list_size(&mut self) -> Result<usize> {
		let len = expect_token!(self, ListSize)? as usize;
		self.check_len("list", len, self.limits.max_list_len)?;
		Ok(len)
	}

	fn decode_list_end(&mut self) -> Result<()> {
		match self.next_token()? {
			Token::ListEnd => Ok(()),
			other => Err(self.mismatch("ListEnd", &other)),
		}
	}
}
