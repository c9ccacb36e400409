//! Streaming list sub-codecs.
//!
//! A list is announced by its size and then written or read item by item, so
//! neither side has to materialise the whole list up front. The sub-codecs
//! count items and refuse to write or read past the announced size.

use super::{Decoder, Encoder};
use crate::error::{MalError, Result};

/// Writes the items of a list whose size has already been announced.
pub struct ListEncoder<'a> {
	encoder: &'a mut dyn Encoder,
	declared: usize,
	written: usize,
}

impl<'a> ListEncoder<'a> {
	pub(super) fn new(encoder: &'a mut dyn Encoder, declared: usize) -> Self {
		Self {
			encoder,
			declared,
			written: 0,
		}
	}

	/// Announced number of items.
	pub fn len(&self) -> usize {
		self.declared
	}

	pub fn is_empty(&self) -> bool {
		self.declared == 0
	}

	/// Items still expected.
	pub fn remaining(&self) -> usize {
		self.declared - self.written
	}

	/// Writes one item through `write`.
	pub fn item<F>(&mut self, write: F) -> Result<()>
	where
		F: FnOnce(&mut dyn Encoder) -> Result<()>,
	{
		if self.written == self.declared {
			return Err(MalError::argument(format!(
				"list announced {} items, refusing to write more",
				self.declared
			)));
		}
		write(&mut *self.encoder)?;
		self.written += 1;
		Ok(())
	}

	/// Finishes the list. Fails if fewer items were written than announced.
	pub fn close(self) -> Result<()> {
		if self.written != self.declared {
			return Err(MalError::argument(format!(
				"list announced {} items but {} were written",
				self.declared, self.written
			)));
		}
		self.encoder.encode_list_end()
	}
}

/// Reads the items of a list whose size has already been read.
pub struct ListDecoder<'a> {
	decoder: &'a mut dyn Decoder,
	len: usize,
	read: usize,
}

impl<'a> ListDecoder<'a> {
	pub(super) fn new(decoder: &'a mut dyn Decoder, len: usize) -> Self {
		Self {
			decoder,
			len,
			read: 0,
		}
	}

	/// Size announced by the stream.
	pub fn size(&self) -> usize {
		self.len
	}

	pub fn has_next(&self) -> bool {
		self.read < self.len
	}

	/// Reads one item through `read`.
	pub fn item<T, F>(&mut self, read: F) -> Result<T>
	where
		F: FnOnce(&mut dyn Decoder) -> Result<T>,
	{
		if !self.has_next() {
			return Err(MalError::encoding(format!(
				"read past the end of a {}-item list",
				self.len
			)));
		}
		let value = read(&mut *self.decoder)?;
		self.read += 1;
		Ok(value)
	}

	/// Finishes the list. Unread items are a decode failure.
	pub fn close(self) -> Result<()> {
		if self.has_next() {
			return Err(MalError::encoding(format!(
				"{} of {} list items left unread",
				self.len - self.read,
				self.len
			)));
		}
		self.decoder.decode_list_end()
	}
}
