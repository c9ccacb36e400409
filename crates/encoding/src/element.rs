//! The [`Element`] trait and the two generic list elements.

use std::any::Any;
use std::fmt;

use crate::codec::{Decoder, Encoder};
use crate::error::Result;
use crate::short_form::ShortForm;

/// A protocol-defined, self-describing, (de)serializable data type.
///
/// Decoding is in place: a factory produces an empty instance and
/// [`Element::decode`] fills it, which is how abstractly typed fields are
/// materialised from a [`ShortForm`] read off the wire.
pub trait Element: ElementObject + Any + fmt::Debug + Send + Sync + 'static {
	/// Wire-stable type identifier of this instance.
	fn short_form(&self) -> ShortForm;

	/// Writes this element's fields in declaration order.
	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()>;

	/// Replaces this element's fields with values read from `decoder`.
	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()>;

	/// Fresh, empty instance of the same concrete type.
	fn create_element(&self) -> Box<dyn Element>;
}

/// Object-safe cloning and comparison, implemented for every
/// `Element + Clone + PartialEq`.
pub trait ElementObject {
	fn clone_element(&self) -> Box<dyn Element>;

	fn eq_element(&self, other: &dyn Element) -> bool;
}

impl<T> ElementObject for T
where
	T: Element + Clone + PartialEq,
{
	fn clone_element(&self) -> Box<dyn Element> {
		Box::new(self.clone())
	}

	fn eq_element(&self, other: &dyn Element) -> bool {
		other.downcast_ref::<T>().is_some_and(|other| other == self)
	}
}

impl dyn Element {
	pub fn is<T: Element>(&self) -> bool {
		(self as &dyn Any).is::<T>()
	}

	pub fn downcast_ref<T: Element>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}

	pub fn downcast_mut<T: Element>(&mut self) -> Option<&mut T> {
		(self as &mut dyn Any).downcast_mut::<T>()
	}
}

impl Clone for Box<dyn Element> {
	fn clone(&self) -> Self {
		self.clone_element()
	}
}

impl PartialEq for dyn Element {
	fn eq(&self, other: &Self) -> bool {
		self.eq_element(other)
	}
}

/// Homogeneous list of nullable items sharing one element short form.
///
/// The list's own short form is the list form of its item type, so a single
/// registered item type is enough to build and decode its list.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementList {
	item_short_form: ShortForm,
	items: Vec<Option<Box<dyn Element>>>,
}

impl ElementList {
	/// Empty list of `item_short_form` items. A list form is normalised to
	/// its element form.
	pub fn new(item_short_form: ShortForm) -> Self {
		Self {
			item_short_form: item_short_form.to_element_form(),
			items: Vec::new(),
		}
	}

	pub fn with_items(item_short_form: ShortForm, items: Vec<Option<Box<dyn Element>>>) -> Self {
		Self {
			item_short_form: item_short_form.to_element_form(),
			items,
		}
	}

	pub fn item_short_form(&self) -> ShortForm {
		self.item_short_form
	}

	pub fn items(&self) -> &[Option<Box<dyn Element>>] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn push(&mut self, item: Option<Box<dyn Element>>) {
		self.items.push(item);
	}

	/// Iterates non-null items of concrete type `T`.
	pub fn iter_as<T: Element>(&self) -> impl Iterator<Item = &T> + '_ {
		self.items
			.iter()
			.filter_map(|item| item.as_deref().and_then(|e| e.downcast_ref::<T>()))
	}
}

impl Element for ElementList {
	fn short_form(&self) -> ShortForm {
		self.item_short_form.to_list_form()
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		let mut list = encoder.create_list_encoder(self.items.len())?;
		for item in &self.items {
			list.item(|enc| enc.encode_nullable_element(item.as_deref()))?;
		}
		list.close()
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.items = decoder.decode_homogeneous_list(self.item_short_form)?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::new(self.item_short_form))
	}
}

/// List whose items each carry their own short form; identified by the
/// reserved [`ShortForm::HETEROGENEOUS_LIST`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeterogeneousList {
	items: Vec<Option<Box<dyn Element>>>,
}

impl HeterogeneousList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_items(items: Vec<Option<Box<dyn Element>>>) -> Self {
		Self { items }
	}

	pub fn items(&self) -> &[Option<Box<dyn Element>>] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn push(&mut self, item: Option<Box<dyn Element>>) {
		self.items.push(item);
	}
}

impl Element for HeterogeneousList {
	fn short_form(&self) -> ShortForm {
		ShortForm::HETEROGENEOUS_LIST
	}

	fn encode(&self, encoder: &mut dyn Encoder) -> Result<()> {
		let mut list = encoder.create_list_encoder(self.items.len())?;
		for item in &self.items {
			list.item(|enc| enc.encode_nullable_abstract_element(item.as_deref()))?;
		}
		list.close()
	}

	fn decode(&mut self, decoder: &mut dyn Decoder) -> Result<()> {
		self.items = decoder.decode_heterogeneous_list()?;
		Ok(())
	}

	fn create_element(&self) -> Box<dyn Element> {
		Box::new(Self::new())
	}
}
