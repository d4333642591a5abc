use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use crate::output::{BorrowedHandle, ElementType, NativeBuffer, OrtValueError, OwnedHandle, Result, TensorElement, TensorView, ValueKind};

/// Named result of decoding one native value.
///
/// Only the decoder builds these. Disposal releases every native handle the
/// value transitively owns and is idempotent.
#[derive(Debug)]
pub struct DecodedValue<'a> {
	name: Box<str>,
	payload: Payload<'a>,
	disposed: bool,
}

/// Payload of a [`DecodedValue`].
#[derive(Debug)]
pub enum Payload<'a> {
	/// Tensor view over native memory.
	Tensor(TensorView<'a>),
	/// Ordered child values plus the container handle.
	Sequence(Sequence<'a>),
	/// Mapping copied into host memory; holds no native handles.
	Map(MapValue),
}

impl<'a> DecodedValue<'a> {
	pub(crate) fn new(name: &str, payload: Payload<'a>) -> Self {
		Self {
			name: name.into(),
			payload,
			disposed: false,
		}
	}

	/// Output name; empty for sequence elements.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Value kind of the payload.
	pub fn kind(&self) -> ValueKind {
		match self.payload {
			Payload::Tensor(_) => ValueKind::Tensor,
			Payload::Sequence(_) => ValueKind::Sequence,
			Payload::Map(_) => ValueKind::Map,
		}
	}

	/// Element type for tensor payloads.
	pub fn element_type(&self) -> Option<ElementType> {
		match &self.payload {
			Payload::Tensor(view) => Some(view.element_type()),
			Payload::Sequence(_) | Payload::Map(_) => None,
		}
	}

	/// Borrow the payload.
	pub fn payload(&self) -> &Payload<'a> {
		&self.payload
	}

	/// Tensor payload, if any.
	pub fn as_tensor(&self) -> Option<&TensorView<'a>> {
		match &self.payload {
			Payload::Tensor(view) => Some(view),
			_ => None,
		}
	}

	/// Sequence payload, if any.
	pub fn as_sequence(&self) -> Option<&Sequence<'a>> {
		match &self.payload {
			Payload::Sequence(items) => Some(items),
			_ => None,
		}
	}

	/// Map payload, if any.
	pub fn as_map(&self) -> Option<&MapValue> {
		match &self.payload {
			Payload::Map(map) => Some(map),
			_ => None,
		}
	}

	/// Typed tensor buffer.
	pub fn tensor<T: TensorElement>(&self) -> Result<&NativeBuffer<'a, T>> {
		let view = self.as_tensor().ok_or(OrtValueError::KindMismatch {
			expected: ValueKind::Tensor,
			got: self.kind(),
		})?;
		view.buffer::<T>()
	}

	/// Non-owning reference to the native handle backing this value.
	///
	/// Maps are fully materialised and have none.
	pub fn native_handle(&self) -> Option<BorrowedHandle<'_>> {
		if self.disposed {
			return None;
		}
		match &self.payload {
			Payload::Tensor(view) => Some(view.handle()),
			Payload::Sequence(items) => Some(items.handle()),
			Payload::Map(_) => None,
		}
	}

	/// Return whether the value has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// Release all native resources owned by this value. Idempotent.
	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		match &mut self.payload {
			Payload::Tensor(view) => view.dispose(),
			Payload::Sequence(items) => items.dispose(),
			Payload::Map(_) => {}
		}
		self.disposed = true;
	}
}

/// Decoded sequence: children in engine order plus the container handle.
pub struct Sequence<'a> {
	items: Vec<DecodedValue<'a>>,
	container: OwnedHandle<'a>,
	disposed: bool,
}

impl<'a> Sequence<'a> {
	pub(crate) fn new(container: OwnedHandle<'a>, capacity: usize) -> Self {
		Self {
			items: Vec::with_capacity(capacity),
			container,
			disposed: false,
		}
	}

	pub(crate) fn push(&mut self, item: DecodedValue<'a>) {
		self.items.push(item);
	}

	/// Child values.
	pub fn items(&self) -> Result<&[DecodedValue<'a>]> {
		if self.disposed {
			return Err(OrtValueError::UseAfterDispose { what: "sequence" });
		}
		Ok(&self.items)
	}

	/// Child value by index.
	pub fn get(&self, index: usize) -> Result<&DecodedValue<'a>> {
		let items = self.items()?;
		items.get(index).ok_or(OrtValueError::OutOfRange { index, len: items.len() })
	}

	/// Number of children.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Return whether there are no children.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Non-owning reference to the container handle.
	pub fn handle(&self) -> BorrowedHandle<'_> {
		self.container.borrow()
	}

	/// Dispose children last-to-first, then release the container. Idempotent.
	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		while let Some(mut item) = self.items.pop() {
			item.dispose();
		}
		self.container.dispose();
		self.disposed = true;
	}
}

impl Drop for Sequence<'_> {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for Sequence<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Sequence")
			.field("items", &self.items)
			.field("container", &self.container)
			.field("disposed", &self.disposed)
			.finish()
	}
}

/// Map output copied into host memory.
///
/// The engine only produces `int64` or text keys with `float32` values.
#[derive(Debug, Clone, PartialEq)]
pub enum MapValue {
	/// `int64` keys.
	Int64(BTreeMap<i64, f32>),
	/// Text keys.
	Text(BTreeMap<String, f32>),
}

impl MapValue {
	/// Key element type.
	pub fn key_type(&self) -> ElementType {
		match self {
			Self::Int64(_) => ElementType::Int64,
			Self::Text(_) => ElementType::Text,
		}
	}

	/// Value element type.
	pub fn value_type(&self) -> ElementType {
		ElementType::Float32
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		match self {
			Self::Int64(map) => map.len(),
			Self::Text(map) => map.len(),
		}
	}

	/// Return whether the map has no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Entries keyed by `int64`, if that is the key type.
	pub fn as_int64(&self) -> Option<&BTreeMap<i64, f32>> {
		match self {
			Self::Int64(map) => Some(map),
			Self::Text(_) => None,
		}
	}

	/// Entries keyed by text, if that is the key type.
	pub fn as_text(&self) -> Option<&BTreeMap<String, f32>> {
		match self {
			Self::Text(map) => Some(map),
			Self::Int64(_) => None,
		}
	}

	/// Pair keys and values by position.
	pub(crate) fn zip<K>(keys: impl ExactSizeIterator<Item = K>, values: &[f32]) -> Result<BTreeMap<K, f32>>
	where
		K: Ord + fmt::Display,
	{
		if keys.len() != values.len() {
			return Err(OrtValueError::MapLengthMismatch {
				keys: keys.len(),
				values: values.len(),
			});
		}

		let mut out = BTreeMap::new();
		for (key, value) in keys.zip(values.iter().copied()) {
			match out.entry(key) {
				Entry::Occupied(entry) => {
					return Err(OrtValueError::DuplicateMapKey { key: entry.key().to_string() });
				}
				Entry::Vacant(entry) => {
					entry.insert(value);
				}
			}
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests;
