use tracing::debug;

use crate::output::{DecodedValue, OrtValueError, Result};

/// Ordered group of decoded outputs.
///
/// Bulk disposal runs from the last inserted entry to the first, so entries
/// that depend on earlier ones are torn down before them. Dropping the
/// collection disposes it.
#[derive(Debug, Default)]
pub struct DisposableCollection<'a> {
	entries: Vec<Option<DecodedValue<'a>>>,
}

impl<'a> DisposableCollection<'a> {
	/// Empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Empty collection with room for `capacity` entries.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: Vec::with_capacity(capacity),
		}
	}

	/// Append a decoded value.
	pub fn push(&mut self, value: DecodedValue<'a>) {
		self.entries.push(Some(value));
	}

	/// Number of slots, including ones emptied by [`take`](DisposableCollection::take).
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Return whether there are no slots.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Entry at `index`, `None` for an emptied slot.
	pub fn get(&self, index: usize) -> Result<Option<&DecodedValue<'a>>> {
		let len = self.entries.len();
		self.entries
			.get(index)
			.map(Option::as_ref)
			.ok_or(OrtValueError::OutOfRange { index, len })
	}

	/// First entry with the given output name.
	pub fn get_by_name(&self, name: &str) -> Option<&DecodedValue<'a>> {
		self.iter().find(|value| value.name() == name)
	}

	/// Occupied entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &DecodedValue<'a>> {
		self.entries.iter().flatten()
	}

	/// Output names of occupied entries in insertion order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.iter().map(DecodedValue::name)
	}

	/// Remove the first entry named `name`, leaving an empty slot.
	///
	/// The caller becomes responsible for disposing the returned value.
	pub fn take(&mut self, name: &str) -> Option<DecodedValue<'a>> {
		self.entries
			.iter_mut()
			.find(|slot| matches!(slot, Some(value) if value.name() == name))
			.and_then(Option::take)
	}

	/// Dispose entries last-to-first, then clear. Idempotent.
	pub fn dispose(&mut self) {
		if self.entries.is_empty() {
			return;
		}
		debug!(entries = self.entries.len(), "disposing decoded outputs");
		for slot in self.entries.iter_mut().rev() {
			if let Some(value) = slot {
				value.dispose();
			}
		}
		self.entries.clear();
	}
}

impl Drop for DisposableCollection<'_> {
	fn drop(&mut self) {
		self.dispose();
	}
}
