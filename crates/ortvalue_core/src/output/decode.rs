use tracing::debug;

use crate::output::decoded::{DecodedValue, MapValue, Payload, Sequence};
use crate::output::native::NativeResultExt;
use crate::output::{
	AllocatorRef, DisposableCollection, ElementType, NativeApi, NativeBuffer, OrtValueError, OwnedHandle, RawHandle, Result, TensorInfo, TensorView, ValueKind,
};

/// Runtime limits for decoding nested values.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Number of value levels that may be decoded.
	///
	/// A top-level output sits at depth 0 and each sequence item one level
	/// below its container, tensors included: `1` admits bare tensors and
	/// maps only, `2` admits a sequence of tensors.
	pub max_depth: u32,
	/// Maximum element count of one sequence.
	pub max_sequence_len: usize,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: 16,
			max_sequence_len: 1 << 20,
		}
	}
}

impl DecodeOptions {
	/// Tight limits for untrusted or exploratory decoding.
	pub fn strict() -> Self {
		Self {
			max_depth: 4,
			max_sequence_len: 4096,
		}
	}
}

/// Builds [`DecodedValue`] trees from native output handles.
///
/// Every handle passed in is consumed exactly once: it ends up owned by the
/// returned value, or it is released before an error is returned.
pub struct Decoder<'a> {
	api: &'a dyn NativeApi,
	allocator: AllocatorRef,
	options: DecodeOptions,
}

impl<'a> Decoder<'a> {
	/// Decoder using the engine's default allocator.
	pub fn new(api: &'a dyn NativeApi) -> Result<Self> {
		let allocator = api.default_allocator().call("default_allocator")?;
		Ok(Self::with_allocator(api, allocator))
	}

	/// Decoder using an explicit allocator for sub-value queries.
	pub fn with_allocator(api: &'a dyn NativeApi, allocator: AllocatorRef) -> Self {
		Self {
			api,
			allocator,
			options: DecodeOptions::default(),
		}
	}

	/// Replace decode limits.
	pub fn with_options(mut self, options: DecodeOptions) -> Self {
		self.options = options;
		self
	}

	/// Active decode limits.
	pub fn options(&self) -> &DecodeOptions {
		&self.options
	}

	/// Decode one named output, taking ownership of `value`.
	///
	/// # Safety
	///
	/// `value` must be a live value handle produced by this decoder's engine,
	/// owned by the caller, and not owned by any other token.
	pub unsafe fn decode(&self, name: &str, value: RawHandle) -> Result<DecodedValue<'a>> {
		// SAFETY: forwarded from the caller's contract.
		let handle = unsafe { OwnedHandle::from_raw(self.api, value) };
		self.decode_handle(name, handle)
	}

	/// Decode one named output from an owning token.
	pub fn decode_handle(&self, name: &str, handle: OwnedHandle<'a>) -> Result<DecodedValue<'a>> {
		self.decode_at(name, handle, 0)
	}

	/// Decode named outputs in order into a collection.
	///
	/// On failure every handle is released: values decoded so far are
	/// disposed in reverse order and undecoded handles are released.
	///
	/// # Safety
	///
	/// Each handle must satisfy the contract of [`decode`](Decoder::decode).
	pub unsafe fn decode_all<I, N>(&self, outputs: I) -> Result<DisposableCollection<'a>>
	where
		I: IntoIterator<Item = (N, RawHandle)>,
		N: AsRef<str>,
	{
		let owned: Vec<(N, OwnedHandle<'a>)> = outputs
			.into_iter()
			// SAFETY: forwarded from the caller's contract.
			.map(|(name, raw)| (name, unsafe { OwnedHandle::from_raw(self.api, raw) }))
			.collect();

		let mut collection = DisposableCollection::with_capacity(owned.len());
		for (name, handle) in owned {
			collection.push(self.decode_handle(name.as_ref(), handle)?);
		}
		Ok(collection)
	}

	fn decode_at(&self, name: &str, handle: OwnedHandle<'a>, depth: u32) -> Result<DecodedValue<'a>> {
		if depth >= self.options.max_depth {
			return Err(OrtValueError::DecodeDepthExceeded {
				max_depth: self.options.max_depth,
			});
		}

		let kind = ValueKind::from_raw(self.api.value_kind(handle.raw()).call("value_kind")?)?;
		debug!(name, %kind, depth, handle = ?handle.raw(), "decoding native value");

		let payload = match kind {
			ValueKind::Tensor => Payload::Tensor(self.decode_tensor(handle)?),
			ValueKind::Sequence => Payload::Sequence(self.decode_sequence(handle, depth)?),
			ValueKind::Map => Payload::Map(self.decode_map(handle)?),
		};
		Ok(DecodedValue::new(name, payload))
	}

	fn decode_tensor(&self, handle: OwnedHandle<'a>) -> Result<TensorView<'a>> {
		let info = TensorInfo::query(self.api, handle.raw(), "tensor")?;
		TensorView::from_native(handle, info)
	}

	fn decode_sequence(&self, handle: OwnedHandle<'a>, depth: u32) -> Result<Sequence<'a>> {
		let count = self.api.value_count(handle.raw()).call("value_count")?;
		if count > self.options.max_sequence_len {
			return Err(OrtValueError::SequenceTooLong {
				count,
				max: self.options.max_sequence_len,
			});
		}

		let mut sequence = Sequence::new(handle, count);
		for index in 0..count {
			let child = self.sub_value(sequence.handle().raw(), index)?;
			sequence.push(self.decode_at("", child, depth + 1)?);
		}
		Ok(sequence)
	}

	fn decode_map(&self, mut handle: OwnedHandle<'a>) -> Result<MapValue> {
		let keys = self.sub_value(handle.raw(), 0)?;
		let values = self.sub_value(handle.raw(), 1)?;

		let key_info = TensorInfo::query(self.api, keys.raw(), "map key")?;
		let value_info = TensorInfo::query(self.api, values.raw(), "map value")?;
		if value_info.element_type != ElementType::Float32 {
			return Err(OrtValueError::UnsupportedElementType {
				raw: value_info.element_type.raw(),
				context: "map value",
			});
		}

		let mut values = NativeBuffer::<f32>::with_info(values, value_info)?;
		let map = match key_info.element_type {
			ElementType::Int64 => {
				let mut keys = NativeBuffer::<i64>::with_info(keys, key_info)?;
				let map = MapValue::zip(keys.as_slice()?.iter().copied(), values.as_slice()?)?;
				keys.dispose();
				MapValue::Int64(map)
			}
			ElementType::Text => {
				let mut keys = NativeBuffer::<String>::with_info(keys, key_info)?;
				let map = MapValue::zip(keys.as_slice()?.iter().cloned(), values.as_slice()?)?;
				keys.dispose();
				MapValue::Text(map)
			}
			other => {
				return Err(OrtValueError::UnsupportedElementType {
					raw: other.raw(),
					context: "map key",
				});
			}
		};

		values.dispose();
		handle.dispose();
		Ok(map)
	}

	fn sub_value(&self, parent: RawHandle, index: usize) -> Result<OwnedHandle<'a>> {
		let raw = self.api.sub_value(parent, index, self.allocator).call("sub_value")?;
		// SAFETY: the engine hands back a new value owned by the caller.
		Ok(unsafe { OwnedHandle::from_raw(self.api, raw) })
	}
}

#[cfg(test)]
mod tests;
