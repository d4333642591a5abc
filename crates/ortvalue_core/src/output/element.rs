use std::ptr::NonNull;

use crate::output::native::NativeResultExt;
use crate::output::{ElementType, NativeApi, NativeBuffer, OrtValueError, RawHandle, Result, TensorView};

/// Static element type of a [`NativeBuffer`].
///
/// Implemented for the fixed-width numeric types, `bool`, and `String`; the
/// set is closed and mirrors [`ElementType`].
pub trait TensorElement: sealed::Sealed + 'static {
	/// Element type tag this Rust type reads.
	const ELEMENT_TYPE: ElementType;
}

pub(crate) mod sealed {
	use crate::output::element::Storage;
	use crate::output::{NativeApi, NativeBuffer, RawHandle, Result, TensorView};

	pub trait Sealed: Sized {
		fn load(api: &dyn NativeApi, value: RawHandle, len: usize) -> Result<Storage<Self>>;
		fn into_view(buffer: NativeBuffer<'_, Self>) -> TensorView<'_>;
		fn from_view<'v, 'a>(view: &'v TensorView<'a>) -> Option<&'v NativeBuffer<'a, Self>>;
	}
}

/// Element storage behind a typed view.
pub enum Storage<T> {
	/// Engine-owned memory, valid while the owning handle lives.
	Native {
		/// First element.
		base: NonNull<T>,
		/// Element count.
		len: usize,
	},
	/// Host copy decoded at construction.
	Owned(Box<[T]>),
}

impl<T> Storage<T> {
	pub(crate) fn as_slice(&self) -> &[T] {
		match self {
			// SAFETY: `NativeApi` guarantees `base` is aligned and valid for `len`
			// initialised elements until the owning handle is released, and the
			// view drops this storage before releasing its handle.
			Self::Native { base, len } => unsafe { std::slice::from_raw_parts(base.as_ptr(), *len) },
			Self::Owned(items) => items,
		}
	}
}

macro_rules! fixed_width_element {
	($($ty:ty => $tag:ident),* $(,)?) => {$(
		impl TensorElement for $ty {
			const ELEMENT_TYPE: ElementType = ElementType::$tag;
		}

		impl sealed::Sealed for $ty {
			fn load(api: &dyn NativeApi, value: RawHandle, len: usize) -> Result<Storage<Self>> {
				load_fixed_width(api, value, len)
			}

			fn into_view(buffer: NativeBuffer<'_, Self>) -> TensorView<'_> {
				TensorView::$tag(buffer)
			}

			fn from_view<'v, 'a>(view: &'v TensorView<'a>) -> Option<&'v NativeBuffer<'a, Self>> {
				match view {
					TensorView::$tag(buffer) => Some(buffer),
					_ => None,
				}
			}
		}
	)*};
}

fixed_width_element!(
	f32 => Float32,
	f64 => Float64,
	i8 => Int8,
	i16 => Int16,
	i32 => Int32,
	i64 => Int64,
	u8 => UInt8,
	u16 => UInt16,
	u32 => UInt32,
	u64 => UInt64,
	bool => Bool,
);

impl TensorElement for String {
	const ELEMENT_TYPE: ElementType = ElementType::Text;
}

impl sealed::Sealed for String {
	fn load(api: &dyn NativeApi, value: RawHandle, len: usize) -> Result<Storage<Self>> {
		let total = api.string_tensor_data_length(value).call("string_tensor_data_length")?;
		let mut data = vec![0_u8; total];
		let mut offsets = vec![0_usize; len];
		api.string_tensor_content(value, &mut data, &mut offsets).call("string_tensor_content")?;
		Ok(Storage::Owned(decode_text(&data, &offsets)?))
	}

	fn into_view(buffer: NativeBuffer<'_, Self>) -> TensorView<'_> {
		TensorView::Text(buffer)
	}

	fn from_view<'v, 'a>(view: &'v TensorView<'a>) -> Option<&'v NativeBuffer<'a, Self>> {
		match view {
			TensorView::Text(buffer) => Some(buffer),
			_ => None,
		}
	}
}

fn load_fixed_width<T>(api: &dyn NativeApi, value: RawHandle, len: usize) -> Result<Storage<T>> {
	let ptr = api.tensor_mutable_data(value).call("tensor_mutable_data")?;
	if len == 0 {
		return Ok(Storage::Native {
			base: NonNull::dangling(),
			len: 0,
		});
	}

	let base = NonNull::new(ptr.cast::<T>()).ok_or(OrtValueError::InvalidBuffer { reason: "null data pointer" })?;
	if !base.as_ptr().is_aligned() {
		return Err(OrtValueError::InvalidBuffer {
			reason: "misaligned data pointer",
		});
	}
	Ok(Storage::Native { base, len })
}

/// Split a string tensor blob at its start offsets.
///
/// Each element ends where the next begins; the last ends at the blob end.
/// The first element must start at the blob start.
pub(crate) fn decode_text(data: &[u8], offsets: &[usize]) -> Result<Box<[String]>> {
	if offsets.first().is_some_and(|&first| first != 0) {
		return Err(OrtValueError::MalformedText { index: 0 });
	}
	let mut out = Vec::with_capacity(offsets.len());
	for (index, start) in offsets.iter().copied().enumerate() {
		let end = offsets.get(index + 1).copied().unwrap_or(data.len());
		let bytes = data.get(start..end).ok_or(OrtValueError::MalformedText { index })?;
		out.push(String::from_utf8_lossy(bytes).into_owned());
	}
	Ok(out.into_boxed_slice())
}
