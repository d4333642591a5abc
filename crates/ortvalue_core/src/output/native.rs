//! Native boundary consumed by the decoder.
//!
//! Every query returns the engine status as `Err(NativeStatus)`; the decoder
//! converts it into [`OrtValueError::NativeCall`] at the call site.

use std::ffi::c_void;
use std::fmt;

use crate::output::{OrtValueError, Result};

/// Result of one native call.
pub type NativeResult<T> = std::result::Result<T, NativeStatus>;

macro_rules! opaque_pointer {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Clone, Copy, PartialEq, Eq, Hash)]
		#[repr(transparent)]
		pub struct $name(*mut c_void);

		impl $name {
			/// Null pointer value.
			pub const fn null() -> Self {
				Self(std::ptr::null_mut())
			}

			/// Wrap a raw engine pointer.
			pub const fn from_ptr(ptr: *mut c_void) -> Self {
				Self(ptr)
			}

			/// Build an identifier from a plain address.
			pub fn from_addr(addr: usize) -> Self {
				Self(std::ptr::without_provenance_mut(addr))
			}

			/// Return the raw engine pointer.
			pub const fn as_ptr(self) -> *mut c_void {
				self.0
			}

			/// Return the pointer address.
			pub fn addr(self) -> usize {
				self.0.addr()
			}

			/// Return whether this is the null pointer.
			pub fn is_null(self) -> bool {
				self.0.is_null()
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}(0x{:x})", stringify!($name), self.addr())
			}
		}
	};
}

opaque_pointer!(
	/// Opaque handle to a value produced by the engine.
	RawHandle
);
opaque_pointer!(
	/// Opaque handle to a tensor type-and-shape query result.
	RawTypeShape
);
opaque_pointer!(
	/// Allocator capability passed to sub-value queries.
	AllocatorRef
);

/// Non-zero status reported by a native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeStatus {
	/// Engine status code.
	pub code: i32,
	/// Engine-provided message.
	pub message: String,
}

impl NativeStatus {
	/// Build a status from code and message.
	pub fn new(code: i32, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}
}

impl fmt::Display for NativeStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "status {}: {}", self.code, self.message)
	}
}

/// Query and release calls of the inference engine ABI.
///
/// Calls are blocking and single-threaded; the engine is never accessed
/// concurrently through one implementation.
///
/// # Safety
///
/// Implementors guarantee that a pointer returned by
/// [`tensor_mutable_data`](NativeApi::tensor_mutable_data) is aligned for the
/// tensor's element type and stays valid and initialised for the tensor's
/// element count until [`release_value`](NativeApi::release_value) is called
/// for that handle. Boolean tensors hold only `0` or `1` bytes.
pub unsafe trait NativeApi {
	/// Return the raw value kind tag of a value.
	fn value_kind(&self, value: RawHandle) -> NativeResult<i32>;

	/// Acquire type and shape information for a tensor value.
	fn tensor_type_and_shape(&self, value: RawHandle) -> NativeResult<RawTypeShape>;

	/// Release information acquired by [`tensor_type_and_shape`](NativeApi::tensor_type_and_shape).
	fn release_type_and_shape(&self, info: RawTypeShape);

	/// Return the raw element type tag.
	fn element_type(&self, info: RawTypeShape) -> NativeResult<i32>;

	/// Return the number of dimensions.
	fn dimension_count(&self, info: RawTypeShape) -> NativeResult<usize>;

	/// Fill `out` with dimension sizes; negative entries mark symbolic dimensions.
	fn dimensions(&self, info: RawTypeShape, out: &mut [i64]) -> NativeResult<()>;

	/// Return the element count; negative marks an unsupported shape.
	fn element_count(&self, info: RawTypeShape) -> NativeResult<i64>;

	/// Return the base address of a fixed-width tensor buffer.
	fn tensor_mutable_data(&self, value: RawHandle) -> NativeResult<*mut c_void>;

	/// Return the total byte length of a string tensor's content.
	fn string_tensor_data_length(&self, value: RawHandle) -> NativeResult<usize>;

	/// Copy string tensor content into `data` and per-element start offsets into `offsets`.
	fn string_tensor_content(&self, value: RawHandle, data: &mut [u8], offsets: &mut [usize]) -> NativeResult<()>;

	/// Return the number of elements of a sequence value.
	fn value_count(&self, value: RawHandle) -> NativeResult<usize>;

	/// Return a newly owned sub-value of a sequence or map.
	fn sub_value(&self, value: RawHandle, index: usize, allocator: AllocatorRef) -> NativeResult<RawHandle>;

	/// Return the engine's default allocator.
	fn default_allocator(&self) -> NativeResult<AllocatorRef>;

	/// Release an owned value handle.
	fn release_value(&self, value: RawHandle) -> NativeResult<()>;
}

/// Attach the native call name to a failing status.
pub(crate) trait NativeResultExt<T> {
	fn call(self, name: &'static str) -> Result<T>;
}

impl<T> NativeResultExt<T> for NativeResult<T> {
	fn call(self, name: &'static str) -> Result<T> {
		self.map_err(|status| OrtValueError::NativeCall { call: name, status })
	}
}
