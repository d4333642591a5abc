use std::fmt;

use crate::output::element::Storage;
use crate::output::{BorrowedHandle, ElementType, OrtValueError, OwnedHandle, Result, Shape, TensorElement, TensorInfo};

/// Typed view over one native tensor value.
///
/// Fixed-width element types read the engine's buffer in place. Text tensors
/// are decoded into host strings once at construction. The view owns its
/// native handle and releases it on [`dispose`](NativeBuffer::dispose).
pub struct NativeBuffer<'a, T> {
	storage: Storage<T>,
	shape: Shape,
	handle: OwnedHandle<'a>,
	disposed: bool,
}

impl<'a, T: TensorElement> NativeBuffer<'a, T> {
	/// Build a view over a tensor value, taking ownership of `handle`.
	///
	/// The handle is released if construction fails.
	pub fn from_handle(handle: OwnedHandle<'a>) -> Result<Self> {
		let info = TensorInfo::query(handle.api(), handle.raw(), "tensor")?;
		Self::with_info(handle, info)
	}

	pub(crate) fn with_info(handle: OwnedHandle<'a>, info: TensorInfo) -> Result<Self> {
		if info.element_type != T::ELEMENT_TYPE {
			return Err(OrtValueError::TypeMismatch {
				expected: T::ELEMENT_TYPE,
				got: info.element_type,
			});
		}

		let storage = T::load(handle.api(), handle.raw(), info.shape.element_count())?;
		Ok(Self {
			storage,
			shape: info.shape,
			handle,
			disposed: false,
		})
	}

	/// Return all elements in row-major order.
	pub fn as_slice(&self) -> Result<&[T]> {
		if self.disposed {
			return Err(OrtValueError::UseAfterDispose { what: "tensor view" });
		}
		Ok(self.storage.as_slice())
	}

	/// Return one element by flat index.
	pub fn get(&self, index: usize) -> Result<&T> {
		let items = self.as_slice()?;
		items.get(index).ok_or(OrtValueError::OutOfRange { index, len: items.len() })
	}

	/// Copy all elements into a host vector.
	pub fn to_vec(&self) -> Result<Vec<T>>
	where
		T: Clone,
	{
		Ok(self.as_slice()?.to_vec())
	}

	/// Return the stable address of element `index`.
	///
	/// The address is `base + index * element_width` and stays valid until the
	/// view is disposed; callers must not keep it past that point.
	pub fn pin(&self, index: usize) -> Result<*const T> {
		let items = self.as_slice()?;
		if index >= items.len() {
			return Err(OrtValueError::OutOfRange { index, len: items.len() });
		}
		Ok(items[index..].as_ptr())
	}

	/// Counterpart of [`pin`](NativeBuffer::pin); memory never relocates, so this does nothing.
	pub fn unpin(&self) {}

	/// Validated tensor shape.
	pub fn shape(&self) -> &Shape {
		&self.shape
	}

	/// Dimension sizes.
	pub fn dimensions(&self) -> &[usize] {
		self.shape.dims()
	}

	/// Number of dimensions.
	pub fn rank(&self) -> usize {
		self.shape.rank()
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.shape.element_count()
	}

	/// Return whether the tensor has no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Element type tag.
	pub fn element_type(&self) -> ElementType {
		T::ELEMENT_TYPE
	}

	/// Distance in bytes between consecutive pinned elements.
	pub fn element_width(&self) -> usize {
		size_of::<T>()
	}

	/// Return whether the view has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// Non-owning reference to the underlying native handle.
	pub fn handle(&self) -> BorrowedHandle<'_> {
		self.handle.borrow()
	}

	/// Release the native value. Idempotent.
	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		self.storage = Storage::Owned(Box::default());
		self.handle.dispose();
		self.disposed = true;
	}
}

impl<T: TensorElement> fmt::Debug for NativeBuffer<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NativeBuffer")
			.field("element_type", &T::ELEMENT_TYPE)
			.field("shape", &self.shape)
			.field("handle", &self.handle)
			.field("disposed", &self.disposed)
			.finish()
	}
}
