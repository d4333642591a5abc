use crate::output::{BorrowedHandle, ElementType, NativeBuffer, OrtValueError, OwnedHandle, Result, Shape, TensorElement, TensorInfo};

/// Tensor payload, one variant per decodable element type.
#[derive(Debug)]
pub enum TensorView<'a> {
	/// `float32` elements.
	Float32(NativeBuffer<'a, f32>),
	/// `float64` elements.
	Float64(NativeBuffer<'a, f64>),
	/// `int8` elements.
	Int8(NativeBuffer<'a, i8>),
	/// `int16` elements.
	Int16(NativeBuffer<'a, i16>),
	/// `int32` elements.
	Int32(NativeBuffer<'a, i32>),
	/// `int64` elements.
	Int64(NativeBuffer<'a, i64>),
	/// `uint8` elements.
	UInt8(NativeBuffer<'a, u8>),
	/// `uint16` elements.
	UInt16(NativeBuffer<'a, u16>),
	/// `uint32` elements.
	UInt32(NativeBuffer<'a, u32>),
	/// `uint64` elements.
	UInt64(NativeBuffer<'a, u64>),
	/// `bool` elements.
	Bool(NativeBuffer<'a, bool>),
	/// Text elements, decoded into host strings.
	Text(NativeBuffer<'a, String>),
}

macro_rules! with_buffer {
	($view:expr, $buffer:ident => $body:expr) => {
		match $view {
			TensorView::Float32($buffer) => $body,
			TensorView::Float64($buffer) => $body,
			TensorView::Int8($buffer) => $body,
			TensorView::Int16($buffer) => $body,
			TensorView::Int32($buffer) => $body,
			TensorView::Int64($buffer) => $body,
			TensorView::UInt8($buffer) => $body,
			TensorView::UInt16($buffer) => $body,
			TensorView::UInt32($buffer) => $body,
			TensorView::UInt64($buffer) => $body,
			TensorView::Bool($buffer) => $body,
			TensorView::Text($buffer) => $body,
		}
	};
}

impl<'a> TensorView<'a> {
	/// Build the view matching `info.element_type`, taking ownership of `handle`.
	pub(crate) fn from_native(handle: OwnedHandle<'a>, info: TensorInfo) -> Result<Self> {
		match info.element_type {
			ElementType::Float32 => build::<f32>(handle, info),
			ElementType::Float64 => build::<f64>(handle, info),
			ElementType::Int8 => build::<i8>(handle, info),
			ElementType::Int16 => build::<i16>(handle, info),
			ElementType::Int32 => build::<i32>(handle, info),
			ElementType::Int64 => build::<i64>(handle, info),
			ElementType::UInt8 => build::<u8>(handle, info),
			ElementType::UInt16 => build::<u16>(handle, info),
			ElementType::UInt32 => build::<u32>(handle, info),
			ElementType::UInt64 => build::<u64>(handle, info),
			ElementType::Bool => build::<bool>(handle, info),
			ElementType::Text => build::<String>(handle, info),
		}
	}

	/// Return the typed buffer, failing when `T` is not this view's element type.
	pub fn buffer<T: TensorElement>(&self) -> Result<&NativeBuffer<'a, T>> {
		T::from_view(self).ok_or(OrtValueError::TypeMismatch {
			expected: T::ELEMENT_TYPE,
			got: self.element_type(),
		})
	}

	/// Element type tag.
	pub fn element_type(&self) -> ElementType {
		with_buffer!(self, buffer => buffer.element_type())
	}

	/// Validated tensor shape.
	pub fn shape(&self) -> &Shape {
		with_buffer!(self, buffer => buffer.shape())
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		with_buffer!(self, buffer => buffer.len())
	}

	/// Return whether the tensor has no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Return whether the view has been disposed.
	pub fn is_disposed(&self) -> bool {
		with_buffer!(self, buffer => buffer.is_disposed())
	}

	/// Non-owning reference to the underlying native handle.
	pub fn handle(&self) -> BorrowedHandle<'_> {
		with_buffer!(self, buffer => buffer.handle())
	}

	/// Release the native value. Idempotent.
	pub fn dispose(&mut self) {
		with_buffer!(self, buffer => buffer.dispose())
	}
}

fn build<'a, T: TensorElement>(handle: OwnedHandle<'a>, info: TensorInfo) -> Result<TensorView<'a>> {
	Ok(T::into_view(NativeBuffer::<T>::with_info(handle, info)?))
}
