mod buffer;
mod collection;
mod decode;
mod decoded;
mod element;
mod error;
mod handle;
mod native;
mod shape;
mod tags;
mod tensor;
mod type_shape;

/// Zero-copy typed view over one native tensor value.
pub use buffer::NativeBuffer;
/// Ordered group of decoded values with reverse-order teardown.
pub use collection::DisposableCollection;
/// Decoder entry points and limits.
pub use decode::{DecodeOptions, Decoder};
/// Decoded value tree types.
pub use decoded::{DecodedValue, MapValue, Payload, Sequence};
/// Static element types accepted by typed buffer views.
pub use element::TensorElement;
/// Error and result aliases.
pub use error::{OrtValueError, Result};
/// Ownership tokens over native value handles.
pub use handle::{BorrowedHandle, OwnedHandle};
/// Native boundary consumed by the decoder.
pub use native::{AllocatorRef, NativeApi, NativeResult, NativeStatus, RawHandle, RawTypeShape};
/// Validated tensor shape.
pub use shape::Shape;
/// Runtime value kind and element type tags.
pub use tags::{ElementType, ValueKind};
/// Tensor payload dispatched over element types.
pub use tensor::TensorView;
/// Tensor element type and shape read under a scoped query.
pub use type_shape::TensorInfo;
