use thiserror::Error;

use crate::output::{ElementType, NativeStatus, ValueKind};

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, OrtValueError>;

/// Errors produced while decoding and reading native output values.
#[derive(Debug, Error)]
pub enum OrtValueError {
	/// Element type tag is outside the decodable set for this position.
	#[error("unsupported element type {raw} for {context}")]
	UnsupportedElementType {
		/// Raw element type tag reported by the engine.
		raw: i32,
		/// Where the element type was encountered.
		context: &'static str,
	},
	/// Value kind tag is not a tensor, sequence, or map.
	#[error("unsupported value kind {raw}")]
	UnsupportedValueKind {
		/// Raw value kind tag reported by the engine.
		raw: i32,
	},
	/// Negative or symbolic dimension, or an inconsistent element count.
	#[error("unsupported shape {dims:?} (element count {element_count})")]
	UnsupportedShape {
		/// Dimensions as reported by the engine.
		dims: Vec<i64>,
		/// Element count as reported by the engine.
		element_count: i64,
	},
	/// Requested static element type differs from the native tag.
	#[error("element type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Statically requested element type.
		expected: ElementType,
		/// Element type carried by the native value.
		got: ElementType,
	},
	/// Decoded value is of a different kind than requested.
	#[error("value kind mismatch: expected {expected}, got {got}")]
	KindMismatch {
		/// Requested value kind.
		expected: ValueKind,
		/// Kind of the decoded value.
		got: ValueKind,
	},
	/// Element index is past the end of a view.
	#[error("index {index} out of range for {len} elements")]
	OutOfRange {
		/// Requested element index.
		index: usize,
		/// Number of elements in the view.
		len: usize,
	},
	/// A view or value was read after disposal.
	#[error("{what} used after dispose")]
	UseAfterDispose {
		/// Kind of object that was accessed.
		what: &'static str,
	},
	/// A native query call reported a non-zero status.
	#[error("native call {call} failed: {status}")]
	NativeCall {
		/// Name of the failing native call.
		call: &'static str,
		/// Status returned by the engine.
		status: NativeStatus,
	},
	/// Nested sequences exceeded the configured depth.
	#[error("decode depth exceeded (max={max_depth})")]
	DecodeDepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Sequence length exceeded the configured limit.
	#[error("sequence too long: count={count}, max={max}")]
	SequenceTooLong {
		/// Element count reported by the engine.
		count: usize,
		/// Maximum permitted element count.
		max: usize,
	},
	/// Map keys and values disagree in length.
	#[error("map length mismatch: keys={keys}, values={values}")]
	MapLengthMismatch {
		/// Number of decoded keys.
		keys: usize,
		/// Number of decoded values.
		values: usize,
	},
	/// Map keys tensor held the same key twice.
	#[error("duplicate map key {key}")]
	DuplicateMapKey {
		/// Rendered duplicate key.
		key: String,
	},
	/// String tensor offsets do not describe the content blob.
	#[error("malformed string tensor at element {index}")]
	MalformedText {
		/// Element whose offset is out of order or out of bounds.
		index: usize,
	},
	/// Tensor data pointer cannot back a typed view.
	#[error("invalid tensor buffer: {reason}")]
	InvalidBuffer {
		/// Why the pointer was rejected.
		reason: &'static str,
	},
}
