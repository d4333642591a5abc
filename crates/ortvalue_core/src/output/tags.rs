use std::fmt;
use std::str::FromStr;

use crate::output::{OrtValueError, Result};

/// Runtime kind of a native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	/// Dense tensor.
	Tensor,
	/// Ordered sequence of values.
	Sequence,
	/// Key/value map.
	Map,
}

impl ValueKind {
	/// Map an engine value kind tag.
	pub fn from_raw(raw: i32) -> Result<Self> {
		match raw {
			1 => Ok(Self::Tensor),
			2 => Ok(Self::Sequence),
			3 => Ok(Self::Map),
			_ => Err(OrtValueError::UnsupportedValueKind { raw }),
		}
	}

	/// Return the engine tag for this kind.
	pub fn raw(self) -> i32 {
		match self {
			Self::Tensor => 1,
			Self::Sequence => 2,
			Self::Map => 3,
		}
	}

	/// Lowercase label.
	pub fn name(self) -> &'static str {
		match self {
			Self::Tensor => "tensor",
			Self::Sequence => "sequence",
			Self::Map => "map",
		}
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Scalar element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
	/// 32-bit float.
	Float32,
	/// 64-bit float.
	Float64,
	/// Signed 8-bit integer.
	Int8,
	/// Signed 16-bit integer.
	Int16,
	/// Signed 32-bit integer.
	Int32,
	/// Signed 64-bit integer.
	Int64,
	/// Unsigned 8-bit integer.
	UInt8,
	/// Unsigned 16-bit integer.
	UInt16,
	/// Unsigned 32-bit integer.
	UInt32,
	/// Unsigned 64-bit integer.
	UInt64,
	/// One-byte boolean.
	Bool,
	/// Variable-width UTF-8 string.
	Text,
}

impl ElementType {
	/// Every decodable element type, in engine tag order.
	pub const ALL: [ElementType; 12] = [
		Self::Float32,
		Self::UInt8,
		Self::Int8,
		Self::UInt16,
		Self::Int16,
		Self::Int32,
		Self::Int64,
		Self::Text,
		Self::Bool,
		Self::Float64,
		Self::UInt32,
		Self::UInt64,
	];

	/// Map an engine element type tag.
	///
	/// `context` names the decode position for the error message.
	pub fn from_raw(raw: i32, context: &'static str) -> Result<Self> {
		Self::ALL
			.into_iter()
			.find(|item| item.raw() == raw)
			.ok_or(OrtValueError::UnsupportedElementType { raw, context })
	}

	/// Return the engine tag for this element type.
	pub fn raw(self) -> i32 {
		match self {
			Self::Float32 => 1,
			Self::UInt8 => 2,
			Self::Int8 => 3,
			Self::UInt16 => 4,
			Self::Int16 => 5,
			Self::Int32 => 6,
			Self::Int64 => 7,
			Self::Text => 8,
			Self::Bool => 9,
			Self::Float64 => 11,
			Self::UInt32 => 12,
			Self::UInt64 => 13,
		}
	}

	/// Byte width of one element, or `None` for variable-width text.
	pub fn width(self) -> Option<usize> {
		match self {
			Self::Int8 | Self::UInt8 | Self::Bool => Some(1),
			Self::Int16 | Self::UInt16 => Some(2),
			Self::Float32 | Self::Int32 | Self::UInt32 => Some(4),
			Self::Float64 | Self::Int64 | Self::UInt64 => Some(8),
			Self::Text => None,
		}
	}

	/// Lowercase label.
	pub fn name(self) -> &'static str {
		match self {
			Self::Float32 => "float32",
			Self::Float64 => "float64",
			Self::Int8 => "int8",
			Self::Int16 => "int16",
			Self::Int32 => "int32",
			Self::Int64 => "int64",
			Self::UInt8 => "uint8",
			Self::UInt16 => "uint16",
			Self::UInt32 => "uint32",
			Self::UInt64 => "uint64",
			Self::Bool => "bool",
			Self::Text => "text",
		}
	}
}

impl fmt::Display for ElementType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for ElementType {
	type Err = String;

	fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|item| item.name() == value)
			.ok_or_else(|| format!("unknown element type: {value}"))
	}
}
