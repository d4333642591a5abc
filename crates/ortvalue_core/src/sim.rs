//! In-memory engine implementing [`NativeApi`].
//!
//! Values live in engine-owned, 8-byte aligned memory so typed views read it
//! in place exactly as they would read a real engine buffer. Every handle
//! acquisition and release is counted, and any named call can be made to
//! fail once with [`SimRuntime::fail_next`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;

use crate::output::{AllocatorRef, ElementType, NativeApi, NativeResult, NativeStatus, RawHandle, RawTypeShape, ValueKind};

const STATUS_FAIL: i32 = 1;
const STATUS_INVALID_ARGUMENT: i32 = 2;

const HANDLE_BASE: usize = 0x1000;
const HANDLE_STRIDE: usize = 0x10;
const ALLOCATOR_ADDR: usize = 0xa110c;
const OPAQUE_KIND: i32 = 4;

/// Scalar types the simulated engine can store.
pub trait SimScalar: Copy {
	/// Element type tag stored with the tensor.
	const ELEMENT_TYPE: ElementType;

	/// Append the native-endian bytes of `self`.
	fn write_native(self, out: &mut Vec<u8>);
}

macro_rules! sim_scalar {
	($($ty:ty => $tag:ident),* $(,)?) => {$(
		impl SimScalar for $ty {
			const ELEMENT_TYPE: ElementType = ElementType::$tag;

			fn write_native(self, out: &mut Vec<u8>) {
				out.extend_from_slice(&self.to_ne_bytes());
			}
		}
	)*};
}

sim_scalar!(
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
);

impl SimScalar for bool {
	const ELEMENT_TYPE: ElementType = ElementType::Bool;

	fn write_native(self, out: &mut Vec<u8>) {
		out.push(u8::from(self));
	}
}

/// Byte buffer with 8-byte alignment.
#[derive(Debug, Clone)]
struct AlignedBytes {
	words: Vec<u64>,
	len: usize,
}

impl AlignedBytes {
	fn from_bytes(bytes: &[u8]) -> Self {
		let mut words = vec![0_u64; bytes.len().div_ceil(8)];
		for (word, chunk) in words.iter_mut().zip(bytes.chunks(8)) {
			let mut buf = [0_u8; 8];
			buf[..chunk.len()].copy_from_slice(chunk);
			*word = u64::from_ne_bytes(buf);
		}
		Self { words, len: bytes.len() }
	}

	fn as_mut_ptr(&mut self) -> *mut c_void {
		if self.len == 0 {
			return std::ptr::null_mut();
		}
		self.words.as_mut_ptr().cast()
	}
}

#[derive(Debug, Clone)]
enum SimData {
	Fixed(AlignedBytes),
	Text(Vec<String>),
}

/// Tensor stored by the simulated engine.
#[derive(Debug, Clone)]
pub struct SimTensor {
	element_type: i32,
	dims: Vec<i64>,
	element_count: i64,
	data: SimData,
}

impl SimTensor {
	/// Fixed-width tensor from host elements.
	pub fn new<T: SimScalar>(dims: &[i64], data: &[T]) -> Self {
		let mut bytes = Vec::with_capacity(data.len() * size_of::<T>());
		for item in data {
			item.write_native(&mut bytes);
		}
		Self::raw(T::ELEMENT_TYPE.raw(), dims, &bytes)
	}

	/// Text tensor.
	pub fn text(dims: &[i64], items: &[&str]) -> Self {
		Self {
			element_type: ElementType::Text.raw(),
			dims: dims.to_vec(),
			element_count: count_for(dims),
			data: SimData::Text(items.iter().map(|item| (*item).to_owned()).collect()),
		}
	}

	/// Tensor with an arbitrary element type tag and raw bytes.
	pub fn raw(element_type: i32, dims: &[i64], bytes: &[u8]) -> Self {
		Self {
			element_type,
			dims: dims.to_vec(),
			element_count: count_for(dims),
			data: SimData::Fixed(AlignedBytes::from_bytes(bytes)),
		}
	}

	/// Override the element count the engine reports.
	pub fn with_element_count(mut self, element_count: i64) -> Self {
		self.element_count = element_count;
		self
	}
}

fn count_for(dims: &[i64]) -> i64 {
	if dims.iter().any(|dim| *dim < 0) {
		return -1;
	}
	dims.iter().product()
}

/// Value stored by the simulated engine.
#[derive(Debug, Clone)]
pub enum SimValue {
	/// Dense tensor.
	Tensor(SimTensor),
	/// Ordered sequence.
	Sequence(Vec<SimValue>),
	/// Map decomposed into a keys tensor and a values tensor.
	Map {
		/// Keys tensor (sub-value 0).
		keys: SimTensor,
		/// Values tensor (sub-value 1).
		values: SimTensor,
	},
	/// Value of a kind the decoder does not support.
	Opaque,
}

impl SimValue {
	/// Fixed-width tensor value.
	pub fn tensor<T: SimScalar>(dims: &[i64], data: &[T]) -> Self {
		Self::Tensor(SimTensor::new(dims, data))
	}

	/// Text tensor value.
	pub fn text(dims: &[i64], items: &[&str]) -> Self {
		Self::Tensor(SimTensor::text(dims, items))
	}

	/// Tensor value with an arbitrary element type tag and raw bytes.
	pub fn raw_tensor(element_type: i32, dims: &[i64], bytes: &[u8]) -> Self {
		Self::Tensor(SimTensor::raw(element_type, dims, bytes))
	}

	/// Value of an unsupported kind.
	pub fn opaque() -> Self {
		Self::Opaque
	}

	/// Sequence value.
	pub fn sequence(items: Vec<SimValue>) -> Self {
		Self::Sequence(items)
	}

	/// Map value.
	pub fn map(keys: SimTensor, values: SimTensor) -> Self {
		Self::Map { keys, values }
	}

	fn kind(&self) -> i32 {
		match self {
			Self::Tensor(_) => ValueKind::Tensor.raw(),
			Self::Sequence(_) => ValueKind::Sequence.raw(),
			Self::Map { .. } => ValueKind::Map.raw(),
			Self::Opaque => OPAQUE_KIND,
		}
	}
}

impl From<SimTensor> for SimValue {
	fn from(value: SimTensor) -> Self {
		Self::Tensor(value)
	}
}

/// Handle accounting of a [`SimRuntime`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
	/// Value handles created.
	pub values_acquired: usize,
	/// Value handles released.
	pub values_released: usize,
	/// Type-and-shape infos created.
	pub infos_acquired: usize,
	/// Type-and-shape infos released.
	pub infos_released: usize,
	/// Releases of unknown or already released handles.
	pub failed_releases: usize,
}

impl HandleStats {
	/// Value handles not yet released.
	pub fn live_values(&self) -> usize {
		self.values_acquired - self.values_released
	}

	/// Type-and-shape infos not yet released.
	pub fn live_infos(&self) -> usize {
		self.infos_acquired - self.infos_released
	}

	/// Every acquisition matched by exactly one release.
	pub fn is_balanced(&self) -> bool {
		self.live_values() == 0 && self.live_infos() == 0 && self.failed_releases == 0
	}
}

#[derive(Debug, Default)]
struct SimState {
	next_id: usize,
	values: HashMap<usize, SimValue>,
	infos: HashMap<usize, SimTensor>,
	stats: HandleStats,
	release_log: Vec<RawHandle>,
	fail_next: Vec<&'static str>,
}

impl SimState {
	fn next_addr(&mut self) -> usize {
		let addr = HANDLE_BASE + self.next_id * HANDLE_STRIDE;
		self.next_id += 1;
		addr
	}

	fn insert_value(&mut self, value: SimValue) -> RawHandle {
		let addr = self.next_addr();
		self.values.insert(addr, value);
		self.stats.values_acquired += 1;
		RawHandle::from_addr(addr)
	}

	fn value(&self, handle: RawHandle) -> NativeResult<&SimValue> {
		self.values.get(&handle.addr()).ok_or_else(|| invalid(format!("unknown value {handle:?}")))
	}

	fn tensor_mut(&mut self, handle: RawHandle) -> NativeResult<&mut SimTensor> {
		match self.values.get_mut(&handle.addr()) {
			Some(SimValue::Tensor(tensor)) => Ok(tensor),
			Some(_) => Err(invalid(format!("value {handle:?} is not a tensor"))),
			None => Err(invalid(format!("unknown value {handle:?}"))),
		}
	}

	fn info(&self, info: RawTypeShape) -> NativeResult<&SimTensor> {
		self.infos.get(&info.addr()).ok_or_else(|| invalid(format!("unknown type info {info:?}")))
	}
}

fn invalid(message: String) -> NativeStatus {
	NativeStatus::new(STATUS_INVALID_ARGUMENT, message)
}

/// In-memory engine with handle accounting.
#[derive(Debug, Default)]
pub struct SimRuntime {
	state: RefCell<SimState>,
}

impl SimRuntime {
	/// Empty engine.
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a value and return a new owned handle to it.
	pub fn insert(&self, value: impl Into<SimValue>) -> RawHandle {
		self.state.borrow_mut().insert_value(value.into())
	}

	/// Current handle accounting.
	pub fn stats(&self) -> HandleStats {
		self.state.borrow().stats
	}

	/// Released value handles in release order.
	pub fn release_log(&self) -> Vec<RawHandle> {
		self.state.borrow().release_log.clone()
	}

	/// Return whether `handle` is a live value handle.
	pub fn is_live(&self, handle: RawHandle) -> bool {
		self.state.borrow().values.contains_key(&handle.addr())
	}

	/// Make the next invocation of the named call fail.
	///
	/// Names match the [`NativeApi`] method names.
	pub fn fail_next(&self, call: &'static str) {
		self.state.borrow_mut().fail_next.push(call);
	}

	/// Allocator accepted by [`NativeApi::sub_value`].
	pub fn allocator(&self) -> AllocatorRef {
		AllocatorRef::from_addr(ALLOCATOR_ADDR)
	}

	fn enter(&self, call: &'static str) -> NativeResult<()> {
		let mut state = self.state.borrow_mut();
		match state.fail_next.iter().position(|item| *item == call) {
			Some(idx) => {
				state.fail_next.remove(idx);
				Err(NativeStatus::new(STATUS_FAIL, format!("injected failure in {call}")))
			}
			None => Ok(()),
		}
	}
}

// SAFETY: tensor data lives in a heap buffer owned by the stored value; the
// buffer is never resized and is freed only when the value handle is released.
// Buffers are 8-byte aligned and bool tensors are written as 0/1 bytes.
unsafe impl NativeApi for SimRuntime {
	fn value_kind(&self, value: RawHandle) -> NativeResult<i32> {
		self.enter("value_kind")?;
		Ok(self.state.borrow().value(value)?.kind())
	}

	fn tensor_type_and_shape(&self, value: RawHandle) -> NativeResult<RawTypeShape> {
		self.enter("tensor_type_and_shape")?;
		let mut state = self.state.borrow_mut();
		let snapshot = match state.value(value)? {
			SimValue::Tensor(tensor) => tensor.clone(),
			_ => return Err(invalid(format!("value {value:?} is not a tensor"))),
		};
		let addr = state.next_addr();
		state.infos.insert(addr, snapshot);
		state.stats.infos_acquired += 1;
		Ok(RawTypeShape::from_addr(addr))
	}

	fn release_type_and_shape(&self, info: RawTypeShape) {
		let mut state = self.state.borrow_mut();
		if state.infos.remove(&info.addr()).is_some() {
			state.stats.infos_released += 1;
		} else {
			state.stats.failed_releases += 1;
		}
	}

	fn element_type(&self, info: RawTypeShape) -> NativeResult<i32> {
		self.enter("element_type")?;
		Ok(self.state.borrow().info(info)?.element_type)
	}

	fn dimension_count(&self, info: RawTypeShape) -> NativeResult<usize> {
		self.enter("dimension_count")?;
		Ok(self.state.borrow().info(info)?.dims.len())
	}

	fn dimensions(&self, info: RawTypeShape, out: &mut [i64]) -> NativeResult<()> {
		self.enter("dimensions")?;
		let state = self.state.borrow();
		let dims = &state.info(info)?.dims;
		if out.len() != dims.len() {
			return Err(invalid(format!("dimension buffer holds {}, need {}", out.len(), dims.len())));
		}
		out.copy_from_slice(dims);
		Ok(())
	}

	fn element_count(&self, info: RawTypeShape) -> NativeResult<i64> {
		self.enter("element_count")?;
		Ok(self.state.borrow().info(info)?.element_count)
	}

	fn tensor_mutable_data(&self, value: RawHandle) -> NativeResult<*mut c_void> {
		self.enter("tensor_mutable_data")?;
		let mut state = self.state.borrow_mut();
		match &mut state.tensor_mut(value)?.data {
			SimData::Fixed(bytes) => Ok(bytes.as_mut_ptr()),
			SimData::Text(_) => Err(invalid(format!("value {value:?} is a string tensor"))),
		}
	}

	fn string_tensor_data_length(&self, value: RawHandle) -> NativeResult<usize> {
		self.enter("string_tensor_data_length")?;
		let mut state = self.state.borrow_mut();
		match &state.tensor_mut(value)?.data {
			SimData::Text(items) => Ok(items.iter().map(String::len).sum()),
			SimData::Fixed(_) => Err(invalid(format!("value {value:?} is not a string tensor"))),
		}
	}

	fn string_tensor_content(&self, value: RawHandle, data: &mut [u8], offsets: &mut [usize]) -> NativeResult<()> {
		self.enter("string_tensor_content")?;
		let mut state = self.state.borrow_mut();
		let SimData::Text(items) = &state.tensor_mut(value)?.data else {
			return Err(invalid(format!("value {value:?} is not a string tensor")));
		};

		let total: usize = items.iter().map(String::len).sum();
		if data.len() != total || offsets.len() != items.len() {
			return Err(invalid("string content buffers have the wrong size".to_owned()));
		}

		let mut at = 0;
		for (item, offset) in items.iter().zip(offsets.iter_mut()) {
			*offset = at;
			data[at..at + item.len()].copy_from_slice(item.as_bytes());
			at += item.len();
		}
		Ok(())
	}

	fn value_count(&self, value: RawHandle) -> NativeResult<usize> {
		self.enter("value_count")?;
		match self.state.borrow().value(value)? {
			SimValue::Sequence(items) => Ok(items.len()),
			SimValue::Map { .. } => Ok(2),
			_ => Err(invalid(format!("value {value:?} has no sub-values"))),
		}
	}

	fn sub_value(&self, value: RawHandle, index: usize, allocator: AllocatorRef) -> NativeResult<RawHandle> {
		self.enter("sub_value")?;
		if allocator != self.allocator() {
			return Err(invalid(format!("unknown allocator {allocator:?}")));
		}

		let mut state = self.state.borrow_mut();
		let child = match (state.value(value)?, index) {
			(SimValue::Sequence(items), _) => items.get(index).cloned(),
			(SimValue::Map { keys, .. }, 0) => Some(SimValue::Tensor(keys.clone())),
			(SimValue::Map { values, .. }, 1) => Some(SimValue::Tensor(values.clone())),
			_ => None,
		};
		let child = child.ok_or_else(|| invalid(format!("value {value:?} has no sub-value {index}")))?;
		Ok(state.insert_value(child))
	}

	fn default_allocator(&self) -> NativeResult<AllocatorRef> {
		self.enter("default_allocator")?;
		Ok(self.allocator())
	}

	fn release_value(&self, value: RawHandle) -> NativeResult<()> {
		if let Err(status) = self.enter("release_value") {
			self.state.borrow_mut().stats.failed_releases += 1;
			return Err(status);
		}
		let mut state = self.state.borrow_mut();
		if state.values.remove(&value.addr()).is_none() {
			state.stats.failed_releases += 1;
			return Err(invalid(format!("release of unknown value {value:?}")));
		}
		state.stats.values_released += 1;
		state.release_log.push(value);
		Ok(())
	}
}
