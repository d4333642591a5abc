use crate::output::native::NativeResultExt;
use crate::output::{ElementType, NativeApi, OrtValueError, RawHandle, RawTypeShape, Result, Shape};

/// Highest tensor rank accepted from the engine.
const MAX_RANK: usize = 64;

/// Scoped type-and-shape query, released on every exit path.
struct TypeShapeGuard<'a> {
	api: &'a dyn NativeApi,
	info: RawTypeShape,
}

impl<'a> TypeShapeGuard<'a> {
	fn acquire(api: &'a dyn NativeApi, value: RawHandle) -> Result<Self> {
		let info = api.tensor_type_and_shape(value).call("tensor_type_and_shape")?;
		Ok(Self { api, info })
	}
}

impl Drop for TypeShapeGuard<'_> {
	fn drop(&mut self) {
		self.api.release_type_and_shape(self.info);
	}
}

/// Element type and validated shape of one tensor value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
	/// Element type tag.
	pub element_type: ElementType,
	/// Concrete shape.
	pub shape: Shape,
}

impl TensorInfo {
	/// Read element type and shape of a tensor value.
	///
	/// `context` names the decode position for unsupported element types.
	pub fn query(api: &dyn NativeApi, value: RawHandle, context: &'static str) -> Result<Self> {
		let guard = TypeShapeGuard::acquire(api, value)?;
		let element_type = ElementType::from_raw(api.element_type(guard.info).call("element_type")?, context)?;

		let rank = api.dimension_count(guard.info).call("dimension_count")?;
		let element_count = api.element_count(guard.info).call("element_count")?;
		if rank > MAX_RANK {
			return Err(OrtValueError::UnsupportedShape {
				dims: Vec::new(),
				element_count,
			});
		}
		let mut dims = vec![0_i64; rank];
		api.dimensions(guard.info, &mut dims).call("dimensions")?;
		let shape = Shape::from_native(&dims, element_count)?;

		Ok(Self { element_type, shape })
	}
}
