use crate::output::{OrtValueError, Result};

/// Validated, fully concrete tensor shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
	dims: Box<[usize]>,
	element_count: usize,
}

impl Shape {
	/// Validate engine-reported dimensions against the reported element count.
	///
	/// Negative dimensions (symbolic), a negative count, or a count that is not
	/// the product of the dimensions are all rejected.
	pub fn from_native(dims: &[i64], element_count: i64) -> Result<Self> {
		let unsupported = || OrtValueError::UnsupportedShape {
			dims: dims.to_vec(),
			element_count,
		};

		let count = usize::try_from(element_count).map_err(|_| unsupported())?;
		let mut product = 1_usize;
		let mut out = Vec::with_capacity(dims.len());
		for dim in dims {
			let dim = usize::try_from(*dim).map_err(|_| unsupported())?;
			product = product.checked_mul(dim).ok_or_else(unsupported)?;
			out.push(dim);
		}
		if product != count {
			return Err(unsupported());
		}

		Ok(Self {
			dims: out.into_boxed_slice(),
			element_count: count,
		})
	}

	/// Dimension sizes, outermost first.
	pub fn dims(&self) -> &[usize] {
		&self.dims
	}

	/// Number of dimensions.
	pub fn rank(&self) -> usize {
		self.dims.len()
	}

	/// Product of all dimensions.
	pub fn element_count(&self) -> usize {
		self.element_count
	}
}
