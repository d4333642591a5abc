use std::path::Path;

use ortvalue::output::{ElementType, RawHandle};
use ortvalue::sim::{SimRuntime, SimScalar, SimTensor, SimValue};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors produced while loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
	/// Fixture file could not be read.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Fixture is not valid JSON for the fixture schema.
	#[error("invalid fixture: {0}")]
	Json(#[from] serde_json::Error),
	/// Element type name is not recognised.
	#[error("unknown element type {name:?}")]
	UnknownElementType {
		/// Name as written in the fixture.
		name: String,
	},
	/// Tensor data does not match its element type.
	#[error("invalid {element_type} data: {source}")]
	Data {
		/// Declared element type.
		element_type: ElementType,
		/// Underlying conversion error.
		source: serde_json::Error,
	},
}

/// Named outputs of one simulated inference run.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
	/// Outputs in engine order.
	pub outputs: Vec<NamedOutput>,
}

/// One named output.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedOutput {
	/// Output name.
	pub name: String,
	/// Output value.
	pub value: ValueFixture,
}

/// Value description keyed by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueFixture {
	/// Dense tensor.
	Tensor(TensorFixture),
	/// Ordered sequence of values.
	Sequence {
		/// Sequence elements.
		items: Vec<ValueFixture>,
	},
	/// Map given as parallel key and value tensors.
	Map {
		/// Keys tensor.
		keys: TensorFixture,
		/// Values tensor.
		values: TensorFixture,
	},
	/// Value of a kind the decoder does not support.
	Opaque,
}

/// Tensor description.
#[derive(Debug, Clone, Deserialize)]
pub struct TensorFixture {
	/// Element type name, or a raw tag whose `data` holds raw bytes.
	pub element_type: FixtureElementType,
	/// Dimensions; negative entries are symbolic.
	pub shape: Vec<i64>,
	/// Elements in row-major order.
	#[serde(default)]
	pub data: Vec<Value>,
	/// Element count reported instead of the shape product.
	#[serde(default)]
	pub element_count: Option<i64>,
}

/// Element type as a name (`"float32"`) or a raw engine tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FixtureElementType {
	/// Decodable element type name.
	Name(String),
	/// Raw engine tag.
	Code(i32),
}

impl Fixture {
	/// Parse a fixture from JSON text.
	pub fn from_json(text: &str) -> Result<Self, FixtureError> {
		Ok(serde_json::from_str(text)?)
	}

	/// Store every output in `sim`, returning owned handles in order.
	pub fn insert_into(&self, sim: &SimRuntime) -> Result<Vec<(String, RawHandle)>, FixtureError> {
		let values = self
			.outputs
			.iter()
			.map(|output| output.value.to_sim().map(|value| (output.name.clone(), value)))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(values.into_iter().map(|(name, value)| (name, sim.insert(value))).collect())
	}
}

/// Read and parse a fixture file.
pub fn load_fixture(path: &Path) -> Result<Fixture, FixtureError> {
	let text = std::fs::read_to_string(path)?;
	Fixture::from_json(&text)
}

impl ValueFixture {
	/// Build the simulated engine value.
	pub fn to_sim(&self) -> Result<SimValue, FixtureError> {
		Ok(match self {
			Self::Tensor(tensor) => SimValue::Tensor(tensor.to_sim()?),
			Self::Sequence { items } => SimValue::sequence(items.iter().map(Self::to_sim).collect::<Result<Vec<_>, _>>()?),
			Self::Map { keys, values } => SimValue::map(keys.to_sim()?, values.to_sim()?),
			Self::Opaque => SimValue::opaque(),
		})
	}
}

impl TensorFixture {
	/// Build the simulated engine tensor.
	pub fn to_sim(&self) -> Result<SimTensor, FixtureError> {
		let dims = &self.shape;
		let tensor = match &self.element_type {
			FixtureElementType::Code(code) => SimTensor::raw(*code, dims, &self.parse::<u8>(ElementType::UInt8)?),
			FixtureElementType::Name(name) => {
				let element_type: ElementType = name.parse().map_err(|_| FixtureError::UnknownElementType { name: name.clone() })?;
				match element_type {
					ElementType::Float32 => self.fixed::<f32>(element_type)?,
					ElementType::Float64 => self.fixed::<f64>(element_type)?,
					ElementType::Int8 => self.fixed::<i8>(element_type)?,
					ElementType::Int16 => self.fixed::<i16>(element_type)?,
					ElementType::Int32 => self.fixed::<i32>(element_type)?,
					ElementType::Int64 => self.fixed::<i64>(element_type)?,
					ElementType::UInt8 => self.fixed::<u8>(element_type)?,
					ElementType::UInt16 => self.fixed::<u16>(element_type)?,
					ElementType::UInt32 => self.fixed::<u32>(element_type)?,
					ElementType::UInt64 => self.fixed::<u64>(element_type)?,
					ElementType::Bool => self.fixed::<bool>(element_type)?,
					ElementType::Text => {
						let items = self.parse::<String>(element_type)?;
						let items: Vec<&str> = items.iter().map(String::as_str).collect();
						SimTensor::text(dims, &items)
					}
				}
			}
		};

		Ok(match self.element_count {
			Some(count) => tensor.with_element_count(count),
			None => tensor,
		})
	}

	fn fixed<T>(&self, element_type: ElementType) -> Result<SimTensor, FixtureError>
	where
		T: SimScalar + for<'de> Deserialize<'de>,
	{
		Ok(SimTensor::new(&self.shape, &self.parse::<T>(element_type)?))
	}

	fn parse<T>(&self, element_type: ElementType) -> Result<Vec<T>, FixtureError>
	where
		T: for<'de> Deserialize<'de>,
	{
		self.data
			.iter()
			.map(|item| T::deserialize(item).map_err(|source| FixtureError::Data { element_type, source }))
			.collect()
	}
}
