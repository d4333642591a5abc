use std::path::PathBuf;

use ortvalue::output::{DecodeOptions, DecodedValue, Decoder, MapValue, NativeBuffer, Payload, TensorElement, TensorView};
use ortvalue::sim::{HandleStats, SimRuntime};
use ortvalue_testkit::{FixtureError, load_fixture};
use serde_json::Value;
use tracing::{debug, info};

use crate::cmd::util::{emit_json, handle_hex};
use crate::error::{CliError, Result};

/// Output truncation limits for decoded values.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of tensor elements, sequence items, or map entries printed per value.
	pub max_items: usize,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self { max_items: 16 }
	}
}

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
	#[arg(long)]
	pub max_depth: Option<u32>,
	#[arg(long)]
	pub max_items: Option<usize>,
	#[arg(long)]
	pub strict: bool,
}

/// Load a fixture into the simulated engine, decode every output, print it,
/// then dispose and verify that every native handle was released.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		json,
		max_depth,
		max_items,
		strict,
	} = args;

	let fixture_error = |source: FixtureError| CliError::Fixture {
		path: path.display().to_string(),
		source,
	};
	let fixture = load_fixture(&path).map_err(fixture_error)?;
	let sim = SimRuntime::new();
	let outputs = fixture.insert_into(&sim).map_err(fixture_error)?;

	let mut decode_options = if strict { DecodeOptions::strict() } else { DecodeOptions::default() };
	if let Some(max_depth) = max_depth {
		decode_options.max_depth = max_depth;
	}
	let print_options = PrintOptions {
		max_items: max_items.unwrap_or(PrintOptions::default().max_items),
	};

	info!(path = %path.display(), outputs = outputs.len(), "decoding fixture outputs");
	let decoder = Decoder::new(&sim)?.with_options(decode_options);
	// SAFETY: the handles were just created by `sim` and nothing else owns them.
	let mut collection = unsafe { decoder.decode_all(outputs) }?;

	if json {
		let outputs = collection.iter().map(|value| value_json(value, print_options)).collect::<Result<Vec<_>>>()?;
		collection.dispose();
		let stats = sim.stats();
		emit_json(&DecodeJson {
			path: path.display().to_string(),
			outputs,
			handles: handles_json(stats),
		})?;
		return check_balanced(stats);
	}

	println!("path: {}", path.display());
	println!("outputs: {}", collection.len());
	for value in collection.iter() {
		for line in value_lines(value, print_options)? {
			println!("{line}");
		}
	}
	collection.dispose();

	let stats = sim.stats();
	println!(
		"handles: acquired={} released={} live={} failed_releases={}",
		stats.values_acquired,
		stats.values_released,
		stats.live_values(),
		stats.failed_releases
	);
	check_balanced(stats)
}

fn check_balanced(stats: HandleStats) -> Result<()> {
	debug!(?stats, "handle accounting after dispose");
	if stats.is_balanced() {
		return Ok(());
	}
	Err(CliError::Leak {
		live: stats.live_values() + stats.live_infos(),
		failed: stats.failed_releases,
	})
}

/// Render one decoded value as indented text lines.
pub(crate) fn value_lines(value: &DecodedValue<'_>, options: PrintOptions) -> Result<Vec<String>> {
	let mut lines = Vec::new();
	push_value_lines(value, value.name(), 0, options, &mut lines)?;
	Ok(lines)
}

fn push_value_lines(value: &DecodedValue<'_>, label: &str, indent: usize, options: PrintOptions, lines: &mut Vec<String>) -> Result<()> {
	let pad = " ".repeat(indent);
	let handle = value
		.native_handle()
		.map(|handle| format!(" handle={}", handle_hex(handle.raw())))
		.unwrap_or_default();

	match value.payload() {
		Payload::Tensor(view) => {
			lines.push(format!("{pad}{label}: tensor {} {:?}{handle}", view.element_type(), view.shape().dims()));
			let items = tensor_items(view, options.max_items)?;
			lines.push(format!("{pad}  {}", render_items(&items, view.len())));
		}
		Payload::Sequence(sequence) => {
			lines.push(format!("{pad}{label}: sequence len={}{handle}", sequence.len()));
			for (index, item) in sequence.items()?.iter().enumerate().take(options.max_items) {
				push_value_lines(item, &format!("[{index}]"), indent + 2, options, lines)?;
			}
			if sequence.len() > options.max_items {
				lines.push(format!("{pad}  ... {} more", sequence.len() - options.max_items));
			}
		}
		Payload::Map(map) => {
			lines.push(format!("{pad}{label}: map {} -> {} len={}", map.key_type(), map.value_type(), map.len()));
			for entry in map_entries(map, options.max_items) {
				lines.push(format!("{pad}  {} = {}", entry.key, entry.value));
			}
			if map.len() > options.max_items {
				lines.push(format!("{pad}  ... {} more", map.len() - options.max_items));
			}
		}
	}
	Ok(())
}

fn render_items(items: &[Value], len: usize) -> String {
	let body = items.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
	match (len - items.len(), body.is_empty()) {
		(0, _) => format!("[{body}]"),
		(more, true) => format!("[... {more} more]"),
		(more, false) => format!("[{body}, ... {more} more]"),
	}
}

/// Render one decoded value as a JSON tree.
pub(crate) fn value_json(value: &DecodedValue<'_>, options: PrintOptions) -> Result<ValueJson> {
	let payload = match value.payload() {
		Payload::Tensor(view) => PayloadJson::Tensor {
			element_type: view.element_type().name(),
			shape: view.shape().dims().to_vec(),
			len: view.len(),
			data: tensor_items(view, options.max_items)?,
		},
		Payload::Sequence(sequence) => PayloadJson::Sequence {
			len: sequence.len(),
			items: sequence
				.items()?
				.iter()
				.take(options.max_items)
				.map(|item| value_json(item, options))
				.collect::<Result<Vec<_>>>()?,
		},
		Payload::Map(map) => PayloadJson::Map {
			key_type: map.key_type().name(),
			value_type: map.value_type().name(),
			len: map.len(),
			entries: map_entries(map, options.max_items),
		},
	};

	Ok(ValueJson {
		name: value.name().to_owned(),
		handle: value.native_handle().map(|handle| handle_hex(handle.raw())),
		payload,
	})
}

fn tensor_items(view: &TensorView<'_>, limit: usize) -> Result<Vec<Value>> {
	match view {
		TensorView::Float32(buffer) => json_items(buffer, limit),
		TensorView::Float64(buffer) => json_items(buffer, limit),
		TensorView::Int8(buffer) => json_items(buffer, limit),
		TensorView::Int16(buffer) => json_items(buffer, limit),
		TensorView::Int32(buffer) => json_items(buffer, limit),
		TensorView::Int64(buffer) => json_items(buffer, limit),
		TensorView::UInt8(buffer) => json_items(buffer, limit),
		TensorView::UInt16(buffer) => json_items(buffer, limit),
		TensorView::UInt32(buffer) => json_items(buffer, limit),
		TensorView::UInt64(buffer) => json_items(buffer, limit),
		TensorView::Bool(buffer) => json_items(buffer, limit),
		TensorView::Text(buffer) => json_items(buffer, limit),
	}
}

fn json_items<T>(buffer: &NativeBuffer<'_, T>, limit: usize) -> Result<Vec<Value>>
where
	T: TensorElement + serde::Serialize,
{
	// Non-finite floats have no JSON number form and become null.
	Ok(buffer
		.as_slice()?
		.iter()
		.take(limit)
		.map(|item| serde_json::to_value(item).unwrap_or_default())
		.collect())
}

fn map_entries(map: &MapValue, limit: usize) -> Vec<MapEntryJson> {
	match map {
		MapValue::Int64(entries) => entries
			.iter()
			.take(limit)
			.map(|(key, value)| MapEntryJson {
				key: Value::from(*key),
				value: *value,
			})
			.collect(),
		MapValue::Text(entries) => entries
			.iter()
			.take(limit)
			.map(|(key, value)| MapEntryJson {
				key: Value::from(key.as_str()),
				value: *value,
			})
			.collect(),
	}
}

fn handles_json(stats: HandleStats) -> HandlesJson {
	HandlesJson {
		acquired: stats.values_acquired,
		released: stats.values_released,
		live: stats.live_values(),
		infos_acquired: stats.infos_acquired,
		infos_released: stats.infos_released,
		failed_releases: stats.failed_releases,
	}
}

#[derive(serde::Serialize)]
pub(crate) struct ValueJson {
	#[serde(skip_serializing_if = "String::is_empty")]
	name: String,
	handle: Option<String>,
	#[serde(flatten)]
	payload: PayloadJson,
}

#[derive(serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PayloadJson {
	Tensor {
		element_type: &'static str,
		shape: Vec<usize>,
		len: usize,
		data: Vec<Value>,
	},
	Sequence {
		len: usize,
		items: Vec<ValueJson>,
	},
	Map {
		key_type: &'static str,
		value_type: &'static str,
		len: usize,
		entries: Vec<MapEntryJson>,
	},
}

#[derive(serde::Serialize)]
struct MapEntryJson {
	key: Value,
	value: f32,
}

#[derive(serde::Serialize)]
struct HandlesJson {
	acquired: usize,
	released: usize,
	live: usize,
	infos_acquired: usize,
	infos_released: usize,
	failed_releases: usize,
}

#[derive(serde::Serialize)]
struct DecodeJson {
	path: String,
	outputs: Vec<ValueJson>,
	handles: HandlesJson,
}
