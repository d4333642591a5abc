use crate::output::{AllocatorRef, DecodeOptions, DecodedValue, Decoder, ElementType, OrtValueError, ValueKind};
use crate::sim::{SimRuntime, SimTensor, SimValue};

fn decode<'a>(sim: &'a SimRuntime, value: impl Into<SimValue>) -> crate::output::Result<DecodedValue<'a>> {
	let decoder = Decoder::new(sim).expect("decoder");
	let raw = sim.insert(value);
	// SAFETY: freshly inserted handle, owned by nobody else.
	unsafe { decoder.decode("out", raw) }
}

#[test]
fn every_element_type_decodes_with_shape_product_length() {
	let sim = SimRuntime::new();
	let dims = [2, 3];
	let cases = [
		(SimValue::tensor(&dims, &[0.5_f32; 6]), ElementType::Float32),
		(SimValue::tensor(&dims, &[0.5_f64; 6]), ElementType::Float64),
		(SimValue::tensor(&dims, &[-1_i8; 6]), ElementType::Int8),
		(SimValue::tensor(&dims, &[-1_i16; 6]), ElementType::Int16),
		(SimValue::tensor(&dims, &[-1_i32; 6]), ElementType::Int32),
		(SimValue::tensor(&dims, &[-1_i64; 6]), ElementType::Int64),
		(SimValue::tensor(&dims, &[1_u8; 6]), ElementType::UInt8),
		(SimValue::tensor(&dims, &[1_u16; 6]), ElementType::UInt16),
		(SimValue::tensor(&dims, &[1_u32; 6]), ElementType::UInt32),
		(SimValue::tensor(&dims, &[1_u64; 6]), ElementType::UInt64),
		(SimValue::tensor(&dims, &[true; 6]), ElementType::Bool),
		(SimValue::text(&dims, &["a", "b", "c", "d", "e", "f"]), ElementType::Text),
	];

	for (value, expected) in cases {
		let mut decoded = decode(&sim, value).expect("tensor decodes");
		assert_eq!(decoded.kind(), ValueKind::Tensor);
		assert_eq!(decoded.element_type(), Some(expected));
		let view = decoded.as_tensor().expect("tensor payload");
		assert_eq!(view.len(), 6, "{expected}");
		assert_eq!(view.shape().dims(), &[2, 3]);
		decoded.dispose();
	}
	assert!(sim.stats().is_balanced());
}

#[test]
fn typed_access_matches_native_contents() {
	let sim = SimRuntime::new();
	let decoded = decode(&sim, SimValue::tensor(&[3], &[1.5_f32, -2.0, 4.25])).expect("tensor decodes");

	let buffer = decoded.tensor::<f32>().expect("float32 buffer");
	assert_eq!(buffer.as_slice().expect("live"), &[1.5, -2.0, 4.25]);
	assert!(matches!(
		decoded.tensor::<i64>(),
		Err(OrtValueError::TypeMismatch {
			expected: ElementType::Int64,
			got: ElementType::Float32
		})
	));
}

#[test]
fn symbolic_dimension_is_rejected_and_released() {
	let sim = SimRuntime::new();
	let err = decode(&sim, SimTensor::new(&[-1, 4], &[0.0_f32; 4])).expect_err("symbolic shape");

	assert!(matches!(err, OrtValueError::UnsupportedShape { element_count: -1, .. }));
	assert!(sim.stats().is_balanced());
}

#[test]
fn implausible_rank_is_rejected_before_reading_dims() {
	let sim = SimRuntime::new();
	let err = decode(&sim, SimTensor::new(&[1; 65], &[0.0_f32])).expect_err("rank above ceiling");

	assert!(matches!(err, OrtValueError::UnsupportedShape { element_count: 1, .. }));
	assert_eq!(sim.stats().infos_acquired, 1);
	assert!(sim.stats().is_balanced());
}

#[test]
fn sequence_dispose_releases_children_then_container() {
	let sim = SimRuntime::new();
	let container = sim.insert(SimValue::sequence(vec![
		SimValue::tensor(&[1], &[1.0_f32]),
		SimValue::tensor(&[1], &[2.0_f32]),
		SimValue::tensor(&[1], &[3.0_f32]),
	]));
	let decoder = Decoder::new(&sim).expect("decoder");
	// SAFETY: freshly inserted handle, owned by nobody else.
	let mut decoded = unsafe { decoder.decode("seq", container) }.expect("sequence decodes");

	let sequence = decoded.as_sequence().expect("sequence payload");
	assert_eq!(sequence.len(), 3);
	let children: Vec<_> = sequence
		.items()
		.expect("live")
		.iter()
		.map(|item| item.native_handle().expect("tensor handle").raw())
		.collect();
	let last = sequence.get(2).expect("third").tensor::<f32>().expect("float32");
	assert_eq!(last.as_slice().expect("live"), &[3.0]);
	assert_eq!(sim.stats().live_values(), 4);

	decoded.dispose();
	let log = sim.release_log();
	assert_eq!(log.len(), 4);
	assert_eq!(log, vec![children[2], children[1], children[0], container]);
	assert!(sim.stats().is_balanced());

	decoded.dispose();
	assert_eq!(sim.release_log().len(), 4);
}

#[test]
fn int64_map_is_materialised_and_released() {
	let sim = SimRuntime::new();
	let decoded = decode(&sim, SimValue::map(SimTensor::new(&[3], &[1_i64, 2, 3]), SimTensor::new(&[3], &[0.1_f32, 0.2, 0.3]))).expect("map decodes");

	let map = decoded.as_map().expect("map payload").as_int64().expect("int64 keys");
	assert_eq!(map.len(), 3);
	assert_eq!(map[&1], 0.1);
	assert_eq!(map[&2], 0.2);
	assert_eq!(map[&3], 0.3);

	let stats = sim.stats();
	assert_eq!(stats.values_acquired, 3);
	assert_eq!(stats.values_released, 3);
	assert!(stats.is_balanced());
	assert!(decoded.native_handle().is_none());
}

#[test]
fn text_keyed_map_decodes() {
	let sim = SimRuntime::new();
	let decoded = decode(&sim, SimValue::map(SimTensor::text(&[2], &["cat", "dog"]), SimTensor::new(&[2], &[0.75_f32, 0.25]))).expect("map decodes");

	let map = decoded.as_map().expect("map payload");
	assert_eq!(map.key_type(), ElementType::Text);
	let entries = map.as_text().expect("text keys");
	assert_eq!(entries["cat"], 0.75);
	assert_eq!(entries["dog"], 0.25);
	assert!(sim.stats().is_balanced());
}

#[test]
fn map_with_unsupported_key_or_value_type_fails_cleanly() {
	let sim = SimRuntime::new();

	let err = decode(&sim, SimValue::map(SimTensor::new(&[1], &[1.0_f32]), SimTensor::new(&[1], &[1.0_f32]))).expect_err("float keys");
	assert!(matches!(err, OrtValueError::UnsupportedElementType { raw: 1, context: "map key" }));

	let err = decode(&sim, SimValue::map(SimTensor::new(&[1], &[1_i64]), SimTensor::new(&[1], &[1_i64]))).expect_err("int64 values");
	assert!(matches!(err, OrtValueError::UnsupportedElementType { raw: 7, context: "map value" }));

	assert!(sim.stats().is_balanced());
}

#[test]
fn malformed_maps_are_rejected() {
	let sim = SimRuntime::new();

	let err = decode(&sim, SimValue::map(SimTensor::new(&[3], &[1_i64, 2, 3]), SimTensor::new(&[2], &[0.1_f32, 0.2]))).expect_err("length mismatch");
	assert!(matches!(err, OrtValueError::MapLengthMismatch { keys: 3, values: 2 }));

	let err = decode(&sim, SimValue::map(SimTensor::new(&[2], &[1_i64, 1]), SimTensor::new(&[2], &[0.1_f32, 0.2]))).expect_err("duplicate key");
	assert!(matches!(err, OrtValueError::DuplicateMapKey { ref key } if key == "1"));

	assert!(sim.stats().is_balanced());
}

#[test]
fn unsupported_kind_is_released() {
	let sim = SimRuntime::new();
	let err = decode(&sim, SimValue::Opaque).expect_err("opaque kind");

	assert!(matches!(err, OrtValueError::UnsupportedValueKind { raw: 4 }));
	assert!(sim.stats().is_balanced());
}

#[test]
fn depth_counts_every_value_level() {
	let sim = SimRuntime::new();
	let with_depth = |max_depth| {
		Decoder::new(&sim).expect("decoder").with_options(DecodeOptions {
			max_depth,
			..DecodeOptions::default()
		})
	};
	let tensors = SimValue::sequence(vec![SimValue::tensor(&[1], &[1_u8])]);

	let raw = sim.insert(SimValue::tensor(&[1], &[1_u8]));
	// SAFETY: freshly inserted handle, owned by nobody else.
	let mut bare = unsafe { with_depth(1).decode("bare", raw) }.expect("top level is depth 0");
	bare.dispose();

	let raw = sim.insert(tensors.clone());
	// SAFETY: freshly inserted handle, owned by nobody else.
	let err = unsafe { with_depth(1).decode("seq", raw) }.expect_err("items sit at depth 1");
	assert!(matches!(err, OrtValueError::DecodeDepthExceeded { max_depth: 1 }));

	let raw = sim.insert(tensors);
	// SAFETY: freshly inserted handle, owned by nobody else.
	let mut seq = unsafe { with_depth(2).decode("seq", raw) }.expect("sequence of tensors fits depth 2");
	assert_eq!(seq.as_sequence().expect("sequence").len(), 1);
	seq.dispose();

	assert!(sim.stats().is_balanced());
}

#[test]
fn nesting_and_length_limits_apply() {
	let sim = SimRuntime::new();
	let nested = SimValue::sequence(vec![SimValue::sequence(vec![SimValue::tensor(&[1], &[1_u8])])]);

	let decoder = Decoder::new(&sim).expect("decoder").with_options(DecodeOptions {
		max_depth: 2,
		..DecodeOptions::default()
	});
	let raw = sim.insert(nested.clone());
	// SAFETY: freshly inserted handle, owned by nobody else.
	let err = unsafe { decoder.decode("deep", raw) }.expect_err("too deep");
	assert!(matches!(err, OrtValueError::DecodeDepthExceeded { max_depth: 2 }));

	let decoder = Decoder::new(&sim).expect("decoder").with_options(DecodeOptions {
		max_sequence_len: 2,
		..DecodeOptions::default()
	});
	let raw = sim.insert(SimValue::sequence(vec![SimValue::tensor(&[1], &[1_u8]); 3]));
	// SAFETY: freshly inserted handle, owned by nobody else.
	let err = unsafe { decoder.decode("long", raw) }.expect_err("too long");
	assert!(matches!(err, OrtValueError::SequenceTooLong { count: 3, max: 2 }));

	let decoder = Decoder::new(&sim).expect("decoder");
	let raw = sim.insert(nested);
	// SAFETY: freshly inserted handle, owned by nobody else.
	let mut decoded = unsafe { decoder.decode("ok", raw) }.expect("within default limits");
	decoded.dispose();

	assert!(sim.stats().is_balanced());
}

#[test]
fn native_failures_release_partial_work() {
	let sim = SimRuntime::new();

	sim.fail_next("value_kind");
	let err = decode(&sim, SimValue::tensor(&[1], &[1_i32])).expect_err("injected failure");
	assert!(matches!(err, OrtValueError::NativeCall { call: "value_kind", .. }));

	let decoder = Decoder::new(&sim).expect("decoder");
	let raw = sim.insert(SimValue::sequence(vec![SimValue::tensor(&[1], &[1_i32]), SimValue::tensor(&[1], &[2_i32])]));
	sim.fail_next("element_count");
	// SAFETY: freshly inserted handle, owned by nobody else.
	let err = unsafe { decoder.decode("seq", raw) }.expect_err("injected failure");
	assert!(matches!(err, OrtValueError::NativeCall { call: "element_count", .. }));

	sim.fail_next("string_tensor_content");
	let err = decode(&sim, SimValue::text(&[2], &["x", "y"])).expect_err("injected failure");
	assert!(matches!(err, OrtValueError::NativeCall { call: "string_tensor_content", .. }));

	assert!(sim.stats().is_balanced());
}

#[test]
fn foreign_allocator_is_reported() {
	let sim = SimRuntime::new();
	let decoder = Decoder::with_allocator(&sim, AllocatorRef::null());
	let raw = sim.insert(SimValue::sequence(vec![SimValue::tensor(&[1], &[1_i32])]));

	// SAFETY: freshly inserted handle, owned by nobody else.
	let err = unsafe { decoder.decode("seq", raw) }.expect_err("unknown allocator");
	assert!(matches!(err, OrtValueError::NativeCall { call: "sub_value", .. }));
	assert!(sim.stats().is_balanced());

	sim.fail_next("default_allocator");
	assert!(Decoder::new(&sim).is_err());
}

#[test]
fn decode_all_keeps_order_and_releases_on_failure() {
	let sim = SimRuntime::new();
	let decoder = Decoder::new(&sim).expect("decoder");

	let outputs = [
		("label", sim.insert(SimValue::tensor(&[1], &[3_i64]))),
		("scores", sim.insert(SimValue::tensor(&[2], &[0.2_f32, 0.8]))),
	];
	// SAFETY: freshly inserted handles, owned by nobody else.
	let mut collection = unsafe { decoder.decode_all(outputs) }.expect("both decode");
	assert_eq!(collection.names().collect::<Vec<_>>(), vec!["label", "scores"]);
	collection.dispose();
	assert!(sim.stats().is_balanced());

	let outputs = vec![
		("a".to_owned(), sim.insert(SimValue::tensor(&[1], &[1_i64]))),
		("b".to_owned(), sim.insert(SimValue::Opaque)),
		("c".to_owned(), sim.insert(SimValue::tensor(&[1], &[2_i64]))),
	];
	// SAFETY: freshly inserted handles, owned by nobody else.
	let err = unsafe { decoder.decode_all(outputs) }.expect_err("opaque output");
	assert!(matches!(err, OrtValueError::UnsupportedValueKind { raw: 4 }));
	let stats = sim.stats();
	assert_eq!(stats.live_values(), 0);
	assert!(stats.is_balanced());
}

#[test]
fn disposed_value_refuses_reads() {
	let sim = SimRuntime::new();
	let raw = sim.insert(SimValue::tensor(&[2], &[1_u16, 2]));
	let decoder = Decoder::new(&sim).expect("decoder");
	// SAFETY: freshly inserted handle, owned by nobody else.
	let mut decoded = unsafe { decoder.decode("out", raw) }.expect("tensor decodes");

	assert_eq!(decoded.native_handle().expect("live handle").raw(), raw);
	decoded.dispose();
	assert!(decoded.is_disposed());
	assert!(decoded.native_handle().is_none());
	assert!(!sim.is_live(raw));

	let buffer = decoded.tensor::<u16>().expect("typed view survives disposal");
	assert!(matches!(buffer.as_slice(), Err(OrtValueError::UseAfterDispose { .. })));

	let decoded = decode(&sim, SimValue::sequence(Vec::new())).expect("empty sequence");
	assert!(matches!(
		decoded.tensor::<u16>(),
		Err(OrtValueError::KindMismatch {
			expected: ValueKind::Tensor,
			got: ValueKind::Sequence
		})
	));
}
