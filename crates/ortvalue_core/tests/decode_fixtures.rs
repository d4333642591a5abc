#![allow(missing_docs)]

use ortvalue::output::{DecodeOptions, Decoder, DisposableCollection, ElementType, OrtValueError, ValueKind};
use ortvalue::sim::SimRuntime;
use ortvalue_testkit::{Fixture, fixture_path, load_fixture};

fn decode_fixture<'a>(sim: &'a SimRuntime, fixture: &Fixture) -> Result<DisposableCollection<'a>, OrtValueError> {
	let outputs = fixture.insert_into(sim).expect("fixture converts");
	let decoder = Decoder::new(sim)?;
	// SAFETY: freshly inserted handles, owned by nobody else.
	unsafe { decoder.decode_all(outputs) }
}

fn load(name: &str) -> Fixture {
	load_fixture(&fixture_path(name)).expect("fixture loads")
}

#[test]
fn classifier_outputs_decode_in_order() {
	let sim = SimRuntime::new();
	let mut outputs = decode_fixture(&sim, &load("classifier_outputs.json")).expect("outputs decode");

	assert_eq!(outputs.names().collect::<Vec<_>>(), vec!["label", "probabilities", "scores"]);

	let label = outputs.get_by_name("label").expect("label");
	assert_eq!(label.tensor::<i64>().expect("int64 label").to_vec().expect("live"), vec![2]);

	let probabilities = outputs.get_by_name("probabilities").expect("probabilities");
	assert_eq!(probabilities.kind(), ValueKind::Sequence);
	let sequence = probabilities.as_sequence().expect("sequence payload");
	let map = sequence.get(0).expect("first item").as_map().expect("map payload");
	let entries = map.as_int64().expect("int64 keys");
	assert_eq!(entries.iter().map(|(key, value)| (*key, *value)).collect::<Vec<_>>(), vec![(0, 0.125), (1, 0.25), (2, 0.625)]);

	let scores = outputs.get_by_name("scores").expect("scores").tensor::<f32>().expect("float32 scores");
	assert_eq!(scores.dimensions(), &[1, 3]);
	assert_eq!(scores.rank(), 2);
	assert_eq!(scores.element_width(), 4);
	assert_eq!(scores.as_slice().expect("live"), &[0.5, -1.25, 3.0]);

	// label, sequence container and scores stay live; the map is already copied out.
	assert_eq!(sim.stats().live_values(), 3);
	outputs.dispose();
	assert!(sim.stats().is_balanced());
}

#[test]
fn text_and_narrow_types_read_back() {
	let sim = SimRuntime::new();
	let outputs = decode_fixture(&sim, &load("text_outputs.json")).expect("outputs decode");

	let tokens = outputs.get_by_name("tokens").expect("tokens");
	assert_eq!(tokens.element_type(), Some(ElementType::Text));
	let tokens = tokens.tensor::<String>().expect("text tensor");
	assert_eq!(tokens.as_slice().expect("live"), &["the", "cat", "sat", ""]);
	assert!(tokens.element_width() > 0);

	let mask = outputs.get_by_name("mask").expect("mask").tensor::<bool>().expect("bool tensor");
	assert_eq!(mask.as_slice().expect("live"), &[true, false, true, true]);

	let ids = outputs.get_by_name("ids").expect("ids").tensor::<u16>().expect("uint16 tensor");
	assert_eq!(ids.as_slice().expect("live"), &[1, u16::MAX]);

	let categories = outputs.get_by_name("categories").expect("categories");
	let map = categories.as_sequence().expect("sequence").get(0).expect("first").as_map().expect("map");
	assert_eq!(map.as_text().expect("text keys").get("dog"), Some(&0.125));

	drop(outputs);
	assert!(sim.stats().is_balanced());
}

#[test]
fn failure_part_way_releases_earlier_outputs() {
	let sim = SimRuntime::new();
	let err = decode_fixture(&sim, &load("symbolic_shape.json")).expect_err("symbolic dimension");

	assert!(matches!(err, OrtValueError::UnsupportedShape { .. }));
	let stats = sim.stats();
	assert_eq!(stats.values_acquired, 2);
	assert!(stats.is_balanced());
}

#[test]
fn taken_output_outlives_its_collection() {
	let sim = SimRuntime::new();
	let mut outputs = decode_fixture(&sim, &load("classifier_outputs.json")).expect("outputs decode");

	let mut scores = outputs.take("scores").expect("scores present");
	drop(outputs);
	assert_eq!(sim.stats().live_values(), 1);
	assert_eq!(scores.tensor::<f32>().expect("float32").get(2).copied().expect("in range"), 3.0);

	scores.dispose();
	assert!(sim.stats().is_balanced());
}

#[test]
fn raw_unsupported_element_type_is_rejected() {
	let fixture = Fixture::from_json(
		r#"{"outputs": [{"name": "half", "value": {"kind": "tensor", "element_type": 10, "shape": [2], "data": [0, 60, 0, 60]}}]}"#,
	)
	.expect("fixture parses");

	let sim = SimRuntime::new();
	let err = decode_fixture(&sim, &fixture).expect_err("float16 is not decodable");
	assert!(matches!(err, OrtValueError::UnsupportedElementType { raw: 10, context: "tensor" }));
	assert!(sim.stats().is_balanced());
}

#[test]
fn strict_options_bound_nesting() {
	let sim = SimRuntime::new();
	let fixture = load("nested_sequences.json");
	let outputs = fixture.insert_into(&sim).expect("fixture converts");
	let decoder = Decoder::new(&sim).expect("decoder").with_options(DecodeOptions {
		max_depth: 1,
		..DecodeOptions::strict()
	});
	assert_eq!(decoder.options().max_sequence_len, 4096);

	// SAFETY: freshly inserted handles, owned by nobody else.
	let err = unsafe { decoder.decode_all(outputs) }.expect_err("nesting exceeds depth 1");
	assert!(matches!(err, OrtValueError::DecodeDepthExceeded { max_depth: 1 }));
	assert!(sim.stats().is_balanced());
}
