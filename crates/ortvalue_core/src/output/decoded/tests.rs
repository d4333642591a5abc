use crate::output::{ElementType, MapValue, OrtValueError};

#[test]
fn zip_pairs_by_position() {
	let map = MapValue::zip([3_i64, 1, 2].into_iter(), &[0.3, 0.1, 0.2]).expect("keys are unique");
	assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![(1, 0.1), (2, 0.2), (3, 0.3)]);
}

#[test]
fn zip_rejects_length_mismatch() {
	let err = MapValue::zip([1_i64, 2].into_iter(), &[0.5]).expect_err("lengths differ");
	assert!(matches!(err, OrtValueError::MapLengthMismatch { keys: 2, values: 1 }));
}

#[test]
fn zip_rejects_duplicate_keys() {
	let keys = ["a".to_owned(), "b".to_owned(), "a".to_owned()];
	let err = MapValue::zip(keys.into_iter(), &[1.0, 2.0, 3.0]).expect_err("duplicate key");
	let OrtValueError::DuplicateMapKey { key } = err else {
		panic!("expected duplicate key error, got {err:?}");
	};
	assert_eq!(key, "a");
}

#[test]
fn map_reports_key_and_value_types() {
	let map = MapValue::Text(MapValue::zip(["x".to_owned()].into_iter(), &[1.0]).expect("single entry"));
	assert_eq!(map.key_type(), ElementType::Text);
	assert_eq!(map.value_type(), ElementType::Float32);
	assert_eq!(map.len(), 1);
	assert!(map.as_int64().is_none());
	assert_eq!(map.as_text().and_then(|items| items.get("x")).copied(), Some(1.0));
}
