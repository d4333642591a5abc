use ortvalue::output::{Decoder, DisposableCollection};
use ortvalue::sim::SimRuntime;
use ortvalue_testkit::{fixture_path, load_fixture};

/// Decode every output of a workspace fixture into `sim`.
pub(crate) fn decode_fixture<'a>(sim: &'a SimRuntime, name: &str) -> DisposableCollection<'a> {
	let fixture = load_fixture(&fixture_path(name)).expect("fixture loads");
	let outputs = fixture.insert_into(sim).expect("fixture converts");
	let decoder = Decoder::new(sim).expect("decoder");
	// SAFETY: freshly inserted handles, owned by nobody else.
	unsafe { decoder.decode_all(outputs) }.expect("fixture outputs decode")
}
