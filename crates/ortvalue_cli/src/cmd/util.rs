use ortvalue::output::RawHandle;

use crate::error::Result;

/// Encode a serializable payload as pretty JSON.
pub(crate) fn json_text<T: serde::Serialize>(payload: &T) -> Result<String> {
	Ok(serde_json::to_string_pretty(payload)?)
}

/// Print a serializable payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) -> Result<()> {
	println!("{}", json_text(payload)?);
	Ok(())
}

/// Render a native handle address as `0x`-prefixed hex.
pub(crate) fn handle_hex(handle: RawHandle) -> String {
	format!("0x{:x}", handle.addr())
}
