/// Fixture decode command.
pub mod decode;
/// Element type listing command.
pub mod types;

mod util;

#[cfg(test)]
mod test_support;
