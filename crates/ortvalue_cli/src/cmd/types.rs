use ortvalue::output::ElementType;

use crate::cmd::util::emit_json;
use crate::error::Result;

#[derive(clap::Args)]
pub struct Args {
	#[arg(long)]
	pub json: bool,
}

/// Print every decodable element type with its engine tag and width.
pub fn run(args: Args) -> Result<()> {
	if args.json {
		let payload = TypesJson {
			element_types: ElementType::ALL
				.into_iter()
				.map(|item| ElementTypeJson {
					name: item.name(),
					code: item.raw(),
					width: item.width(),
				})
				.collect(),
		};
		return emit_json(&payload);
	}

	for item in ElementType::ALL {
		let width = item.width().map_or_else(|| "variable".to_owned(), |width| format!("{width} byte(s)"));
		println!("{:>3}  {:<8} {width}", item.raw(), item.name());
	}
	Ok(())
}

#[derive(serde::Serialize)]
struct ElementTypeJson {
	name: &'static str,
	code: i32,
	width: Option<usize>,
}

#[derive(serde::Serialize)]
struct TypesJson {
	element_types: Vec<ElementTypeJson>,
}
