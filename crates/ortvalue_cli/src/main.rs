#![allow(missing_docs)]

use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

mod cmd;
mod error;

#[derive(Parser)]
#[command(name = "ortvalue", about = "Decode native inference output values")]
struct Cli {
	/// Raise log verbosity on stderr (repeat for more).
	#[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
	verbose: u8,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Decode the outputs described by a JSON fixture.
	Decode(cmd::decode::Args),
	/// List decodable element types.
	Types(cmd::types::Args),
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run(command: Commands) -> error::Result<()> {
	match command {
		Commands::Decode(args) => cmd::decode::run(args),
		Commands::Types(args) => cmd::types::run(args),
	}
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => Level::WARN,
		1 => Level::INFO,
		2 => Level::DEBUG,
		_ => Level::TRACE,
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}
