use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use strand_bytecode::{Archive, ByteCode};

/// Disassemble a serialized instruction stream.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a serialized bytecode stream.
    path: PathBuf,

    /// Print only the entry table.
    #[arg(long)]
    entries: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let data = match fs::read(&args.path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("{}: {err}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut code = ByteCode::new();
    if let Err(err) = code.serialize(&mut Archive::loading(&data)) {
        eprintln!("{}: {err}", args.path.display());
        return ExitCode::FAILURE;
    }

    for index in 0..code.num_entries() {
        let entry = code.entry(index);
        println!("{}: instruction {}", entry.name, entry.instruction_index);
    }
    if !args.entries {
        print!("{}", code.dump());
    }
    ExitCode::SUCCESS
}
