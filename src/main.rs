//! CLI entry point: `stackasm <bytecode-file>`, emitting `exe.asm` in the
//! current directory.

use std::path::Path;

use stackasm::codegen;
use stackasm::emitter;
use stackasm::error::TranslateError;
use stackasm::program::load_program;

fn main() {
    let mut args = std::env::args();
    let program_name = args.next().unwrap_or_else(|| "stackasm".to_string());

    let Some(path) = args.next() else {
        println!("usage: {program_name} <file>");
        return;
    };

    if let Err(err) = run(&path) {
        println!("{err}");
        std::process::exit(1);
    }
}

fn run(path: &str) -> Result<(), TranslateError> {
    let program = load_program(Path::new(path))?;
    let assembly = codegen::translate(&program)?;
    assembly.write_to(&emitter::output_path())?;
    Ok(())
}
