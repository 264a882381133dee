use std::env;
use std::fs;
use std::io;
use std::process::ExitCode;

use log::error;
use schemelet::{Environment, run_transcript};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [path] = args.as_slice() else {
        eprintln!("usage: schemelet <file>");
        return ExitCode::from(2);
    };

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Cannot read '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let global_env = Environment::new_global();
    match run_transcript(&source, &global_env, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Err(io_err) = e.pretty_print(path, &source) {
                error!("failed to render error report: {}", io_err);
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
