mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::commands::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
