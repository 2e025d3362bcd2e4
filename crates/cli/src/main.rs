use std::process::ExitCode;

fn main() -> ExitCode {
    match structscope_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(structscope_cli::exit_code(e.as_ref()))
        }
    }
}
