use std::process::ExitCode;

fn main() -> ExitCode {
    coursey_cli::run()
}
