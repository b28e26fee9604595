use std::process::ExitCode;

fn main() -> ExitCode {
    pizzeria_cli::run()
}
