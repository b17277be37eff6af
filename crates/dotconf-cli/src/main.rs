use std::process::ExitCode;

fn main() -> ExitCode {
    dotconf_cli::run()
}
