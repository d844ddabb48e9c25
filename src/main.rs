use std::process::ExitCode;

fn main() -> ExitCode {
    match ghpages_deploy::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
