//! `dpc` — standalone binary entry point.
//!
//! A thin wrapper around [`dpscript_cli::run_cli`]: logging setup, error
//! display, exit code. All command logic lives in the library crate.

fn main() {
    env_logger::init();
    match dpscript_cli::run_cli() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
