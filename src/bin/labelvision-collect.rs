//! Dataset placeholder generator
//!
//! Creates `<output_dir>/<label>/<label>_<n>.jpg` for every label of the JSON request.

use std::process::ExitCode;

fn main() -> ExitCode {
    labelvision::cli::collect_main()
}
