//! Inference runner
//!
//! Classifies one image with the model found in `model_dir` and prints the
//! result listing, the JSON document and a final `RESULT:` line.

use std::process::ExitCode;

fn main() -> ExitCode {
    labelvision::cli::predict_main()
}
