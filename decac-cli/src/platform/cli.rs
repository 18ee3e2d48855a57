//! CLI formatted output
//!
//! Diagnostics go to stderr, one line per problem, prefixed by the file.

use decac_api::{DecacError, Warning};
use std::path::Path;

/// Print a file's failure as `<file>: <message>`; `json` prints the
/// structured report instead
pub fn print_error(path: &Path, e: &DecacError, json: bool) {
    if json {
        let report = serde_json::json!({
            "file": path.display().to_string(),
            "error": e.to_report(),
        });
        eprintln!("{}", report);
    } else {
        eprintln!("{}: {}", path.display(), e);
    }
}

pub fn print_warning(path: &Path, warning: &Warning) {
    eprintln!("{}: warning: {}", path.display(), warning);
}
