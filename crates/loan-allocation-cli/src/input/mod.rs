pub mod file;
pub mod stdin;

use loan_allocation_core::types::Applicant;

/// Applicants from `--input` (JSON or CSV), else from piped JSON on stdin.
pub fn load_applicants(path: Option<&str>) -> Result<Vec<Applicant>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_applicants(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input file is required (or pipe a JSON array of applicants on stdin)".into())
    }
}
