use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use loan_allocation_core::allocation::ScenarioConfig;
use loan_allocation_core::types::Applicant;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = read(&canonical)?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read applicant records from a `.csv` file (header row required) or a JSON
/// array.
pub fn read_applicants(path: &str) -> Result<Vec<Applicant>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    if has_extension(&canonical, &["csv"]) {
        let file = fs::File::open(&canonical)
            .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        parse_applicants_csv(file)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
    } else {
        read_json(path)
    }
}

/// Read a scenario config from YAML (`.yaml`/`.yml`) or JSON.
pub fn read_config(path: &str) -> Result<ScenarioConfig, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = read(&canonical)?;
    let config: ScenarioConfig = if has_extension(&canonical, &["yaml", "yml"]) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(config)
}

pub fn parse_applicants_csv<R: Read>(reader: R) -> Result<Vec<Applicant>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let rows: Result<Vec<Applicant>, csv::Error> = rdr.deserialize().collect();
    rows
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    Ok(fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?)
}

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| wanted.iter().any(|w| e.eq_ignore_ascii_case(w)))
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_allocation_core::types::LoanCategory;

    const HEADER: &str = "age,income,employment_length,credit_history_length,requested_amount,\
interest_rate,loan_to_income_ratio,loan_category,probability_of_default,expected_return_rate\n";

    #[test]
    fn test_csv_applicants() {
        let data = format!(
            "{HEADER}34,52000,6,9,12000,11.5,0.23,EDUCATION,0.04,0.125\n\
             51, 88000, 20, 25, 5000, 8.2, 0.06, HOMEIMPROVEMENT, 0.02, 0.102\n"
        );
        let rows = parse_applicants_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].loan_category, LoanCategory::Education);
        assert_eq!(rows[1].loan_category, LoanCategory::HomeImprovement);
        assert_eq!(rows[1].income, 88_000.0);
    }

    #[test]
    fn test_csv_rejects_bad_category() {
        let data = format!("{HEADER}34,52000,6,9,12000,11.5,0.23,YACHT,0.04,0.125\n");
        assert!(parse_applicants_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn test_extension_match() {
        assert!(has_extension(Path::new("a/b.YML"), &["yaml", "yml"]));
        assert!(!has_extension(Path::new("a/b.json"), &["csv"]));
        assert!(!has_extension(Path::new("noext"), &["csv"]));
    }
}
