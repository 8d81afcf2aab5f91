use crate::error::CubeError;
use crate::model::{ConcreteType, RecordField};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_CONFIG_JSON: &str = include_str!("../../../config/default.json");

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Workbook layout and validation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Sheet holding every record in extraction order.
    pub raw_sheet: String,
    /// Header row, one title per record field.
    pub headers: Vec<String>,
    /// One sheet per listed type, in this order.
    pub concrete_types: Vec<ConcreteType>,
    /// Plausible compressive strength range in MPa.
    pub min_strength: Decimal,
    pub max_strength: Decimal,
    /// Column whose runs of equal values are merged.
    pub pour_location_column: String,
    /// Columns merged in fixed-size row groups.
    pub merge_columns: Vec<String>,
    #[serde(default = "default_group_size")]
    pub merge_group_size: usize,
    #[serde(default = "default_log_filename")]
    pub log_filename: String,
}

fn default_group_size() -> usize {
    2
}

fn default_log_filename() -> String {
    "cube_automation.log".into()
}

/// The configuration shipped with the tool.
pub fn default_config() -> Result<ReportConfig, CubeError> {
    let config: ReportConfig = serde_json::from_str(DEFAULT_CONFIG_JSON)?;
    Ok(config)
}

/// Load a configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ReportConfig, CubeError> {
    let content = std::fs::read_to_string(path).map_err(|e| CubeError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ReportConfig, CubeError> {
    let config: ReportConfig = serde_json::from_str(json).map_err(|e| CubeError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is well-formed.
pub fn validate_config(config: &ReportConfig) -> Result<(), CubeError> {
    validate_sheet_name(&config.raw_sheet)?;

    if config.headers.len() != RecordField::ALL.len() {
        return Err(CubeError::ConfigInvalid(format!(
            "expected {} headers, got {}",
            RecordField::ALL.len(),
            config.headers.len()
        )));
    }

    let mut sheet_names = HashSet::new();
    sheet_names.insert(config.raw_sheet.to_uppercase());
    for ty in &config.concrete_types {
        if !sheet_names.insert(ty.name().to_uppercase()) {
            return Err(CubeError::ConfigInvalid(format!(
                "duplicate sheet name '{}'",
                ty
            )));
        }
    }

    if config.min_strength > config.max_strength {
        return Err(CubeError::ConfigInvalid(format!(
            "min_strength {} is greater than max_strength {}",
            config.min_strength, config.max_strength
        )));
    }

    if config.merge_group_size < 2 {
        return Err(CubeError::ConfigInvalid(
            "merge_group_size must be at least 2".into(),
        ));
    }

    // Overlapping merge ranges make the workbook unreadable in Excel.
    if config
        .merge_columns
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&config.pour_location_column))
    {
        return Err(CubeError::ConfigInvalid(format!(
            "column '{}' cannot be both the pour location column and a merge column",
            config.pour_location_column
        )));
    }

    let columns =
        std::iter::once(&config.pour_location_column).chain(config.merge_columns.iter());
    for letter in columns {
        match column_index(letter) {
            Some(idx) if idx < config.headers.len() => {}
            Some(_) => {
                return Err(CubeError::ConfigInvalid(format!(
                    "column '{}' is past the last header column",
                    letter
                )))
            }
            None => {
                return Err(CubeError::ConfigInvalid(format!(
                    "invalid column letter '{}'",
                    letter
                )))
            }
        }
    }

    Ok(())
}

/// Excel sheet names are 1 to 31 characters, contain none of `[]:*?/\`, and
/// do not start or end with an apostrophe.
fn validate_sheet_name(name: &str) -> Result<(), CubeError> {
    if name.trim().is_empty() {
        return Err(CubeError::ConfigInvalid(
            "raw_sheet must not be empty".into(),
        ));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(CubeError::ConfigInvalid(format!(
            "sheet name '{}' is longer than {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return Err(CubeError::ConfigInvalid(format!(
            "sheet name '{}' contains '{}'",
            name, c
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(CubeError::ConfigInvalid(format!(
            "sheet name '{}' cannot start or end with an apostrophe",
            name
        )));
    }
    Ok(())
}

/// Zero-based index of a spreadsheet column letter (`A` is 0, `AA` is 26).
pub fn column_index(letter: &str) -> Option<usize> {
    let letter = letter.trim();
    if letter.is_empty() || !letter.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut idx = 0usize;
    for c in letter.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        idx = idx.checked_mul(26)?.checked_add(digit)?;
    }
    Some(idx - 1)
}

/// Spreadsheet column letter for a zero-based index.
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = default_config().unwrap();
        validate_config(&config).unwrap();
        assert_eq!(config.raw_sheet, "Raw");
        assert_eq!(
            config.concrete_types,
            vec![
                ConcreteType::Grade45,
                ConcreteType::Grade60,
                ConcreteType::Grade45Wp,
                ConcreteType::Grade60Wp,
            ]
        );
        assert_eq!(config.min_strength, dec!(20.0));
        assert_eq!(config.max_strength, dec!(100.0));
        assert_eq!(config.merge_columns, vec!["A", "B", "D", "E"]);
        assert_eq!(config.pour_location_column, "G");
        assert_eq!(config.merge_group_size, 2);
    }

    fn with(edit: impl FnOnce(&mut ReportConfig)) -> ReportConfig {
        let mut config = default_config().unwrap();
        edit(&mut config);
        config
    }

    #[test]
    fn test_wrong_header_count_rejected() {
        let config = with(|c| {
            c.headers.pop();
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_inverted_strength_range_rejected() {
        let config = with(|c| c.min_strength = dec!(120));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_type_sheet_rejected() {
        let config = with(|c| c.concrete_types.push(ConcreteType::Grade45));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_columns_rejected() {
        assert!(validate_config(&with(|c| c.merge_columns.push("H".into()))).is_err());
        assert!(validate_config(&with(|c| c.pour_location_column = "G1".into())).is_err());
        assert!(validate_config(&with(|c| c.merge_group_size = 1)).is_err());
        assert!(validate_config(&with(|c| c.merge_columns.push("g".into()))).is_err());
    }

    #[test]
    fn test_illegal_raw_sheet_names_rejected() {
        let too_long = "R".repeat(32);
        for name in ["", "  ", "Raw/All", "Raw[1]", "Q1: raw", "Raw?", "A*B", "a\\b", "'Raw"] {
            let config = with(|c| c.raw_sheet = name.into());
            assert!(validate_config(&config).is_err(), "accepted {name:?}");
        }
        assert!(validate_config(&with(|c| c.raw_sheet = too_long)).is_err());
        assert!(validate_config(&with(|c| c.raw_sheet = "R".repeat(31))).is_ok());
        assert!(validate_config(&with(|c| c.raw_sheet = "Raw data (all)".into())).is_ok());
    }

    #[test]
    fn test_unknown_type_name_rejected_on_parse() {
        let json = DEFAULT_CONFIG_JSON.replace("\"60DWP\"", "\"70D\"");
        assert!(parse_config(&json, Path::new("custom.json")).is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "raw_sheet": "All",
            "headers": ["a", "b", "c", "d", "e", "f", "g"],
            "concrete_types": ["60D", "Unknown"],
            "min_strength": "10",
            "max_strength": "90",
            "pour_location_column": "G",
            "merge_columns": []
        }"#;
        let config = parse_config(json, Path::new("custom.json")).unwrap();
        assert_eq!(config.merge_group_size, 2);
        assert_eq!(config.log_filename, "cube_automation.log");
        assert_eq!(config.concrete_types[1], ConcreteType::Unknown);
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("g"), Some(6));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(6), "G");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }
}
