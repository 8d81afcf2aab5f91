use cubesheet_core::config::{default_config, load_config};
use cubesheet_core::error::CubeError;
use cubesheet_core::ConcreteType;
use std::path::Path;

pub fn show() -> Result<(), CubeError> {
    let config = default_config()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), CubeError> {
    let config = load_config(file)?;

    let types: Vec<&str> = config.concrete_types.iter().map(|t| t.name()).collect();
    println!("Config '{}' is valid.", file.display());
    println!("  Sheets: {}, {}", config.raw_sheet, types.join(", "));
    println!(
        "  Strength range: {}-{} MPa",
        config.min_strength, config.max_strength
    );
    println!(
        "  Merges: {} every {} rows, {} by equal value",
        config.merge_columns.join(", "),
        config.merge_group_size,
        config.pour_location_column
    );

    if config
        .concrete_types
        .iter()
        .any(|t| *t == ConcreteType::Unknown)
    {
        println!("\nWarnings:");
        println!("  - an 'Unknown' sheet collects every unclassified record");
    }

    Ok(())
}
