use super::config::CustodyConfig;
use std::path::Path;

/// Write the default configuration, refusing to clobber an existing file
/// unless `force` is set.
pub fn execute(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    CustodyConfig::create_default(config_path)?;
    println!("Created: {}", config_path.display());
    println!("Edit the [committee] table before creating a ledger.");

    Ok(())
}
