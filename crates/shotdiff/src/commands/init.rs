use anyhow::{Result, bail};

use crate::config;

/// `shotdiff init`: create .shotdiff/config.toml.
pub fn init(force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".shotdiff/config.toml already exists (use --force to overwrite)");
    }

    config::write_template()?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .shotdiff/config.toml");
    Ok(())
}
