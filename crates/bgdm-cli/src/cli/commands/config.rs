//! `bgdm config`: print the config file location and effective values.

use anyhow::Result;
use bgdm_core::config;

pub fn show_config() -> Result<()> {
    let path = config::config_path()?;
    let cfg = config::load_or_init()?;
    println!("config file: {}", path.display());
    println!();
    print!("{}", cfg.to_toml()?);
    Ok(())
}
