use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use flowrec_cli::{ConfigCommands, FlowrecConfig};
use tracing::info;

pub fn handle(config_flag: Option<&Path>, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { path, force } => {
            let target = match path.as_deref() {
                Some(path) => path.to_path_buf(),
                None => FlowrecConfig::config_path()
                    .ok_or_else(|| anyhow!("could not determine config directory"))?,
            };
            if target.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }
            FlowrecConfig::default().save_to(&target)?;
            info!("Wrote default configuration to {}", target.display());
            println!("{}", target.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = FlowrecConfig::resolve(config_flag)?;
            let rendered = toml::to_string_pretty(&config).context("serializing config")?;
            print!("{rendered}");
            Ok(())
        }
    }
}
