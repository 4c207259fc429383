//! Manage the configured STAC APIs

use anyhow::Result;
use clap::Subcommand;

use stac_browser_core::config::ConfigStore;

#[derive(Subcommand, Debug)]
pub enum ApiCommand {
    /// List configured APIs
    List,

    /// Add an API
    Add {
        /// API URL (http or https)
        url: String,
    },

    /// Remove an API
    Remove {
        /// API URL
        url: String,
    },
}

pub fn execute(mut store: ConfigStore, command: ApiCommand) -> Result<()> {
    match command {
        ApiCommand::List => {
            let config = store.config();
            if config.api_hrefs.is_empty() {
                println!("No APIs configured.");
                return Ok(());
            }

            println!("Configured APIs:\n");
            for href in &config.api_hrefs {
                println!("  {href}");
            }

            match config.last_update.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)) {
                Some(updated) => println!(
                    "\nCatalogs cached {} ({} API(s))",
                    updated.format("%Y-%m-%d %H:%M:%S UTC"),
                    config.apis.len()
                ),
                None => println!("\nNo cached catalogs"),
            }
        }
        ApiCommand::Add { url } => {
            store.config_mut().add_api(&url)?;
            store.save()?;
            println!("Added API {url}");
        }
        ApiCommand::Remove { url } => {
            store.config_mut().remove_api(&url)?;
            store.save()?;
            println!("Removed API {url}");
        }
    }

    Ok(())
}
