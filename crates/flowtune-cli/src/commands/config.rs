//! Engine configuration commands.

use clap::Subcommand;
use flowtune_core::EngineConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration as TOML
    Show,
    /// Write the default configuration to disk
    Init,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = EngineConfig::load_or_default();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            let config = EngineConfig::default();
            config.save()?;
            println!("written");
        }
    }
    Ok(())
}
