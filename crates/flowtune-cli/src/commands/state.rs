//! Learned state export, import, and reset.

use std::path::PathBuf;

use clap::Subcommand;
use flowtune_core::StateBundle;

use super::open_engine;

#[derive(Subcommand)]
pub enum StateAction {
    /// Export all learned state as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import a previously exported backup (overwrites verbatim)
    Import {
        /// Backup file to read
        input: PathBuf,
    },
    /// Drop all learned state
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: StateAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        StateAction::Export { output } => {
            let bundle = engine.export_state()?;
            let json = serde_json::to_string_pretty(&bundle)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        StateAction::Import { input } => {
            let raw = std::fs::read_to_string(input)?;
            let bundle: StateBundle = serde_json::from_str(&raw)?;
            engine.import_state(bundle)?;
            println!("imported");
        }
        StateAction::Reset { yes } => {
            if !yes {
                return Err("refusing to reset without --yes".into());
            }
            engine.reset()?;
            println!("reset");
        }
    }
    Ok(())
}
