use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "flowtune-cli", version, about = "Flowtune CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus and break recommendations
    Recommend {
        #[command(subcommand)]
        action: commands::recommend::RecommendAction,
    },
    /// Record session outcomes and rejections
    Record {
        #[command(subcommand)]
        action: commands::record::RecordAction,
    },
    /// Learned state management
    State {
        #[command(subcommand)]
        action: commands::state::StateAction,
    },
    /// Learned statistics per context
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Recommend { action } => commands::recommend::run(action),
        Commands::Record { action } => commands::record::run(action),
        Commands::State { action } => commands::state::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
