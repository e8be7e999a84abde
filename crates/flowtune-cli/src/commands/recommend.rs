//! Recommendation commands.

use clap::Subcommand;
use flowtune_core::baseline::{BaselineProvider, StaticBaseline};

use super::{context, open_engine, parse_arms, parse_energy};

#[derive(Subcommand)]
pub enum RecommendAction {
    /// Recommend a focus duration
    Focus {
        /// Task type label
        task: String,
        /// Energy level: low, mid, high, or unset
        #[arg(long, default_value = "unset")]
        energy: String,
        /// Comma-separated custom durations to consider
        #[arg(long)]
        arms: Option<String>,
        /// Force a short session
        #[arg(long)]
        short: bool,
    },
    /// Recommend a break after a focus session
    Break {
        /// Task type label
        task: String,
        /// Minutes of focus just finished
        focus_minutes: u32,
        /// Energy level: low, mid, high, or unset
        #[arg(long, default_value = "unset")]
        energy: String,
    },
}

pub fn run(action: RecommendAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        RecommendAction::Focus {
            task,
            energy,
            arms,
            short,
        } => {
            let ctx = context(&task, &energy)?;
            let baseline = StaticBaseline.baseline(parse_energy(&energy)?, &task, short);
            let arms = parse_arms(arms.as_deref())?;
            let rec = engine.recommend(&ctx, baseline.focus_min, &arms, short);
            println!("{}", serde_json::to_string_pretty(&rec)?);
        }
        RecommendAction::Break {
            task,
            focus_minutes,
            energy,
        } => {
            let ctx = context(&task, &energy)?;
            let baseline = StaticBaseline.baseline(parse_energy(&energy)?, &task, false);
            let rec = engine.recommend_break(&ctx, baseline.break_min, focus_minutes);
            println!("{}", serde_json::to_string_pretty(&rec)?);
        }
    }
    Ok(())
}
