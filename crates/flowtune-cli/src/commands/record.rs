//! Outcome recording commands.

use clap::Subcommand;
use flowtune_core::{SessionOutcome, SkipReason};

use super::{context, open_engine};

#[derive(Subcommand)]
pub enum RecordAction {
    /// Record a finished focus session
    Outcome {
        /// Task type label
        task: String,
        /// Duration the user committed to (minutes)
        selected: u32,
        /// Focus time actually achieved (minutes)
        actual: u32,
        /// Energy level: low, mid, high, or unset
        #[arg(long, default_value = "unset")]
        energy: String,
        /// Session ran to completion
        #[arg(long)]
        completed: bool,
        /// The recommendation was accepted as-is
        #[arg(long)]
        accepted: bool,
        /// What the engine had recommended (defaults to selected)
        #[arg(long)]
        recommended: Option<u32>,
        /// Skip reason for unfinished sessions: focus or break
        #[arg(long)]
        skipped: Option<String>,
    },
    /// Record a finished break
    Break {
        /// Task type label
        task: String,
        /// Break length taken (minutes)
        selected: u32,
        /// Energy level: low, mid, high, or unset
        #[arg(long, default_value = "unset")]
        energy: String,
        /// Break was fully taken
        #[arg(long)]
        completed: bool,
        /// The recommendation was accepted as-is
        #[arg(long)]
        accepted: bool,
    },
    /// Record an explicit decline of a recommended duration
    Reject {
        /// Task type label
        task: String,
        /// Declined duration (minutes)
        action: u32,
        /// Energy level: low, mid, high, or unset
        #[arg(long, default_value = "unset")]
        energy: String,
    },
}

pub fn run(action: RecordAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        RecordAction::Outcome {
            task,
            selected,
            actual,
            energy,
            completed,
            accepted,
            recommended,
            skipped,
        } => {
            let ctx = context(&task, &energy)?;
            let skip_reason = match skipped.as_deref() {
                None => None,
                Some("focus") => Some(SkipReason::SkippedFocus),
                Some("break") => Some(SkipReason::SkippedBreak),
                Some(other) => {
                    return Err(format!("unknown skip reason '{other}'").into());
                }
            };
            engine.record_outcome(
                &ctx,
                SessionOutcome {
                    selected_min: selected,
                    actual_focus_min: actual,
                    completed,
                    accepted,
                    recommended_min: recommended,
                    skip_reason,
                },
            );
            println!("recorded");
        }
        RecordAction::Break {
            task,
            selected,
            energy,
            completed,
            accepted,
        } => {
            let ctx = context(&task, &energy)?;
            engine.record_break_outcome(&ctx, selected, completed, accepted);
            println!("recorded");
        }
        RecordAction::Reject {
            task,
            action,
            energy,
        } => {
            let ctx = context(&task, &energy)?;
            engine.record_rejection(&ctx, action);
            println!("recorded");
        }
    }
    Ok(())
}
