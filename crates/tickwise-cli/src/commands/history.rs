use clap::Subcommand;
use tickwise_core::Database;

use super::session::CmdResult;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Completed sessions, most recent first
    List {
        /// Maximum number of sessions to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Totals per mode, all-time and today
    Stats,
}

pub fn run(action: HistoryAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            let sessions = db.list_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        HistoryAction::Stats => {
            let stats = db.stats_all()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
