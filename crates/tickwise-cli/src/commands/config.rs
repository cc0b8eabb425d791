//! `tickwise config`: read and edit `config.toml` in the data directory.

use clap::{Subcommand, ValueEnum};
use serde_json::json;
use tickwise_core::storage::{FeedbackConfig, IntervalDefaults, TickerConfig};
use tickwise_core::Config;
use tracing::info;

use super::session::CmdResult;

#[derive(Clone, Copy, ValueEnum)]
pub enum Section {
    Feedback,
    Interval,
    Ticker,
}

impl Section {
    const ALL: [Section; 3] = [Section::Feedback, Section::Interval, Section::Ticker];

    fn name(self) -> &'static str {
        match self {
            Section::Feedback => "feedback",
            Section::Interval => "interval",
            Section::Ticker => "ticker",
        }
    }

    fn restore_default(self, config: &mut Config) {
        match self {
            Section::Feedback => config.feedback = FeedbackConfig::default(),
            Section::Interval => config.interval = IntervalDefaults::default(),
            Section::Ticker => config.ticker = TickerConfig::default(),
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Dotted key, e.g. "feedback.volume", "interval.loops", "ticker.cadence_ms"
        key: String,
    },
    /// Change one value and save
    Set {
        /// Dotted key
        key: String,
        /// New value, parsed as the field's type
        value: String,
    },
    /// Print the whole config, or one section, as JSON
    List {
        #[arg(long, value_enum)]
        section: Option<Section>,
    },
    /// Restore defaults for one section, or for all of them
    Reset {
        #[arg(long, value_enum)]
        section: Option<Section>,
    },
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let Some(value) = config.get(&key) else {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            };
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            info!(%key, %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { section } => {
            let config = serde_json::to_value(Config::load()?)?;
            let shown = match section {
                Some(section) => config[section.name()].clone(),
                None => config,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigAction::Reset { section } => {
            let mut config = Config::load_or_default();
            let sections = section.map_or(Section::ALL.to_vec(), |s| vec![s]);
            for s in &sections {
                s.restore_default(&mut config);
            }
            config.save()?;
            let names: Vec<_> = sections.iter().map(|s| s.name()).collect();
            info!(sections = ?names, "config reset to defaults");
            println!("{}", json!({ "reset": names }));
        }
    }
    Ok(())
}
