use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;
mod feedback;

#[derive(Parser)]
#[command(name = "tickwise", version, about = "Tickwise timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count-up stopwatch with laps
    Stopwatch {
        #[command(subcommand)]
        action: commands::stopwatch::StopwatchAction,
    },
    /// Fixed-length countdown
    Countdown {
        #[command(subcommand)]
        action: commands::countdown::CountdownAction,
    },
    /// Alternating work/break intervals
    Interval {
        #[command(subcommand)]
        action: commands::interval::IntervalAction,
    },
    /// Drive a running timer live until it completes or Ctrl-C
    Watch {
        #[arg(value_enum)]
        mode: commands::watch::ModeArg,
        /// Print a status line every N seconds (0 disables)
        #[arg(long, default_value_t = 1)]
        every: u64,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Completed session history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TICKWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Stopwatch { action } => commands::stopwatch::run(action),
        Commands::Countdown { action } => commands::countdown::run(action),
        Commands::Interval { action } => commands::interval::run(action),
        Commands::Watch { mode, every } => commands::watch::run(mode, every),
        Commands::Config { action } => commands::config::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "tickwise", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
