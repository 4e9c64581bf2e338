// vizboard_app/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Vizboard: replays recorded feed and pointer events through the dashboard
/// widgets and dumps what each one would draw.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The dashboard TOML file to build the widgets from.
    #[arg(short, long, default_value = "dashboard.toml")]
    pub config: PathBuf,

    /// Newline-delimited JSON events to replay.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write each widget's draw commands. Stdout when absent.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `vizboard_app=trace`. Overrides RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_arguments() {
        let cli = Cli::parse_from(["vizboard", "--input", "events.jsonl", "--log-level", "debug"]);
        assert_eq!(cli.config, PathBuf::from("dashboard.toml"));
        assert_eq!(cli.input, PathBuf::from("events.jsonl"));
        assert!(cli.output.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["vizboard"]).is_err());
    }
}
