use std::path::PathBuf;

use clap::{Parser, Subcommand};
use desk_core::{JobId, JobKind, SortOrder};

#[derive(Parser, Debug, Clone)]
#[command(name = "query_desk", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file; defaults to ./query_desk.ron when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Submit a question and wait for its answer
    Ask {
        text: String,
        /// general, analyze or backtest
        #[arg(long, default_value = "general")]
        kind: JobKind,
        #[arg(long)]
        ticker: Option<String>,
        /// Print the new job id and return without waiting
        #[arg(long, default_value_t = false)]
        no_wait: bool,
        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },
    /// List previously submitted jobs
    History {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long)]
        search: Option<String>,
        /// newest, oldest or by-ticker
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },
    /// Show one job in full
    Show { id: JobId },
    /// Delete a job
    Delete {
        id: JobId,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    /// Compare 2 to 5 tickers side by side
    Compare {
        #[arg(required = true, num_args = 1..)]
        tickers: Vec<String>,
        /// Period such as 1mo, 6mo or 1y
        #[arg(long)]
        period: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ask_parses_kind_and_ticker() {
        let cli = Cli::try_parse_from([
            "query_desk",
            "ask",
            "Is it a buy?",
            "--kind",
            "analyze",
            "--ticker",
            "aapl",
        ])
        .unwrap();
        match cli.command {
            Command::Ask {
                text, kind, ticker, ..
            } => {
                assert_eq!(text, "Is it a buy?");
                assert_eq!(kind, JobKind::Analyze);
                assert_eq!(ticker.as_deref(), Some("aapl"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn history_accepts_sort_aliases() {
        let cli =
            Cli::try_parse_from(["query_desk", "--config", "x.ron", "history", "--sort", "ticker"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.ron")));
        assert!(matches!(
            cli.command,
            Command::History {
                sort: SortOrder::ByTicker,
                page: 1,
                ..
            }
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["query_desk", "ask", "hi", "--kind", "poem"]).is_err());
    }

    #[test]
    fn compare_collects_tickers() {
        let cli = Cli::try_parse_from(["query_desk", "compare", "AAPL", "MSFT", "--period", "1y"])
            .unwrap();
        match cli.command {
            Command::Compare { tickers, period } => {
                assert_eq!(tickers, vec!["AAPL".to_string(), "MSFT".to_string()]);
                assert_eq!(period.as_deref(), Some("1y"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
