pub mod commands;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::domain::{AlertKind, HISTORY_RETENTION_DAYS};
use crate::loader::LoaderKind;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Track Daraz product prices and get alerted on changes", long_about = None)]
pub struct Cli {
    /// Database file (default: platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Page loader to use: chrome or http
    #[arg(long, global = true)]
    pub loader: Option<LoaderKind>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a product page and start or stop tracking it
    Track {
        /// Product page URL
        url: String,
    },
    /// Start or stop tracking without loading the page
    Toggle {
        url: String,

        /// Product name
        #[arg(long, default_value = "")]
        name: String,

        /// Starting price
        #[arg(long)]
        price: f64,
    },
    /// Load a product page and record its price if tracked
    Visit { url: String },
    /// Search the catalog, cheapest first
    Search {
        query: String,

        /// Maximum number of results to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List tracked products
    List,
    /// Show price history for a tracked product
    Show {
        url: String,

        /// Days of history to show
        #[arg(short, long, default_value_t = HISTORY_RETENTION_DAYS)]
        days: i64,
    },
    /// Set or clear a price alert
    #[command(group(ArgGroup::new("threshold").required(true).args(["below", "above", "clear"])))]
    Alert {
        url: String,

        /// Alert when the price drops to or below this value
        #[arg(long)]
        below: Option<f64>,

        /// Alert when the price rises to or above this value
        #[arg(long)]
        above: Option<f64>,

        /// Remove an alert: below or above
        #[arg(long)]
        clear: Option<AlertKind>,
    },
    /// Check all tracked products once
    Check,
    /// Check all tracked products periodically until interrupted
    Watch {
        /// Check interval (e.g., "30m", "6h", "1d")
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the check on start
        #[arg(long)]
        no_initial_check: bool,
    },
    /// Answer JSON requests from stdin, one per line
    Rpc,
    /// Open the product behind a price alert notification
    Open {
        /// Notification id (price-alert-<url>)
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alert_below() {
        let cli = Cli::try_parse_from([
            "pricewatch",
            "alert",
            "https://www.daraz.com.bd/products/a-i1.html",
            "--below",
            "900",
        ])
        .unwrap();

        match cli.command {
            Commands::Alert { below, above, clear, .. } => {
                assert_eq!(below, Some(900.0));
                assert!(above.is_none());
                assert!(clear.is_none());
            }
            _ => panic!("expected alert command"),
        }
    }

    #[test]
    fn test_alert_requires_exactly_one_threshold() {
        let url = "https://www.daraz.com.bd/products/a-i1.html";
        assert!(Cli::try_parse_from(["pricewatch", "alert", url]).is_err());
        assert!(Cli::try_parse_from([
            "pricewatch", "alert", url, "--below", "1", "--above", "2"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["pricewatch", "alert", url, "--clear", "above"]).is_ok());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["pricewatch", "list", "--loader", "http", "--db", "x.db"])
            .unwrap();
        assert_eq!(cli.loader, Some(LoaderKind::Http));
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pricewatch", "search", "kettle"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { limit: 10, .. }));

        let cli = Cli::try_parse_from(["pricewatch", "show", "u"]).unwrap();
        assert!(matches!(cli.command, Commands::Show { days: 90, .. }));
    }
}
