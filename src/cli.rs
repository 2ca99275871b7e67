use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub const DEFAULT_CATEGORY_URL: &str = "https://fc.vspo.jp/ja/gallery/category/radio";
pub const DEFAULT_ITEM_PREFIX: &str = "https://fc.vspo.jp/ja/gallery/radio";

#[derive(Debug, Parser)]
#[command(
    name = "radiotrack",
    version,
    about = "Play gallery radio episodes back-to-back and remember what was played"
)]
pub struct Cli {
    /// Listing page that links to every episode
    #[arg(long, global = true, default_value = DEFAULT_CATEGORY_URL)]
    pub category_url: String,

    /// Only links starting with this prefix are episodes
    #[arg(long, global = true, default_value = DEFAULT_ITEM_PREFIX)]
    pub item_prefix: String,

    /// Connect/read timeout for page fetches (no timeout when omitted)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Media player binary (overrides RADIOTRACK_PLAYER_BIN)
    #[arg(long, global = true, value_name = "BIN")]
    pub player: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every episode with its played state
    List {
        #[arg(long)]
        json: bool,
    },
    /// Play episodes back-to-back in the terminal
    Play {
        /// 1-based episode position to start from (default: first unplayed)
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        from: Option<u64>,
    },
    Tui,
}
