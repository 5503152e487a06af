use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::page::Mode;
use crate::transport::TransportConfig;

pub const USAGE: &str = "usage: page-mirror <URL 1> <URL 2> <...>";

#[derive(Parser, Debug)]
#[command(
    name = "page-mirror",
    about = "A CLI utility to fetch web pages and mirror them locally",
    version,
    long_about = "Fetches each URL and saves its HTML. With --mirror, images, stylesheets and scripts are downloaded too and the page is rewritten to reference the local copies."
)]
pub struct MirrorCommand {
    /// The URLs of the pages to fetch
    pub urls: Vec<String>,

    /// Print page metadata instead of saving anything
    #[arg(short, long)]
    pub metadata: bool,

    /// Mirror the page together with its images, stylesheets and scripts
    #[arg(short = 'r', long)]
    pub mirror: bool,

    /// Output directory for saved pages and assets
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print metadata as JSON
    #[arg(long)]
    pub json: bool,

    /// User agent string to use for requests
    #[arg(long, default_value = "PageMirror/1.0")]
    pub user_agent: String,

    /// Timeout for requests in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl MirrorCommand {
    /// Metadata wins over mirroring when both are requested.
    pub fn mode(&self) -> Mode {
        if self.metadata {
            Mode::Metadata { json: self.json }
        } else if self.mirror {
            Mode::Mirror
        } else {
            Mode::Download
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}
