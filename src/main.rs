use anyhow::Result;
use clap::Parser;
use colored::*;

use page_mirror::cli::{MirrorCommand, USAGE};
use page_mirror::{logging, FileManager, HttpTransport, Page};

#[tokio::main]
async fn main() -> Result<()> {
    let args = MirrorCommand::parse();
    logging::init_logging(args.verbose);

    if args.urls.is_empty() {
        println!("{}", USAGE);
        std::process::exit(1);
    }

    let transport = HttpTransport::new(&args.transport_config())?;
    let files = FileManager::new(args.out.as_deref());
    let mode = args.mode();

    // A failing page is reported and the next URL still runs.
    for url in &args.urls {
        let mut page = Page::new(url.as_str(), transport.clone(), files.clone());
        if let Err(e) = page.process(mode).await {
            eprintln!("{} {}", "❌".red(), e);
        }
    }

    Ok(())
}
