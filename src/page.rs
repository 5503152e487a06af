use chrono::{DateTime, Local};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::asset::{last_segment, sanitize_basename, AssetMirror, MirrorOutcome};
use crate::error::{AssetDownloadError, PageError};
use crate::file_manager::FileManager;
use crate::html::{Element, HtmlDocument, MIRRORABLE_TAGS};
use crate::transport::Transport;

/// What to do with a page once it is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Save the raw HTML.
    Download,
    /// Print metadata only, nothing is written to disk.
    Metadata { json: bool },
    /// Save the page with its assets, rewritten to point at the local copies.
    Mirror,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub site: String,
    pub num_links: usize,
    pub images: usize,
    pub last_fetch: DateTime<Local>,
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "site: {}", self.site)?;
        writeln!(f, "num_links: {}", self.num_links)?;
        writeln!(f, "images: {}", self.images)?;
        write!(f, "last_fetch: {}", self.last_fetch)
    }
}

#[derive(Debug)]
pub struct MirrorReport {
    pub output: PathBuf,
    pub mirrored: usize,
    pub skipped: usize,
    pub failed: Vec<AssetDownloadError>,
}

/// A remote HTML page. The parsed document lives here and nowhere else.
pub struct Page<T: Transport> {
    url: String,
    transport: T,
    files: FileManager,
    html: Option<Vec<u8>>,
    document: Option<HtmlDocument>,
    last_fetched_at: Option<DateTime<Local>>,
}

impl<T: Transport> Page<T> {
    pub fn new(url: impl Into<String>, transport: T, files: FileManager) -> Self {
        Self {
            url: url.into(),
            transport,
            files,
            html: None,
            document: None,
            last_fetched_at: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Local>> {
        self.last_fetched_at
    }

    /// Retrieves the page, records the fetch time and parses the body.
    pub async fn fetch(&mut self) -> Result<&[u8], PageError> {
        let response = match self.transport.get(&self.url).await {
            Ok(response) if response.success => response,
            Ok(response) => {
                debug!(url = %self.url, status = response.status, "page fetch unsuccessful");
                return Err(PageError::Fetch { url: self.url.clone() });
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "page fetch failed");
                return Err(PageError::Fetch { url: self.url.clone() });
            }
        };

        self.last_fetched_at = Some(Local::now());
        self.document = None;
        let html = self.html.insert(response.body);

        let document = HtmlDocument::parse(html.as_slice()).map_err(|source| PageError::Parse {
            url: self.url.clone(),
            source,
        })?;
        self.document = Some(document);

        info!(url = %self.url, bytes = html.len(), "page fetched");
        Ok(html.as_slice())
    }

    /// Raw page body, fetched on first use.
    pub async fn html(&mut self) -> Result<&[u8], PageError> {
        self.ensure_fetched().await?;
        self.html.as_deref().ok_or_else(|| PageError::NotFetched {
            url: self.url.clone(),
        })
    }

    pub async fn images(&mut self) -> Result<Vec<Element>, PageError> {
        self.ensure_fetched().await?;
        Ok(self.document()?.query("img"))
    }

    pub async fn links(&mut self) -> Result<Vec<Element>, PageError> {
        self.ensure_fetched().await?;
        Ok(self.document()?.query("a"))
    }

    pub fn num_images(&self) -> Result<usize, PageError> {
        Ok(self.document()?.query("img").len())
    }

    pub fn num_links(&self) -> Result<usize, PageError> {
        Ok(self.document()?.query("a").len())
    }

    /// Requires a prior successful fetch.
    pub fn metadata(&self) -> Result<Metadata, PageError> {
        let last_fetch = self.last_fetched_at.ok_or_else(|| PageError::NotFetched {
            url: self.url.clone(),
        })?;

        Ok(Metadata {
            site: self.url.clone(),
            num_links: self.num_links()?,
            images: self.num_images()?,
            last_fetch,
        })
    }

    /// `<sanitized last segment>.html`, relative to the output location.
    pub fn filename(&self) -> String {
        format!("{}.html", sanitize_basename(last_segment(&self.url)))
    }

    pub fn output_path(&self) -> PathBuf {
        self.files.resolve(&self.filename())
    }

    /// Writes the fetched HTML, unchanged, overwriting any existing file.
    pub async fn download(&mut self) -> Result<PathBuf, PageError> {
        self.ensure_fetched().await?;
        let html = self.html.as_deref().ok_or_else(|| PageError::NotFetched {
            url: self.url.clone(),
        })?;

        self.write_output(html)
    }

    /// Mirrors every image, stylesheet and script, then writes the rewritten
    /// page. A failed asset keeps its remote URL and does not stop the rest.
    pub async fn mirror(&mut self) -> Result<MirrorReport, PageError> {
        self.ensure_fetched().await?;
        let document = self.document()?;

        let elements: Vec<Element> = MIRRORABLE_TAGS
            .iter()
            .flat_map(|tag| document.query(tag))
            .collect();

        let progress_bar = ProgressBar::new(elements.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            progress_bar.set_style(style);
        }

        let mut report = MirrorReport {
            output: self.output_path(),
            mirrored: 0,
            skipped: 0,
            failed: Vec::new(),
        };

        for element in &elements {
            let asset = AssetMirror::new(&self.url, element, &self.files, &self.transport);
            progress_bar.set_message(asset.asset_url().unwrap_or_default().to_string());

            match asset.mirror().await {
                Ok(MirrorOutcome::Skipped) => report.skipped += 1,
                Ok(MirrorOutcome::Mirrored { local_path, .. }) => {
                    debug!(kind = ?asset.kind(), %local_path, "asset rewritten");
                    report.mirrored += 1;
                }
                Err(e) => {
                    debug!(error = %e, "asset skipped");
                    progress_bar.suspend(|| eprintln!("⚠️  {}", e));
                    report.failed.push(e);
                }
            }
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        let html = document.serialize().map_err(|source| PageError::Io {
            path: report.output.clone(),
            source,
        })?;
        report.output = self.write_output(&html)?;

        Ok(report)
    }

    /// Runs the requested mode, printing its result.
    pub async fn process(&mut self, mode: Mode) -> Result<(), PageError> {
        match mode {
            Mode::Metadata { json } => {
                self.ensure_fetched().await?;
                let metadata = self.metadata()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&metadata)?);
                } else {
                    println!("{}", metadata);
                }
            }
            Mode::Mirror => {
                let report = self.mirror().await?;
                println!(
                    "✅ Mirrored {} to {:?} ({} assets, {} failed, {} without URL)",
                    self.url.blue(),
                    report.output,
                    report.mirrored.to_string().green(),
                    report.failed.len().to_string().red(),
                    report.skipped
                );
            }
            Mode::Download => {
                let saved = self.download().await?;
                println!("💾 Saved {} to {:?}", self.url.blue(), saved);
            }
        }

        Ok(())
    }

    async fn ensure_fetched(&mut self) -> Result<(), PageError> {
        if self.html.is_none() {
            self.fetch().await?;
        }
        Ok(())
    }

    fn document(&self) -> Result<&HtmlDocument, PageError> {
        if self.html.is_none() {
            return Err(PageError::NotFetched {
                url: self.url.clone(),
            });
        }
        self.document.as_ref().ok_or_else(|| PageError::NotParsed {
            url: self.url.clone(),
        })
    }

    fn write_output(&self, content: &[u8]) -> Result<PathBuf, PageError> {
        let filename = self.filename();
        self.files
            .save_file(&filename, content)
            .map_err(|source| PageError::Io {
                path: self.files.resolve(&filename),
                source,
            })
    }
}
