use regex::Regex;
use std::cell::OnceCell;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::error::{AssetDownloadError, AssetFailure};
use crate::file_manager::FileManager;
use crate::html::{url_attr_for, AssetKind, Element};
use crate::transport::Transport;

static ABSOLUTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z]+://").expect("absolute URL pattern is valid")
});

/// What happened to a single asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// The element carried no usable URL.
    Skipped,
    Mirrored { local_path: String, disk_path: PathBuf },
}

/// Mirrors the remote resource behind one `img`, `link` or `script` element.
///
/// The resolved URL and local path are computed on first use and cached, so
/// they stay stable after the element's attribute is rewritten.
pub struct AssetMirror<'a, T: Transport> {
    page_url: &'a str,
    element: &'a Element,
    files: &'a FileManager,
    transport: &'a T,
    asset_url: OnceCell<Option<String>>,
    local_path: OnceCell<Option<String>>,
}

impl<'a, T: Transport> AssetMirror<'a, T> {
    pub fn new(page_url: &'a str, element: &'a Element, files: &'a FileManager, transport: &'a T) -> Self {
        Self {
            page_url,
            element,
            files,
            transport,
            asset_url: OnceCell::new(),
            local_path: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_tag(&self.element.tag_name())
    }

    /// Resolved source URL, `None` when the element has nothing to mirror.
    pub fn asset_url(&self) -> Option<&str> {
        self.asset_url
            .get_or_init(|| {
                let attr = url_attr_for(&self.element.tag_name())?;
                let raw = self.element.attr(attr)?;
                resolve_asset_url(self.page_url, &raw)
            })
            .as_deref()
    }

    /// Path written into the element, relative to the page output location.
    pub fn local_path(&self) -> Option<&str> {
        self.local_path
            .get_or_init(|| {
                let asset_url = self.asset_url()?;
                Some(local_path_for(self.page_url, &self.element.tag_name(), asset_url))
            })
            .as_deref()
    }

    /// Downloads the asset, then points the element at the local copy.
    /// The element is left untouched if the download fails.
    pub async fn mirror(&self) -> Result<MirrorOutcome, AssetDownloadError> {
        let (Some(asset_url), Some(local_path)) = (self.asset_url(), self.local_path()) else {
            return Ok(MirrorOutcome::Skipped);
        };

        let disk_path = self.download(asset_url, local_path).await?;

        if let Some(attr) = url_attr_for(&self.element.tag_name()) {
            self.element.set_attr(attr, local_path);
        }

        Ok(MirrorOutcome::Mirrored {
            local_path: local_path.to_string(),
            disk_path,
        })
    }

    async fn download(&self, asset_url: &str, local_path: &str) -> Result<PathBuf, AssetDownloadError> {
        let failed = |cause: AssetFailure| AssetDownloadError {
            url: asset_url.to_string(),
            cause,
        };

        let chunks = self
            .transport
            .get_streaming(asset_url)
            .await
            .map_err(|e| failed(e.into()))?;
        let (disk_path, bytes) = self
            .files
            .stream_to_file(local_path, chunks)
            .await
            .map_err(failed)?;

        debug!(url = %asset_url, path = ?disk_path, bytes, "asset mirrored");
        Ok(disk_path)
    }
}

/// Resolves an element's URL attribute against the page URL.
///
/// Absolute values (`scheme://...`) are returned verbatim. Anything else is
/// appended to the page URL itself when the page has no path, or to the page
/// URL minus its last segment otherwise. No `.`/`..` normalisation happens.
pub fn resolve_asset_url(page_url: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if ABSOLUTE_URL.is_match(raw) {
        return Some(raw.to_string());
    }

    let page = page_url.strip_suffix('/').unwrap_or(page_url);
    let parsed = Url::parse(page).ok()?;

    let base = if has_empty_path(page, &parsed) {
        page
    } else {
        directory_of(page)
    };

    Some(join_segments(base, raw))
}

// `Url` reports "/" for an empty path on special schemes, so also check the
// text itself.
fn has_empty_path(page: &str, parsed: &Url) -> bool {
    match parsed.path() {
        "" => true,
        "/" => {
            let after_scheme = page.split_once("://").map_or(page, |(_, rest)| rest);
            !after_scheme.contains('/')
        }
        _ => false,
    }
}

fn directory_of(url: &str) -> &str {
    match url.rfind('/') {
        Some(idx) => url[..idx].trim_end_matches('/'),
        None => ".",
    }
}

fn join_segments(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Last non-empty `/`-separated segment, or the whole string.
pub fn last_segment(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Replaces every character outside `[A-Za-z0-9.]` with `-`.
pub fn sanitize_basename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect()
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Splits `name` into stem and extension (with its leading dot). A leading
/// or trailing dot does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Folder for a page's assets of one tag: `<page-basename>-assets/<tag>`.
pub fn asset_folder(page_url: &str, tag: &str) -> String {
    format!("{}-assets/{}", sanitize_basename(last_segment(page_url)), tag)
}

/// Local path for an asset: `./<page-basename>-assets/<tag>/<stem><ext>`.
pub fn local_path_for(page_url: &str, tag: &str, asset_url: &str) -> String {
    let filename = last_segment(asset_url);
    let (stem, extension) = split_extension(filename);

    // The extension is kept as-is unless it carries characters that are not
    // safe in a file name (query strings and the like).
    let extension = match extension.strip_prefix('.') {
        Some(ext) if !ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{}", sanitize_stem(ext))
        }
        _ => extension.to_string(),
    };

    format!(
        "./{}/{}{}",
        asset_folder(page_url, tag),
        sanitize_stem(stem),
        extension
    )
}
