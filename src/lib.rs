pub mod asset;
pub mod cli;
pub mod error;
pub mod file_manager;
pub mod html;
pub mod logging;
pub mod page;
pub mod transport;

// Re-export main types for convenience
pub use asset::{AssetMirror, MirrorOutcome};
pub use cli::MirrorCommand;
pub use error::{AssetDownloadError, AssetFailure, PageError, TransportError};
pub use file_manager::FileManager;
pub use html::{AssetKind, Element, HtmlDocument};
pub use page::{Metadata, MirrorReport, Mode, Page};
pub use transport::{ChunkStream, HttpTransport, Response, Transport, TransportConfig};
