mod directory;
mod threaded;

pub use directory::DirectoryTileSource;
pub use threaded::ThreadedAssetStore;

use crate::TileImage;

use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FetchError {
    #[error("no tile at {0}")]
    NotFound(String),
    #[error("failed to read {locator}: {message}")]
    Io { locator: String, message: String },
    #[error("failed to decode {locator}: {message}")]
    Decode { locator: String, message: String },
    #[error("unsupported texel layout {layout} in {locator}")]
    UnsupportedLayout { locator: String, layout: String },
    #[error("request timed out after {frames} frames")]
    TimedOut { frames: u32 },
    #[error("asset store shut down before completing the request")]
    Disconnected,
}

pub type FetchResult = Result<TileImage, FetchError>;

/// Invoked exactly once per asynchronous fetch, on whichever thread finished it.
pub type FetchCallback = Box<dyn FnOnce(FetchResult) + Send + 'static>;

/// Resolves a locator string to a decoded tile.
pub trait AssetStore {
    /// Only used to bootstrap a clipmap; never called from the frame loop.
    fn fetch_blocking(&self, locator: &str) -> FetchResult;

    /// Must not block. `on_complete` may be called before this returns.
    fn fetch_async(&self, locator: String, on_complete: FetchCallback);
}

impl<S: AssetStore + ?Sized> AssetStore for Arc<S> {
    fn fetch_blocking(&self, locator: &str) -> FetchResult {
        (**self).fetch_blocking(locator)
    }

    fn fetch_async(&self, locator: String, on_complete: FetchCallback) {
        (**self).fetch_async(locator, on_complete)
    }
}

/// A blocking tile reader that can be shared between worker threads. Wrap it in a [`ThreadedAssetStore`] to get an
/// [`AssetStore`].
pub trait TileSource: Send + Sync + 'static {
    fn read(&self, locator: &str) -> FetchResult;
}
