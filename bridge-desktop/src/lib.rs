//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new("settings.db".into()).await?;
//!     // Hand both to CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
