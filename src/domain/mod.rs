//! Domain models and types for deal-etl.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ScanId`], [`TenantId`], [`Cursor`])
//! - **Deal models** ([`RawDeal`], [`DealPage`], [`TransformedDeal`])
//! - **Error types** ([`EtlError`], [`RemoteError`], [`CheckpointWriteError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, EtlError>`]:
//!
//! ```rust
//! use deal_etl::domain::{EtlError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = deal_etl::config::load_config("deal-etl.toml")?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod deal;
pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use deal::{DealPage, RawDeal, TransformedDeal, SOURCE_SERVICE};
pub use errors::{CheckpointWriteError, EtlError, RemoteError};
pub use ids::{Cursor, ScanId, TenantId};
pub use result::Result;
