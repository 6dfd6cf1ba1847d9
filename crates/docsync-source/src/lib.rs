//! # docsync source
//!
//! Source listing abstraction for docsync. The [`SourceLister`] trait
//! enumerates deliverables, resolves each one to a fetchable URL and
//! retrieves its bytes.
//!
//! ## Implementations
//!
//! - [`HttpSource`] - JSON listing plus HTTP fetches over one shared client
//! - [`MemorySource`] - In-memory documents for tests and demos
//!
//! ## Errors
//!
//! - [`ListingError`] - fatal to a sync run
//! - [`FetchError`] - local to one item; distinguishes `NotFound` from
//!   transient failures

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::{FetchError, ListingError, Result};
pub use http::{HttpSource, HttpSourceConfig};
pub use memory::MemorySource;
pub use traits::SourceLister;
