//! Service layer
//!
//! Business logic over the storage, fast-store, and cache seams. Each
//! service takes its collaborators at construction; no globals.

mod link_service;
mod rate_limiter;
mod sequence;
mod sync;

pub use link_service::{LinkService, ResolvedLink, UrlStats};
pub use rate_limiter::RateLimiter;
pub use sequence::SequenceAllocator;
pub use sync::{SyncReport, SyncWorker};
