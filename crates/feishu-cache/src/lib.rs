//! Cache implementations for the token manager.
//!
//! The [`Cache`] trait itself lives in `feishu-core`; it is re-exported here.

mod in_memory;

pub use in_memory::InMemoryCache;

pub use feishu_core::Cache;
