pub mod cache;
pub mod service;

pub use cache::{AdCache, ad_key};
pub use service::{AdService, CacheHealth};
