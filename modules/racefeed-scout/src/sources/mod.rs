//! Source fetchers: each one turns an entry into zero or more stream links.
//!
//! Fetchers return `Err` on any fetch failure; the crawler logs it and treats
//! the fetcher as having found nothing for that entry.

pub mod cross_site;
pub mod direct_mirror;
