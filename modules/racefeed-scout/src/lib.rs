pub mod crawler;
pub mod document;
pub mod fetch;
pub mod hosts;
pub mod listing;
pub mod merge;
pub mod sites;
pub mod sources;
pub mod stats;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
