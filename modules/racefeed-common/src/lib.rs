pub mod config;
pub mod error;
pub mod title;
pub mod types;

pub use config::Config;
pub use error::RaceFeedError;
pub use title::similar;
pub use types::*;
