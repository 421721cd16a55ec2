/// Concrete updaters, registrable by name
mod local_feed;
mod osv_feed;
mod osv_schema;

pub use local_feed::{LocalFeedConfig, LocalFeedUpdater};
pub use osv_feed::{OsvFeedConfig, OsvFeedUpdater};
pub use osv_schema::parse_osv_feed;
