/// Lock source adapters
mod local_lock_source;

pub use local_lock_source::LocalLockSource;
