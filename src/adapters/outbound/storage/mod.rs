/// Update store adapters
mod json_blob_store;

pub use json_blob_store::JsonBlobStore;
