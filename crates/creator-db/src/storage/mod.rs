mod local;

pub(crate) use local::{join_public_url, validate_blob_path};
pub use local::LocalBlobStorage;
