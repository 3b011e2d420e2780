//! Service clients used by the workers

mod http;
mod quicksight;
mod s3;
mod traits;

#[cfg(test)]
pub mod mock;

pub use http::HttpBundleDownloader;
pub use quicksight::{QuickSightProvider, FOLDER_PAGE_SIZE};
pub use s3::S3ObjectStore;
pub use traits::*;

#[cfg(test)]
pub use mock::{MockAssetBundleApi, MockObjectStore};
