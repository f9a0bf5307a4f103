pub mod asset_index;

pub use asset_index::{AssetFetch, AssetIndex};
