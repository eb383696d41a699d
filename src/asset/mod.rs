//! Asset type management
//!
//! An asset type is one in-app currency (GOLD, POINTS, ...), identified by a
//! globally unique uppercase code and carrying its own decimal precision.

pub mod manager;
pub mod models;

pub use manager::AssetManager;
pub use models::{AssetType, NewAssetType, normalize_code};
