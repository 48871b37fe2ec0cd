pub mod elevation_raster;
pub mod manifest;
pub mod scene_config;
pub mod scene_package;
pub mod trajectory;

pub use elevation_raster::*;
pub use manifest::*;
pub use scene_config::*;
pub use scene_package::*;
pub use trajectory::*;
