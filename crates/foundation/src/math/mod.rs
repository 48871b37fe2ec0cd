pub mod geodesy;
pub mod projection;
pub mod rotation;
pub mod sphere;
pub mod vec;

pub use geodesy::*;
pub use projection::*;
pub use rotation::*;
pub use sphere::*;
pub use vec::*;
