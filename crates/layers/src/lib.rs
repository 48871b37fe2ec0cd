pub mod layer;
pub mod symbology;
pub mod terrain;
pub mod trajectory;

pub use layer::*;
pub use symbology::*;
pub use terrain::*;
pub use trajectory::*;
