pub mod errors;
pub mod params;
pub mod regime;

pub use errors::*;
pub use params::*;
pub use regime::*;
