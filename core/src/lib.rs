pub mod error;
pub mod image;
pub mod violation;

pub use error::{FsckError, FsckResult};
pub use image::{region, ImageFile};
pub use violation::Violation;
