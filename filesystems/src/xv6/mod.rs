// xv6 filesystem consistency checking
// On-disk layout, decoding, and the validators enforcing the twelve consistency rules.

pub mod bitmap;
pub mod checker;
pub mod constants;
pub mod geometry;
pub mod image;
pub mod structures;
pub mod validators;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(test)]
mod tests;

pub use checker::{check_image, Checker};
pub use geometry::Geometry;
pub use image::{BlockRef, BlockRefKind, Xv6Image};
pub use structures::{InodeType, Superblock};
pub use validators::Validator;
