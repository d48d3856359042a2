// Filesystem consistency checkers
pub mod xv6;

pub use xv6::{check_image, Checker, Xv6Image};
