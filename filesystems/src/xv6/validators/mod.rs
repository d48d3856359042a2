// xv6 consistency validators
// Each validator owns its scratch state, scans the image itself, and stops at the first offender.

mod address_range;
mod address_uniqueness;
mod bitmap_consistency;
mod directory_format;
mod directory_reference;
mod inode_type;
mod link_count;
mod root_directory;

pub use address_range::AddressRangeValidator;
pub use address_uniqueness::AddressUniquenessValidator;
pub use bitmap_consistency::BitmapConsistencyValidator;
pub use directory_format::DirectoryFormatValidator;
pub use directory_reference::DirectoryReferenceValidator;
pub use inode_type::InodeTypeValidator;
pub use link_count::LinkCountValidator;
pub use root_directory::RootDirectoryValidator;

use super::image::Xv6Image;
use super::structures::{DirentRef, InodeRef};
use fcheck_core::FsckResult;

/// One consistency check over a decoded image
pub trait Validator {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Consistency rules this validator enforces
    fn rules(&self) -> &'static [u8];

    /// Pass silently or return the first violation found.
    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()>;
}

/// All validators, in the order they must run
pub fn default_validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(InodeTypeValidator),
        Box::new(AddressRangeValidator),
        Box::new(RootDirectoryValidator),
        Box::new(DirectoryFormatValidator),
        Box::new(BitmapConsistencyValidator),
        Box::new(AddressUniquenessValidator),
        Box::new(DirectoryReferenceValidator),
        Box::new(LinkCountValidator),
    ]
}

/// Visit every non-empty entry of every in-use directory that owns storage, in table order.
pub(crate) fn for_each_dir_entry<'a, F>(fs: &Xv6Image<'a>, mut visit: F) -> FsckResult<()>
where
    F: FnMut(&InodeRef<'a>, &DirentRef<'a>) -> FsckResult<()>,
{
    for dir in fs.inodes() {
        let dir = dir?;
        if !dir.is_directory() || !dir.has_storage() {
            continue;
        }
        for entry in fs.dir_entries(&dir)? {
            visit(&dir, &entry)?;
        }
    }
    Ok(())
}
