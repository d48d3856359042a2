use super::Validator;
use crate::xv6::image::Xv6Image;
use fcheck_core::{FsckResult, Violation};
use log::trace;

/// Every in-use inode carries a known type tag.
pub struct InodeTypeValidator;

impl Validator for InodeTypeValidator {
    fn name(&self) -> &'static str {
        "inode types"
    }

    fn rules(&self) -> &'static [u8] {
        &[1]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        for inode in fs.inodes() {
            let inode = inode?;
            if !inode.is_in_use() {
                continue;
            }
            trace!("inode {}: type {}", inode.inum(), inode.raw_type());
            if inode.kind().is_none() {
                return Err(Violation::BadInode {
                    inum: inode.inum(),
                    raw_type: inode.raw_type(),
                }
                .into());
            }
        }
        Ok(())
    }
}
