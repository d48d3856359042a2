use super::Validator;
use crate::xv6::constants::ROOT_INO;
use crate::xv6::image::Xv6Image;
use fcheck_core::{FsckResult, Violation};
use log::debug;

/// Inode 1 is a directory whose first entry names itself and whose `..` points back at it.
pub struct RootDirectoryValidator;

impl Validator for RootDirectoryValidator {
    fn name(&self) -> &'static str {
        "root directory"
    }

    fn rules(&self) -> &'static [u8] {
        &[3]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        if ROOT_INO >= fs.inode_count() {
            debug!("inode table has no slot for the root inode");
            return Err(Violation::RootDirectoryMissing.into());
        }

        let root = fs.inode(ROOT_INO)?;
        if !root.is_directory() {
            debug!("root inode has type {}", root.raw_type());
            return Err(Violation::RootDirectoryMissing.into());
        }

        let first_block = root.addr(0);
        if first_block == 0 {
            debug!("root inode has no first block");
            return Err(Violation::RootDirectoryMissing.into());
        }

        let first_entry = fs.dirent(first_block, 0)?;
        if first_entry.inum() != ROOT_INO {
            debug!("root's first entry names inode {}", first_entry.inum());
            return Err(Violation::RootDirectoryMissing.into());
        }

        let parent_is_self = fs
            .dir_entries(&root)?
            .iter()
            .any(|entry| entry.is_dotdot() && entry.inum() == ROOT_INO);
        if !parent_is_self {
            debug!("root has no '..' entry pointing at itself");
            return Err(Violation::RootDirectoryMissing.into());
        }

        Ok(())
    }
}
