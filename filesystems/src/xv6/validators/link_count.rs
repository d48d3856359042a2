use super::{for_each_dir_entry, Validator};
use crate::xv6::image::Xv6Image;
use crate::xv6::structures::InodeType;
use fcheck_core::{FsckResult, Violation};
use log::trace;

/// File link counts match their directory references, and no directory is linked twice.
///
/// `.` and `..` entries are not counted as references.
pub struct LinkCountValidator;

impl Validator for LinkCountValidator {
    fn name(&self) -> &'static str {
        "link counts"
    }

    fn rules(&self) -> &'static [u8] {
        &[11, 12]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        let mut references = vec![0u32; fs.inode_count() as usize];
        for_each_dir_entry(fs, |_, entry| {
            if entry.is_dot() || entry.is_dotdot() {
                return Ok(());
            }
            if let Some(count) = references.get_mut(entry.inum() as usize) {
                *count += 1;
            }
            Ok(())
        })?;

        for inode in fs.inodes() {
            let inode = inode?;
            let count = references[inode.inum() as usize];
            match inode.kind() {
                Some(InodeType::File) if count != u32::from(inode.nlink()) => {
                    return Err(Violation::BadFileReferenceCount {
                        inum: inode.inum(),
                        nlink: inode.nlink(),
                        references: count,
                    }
                    .into());
                }
                Some(InodeType::Directory) if count > 1 => {
                    return Err(Violation::DirectoryLinkedTwice {
                        inum: inode.inum(),
                        references: count,
                    }
                    .into());
                }
                _ => trace!("inode {}: {} references", inode.inum(), count),
            }
        }
        Ok(())
    }
}
