use super::{for_each_dir_entry, Validator};
use crate::xv6::image::Xv6Image;
use fcheck_core::{FsckResult, Violation};
use log::debug;

/// Directory entries and in-use inodes agree in both directions.
///
/// Entries are checked against the inode table while references are counted, so an entry
/// naming a free inode is reported before any unreferenced inode.
pub struct DirectoryReferenceValidator;

impl Validator for DirectoryReferenceValidator {
    fn name(&self) -> &'static str {
        "directory references"
    }

    fn rules(&self) -> &'static [u8] {
        &[9, 10]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        let count = fs.inode_count() as usize;
        let mut in_use = vec![false; count];
        for inode in fs.inodes() {
            let inode = inode?;
            in_use[inode.inum() as usize] = inode.is_in_use();
        }

        let mut referenced = vec![false; count];
        for_each_dir_entry(fs, |dir, entry| {
            let inum = entry.inum();
            if !in_use.get(inum as usize).copied().unwrap_or(false) {
                debug!(
                    "directory {} entry '{}' (block {} slot {}) names free inode {}",
                    dir.inum(),
                    entry.name(),
                    entry.block(),
                    entry.slot(),
                    inum
                );
                return Err(Violation::InodeReferencedButFree { dir: dir.inum(), inum }.into());
            }
            referenced[inum as usize] = true;
            Ok(())
        })?;

        // Slot 0 is never in use, so it is never reported
        let orphan = in_use
            .iter()
            .zip(&referenced)
            .position(|(&used, &seen)| used && !seen);
        match orphan {
            Some(inum) => Err(Violation::InodeNotInDirectory { inum: inum as u32 }.into()),
            None => Ok(()),
        }
    }
}
