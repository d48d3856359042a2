use super::Validator;
use crate::xv6::bitmap::BlockSet;
use crate::xv6::image::Xv6Image;
use fcheck_core::{FsckResult, Violation};
use log::trace;

/// The on-disk bitmap agrees with the blocks reachable from in-use inodes.
///
/// The forward pass fails as soon as a reachable block is marked free. Leaked blocks
/// (marked used, reachable from nowhere) can only be found once that pass completes.
pub struct BitmapConsistencyValidator;

impl Validator for BitmapConsistencyValidator {
    fn name(&self) -> &'static str {
        "bitmap consistency"
    }

    fn rules(&self) -> &'static [u8] {
        &[5, 6]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        let geometry = fs.geometry();
        let bitmap = fs.bitmap()?;
        let mut observed = BlockSet::new(geometry.first_data_block, geometry.block_count);

        for inode in fs.inodes() {
            let inode = inode?;
            if !inode.is_in_use() || !inode.has_storage() {
                continue;
            }

            for block_ref in fs.block_refs(&inode)? {
                if !geometry.is_data_block(block_ref.block) {
                    continue;
                }
                if !bitmap.is_allocated(block_ref.block) {
                    return Err(Violation::AddressMarkedFree {
                        inum: inode.inum(),
                        block: block_ref.block,
                    }
                    .into());
                }
                observed.insert(block_ref.block);
            }
        }
        trace!("{} data blocks reachable from inodes", observed.len());

        for block in bitmap.allocated_in(geometry.first_data_block..geometry.block_count) {
            if !observed.contains(block) {
                return Err(Violation::BitmapBlockUnused { block }.into());
            }
        }
        Ok(())
    }
}
