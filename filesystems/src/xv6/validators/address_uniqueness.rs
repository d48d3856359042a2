use super::Validator;
use crate::xv6::bitmap::BlockSet;
use crate::xv6::image::Xv6Image;
use fcheck_core::{FsckResult, Violation};

/// No data block is claimed twice, whether through direct slots or through indirect addressing.
///
/// Direct and indirect claims share one set, so a block used directly by one inode and
/// indirectly by another is reported as well.
pub struct AddressUniquenessValidator;

impl Validator for AddressUniquenessValidator {
    fn name(&self) -> &'static str {
        "address uniqueness"
    }

    fn rules(&self) -> &'static [u8] {
        &[7, 8]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        let geometry = fs.geometry();
        let mut claimed = BlockSet::new(geometry.first_data_block, geometry.block_count);

        for inode in fs.inodes() {
            let inode = inode?;
            if !inode.is_in_use() {
                continue;
            }

            for block_ref in fs.block_refs(&inode)? {
                if !geometry.is_data_block(block_ref.block) || claimed.insert(block_ref.block) {
                    continue;
                }
                let (inum, block) = (inode.inum(), block_ref.block);
                let violation = if block_ref.is_direct() {
                    Violation::DirectAddressReused { inum, block }
                } else {
                    Violation::IndirectAddressReused { inum, block }
                };
                return Err(violation.into());
            }
        }
        Ok(())
    }
}
