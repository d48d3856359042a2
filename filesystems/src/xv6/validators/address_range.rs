use super::Validator;
use crate::xv6::image::{BlockRefKind, Xv6Image};
use fcheck_core::{FsckResult, Violation};

/// Block pointers of non-empty in-use inodes stay inside the data region.
///
/// Direct slots are checked first, then the indirect pointer, then the indirect block's
/// slots. The indirect block is only read once its own address is known to be valid.
pub struct AddressRangeValidator;

impl Validator for AddressRangeValidator {
    fn name(&self) -> &'static str {
        "address ranges"
    }

    fn rules(&self) -> &'static [u8] {
        &[2]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        let geometry = fs.geometry();

        for inode in fs.inodes() {
            let inode = inode?;
            if !inode.is_in_use() || inode.size() == 0 {
                continue;
            }

            for block_ref in fs.block_refs(&inode)? {
                if geometry.is_data_block(block_ref.block) {
                    continue;
                }
                let violation = match block_ref.kind {
                    BlockRefKind::Direct { slot } => Violation::BadDirectAddress {
                        inum: inode.inum(),
                        slot,
                        block: block_ref.block,
                    },
                    BlockRefKind::Indirect | BlockRefKind::IndirectEntry { .. } => {
                        Violation::BadIndirectAddress {
                            inum: inode.inum(),
                            block: block_ref.block,
                        }
                    }
                };
                return Err(violation.into());
            }
        }
        Ok(())
    }
}
