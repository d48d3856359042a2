use super::Validator;
use crate::xv6::image::Xv6Image;
use fcheck_core::{FsckResult, Violation};
use log::debug;

/// Every directory has a `.` entry naming itself and a `..` entry.
pub struct DirectoryFormatValidator;

impl Validator for DirectoryFormatValidator {
    fn name(&self) -> &'static str {
        "directory format"
    }

    fn rules(&self) -> &'static [u8] {
        &[4]
    }

    fn validate(&self, fs: &Xv6Image<'_>) -> FsckResult<()> {
        for dir in fs.inodes() {
            let dir = dir?;
            if !dir.is_directory() {
                continue;
            }

            let mut has_dot = false;
            let mut has_dotdot = false;
            let mut dot_is_self = false;

            for entry in fs.dir_entries(&dir)? {
                if entry.is_dot() {
                    has_dot = true;
                    dot_is_self |= entry.inum() == dir.inum();
                }
                if entry.is_dotdot() {
                    has_dotdot = true;
                }
                if has_dot && has_dotdot && dot_is_self {
                    break;
                }
            }

            if !(has_dot && has_dotdot && dot_is_self) {
                debug!(
                    "directory {}: '.' {} (self {}), '..' {}",
                    dir.inum(),
                    has_dot,
                    dot_is_self,
                    has_dotdot
                );
                return Err(Violation::DirectoryNotFormatted { inum: dir.inum() }.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xv6::constants::{DIRENTS_PER_BLOCK, ROOT_INO};
    use crate::xv6::test_helpers::ImageBuilder;

    fn check(builder: ImageBuilder) -> Option<Violation> {
        let bytes = builder.build();
        let fs = Xv6Image::new(&bytes).unwrap();
        DirectoryFormatValidator.validate(&fs).err().and_then(|e| e.violation().cloned())
    }

    #[test]
    fn nested_directories_pass() {
        let mut builder = ImageBuilder::new();
        let usr = builder.mkdir(ROOT_INO, "usr");
        builder.mkdir(usr, "bin");
        assert_eq!(check(builder), None);
    }

    #[test]
    fn dot_pointing_elsewhere_fails() {
        let mut builder = ImageBuilder::new();
        let dir = builder.mkdir(ROOT_INO, "a");
        let block = builder.inode(dir).addrs[0];
        builder.put_dirent(block, 0, ROOT_INO as u16, ".");
        assert_eq!(check(builder), Some(Violation::DirectoryNotFormatted { inum: dir }));
    }

    #[test]
    fn missing_dotdot_fails() {
        let mut builder = ImageBuilder::new();
        let dir = builder.mkdir(ROOT_INO, "a");
        let block = builder.inode(dir).addrs[0];
        builder.put_dirent(block, 1, 0, "");
        assert_eq!(check(builder), Some(Violation::DirectoryNotFormatted { inum: dir }));
    }

    #[test]
    fn later_directory_is_still_scanned() {
        let mut builder = ImageBuilder::new();
        builder.mkdir(ROOT_INO, "a");
        builder.create_file(ROOT_INO, "f", 1);
        let last = builder.mkdir(ROOT_INO, "z");
        let block = builder.inode(last).addrs[0];
        builder.put_dirent(block, 0, 0, "");
        assert_eq!(check(builder), Some(Violation::DirectoryNotFormatted { inum: last }));
    }

    #[test]
    fn entries_in_a_second_block_count() {
        let mut builder = ImageBuilder::new();
        let dir = builder.mkdir(ROOT_INO, "a");
        let file = builder.create_file(dir, "f", 0);
        for i in 0..DIRENTS_PER_BLOCK {
            builder.link(dir, &format!("l{}", i), file);
        }
        // Move '..' out of the first block into the last slot written
        let first = builder.inode(dir).addrs[0];
        builder.put_dirent(first, 1, 0, "");
        builder.link(dir, "..", ROOT_INO);
        assert_eq!(check(builder), None);
    }
}
