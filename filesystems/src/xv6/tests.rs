// End-to-end checks: one corrupted image per consistency rule, plus valid images that must pass

use super::constants::*;
use super::image::Xv6Image;
use super::structures::InodeType;
use super::test_helpers::ImageBuilder;
use super::validators::default_validators;
use super::{check_image, Checker};
use fcheck_core::{FsckError, Violation};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn violation_of(builder: ImageBuilder) -> Option<Violation> {
    init_logging();
    let bytes = builder.build();
    match check_image(&bytes) {
        Ok(()) => None,
        Err(FsckError::Violation(v)) => Some(v),
        Err(e) => panic!("expected a rule violation, got {}", e),
    }
}

fn rule_of(builder: ImageBuilder) -> Option<u8> {
    violation_of(builder).map(|v| v.rule())
}

#[test]
fn fresh_image_is_consistent() {
    assert_eq!(violation_of(ImageBuilder::new()), None);
}

#[test]
fn populated_image_is_consistent() {
    let mut builder = ImageBuilder::with_geometry(64, 1024);
    let bin = builder.mkdir(ROOT_INO, "bin");
    let usr = builder.mkdir(ROOT_INO, "usr");
    let share = builder.mkdir(usr, "share");
    builder.create_file(bin, "sh", 3);
    builder.create_file(share, "big", NDIRECT + 20);
    builder.create_file(usr, "empty", 0);
    builder.mknod(ROOT_INO, "console", 1, 1);

    let shared = builder.create_file(ROOT_INO, "README", 1);
    builder.link(share, "README", shared);
    builder.set_nlink(shared, 2);

    // Enough entries to push the root directory through its indirect block
    let many = builder.create_file(ROOT_INO, "n0", 0);
    for i in 1..400 {
        builder.link(ROOT_INO, &format!("n{}", i), many);
    }
    builder.set_nlink(many, 400);
    assert_ne!(builder.inode(ROOT_INO).addrs[NDIRECT], 0);

    assert_eq!(violation_of(builder), None);
}

#[test]
fn image_with_exact_inode_block_multiple_is_consistent() {
    let mut builder = ImageBuilder::with_geometry(IPB, 64);
    assert_eq!(builder.geometry().inode_blocks, 1);
    builder.create_file(ROOT_INO, "f", 2);
    assert_eq!(violation_of(builder), None);
}

// Each fixture breaks exactly one rule; every validator not enforcing that rule must accept it.

type Fixture = fn() -> (ImageBuilder, Violation);

fn unknown_type_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let file = builder.create_file(ROOT_INO, "f", 1);
    let mut disk = builder.inode(file);
    disk.kind = 7;
    builder.put_inode(file, &disk);
    (builder, Violation::BadInode { inum: file, raw_type: 7 })
}

/// One-block file whose only pointer is moved to `target`; the abandoned block is freed.
fn moved_direct_pointer(target: impl FnOnce(&ImageBuilder) -> u32) -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let block = target(&builder);
    let file = builder.create_file(ROOT_INO, "f", 1);
    let mut disk = builder.inode(file);
    builder.set_bitmap_bit(disk.addrs[0], false);
    disk.addrs[0] = block;
    builder.put_inode(file, &disk);
    (builder, Violation::BadDirectAddress { inum: file, slot: 0, block })
}

fn direct_into_bitmap_fixture() -> (ImageBuilder, Violation) {
    moved_direct_pointer(|b| b.geometry().last_bitmap_block)
}

fn direct_past_end_fixture() -> (ImageBuilder, Violation) {
    moved_direct_pointer(|b| b.geometry().block_count)
}

fn indirect_past_end_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let end = builder.geometry().block_count;
    let file = builder.create_file(ROOT_INO, "f", NDIRECT + 1);
    let mut disk = builder.inode(file);
    let table = disk.addrs[NDIRECT];
    let entry = builder.indirect_entry(table, 0);
    builder.put_indirect(table, 0, 0);
    builder.set_bitmap_bit(entry, false);
    builder.set_bitmap_bit(table, false);
    disk.addrs[NDIRECT] = end;
    builder.put_inode(file, &disk);
    (builder, Violation::BadIndirectAddress { inum: file, block: end })
}

fn root_parent_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let child = builder.mkdir(ROOT_INO, "a");
    let block = builder.inode(ROOT_INO).addrs[0];
    builder.put_dirent(block, 1, child as u16, "..");
    (builder, Violation::RootDirectoryMissing)
}

fn dot_elsewhere_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let dir = builder.mkdir(ROOT_INO, "a");
    let block = builder.inode(dir).addrs[0];
    builder.put_dirent(block, 0, ROOT_INO as u16, ".");
    (builder, Violation::DirectoryNotFormatted { inum: dir })
}

fn marked_free_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let file = builder.create_file(ROOT_INO, "f", 2);
    let block = builder.inode(file).addrs[1];
    builder.set_bitmap_bit(block, false);
    (builder, Violation::AddressMarkedFree { inum: file, block })
}

fn leaked_block_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    builder.create_file(ROOT_INO, "f", 1);
    let block = builder.alloc_block();
    (builder, Violation::BitmapBlockUnused { block })
}

fn shared_direct_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let a = builder.create_file(ROOT_INO, "a", 1);
    let b = builder.create_file(ROOT_INO, "b", 1);
    let shared = builder.inode(a).addrs[0];
    let mut disk = builder.inode(b);
    builder.set_bitmap_bit(disk.addrs[0], false);
    disk.addrs[0] = shared;
    builder.put_inode(b, &disk);
    (builder, Violation::DirectAddressReused { inum: b, block: shared })
}

fn shared_indirect_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let a = builder.create_file(ROOT_INO, "a", NDIRECT + 1);
    let b = builder.create_file(ROOT_INO, "b", 0);
    let table = builder.inode(a).addrs[NDIRECT];
    let mut disk = builder.inode(b);
    disk.addrs[NDIRECT] = table;
    disk.size = BSIZE as u32;
    builder.put_inode(b, &disk);
    (builder, Violation::IndirectAddressReused { inum: b, block: table })
}

fn orphan_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    builder.create_file(ROOT_INO, "f", 1);
    let orphan = builder.alloc_inode(InodeType::File);
    builder.set_nlink(orphan, 0);
    (builder, Violation::InodeNotInDirectory { inum: orphan })
}

fn free_reference_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    builder.link(ROOT_INO, "ghost", 5);
    (builder, Violation::InodeReferencedButFree { dir: ROOT_INO, inum: 5 })
}

fn nlink_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let file = builder.create_file(ROOT_INO, "f", 1);
    builder.set_nlink(file, 2);
    (builder, Violation::BadFileReferenceCount { inum: file, nlink: 2, references: 1 })
}

fn directory_alias_fixture() -> (ImageBuilder, Violation) {
    let mut builder = ImageBuilder::new();
    let dir = builder.mkdir(ROOT_INO, "a");
    builder.link(ROOT_INO, "alias", dir);
    (builder, Violation::DirectoryLinkedTwice { inum: dir, references: 2 })
}

const FIXTURES: [(&str, Fixture); 14] = [
    ("unknown type", unknown_type_fixture),
    ("direct pointer into bitmap", direct_into_bitmap_fixture),
    ("direct pointer past end", direct_past_end_fixture),
    ("indirect pointer past end", indirect_past_end_fixture),
    ("root parent", root_parent_fixture),
    ("dot names another inode", dot_elsewhere_fixture),
    ("used block marked free", marked_free_fixture),
    ("leaked block", leaked_block_fixture),
    ("shared direct block", shared_direct_fixture),
    ("shared indirect block", shared_indirect_fixture),
    ("orphan inode", orphan_fixture),
    ("reference to free inode", free_reference_fixture),
    ("file link count", nlink_fixture),
    ("directory alias", directory_alias_fixture),
];

fn expect_fixture(fixture: Fixture) {
    let (builder, expected) = fixture();
    assert_eq!(violation_of(builder), Some(expected));
}

#[test]
fn unknown_inode_type() {
    expect_fixture(unknown_type_fixture);
}

#[test]
fn direct_pointer_into_bitmap() {
    expect_fixture(direct_into_bitmap_fixture);
}

#[test]
fn direct_pointer_past_end() {
    expect_fixture(direct_past_end_fixture);
}

#[test]
fn indirect_pointer_past_end() {
    expect_fixture(indirect_past_end_fixture);
}

#[test]
fn root_parent_is_not_root() {
    expect_fixture(root_parent_fixture);
}

#[test]
fn directory_dot_names_another_inode() {
    expect_fixture(dot_elsewhere_fixture);
}

#[test]
fn used_block_marked_free() {
    expect_fixture(marked_free_fixture);
}

#[test]
fn bitmap_leaks_a_block() {
    expect_fixture(leaked_block_fixture);
}

#[test]
fn direct_block_shared_by_two_files() {
    expect_fixture(shared_direct_fixture);
}

#[test]
fn indirect_block_shared_by_two_files() {
    expect_fixture(shared_indirect_fixture);
}

#[test]
fn allocated_inode_without_directory_entry() {
    expect_fixture(orphan_fixture);
}

#[test]
fn directory_entry_names_free_inode() {
    expect_fixture(free_reference_fixture);
}

#[test]
fn file_link_count_too_high() {
    expect_fixture(nlink_fixture);
}

#[test]
fn directory_linked_from_two_places() {
    expect_fixture(directory_alias_fixture);
}

#[test]
fn fixtures_break_no_other_rule() {
    init_logging();
    for (name, fixture) in FIXTURES {
        let (builder, expected) = fixture();
        let bytes = builder.build();
        let fs = Xv6Image::new(&bytes).unwrap();
        for validator in default_validators() {
            let result = validator.validate(&fs);
            if validator.rules().contains(&expected.rule()) {
                assert_eq!(
                    result.unwrap_err().violation(),
                    Some(&expected),
                    "{}: {}",
                    name,
                    validator.name()
                );
            } else {
                assert!(result.is_ok(), "{}: {} reported {:?}", name, validator.name(), result);
            }
        }
    }
}

#[test]
fn fixtures_cover_every_rule() {
    let mut rules: Vec<u8> = FIXTURES.iter().map(|(_, fixture)| fixture().1.rule()).collect();
    rules.sort_unstable();
    rules.dedup();
    assert_eq!(rules, (1..=12).collect::<Vec<u8>>());
}


#[test]
fn earlier_rule_is_reported_first() {
    let mut builder = ImageBuilder::new();
    let file = builder.create_file(ROOT_INO, "f", 1);
    builder.set_nlink(file, 3);
    builder.alloc_block();
    let mut disk = builder.inode(file);
    disk.kind = 9;
    builder.put_inode(file, &disk);
    assert_eq!(rule_of(builder), Some(1));
}

#[test]
fn repeated_runs_agree() {
    init_logging();
    let mut builder = ImageBuilder::new();
    builder.create_file(ROOT_INO, "f", 1);
    builder.alloc_block();
    let bytes = builder.build();

    let checker = Checker::new(&bytes).unwrap();
    let first = checker.run().unwrap_err();
    let second = checker.run().unwrap_err();
    assert_eq!(first.violation(), second.violation());
    assert_eq!(first.to_string(), "ERROR: bitmap marks block in use but it is not in use.");
}

#[test]
fn checker_lists_validators_in_rule_order() {
    let bytes = ImageBuilder::new().build();
    let checker = Checker::new(&bytes).unwrap();
    let names = checker.validators();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "inode types");
    assert_eq!(names[7], "link counts");
    assert_eq!(checker.image().inode_count(), ImageBuilder::DEFAULT_INODES);
}

#[test]
fn truncated_image_is_not_a_violation() {
    init_logging();
    let mut bytes = ImageBuilder::new().build();
    bytes.truncate(bytes.len() / 2);
    let err = check_image(&bytes).unwrap_err();
    assert!(matches!(err, FsckError::Decode { .. }));
    assert!(!err.is_violation());
}

#[test]
fn wild_pointer_in_empty_directory_is_decode_error() {
    let mut builder = ImageBuilder::new();
    let dir = builder.mkdir(ROOT_INO, "a");
    let mut disk = builder.inode(dir);
    builder.set_bitmap_bit(disk.addrs[0], false);
    disk.size = 0;
    disk.addrs[0] = 1_000_000;
    builder.put_inode(dir, &disk);
    let bytes = builder.build();

    let err = check_image(&bytes).unwrap_err();
    assert!(matches!(err, FsckError::Decode { what: "block", .. }), "{}", err);
}

#[test]
fn empty_buffer_is_decode_error() {
    assert!(matches!(check_image(&[]), Err(FsckError::Decode { .. })));
}

#[test]
fn superblock_without_data_region_is_geometry_error() {
    let bytes = ImageBuilder::new().with_superblock(|sb| sb.size = 4).build();
    assert!(matches!(check_image(&bytes), Err(FsckError::Geometry(_))));
}
