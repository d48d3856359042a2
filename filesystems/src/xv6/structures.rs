// xv6 on-disk structures
// Owned layouts pin the record sizes; the *Ref types are zero-copy views into the image buffer.

use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fcheck_core::{region, FsckResult};
use static_assertions::assert_eq_size;
use std::borrow::Cow;

/// Superblock stored at block 1
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Superblock {
    pub size: u32,    // Total blocks in the image
    pub nblocks: u32, // Data blocks
    pub ninodes: u32, // Inode table slots
    pub nlog: u32,    // Log blocks
}

assert_eq_size!(Superblock, [u8; SUPERBLOCK_SIZE]);

impl Superblock {
    pub fn decode(image: &[u8]) -> FsckResult<Self> {
        let offset = SUPERBLOCK_BLOCK as u64 * BSIZE as u64;
        let raw = region(image, offset, SUPERBLOCK_SIZE, "superblock")?;
        Ok(Self {
            size: LittleEndian::read_u32(&raw[SB_SIZE..]),
            nblocks: LittleEndian::read_u32(&raw[SB_NBLOCKS..]),
            ninodes: LittleEndian::read_u32(&raw[SB_NINODES..]),
            nlog: LittleEndian::read_u32(&raw[SB_NLOG..]),
        })
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[SB_SIZE..], self.size);
        LittleEndian::write_u32(&mut out[SB_NBLOCKS..], self.nblocks);
        LittleEndian::write_u32(&mut out[SB_NINODES..], self.ninodes);
        LittleEndian::write_u32(&mut out[SB_NLOG..], self.nlog);
    }
}

/// Inode type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    Unused,
    Directory,
    File,
    Device,
}

impl InodeType {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            T_UNUSED => Some(InodeType::Unused),
            T_DIR => Some(InodeType::Directory),
            T_FILE => Some(InodeType::File),
            T_DEV => Some(InodeType::Device),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u16 {
        match self {
            InodeType::Unused => T_UNUSED,
            InodeType::Directory => T_DIR,
            InodeType::File => T_FILE,
            InodeType::Device => T_DEV,
        }
    }
}

/// On-disk inode, owned copy
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskInode {
    pub kind: u16,
    pub major: u16,
    pub minor: u16,
    pub nlink: u16,
    pub size: u32,
    pub addrs: [u32; NDIRECT + 1],
}

assert_eq_size!(DiskInode, [u8; INODE_SIZE]);

impl DiskInode {
    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u16(&mut out[DI_TYPE..], self.kind);
        LittleEndian::write_u16(&mut out[DI_MAJOR..], self.major);
        LittleEndian::write_u16(&mut out[DI_MINOR..], self.minor);
        LittleEndian::write_u16(&mut out[DI_NLINK..], self.nlink);
        LittleEndian::write_u32(&mut out[DI_SIZE..], self.size);
        for (slot, addr) in self.addrs.iter().enumerate() {
            LittleEndian::write_u32(&mut out[DI_ADDRS + slot * 4..], *addr);
        }
    }
}

/// Borrowed view of one inode table slot
#[derive(Debug, Clone, Copy)]
pub struct InodeRef<'a> {
    inum: u32,
    raw: &'a [u8],
}

impl<'a> InodeRef<'a> {
    pub(crate) fn new(inum: u32, raw: &'a [u8]) -> Self {
        debug_assert_eq!(raw.len(), INODE_SIZE);
        Self { inum, raw }
    }

    pub fn inum(&self) -> u32 {
        self.inum
    }

    pub fn raw_type(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[DI_TYPE..])
    }

    /// Decoded type tag, `None` when the tag is not a known type.
    pub fn kind(&self) -> Option<InodeType> {
        InodeType::from_raw(self.raw_type())
    }

    pub fn is_in_use(&self) -> bool {
        self.raw_type() != T_UNUSED
    }

    pub fn is_directory(&self) -> bool {
        self.kind() == Some(InodeType::Directory)
    }

    pub fn is_file(&self) -> bool {
        self.kind() == Some(InodeType::File)
    }

    pub fn major(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[DI_MAJOR..])
    }

    pub fn minor(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[DI_MINOR..])
    }

    pub fn nlink(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[DI_NLINK..])
    }

    pub fn size(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[DI_SIZE..])
    }

    /// Pointer in `addrs[slot]`; slot `NDIRECT` is the indirect pointer.
    pub fn addr(&self, slot: usize) -> u32 {
        assert!(slot <= NDIRECT, "inode address slot {} out of range", slot);
        LittleEndian::read_u32(&self.raw[DI_ADDRS + slot * 4..])
    }

    /// Direct pointers with their slot numbers, including unallocated (zero) slots.
    pub fn direct(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        (0..NDIRECT).map(move |slot| (slot, self.addr(slot)))
    }

    pub fn indirect(&self) -> u32 {
        self.addr(NDIRECT)
    }

    /// True when any direct or indirect pointer is allocated.
    pub fn has_storage(&self) -> bool {
        (0..=NDIRECT).any(|slot| self.addr(slot) != 0)
    }

    pub fn to_disk(&self) -> DiskInode {
        let mut addrs = [0u32; NDIRECT + 1];
        for (slot, addr) in addrs.iter_mut().enumerate() {
            *addr = self.addr(slot);
        }
        DiskInode {
            kind: self.raw_type(),
            major: self.major(),
            minor: self.minor(),
            nlink: self.nlink(),
            size: self.size(),
            addrs,
        }
    }
}

/// Borrowed view of a data block holding `NINDIRECT` block pointers
#[derive(Debug, Clone, Copy)]
pub struct IndirectBlock<'a> {
    block: u32,
    raw: &'a [u8],
}

impl<'a> IndirectBlock<'a> {
    pub(crate) fn new(block: u32, raw: &'a [u8]) -> Self {
        debug_assert_eq!(raw.len(), BSIZE);
        Self { block, raw }
    }

    pub fn block(&self) -> u32 {
        self.block
    }

    pub fn entry(&self, slot: usize) -> u32 {
        LittleEndian::read_u32(&self.raw[slot * 4..])
    }

    /// All pointer slots in order, including unallocated (zero) ones.
    pub fn entries(&self) -> impl Iterator<Item = (usize, u32)> + 'a {
        let table = *self;
        (0..NINDIRECT).map(move |slot| (slot, table.entry(slot)))
    }
}

/// On-disk directory entry, owned copy
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskDirent {
    pub inum: u16,
    pub name: [u8; DIRSIZ],
}

assert_eq_size!(DiskDirent, [u8; DIRENT_SIZE]);

impl DiskDirent {
    /// Build an entry; names longer than `DIRSIZ` are truncated like xv6 does.
    pub fn new(inum: u16, name: &str) -> Self {
        let mut buf = [0u8; DIRSIZ];
        let len = name.len().min(DIRSIZ);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self { inum, name: buf }
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u16(&mut out[DE_INUM..], self.inum);
        out[DE_NAME..DE_NAME + DIRSIZ].copy_from_slice(&self.name);
    }
}

/// Borrowed view of one directory entry
#[derive(Debug, Clone, Copy)]
pub struct DirentRef<'a> {
    block: u32,
    slot: usize,
    raw: &'a [u8],
}

impl<'a> DirentRef<'a> {
    pub(crate) fn new(block: u32, slot: usize, raw: &'a [u8]) -> Self {
        debug_assert_eq!(raw.len(), DIRENT_SIZE);
        Self { block, slot, raw }
    }

    pub fn block(&self) -> u32 {
        self.block
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn inum(&self) -> u32 {
        LittleEndian::read_u16(&self.raw[DE_INUM..]) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.inum() == 0
    }

    /// Name bytes up to the first NUL.
    pub fn name_bytes(&self) -> &'a [u8] {
        let name = &self.raw[DE_NAME..DE_NAME + DIRSIZ];
        let end = name.iter().position(|&b| b == 0).unwrap_or(DIRSIZ);
        &name[..end]
    }

    pub fn name(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    pub fn is_dot(&self) -> bool {
        self.name_bytes() == b"."
    }

    pub fn is_dotdot(&self) -> bool {
        self.name_bytes() == b".."
    }
}
