// Block bitmaps
// BlockBitmap reads the on-disk allocation bitmap; BlockSet is the scratch set the scans fill in.
// Bit b lives in byte b / 8 under mask 1 << (b % 8).

/// On-disk block allocation bitmap, borrowed from the image
#[derive(Debug, Clone, Copy)]
pub struct BlockBitmap<'a> {
    data: &'a [u8],
    block_count: u32,
}

impl<'a> BlockBitmap<'a> {
    pub fn new(data: &'a [u8], block_count: u32) -> Self {
        Self { data, block_count }
    }

    /// Check if a block is marked in use
    pub fn is_allocated(&self, block: u32) -> bool {
        if block >= self.block_count {
            return false;
        }

        let byte_index = (block / 8) as usize;
        let bit_index = (block % 8) as u8;

        self.data
            .get(byte_index)
            .map_or(false, |byte| byte & (1 << bit_index) != 0)
    }

    /// Blocks in `range` whose bit is set
    pub fn allocated_in(&self, range: std::ops::Range<u32>) -> impl Iterator<Item = u32> + '_ {
        range.filter(move |&block| self.is_allocated(block))
    }
}

/// Set of block numbers within `[first, end)`
#[derive(Debug, Clone)]
pub struct BlockSet {
    first: u32,
    end: u32,
    data: Vec<u8>,
}

impl BlockSet {
    pub fn new(first: u32, end: u32) -> Self {
        let span = end.saturating_sub(first);
        Self {
            first,
            end,
            data: vec![0u8; span.div_ceil(8) as usize],
        }
    }

    pub fn covers(&self, block: u32) -> bool {
        block >= self.first && block < self.end
    }

    /// Add a block. Returns false if it was already present.
    /// Blocks outside the tracked range are ignored and reported as newly added.
    pub fn insert(&mut self, block: u32) -> bool {
        if !self.covers(block) {
            return true;
        }

        let index = block - self.first;
        let byte_index = (index / 8) as usize;
        let mask = 1u8 << (index % 8);

        let fresh = self.data[byte_index] & mask == 0;
        self.data[byte_index] |= mask;
        fresh
    }

    pub fn contains(&self, block: u32) -> bool {
        if !self.covers(block) {
            return false;
        }

        let index = block - self.first;
        self.data[(index / 8) as usize] & (1 << (index % 8)) != 0
    }

    pub fn len(&self) -> usize {
        self.data.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&byte| byte == 0)
    }
}
