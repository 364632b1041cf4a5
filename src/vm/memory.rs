//! Data store of the machine.
//!
//! One flat array of words. The stack grows up from address 0 (`SB`); the
//! heap grows down from the top. Every heap block starts with a two-word
//! header `[tag, size]` and is addressed by its first payload word, so an
//! array's length sits at `address - 1`. Address 0 is never a heap block and
//! doubles as `null`.

use std::fmt;

/// Header tag of an array block. Objects are tagged with their class index.
pub const ARRAY_TAG: i32 = -2;

/// Words in front of every heap block.
pub const HEADER_WORDS: usize = 2;

/// A memory access that failed; the machine adds the code address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    StackOverflow,
    StackUnderflow,
    HeapExhausted,
    NullPointer,
    InvalidAddress(i32),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::StackOverflow => f.write_str("stack overflow"),
            Fault::StackUnderflow => f.write_str("stack underflow"),
            Fault::HeapExhausted => f.write_str("heap exhausted"),
            Fault::NullPointer => f.write_str("null pointer"),
            Fault::InvalidAddress(address) => write!(f, "invalid address {address}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Fault>;

#[derive(Debug, Clone)]
pub struct Memory {
    words: Vec<i32>,
    /// Stack top: first free word above the stack.
    st: usize,
    /// Heap base: lowest word in use by the heap.
    hb: usize,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            words: vec![0; size],
            st: 0,
            hb: size,
        }
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn stack_top(&self) -> usize {
        self.st
    }

    pub fn heap_base(&self) -> usize {
        self.hb
    }

    /// Words currently used by heap blocks, headers included.
    pub fn heap_words(&self) -> usize {
        self.words.len() - self.hb
    }

    /// The live stack, bottom first.
    pub fn stack(&self) -> &[i32] {
        &self.words[..self.st]
    }

    // ==========================================================================
    // Raw access
    // ==========================================================================

    fn index(&self, address: i32) -> Result<usize> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index < self.words.len())
            .ok_or(Fault::InvalidAddress(address))
    }

    pub fn read(&self, address: i32) -> Result<i32> {
        Ok(self.words[self.index(address)?])
    }

    pub fn write(&mut self, address: i32, value: i32) -> Result<()> {
        let index = self.index(address)?;
        self.words[index] = value;
        Ok(())
    }

    // ==========================================================================
    // Stack
    // ==========================================================================

    pub fn push(&mut self, value: i32) -> Result<()> {
        if self.st >= self.hb {
            return Err(Fault::StackOverflow);
        }
        self.words[self.st] = value;
        self.st += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<i32> {
        if self.st == 0 {
            return Err(Fault::StackUnderflow);
        }
        self.st -= 1;
        Ok(self.words[self.st])
    }

    /// Discard `count` words.
    pub fn drop_words(&mut self, count: usize) -> Result<()> {
        self.st = self.st.checked_sub(count).ok_or(Fault::StackUnderflow)?;
        Ok(())
    }

    /// Move the stack top, used when a frame is torn down.
    pub fn set_stack_top(&mut self, st: usize) -> Result<()> {
        if st > self.hb {
            return Err(Fault::StackOverflow);
        }
        self.st = st;
        Ok(())
    }

    // ==========================================================================
    // Heap
    // ==========================================================================

    /// Allocate a zeroed block of `size` payload words.
    pub fn alloc(&mut self, tag: i32, size: usize) -> Result<i32> {
        let total = size.checked_add(HEADER_WORDS).ok_or(Fault::HeapExhausted)?;
        let base = self
            .hb
            .checked_sub(total)
            .filter(|&base| base >= self.st && base > 0)
            .ok_or(Fault::HeapExhausted)?;

        self.words[base] = tag;
        self.words[base + 1] = size as i32;
        self.words[base + HEADER_WORDS..self.hb].fill(0);
        self.hb = base;
        Ok((base + HEADER_WORDS) as i32)
    }

    /// Check that `address` is the payload of a live heap block.
    fn block(&self, address: i32) -> Result<usize> {
        if address == 0 {
            return Err(Fault::NullPointer);
        }
        // An empty block's payload address is one past its header, which
        // for the first block is the end of memory.
        usize::try_from(address)
            .ok()
            .filter(|&index| index >= self.hb + HEADER_WORDS && index <= self.words.len())
            .ok_or(Fault::InvalidAddress(address))
    }

    pub fn tag(&self, address: i32) -> Result<i32> {
        Ok(self.words[self.block(address)? - 2])
    }

    /// Payload size of the block at `address`; an array's length.
    pub fn block_size(&self, address: i32) -> Result<i32> {
        Ok(self.words[self.block(address)? - 1])
    }

    /// Address of payload word `index`, or `None` when out of range.
    pub fn element(&self, address: i32, index: i32) -> Result<Option<i32>> {
        let size = self.block_size(address)?;
        Ok((0..size).contains(&index).then(|| address + index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_grows_up() {
        let mut memory = Memory::new(16);
        memory.push(7).unwrap();
        memory.push(8).unwrap();
        assert_eq!(memory.stack(), &[7, 8]);
        assert_eq!(memory.pop(), Ok(8));
        assert_eq!(memory.stack_top(), 1);
    }

    #[test]
    fn heap_grows_down_with_header() {
        let mut memory = Memory::new(16);
        let array = memory.alloc(ARRAY_TAG, 3).unwrap();
        assert_eq!(array, 16 - 3);
        assert_eq!(memory.block_size(array), Ok(3));
        assert_eq!(memory.tag(array), Ok(ARRAY_TAG));
        assert_eq!(memory.read(array - 1), Ok(3));
        assert_eq!(memory.heap_words(), 5);

        let object = memory.alloc(9, 2).unwrap();
        assert!(object < array);
        assert_eq!(memory.tag(object), Ok(9));
    }

    #[test]
    fn blocks_are_zeroed() {
        let mut memory = Memory::new(8);
        for i in 0..8 {
            memory.write(i, -1).unwrap();
        }
        let block = memory.alloc(1, 2).unwrap();
        assert_eq!(memory.read(block), Ok(0));
        assert_eq!(memory.read(block + 1), Ok(0));
    }

    #[test]
    fn stack_and_heap_collide() {
        let mut memory = Memory::new(6);
        memory.alloc(ARRAY_TAG, 2).unwrap();
        memory.push(1).unwrap();
        memory.push(2).unwrap();
        assert_eq!(memory.push(3), Err(Fault::StackOverflow));
        assert_eq!(memory.alloc(ARRAY_TAG, 0), Err(Fault::HeapExhausted));
    }

    #[test]
    fn null_and_stack_addresses_are_not_blocks() {
        let mut memory = Memory::new(16);
        memory.push(5).unwrap();
        assert_eq!(memory.block_size(0), Err(Fault::NullPointer));
        assert_eq!(memory.block_size(1), Err(Fault::InvalidAddress(1)));
        assert_eq!(memory.read(99), Err(Fault::InvalidAddress(99)));
    }

    #[test]
    fn empty_block_at_top_of_memory() {
        let mut memory = Memory::new(16);
        let empty = memory.alloc(ARRAY_TAG, 0).unwrap();
        assert_eq!(empty, 16);
        assert_eq!(memory.block_size(empty), Ok(0));
        assert_eq!(memory.tag(empty), Ok(ARRAY_TAG));
        assert_eq!(memory.element(empty, 0), Ok(None));
        assert_eq!(memory.block_size(17), Err(Fault::InvalidAddress(17)));
    }

    #[test]
    fn element_bounds() {
        let mut memory = Memory::new(16);
        let array = memory.alloc(ARRAY_TAG, 2).unwrap();
        assert_eq!(memory.element(array, 1), Ok(Some(array + 1)));
        assert_eq!(memory.element(array, 2), Ok(None));
        assert_eq!(memory.element(array, -1), Ok(None));
    }

    #[test]
    fn underflow_is_reported() {
        let mut memory = Memory::new(4);
        assert_eq!(memory.pop(), Err(Fault::StackUnderflow));
        assert_eq!(memory.drop_words(1), Err(Fault::StackUnderflow));
    }
}
