use std::fmt;

use crate::types::PropertyIndex;

/// One bit per flattened property of a class
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct DiffMask {
    mask: Vec<u8>,
    len: usize,
}

impl DiffMask {
    /// Creates a clear mask covering `len` properties
    pub fn new(len: usize) -> Self {
        Self {
            mask: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Creates a mask with every property set
    pub fn full(len: usize) -> Self {
        let mut mask = Self::new(len);
        for index in 0..len {
            mask.set_bit(index as PropertyIndex, true);
        }
        mask
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit(&self, index: PropertyIndex) -> Option<bool> {
        let index = usize::from(index);
        if index >= self.len {
            return None;
        }
        Some(self.mask[index / 8] & (1 << (index % 8)) != 0)
    }

    /// Bits beyond `len` are ignored
    pub fn set_bit(&mut self, index: PropertyIndex, value: bool) {
        let index = usize::from(index);
        if index >= self.len {
            return;
        }
        let bit = 1 << (index % 8);
        if value {
            self.mask[index / 8] |= bit;
        } else {
            self.mask[index / 8] &= !bit;
        }
    }

    pub fn clear(&mut self) {
        self.mask.iter_mut().for_each(|byte| *byte = 0);
    }

    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }

    pub fn or(&mut self, other: &DiffMask) {
        for (byte, other) in self.mask.iter_mut().zip(&other.mask) {
            *byte |= *other;
        }
    }

    /// Clears every bit that is set in `other`
    pub fn nand(&mut self, other: &DiffMask) {
        for (byte, other) in self.mask.iter_mut().zip(&other.mask) {
            *byte &= !*other;
        }
    }

    /// Set indices, ascending
    pub fn iter_set(&self) -> impl Iterator<Item = PropertyIndex> + '_ {
        (0..self.len)
            .map(|index| index as PropertyIndex)
            .filter(|index| self.bit(*index) == Some(true))
    }

    pub fn count(&self) -> usize {
        self.mask.iter().map(|byte| byte.count_ones() as usize).sum()
    }
}

impl fmt::Debug for DiffMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: String = (0..self.len)
            .map(|index| match self.bit(index as PropertyIndex) {
                Some(true) => '1',
                _ => '0',
            })
            .collect();
        write!(f, "DiffMask({})", bits)
    }
}
