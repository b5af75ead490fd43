use core::ops::Deref;

use crate::{
    decode::{Decode, DecodeError},
    records::{RobotInfo, Vector2D},
};

/// A list with a fixed capacity of `N` items, stored inline.
///
/// Decoding overwrites the list in place, so a list that lives as long as its
/// owner never allocates.
#[derive(Debug, Clone)]
pub struct FixedList<T, const N: usize> {
    items: [T; N],
    len: usize,
}

pub type RobotInfoList<const N: usize> = FixedList<RobotInfo, N>;
pub type BallPositionList<const N: usize> = FixedList<Vector2D, N>;

impl<T: Copy + Default, const N: usize> FixedList<T, N> {
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }
}

impl<T: Copy + Default, const N: usize> Default for FixedList<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> FixedList<T, N> {
    pub const CAPACITY: usize = N;

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends an item, handing it back if the list is full.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        match self.items.get_mut(self.len) {
            Some(slot) => {
                *slot = item;
                self.len += 1;
                Ok(())
            }
            None => Err(item),
        }
    }
}

impl<T: Decode, const N: usize> FixedList<T, N> {
    /// Decodes `count` records from `data`, replacing the contents of the list.
    ///
    /// `count` is capped at the capacity, so no slot past `N - 1` is ever
    /// written and no more than `min(count, N)` records are consumed. If a
    /// record fails to decode the list is left empty.
    pub fn decode_from(&mut self, data: &mut &[u8], count: usize) -> Result<(), DecodeError> {
        let count = count.min(N);
        self.len = 0;

        for slot in &mut self.items[..count] {
            *slot = T::decode(data)?;
        }

        self.len = count;
        Ok(())
    }
}

impl<T, const N: usize> Deref for FixedList<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

/// Only the occupied slots take part in comparisons.
impl<T: PartialEq, const N: usize> PartialEq for FixedList<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a FixedList<T, N> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}
