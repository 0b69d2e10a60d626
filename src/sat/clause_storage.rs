#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Backing storage for the literals of a clause.
//!
//! Clauses are overwhelmingly short, so the default storage is a
//! `SmallVec` that keeps the literal run inline with the clause header in
//! one allocation-free block. `Vec` is also supported for callers that
//! prefer plain heap storage.

use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::mem::size_of;
use std::ops::{Index, IndexMut};
use std::slice::Iter;

pub trait LiteralStorage<L: Literal>:
    Index<usize, Output = L>
    + IndexMut<usize, Output = L>
    + FromIterator<L>
    + From<Vec<L>>
    + Extend<L>
    + AsRef<[L]>
    + Clone
    + Default
    + Debug
{
    fn push(&mut self, literal: L);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn iter(&self) -> Iter<L>;
    fn clear(&mut self);
    fn swap(&mut self, a: usize, b: usize);
    fn truncate(&mut self, len: usize);

    /// # Safety
    ///
    /// `index` must be within `[0, self.len())`.
    unsafe fn get_unchecked(&self, index: usize) -> &L;

    /// # Safety
    ///
    /// `index` must be within `[0, self.len())`.
    unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut L;

    /// Bytes spilled to the heap by this storage, for memory accounting.
    fn heap_bytes(&self) -> usize;
}

impl<L: Literal> LiteralStorage<L> for Vec<L> {
    fn push(&mut self, literal: L) {
        self.push(literal);
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn iter(&self) -> Iter<L> {
        self.as_slice().iter()
    }

    fn clear(&mut self) {
        self.clear();
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.as_mut_slice().swap(a, b);
    }

    fn truncate(&mut self, len: usize) {
        self.truncate(len);
    }

    unsafe fn get_unchecked(&self, index: usize) -> &L {
        self.as_slice().get_unchecked(index)
    }

    unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut L {
        self.as_mut_slice().get_unchecked_mut(index)
    }

    fn heap_bytes(&self) -> usize {
        self.capacity() * size_of::<L>()
    }
}

impl<L: Literal, const N: usize> LiteralStorage<L> for SmallVec<[L; N]>
where
    [L; N]: smallvec::Array<Item = L>,
{
    fn push(&mut self, literal: L) {
        self.push(literal);
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn iter(&self) -> Iter<L> {
        self.as_slice().iter()
    }

    fn clear(&mut self) {
        self.clear();
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.as_mut_slice().swap(a, b);
    }

    fn truncate(&mut self, len: usize) {
        self.truncate(len);
    }

    unsafe fn get_unchecked(&self, index: usize) -> &L {
        self.as_slice().get_unchecked(index)
    }

    unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut L {
        self.as_mut_slice().get_unchecked_mut(index)
    }

    fn heap_bytes(&self) -> usize {
        if self.spilled() {
            self.capacity() * size_of::<L>()
        } else {
            0
        }
    }
}
