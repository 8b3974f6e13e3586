//! Storage indexed by frame slot.

use vkpbr_rhi::{RhiError, RhiResult};

/// One `T` per frame slot, with bounds-checked lookup.
///
/// An index past the last slot is reported as [`RhiError::ResourceBounds`]
/// tagged with `what`, never read.
#[derive(Debug)]
pub struct PerFrame<T> {
    what: &'static str,
    items: Vec<T>,
}

impl<T> PerFrame<T> {
    pub fn new(what: &'static str, items: Vec<T>) -> Self {
        Self { what, items }
    }

    pub fn get(&self, index: usize) -> RhiResult<&T> {
        RhiError::check_bounds(self.what, index, self.items.len())?;
        Ok(&self.items[index])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
