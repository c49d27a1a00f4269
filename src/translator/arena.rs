//! Scoped transfer buffers
//!
//! Every call that marshals variable-length data across the engine boundary
//! (id lists, coefficient arrays, the solution bitmap) allocates it from a
//! bump arena inside a [`Scratch`] scope. Dropping the scope resets the
//! arena, so the memory is released on every exit path, errors included.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

/// Arena backing the transfer buffers of one solver
pub struct ScratchArena {
    bump: Bump,
}

impl ScratchArena {
    /// Creates a new arena
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Opens a scope; everything allocated through it is freed on drop
    pub fn scope(&mut self) -> Scratch<'_> {
        Scratch {
            bump: &mut self.bump,
        }
    }

    /// Bytes currently reserved by the arena's chunks
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::new()
    }
}

/// An open transfer-buffer scope
pub struct Scratch<'a> {
    bump: &'a mut Bump,
}

impl Scratch<'_> {
    /// Allocates an empty growable buffer
    pub fn vec<T>(&self, capacity: usize) -> BumpVec<'_, T> {
        BumpVec::with_capacity_in(capacity, &*self.bump)
    }

    /// Allocates a slice and initializes it from an iterator
    pub fn slice_from<T, I>(&self, iter: I) -> &[T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.bump.alloc_slice_fill_iter(iter)
    }

    /// Allocates an all-false bitmap of `len` entries
    pub fn bitmap(&self, len: usize) -> &mut [bool] {
        self.bump.alloc_slice_fill_copy(len, false)
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        self.bump.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_allocations() {
        let mut arena = ScratchArena::new();
        let scratch = arena.scope();

        let ids = scratch.slice_from([3u32, 1, 4]);
        let mut buffer = scratch.vec::<u64>(2);
        buffer.push(7);
        buffer.push(9);
        let bits = scratch.bitmap(5);
        bits[2] = true;

        assert_eq!(ids, &[3, 1, 4]);
        assert_eq!(buffer.as_slice(), &[7, 9]);
        assert_eq!(bits, &[false, false, true, false, false]);
    }

    #[test]
    fn test_memory_is_reused_across_scopes() {
        let mut arena = ScratchArena::new();

        {
            let scratch = arena.scope();
            scratch.bitmap(4096);
        }
        let after_first = arena.allocated_bytes();

        for _ in 0..1000 {
            let scratch = arena.scope();
            scratch.bitmap(4096);
            scratch.slice_from(0..512u32);
        }

        // Resetting keeps at most the chunks needed by one scope.
        assert!(arena.allocated_bytes() <= after_first * 4);
    }

    #[test]
    fn test_released_on_early_return() {
        fn fails(arena: &mut ScratchArena) -> Result<(), ()> {
            let scratch = arena.scope();
            scratch.bitmap(1 << 16);
            Err(())
        }

        let mut arena = ScratchArena::new();
        for _ in 0..100 {
            assert!(fails(&mut arena).is_err());
        }
        assert!(arena.allocated_bytes() < 1 << 20);
    }
}
