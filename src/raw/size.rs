use super::handle::Handle;

/// Number of entries in a subtree.
///
/// Shares the niche-optimised representation of [`Handle`]; a subtree can never
/// hold more nodes than the arena can address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Size(Handle);

impl Size {
    pub(crate) const MAX: usize = Handle::MAX;
    pub(crate) const ZERO: Self = Self::from_usize(0);
    pub(crate) const ONE: Self = Self::from_usize(1);

    #[inline]
    pub(crate) const fn from_usize(size: usize) -> Self {
        assert!(size <= Self::MAX, "`Size::from_usize()` - `size` > `Size::MAX`!");
        Self(Handle::from_index(size))
    }

    #[inline]
    pub(crate) const fn to_usize(self) -> usize {
        self.0.to_index()
    }

    /// Size of a subtree whose root has children of sizes `left` and `right`.
    #[inline]
    pub(crate) const fn of_subtree(left: Self, right: Self) -> Self {
        Self::from_usize(1 + left.to_usize() + right.to_usize())
    }
}
