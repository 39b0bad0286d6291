//! Lowest-index-first selection over per-slot flags.

/// Most slots a [`SlotMask`] can describe.
pub const MAX_SLOTS: usize = u128::BITS as usize;

/// One bit per slot. Rebuilt from slot state every tick, never cached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotMask(u128);

impl SlotMask {
    pub const EMPTY: Self = SlotMask(0);

    pub fn with(self, slot: usize) -> Self {
        debug_assert!(slot < MAX_SLOTS);
        SlotMask(self.0 | (1 << slot))
    }

    pub fn contains(self, slot: usize) -> bool {
        slot < MAX_SLOTS && self.0 & (1 << slot) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Priority encoder: the lowest set slot, or `None` when no slot is set.
    pub fn lowest(self) -> Option<usize> {
        (self.0 != 0).then(|| self.0.trailing_zeros() as usize)
    }
}

impl FromIterator<bool> for SlotMask {
    fn from_iter<I: IntoIterator<Item = bool>>(flags: I) -> Self {
        flags
            .into_iter()
            .enumerate()
            .filter(|(_, flag)| *flag)
            .fold(SlotMask::EMPTY, |mask, (slot, _)| mask.with(slot))
    }
}
