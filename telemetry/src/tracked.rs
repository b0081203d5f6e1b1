/*!
Tracked-ID index.

The set of identifiers the gateway understands, kept sorted so both the
ingestion worker and the decode table resolve an identifier to its process
image slot with a binary search.
*/

/// Immutable sorted set of tracked CAN identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedIds {
    ids: Box<[u32]>,
}

impl TrackedIds {
    /// Build the index from any list of identifiers. Duplicates collapse into one slot.
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        Self {
            ids: ids.into_boxed_slice(),
        }
    }

    /// Slot index of an identifier, or `None` if it is not tracked
    pub fn slot_of(&self, id: u32) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.slot_of(id).is_some()
    }

    /// Number of tracked identifiers (and of process image slots)
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in slot order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ids.iter().copied()
    }
}
