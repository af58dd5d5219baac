//! Generation-checked handles for objects owned across the C boundary.
//!
//! A handle packs a slot index (high 32 bits) and that slot's generation
//! (low 32 bits). Removing an entry bumps its slot's generation, so a
//! handle kept after destroy resolves to nothing rather than to whatever
//! reuses the slot.

fn pack(slot: u32, generation: u32) -> u64 {
    (u64::from(slot) << 32) | u64::from(generation)
}

fn unpack(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot table mapping `u64` handles to owned values.
pub(crate) struct HandleTable<T> {
    entries: Vec<Entry<T>>,
    vacant: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            vacant: Vec::new(),
            live: 0,
        }
    }

    /// Store `value`, reusing a vacant slot if there is one.
    pub fn insert(&mut self, value: T) -> u64 {
        self.live += 1;
        if let Some(slot) = self.vacant.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.value = Some(value);
            return pack(slot, entry.generation);
        }
        let slot = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        pack(slot, 0)
    }

    /// The value behind `handle`, or `None` if it is stale or was never
    /// issued.
    pub fn get(&self, handle: u64) -> Option<&T> {
        let (slot, generation) = unpack(handle);
        let entry = self.entries.get(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        entry.value.as_ref()
    }

    /// Take the value out and invalidate `handle`. Removing twice is a
    /// harmless `None`.
    ///
    /// A slot whose generation wraps to 0 is retired for good: reusing it
    /// would let a handle from its first life resolve again.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (slot, generation) = unpack(handle);
        let entry = self.entries.get_mut(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        if entry.generation != 0 {
            self.vacant.push(slot);
        }
        self.live -= 1;
        Some(value)
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_value_is_reachable() {
        let mut table = HandleTable::new();
        let h = table.insert("ctx");
        assert_eq!(table.get(h), Some(&"ctx"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn removed_handle_goes_stale() {
        let mut table = HandleTable::new();
        let h = table.insert(7u32);
        assert_eq!(table.remove(h), Some(7));
        assert_eq!(table.get(h), None);
        assert_eq!(table.remove(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut table = HandleTable::new();
        let old = table.insert(1u32);
        table.remove(old);
        let new = table.insert(2u32);

        let (old_slot, old_gen) = unpack(old);
        let (new_slot, new_gen) = unpack(new);
        assert_eq!(old_slot, new_slot);
        assert_eq!(new_gen, old_gen + 1);
        assert_eq!(table.get(old), None);
        assert_eq!(table.get(new), Some(&2));
    }

    #[test]
    fn never_issued_handle_is_unknown() {
        let table: HandleTable<u32> = HandleTable::new();
        assert_eq!(table.get(pack(42, 0)), None);
    }

    #[test]
    fn wrapped_slot_is_retired() {
        let mut table = HandleTable::new();
        let h = table.insert(1u32);
        table.remove(h);
        table.entries[0].generation = u32::MAX;

        let last = table.insert(2u32);
        assert_eq!(unpack(last), (0, u32::MAX));
        table.remove(last);
        assert!(!table.vacant.contains(&0));

        // First-life handle must not resolve, and slot 0 is never reused.
        assert_eq!(table.get(pack(0, 0)), None);
        let (slot, _) = unpack(table.insert(3u32));
        assert_ne!(slot, 0);
    }
}
