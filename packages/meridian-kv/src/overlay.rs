//! Per-block transactional overlay (§4.1). Each engine handler writes
//! through a `TxOverlay` rather than the committed store directly; on any
//! transaction error the overlay is discarded and the committed state is
//! left untouched, on success it is flushed with [`TxOverlay::commit`].

use std::collections::BTreeMap;

use cosmwasm_std::{Order, Record, Storage};

/// A buffered write-set over a borrowed base store. Reads check the
/// buffer first, then fall through to the base, so a handler sees its own
/// writes immediately (read-your-writes) without touching the base until
/// `commit`.
pub struct TxOverlay<'a> {
    base: &'a mut dyn Storage,
    // `None` is a tombstone: the key was deleted in this overlay even if
    // it still exists in the base store.
    ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> TxOverlay<'a> {
    pub fn new(base: &'a mut dyn Storage) -> Self {
        Self {
            base,
            ops: BTreeMap::new(),
        }
    }

    /// Flushes every buffered write/delete into the base store. Consumes
    /// the overlay: a committed overlay cannot be reused.
    pub fn commit(self) {
        for (key, value) in self.ops {
            match value {
                Some(v) => self.base.set(&key, &v),
                None => self.base.remove(&key),
            }
        }
    }

    /// Drops every buffered write/delete. The base store is left exactly
    /// as it was before this overlay was created.
    pub fn discard(self) {
        // Dropping `self.ops` without applying it is the whole operation.
    }

    fn merged_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .base
            .range(start, end, Order::Ascending)
            .collect();

        for (key, value) in self.in_bounds_ops(start, end) {
            match value {
                Some(v) => {
                    merged.insert(key, v);
                }
                None => {
                    merged.remove(&key);
                }
            }
        }

        merged
    }

    fn in_bounds_ops(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> impl Iterator<Item = (Vec<u8>, Option<Vec<u8>>)> + '_ {
        self.ops.iter().filter_map(move |(k, v)| {
            let after_start = start.map(|s| k.as_slice() >= s).unwrap_or(true);
            let before_end = end.map(|e| k.as_slice() < e).unwrap_or(true);
            (after_start && before_end).then(|| (k.clone(), v.clone()))
        })
    }
}

impl<'a> Storage for TxOverlay<'a> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.ops.get(key) {
            Some(Some(v)) => Some(v.clone()),
            Some(None) => None,
            None => self.base.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        let merged = self.merged_range(start, end);
        let items: Vec<Record> = match order {
            Order::Ascending => merged.into_iter().collect(),
            Order::Descending => merged.into_iter().rev().collect(),
        };
        Box::new(items.into_iter())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.ops.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.ops.insert(key.to_vec(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;

    #[test]
    fn reads_own_writes_before_commit() {
        let mut base = MockStorage::new();
        base.set(b"a", b"1");

        let mut overlay = TxOverlay::new(&mut base);
        assert_eq!(overlay.get(b"a"), Some(b"1".to_vec()));
        overlay.set(b"a", b"2");
        overlay.set(b"b", b"3");
        assert_eq!(overlay.get(b"a"), Some(b"2".to_vec()));
        overlay.commit();

        assert_eq!(base.get(b"a"), Some(b"2".to_vec()));
        assert_eq!(base.get(b"b"), Some(b"3".to_vec()));
    }

    #[test]
    fn discard_leaves_base_untouched() {
        let mut base = MockStorage::new();
        base.set(b"a", b"1");

        let mut overlay = TxOverlay::new(&mut base);
        overlay.set(b"a", b"2");
        overlay.remove(b"a");
        overlay.set(b"c", b"new");
        overlay.discard();

        assert_eq!(base.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(base.get(b"c"), None);
    }

    #[test]
    fn range_is_byte_lexicographic_and_respects_tombstones() {
        let mut base = MockStorage::new();
        base.set(b"a", b"1");
        base.set(b"b", b"2");
        base.set(b"d", b"4");

        let mut overlay = TxOverlay::new(&mut base);
        overlay.remove(b"b");
        overlay.set(b"c", b"3");

        let all: Vec<_> = overlay
            .range(None, None, Order::Ascending)
            .map(|(k, v)| (k, v))
            .collect();
        assert_eq!(
            all,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
                (b"d".to_vec(), b"4".to_vec()),
            ]
        );
    }
}
