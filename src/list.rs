//! Doubly linked lists of forward-trie references.
//!
//! Every reverse-trie node that is a forwarding target owns one such list,
//! holding the forward-trie nodes currently forwarded onto it. All entries
//! live in a single [`Slab`] so that an entry is addressed by a plain index
//! and can be unlinked in O(1) given nothing but its handle.

use derive_new::new;
use slab::Slab;

use crate::trie::NodeId;

/// Index of a list entry in the arena.
pub(crate) type EntryId = usize;

/// One element of a source list. The `key` back-reference owns nothing.
#[derive(Debug, new)]
pub(crate) struct SourceEntry {
    /// Forward-trie node forwarded onto the list's owner.
    pub key: NodeId,
    pub prev: Option<EntryId>,
    pub next: Option<EntryId>,
}

/// Arena backing every source list in the reverse trie.
#[derive(Debug, Default)]
pub(crate) struct SourceLists {
    entries: Slab<SourceEntry>,
}

impl SourceLists {
    /// Prepends an entry for `key` to the list starting at `head` and
    /// returns it. The caller stores the returned entry as the new head.
    pub fn push_front(&mut self, head: Option<EntryId>, key: NodeId) -> EntryId {
        let entry = self.entries.insert(SourceEntry::new(key, None, head));
        if let Some(old_head) = head {
            self.entries[old_head].prev = Some(entry);
        }
        entry
    }

    /// Splices `entry` out of its list and releases it.
    ///
    /// If `entry` is the head of its list, the owner's head reference must
    /// be advanced before calling this.
    pub fn unlink(&mut self, entry: EntryId) {
        let SourceEntry { prev, next, .. } = self.entries.remove(entry);
        if let Some(prev) = prev {
            self.entries[prev].next = next;
        }
        if let Some(next) = next {
            self.entries[next].prev = prev;
        }
    }

    pub fn next(&self, entry: EntryId) -> Option<EntryId> {
        self.entries[entry].next
    }

    pub fn key(&self, entry: EntryId) -> NodeId {
        self.entries[entry].key
    }

    /// Iterates the keys of the list starting at `head`, front to back.
    pub fn keys(&self, head: Option<EntryId>) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(head, move |&entry| self.next(entry)).map(move |entry| self.key(entry))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
