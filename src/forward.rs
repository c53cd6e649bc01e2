//! The forwarding index: two cross-linked tries and the four queries.
//!
//! The forward trie spells the sources of forwardings and the reverse trie
//! spells their targets. A forward node points at its target through a
//! [`Link`]; the target keeps a doubly linked list of every forward node
//! pointing at it, and the link also records this node's entry in that
//! list, so replacing or removing a forwarding unlinks in O(1).

use debug_print::debug_println;
use thiserror::Error;

use crate::digits;
use crate::list::SourceLists;
use crate::numbers::PhoneNumbers;
use crate::trie::{Link, NodeId, Trie};

/// Why an [`add`](PhoneForward::add) was rejected.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An argument is not a valid phone number.
    #[error("not a phone number")]
    NotANumber,
    /// The source and the target are the same number.
    #[error("a number cannot forward to itself")]
    SelfForward,
}

/// A mutable database of phone-number prefix forwardings.
///
/// A forwarding `A → B` rewrites every number starting with `A` by
/// replacing that prefix with `B`. When several forwarded prefixes apply
/// to a number, the longest one wins. Each source prefix carries at most
/// one forwarding; adding a second one replaces the first.
///
/// ```
/// use phonefwd::PhoneForward;
///
/// let mut pf = PhoneForward::new();
/// pf.add("123", "9").unwrap();
/// assert_eq!(pf.get("1234567").get(0), Some("94567"));
/// ```
pub struct PhoneForward {
    fwd: Trie,
    rev: Trie,
    lists: SourceLists,
}

impl Default for PhoneForward {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneForward {
    /// Creates an index with no forwardings.
    pub fn new() -> Self {
        PhoneForward {
            fwd: Trie::new(),
            rev: Trie::new(),
            lists: SourceLists::default(),
        }
    }

    /// Installs the forwarding `from` → `to`, replacing any forwarding
    /// previously installed for `from`.
    pub fn add(&mut self, from: &str, to: &str) -> Result<(), Error> {
        let from_digits = digits::to_digits(from).ok_or(Error::NotANumber)?;
        let to_digits = digits::to_digits(to).ok_or(Error::NotANumber)?;
        if from_digits == to_digits {
            return Err(Error::SelfForward);
        }

        let source = self.fwd.insert(&from_digits);
        let target = self.rev.insert(&to_digits);
        let entry = self.lists.push_front(self.rev.sources(target), source);
        self.rev.set_sources(target, Some(entry));

        // Unlink a replaced forwarding only once the new target node and
        // list entry are in place. If the old and the new target share a
        // branch, collecting the old one must see the new entry already
        // installed, or it would free nodes the new link needs.
        if let Some(old) = self.fwd.take_link(source) {
            debug_println!("phonefwd: replacing the forwarding of {}", from);
            Self::unlink_source(&mut self.rev, &mut self.lists, old);
        }
        self.fwd.set_link(source, Link { target, entry });
        Ok(())
    }

    /// Removes every forwarding whose source starts with `prefix`.
    ///
    /// A malformed prefix, or one no source starts with, is ignored.
    pub fn remove(&mut self, prefix: &str) {
        let Some(prefix_digits) = digits::to_digits(prefix) else {
            return;
        };
        let PhoneForward { fwd, rev, lists } = self;
        if fwd.remove_branch(&prefix_digits, |link| {
            Self::unlink_source(rev, lists, link)
        }) {
            debug_println!("phonefwd: removed the forwardings under {}", prefix);
        }
    }

    /// Maps `num` forward: returns the one number obtained by replacing the
    /// longest forwarded prefix of `num` with its target, or `num` itself
    /// when no forwarded prefix applies.
    ///
    /// A malformed `num` yields an empty sequence.
    pub fn get(&self, num: &str) -> PhoneNumbers {
        let mut result = PhoneNumbers::new();
        let Some(num_digits) = digits::to_digits(num) else {
            return result;
        };

        let mut pos = 0;
        let mut longest = self.fwd.root();
        while let Some(deeper) = self.fwd.find_next_occupied(longest, &num_digits, &mut pos) {
            longest = deeper;
        }

        let rewritten = match self.fwd.link(longest) {
            Some(link) => change_prefix(&self.rev, link.target, &num[pos..]),
            // only the root carries no forwarding here
            None => num.to_string(),
        };
        result.push(rewritten);
        result
    }

    /// Enumerates every number that could forward onto `num`, plus `num`
    /// itself, sorted in digit order with duplicates collapsed.
    ///
    /// The sequence contains every `x` with `get(x) == num` but may contain
    /// more: a listed source can itself be shadowed by a longer forwarded
    /// prefix. [`get_reverse`](PhoneForward::get_reverse) filters those out.
    ///
    /// A malformed `num` yields an empty sequence.
    pub fn reverse(&self, num: &str) -> PhoneNumbers {
        let mut result = PhoneNumbers::new();
        let Some(num_digits) = digits::to_digits(num) else {
            return result;
        };
        result.push(num.to_string());

        // visit every prefix of num that is a forwarding target
        let mut pos = 0;
        let mut cursor = self.rev.root();
        while let Some(target) = self.rev.find_next_occupied(cursor, &num_digits, &mut pos) {
            for source in self.lists.keys(self.rev.sources(target)) {
                result.push(change_prefix(&self.fwd, source, &num[pos..]));
            }
            cursor = target;
        }

        // two sources forwarded onto the same prefix yield equal rewrites
        result.sort_and_dedup();
        result
    }

    /// Returns exactly the numbers that [`get`](PhoneForward::get) maps to
    /// `num`, sorted in digit order.
    ///
    /// A malformed `num` yields an empty sequence.
    pub fn get_reverse(&self, num: &str) -> PhoneNumbers {
        let mut result = PhoneNumbers::new();
        let Some(num_digits) = digits::to_digits(num) else {
            return result;
        };

        // num maps to itself iff no forwarded prefix lies along it
        let mut probe = 0;
        if self
            .fwd
            .find_next_occupied(self.fwd.root(), &num_digits, &mut probe)
            .is_none()
        {
            result.push(num.to_string());
        }

        let mut pos = 0;
        let mut cursor = self.rev.root();
        while let Some(target) = self.rev.find_next_occupied(cursor, &num_digits, &mut pos) {
            for source in self.lists.keys(self.rev.sources(target)) {
                // the candidate's rewrite must not be shadowed by a deeper
                // forwarding along the remaining digits
                let mut deeper = pos;
                if self
                    .fwd
                    .find_next_occupied(source, &num_digits, &mut deeper)
                    .is_none()
                {
                    result.push(change_prefix(&self.fwd, source, &num[pos..]));
                }
            }
            cursor = target;
        }

        // distinct surviving candidates are distinct numbers, so sorting
        // alone suffices
        result.sort();
        result
    }

    /// Removes `link`'s entry from its target's source list and collects
    /// the target's branch if that left it dead.
    fn unlink_source(rev: &mut Trie, lists: &mut SourceLists, link: Link) {
        if rev.sources(link.target) == Some(link.entry) {
            rev.set_sources(link.target, lists.next(link.entry));
        }
        lists.unlink(link.entry);
        rev.collect_dead_branch(link.target);
    }
}

/// Builds the number spelled by `node` (recovered through parent links)
/// followed by `suffix`. Allocates exactly the output's length.
fn change_prefix(trie: &Trie, node: NodeId, suffix: &str) -> String {
    let prefix = trie.path(node);
    let mut out = String::with_capacity(prefix.len() + suffix.len());
    out.extend(prefix.into_iter().map(digits::digit_char));
    out.push_str(suffix);
    out
}

#[cfg(test)]
impl PhoneForward {
    /// Audits the structure the public operations rely on: parent links
    /// and the absence of vacant leaves in both trees, and the one-to-one
    /// correspondence between forward links and source-list entries.
    pub(crate) fn check_consistency(&self) {
        use crate::digits::RADIX;

        let mut linked = 0;
        for trie in [&self.fwd, &self.rev] {
            for id in trie.ids() {
                for digit in 0..RADIX as u8 {
                    if let Some(child) = trie.child(id, digit) {
                        assert_eq!(trie.parent(child), Some(id), "broken parent link");
                    }
                }
                if trie.child_count(id) == 0 {
                    assert!(!trie.is_vacant(id), "vacant leaf left behind");
                }
            }
        }

        for id in self.fwd.ids() {
            assert!(self.fwd.sources(id).is_none(), "source list in the forward trie");
            if let Some(link) = self.fwd.link(id) {
                linked += 1;
                assert_eq!(self.lists.key(link.entry), id, "entry names another node");
                assert!(
                    self.lists
                        .keys(self.rev.sources(link.target))
                        .any(|key| key == id),
                    "linked node missing from its target's source list"
                );
            }
        }

        let mut listed = 0;
        for id in self.rev.ids() {
            assert!(self.rev.link(id).is_none(), "forwarding in the reverse trie");
            let mut entry = self.rev.sources(id);
            while let Some(e) = entry {
                listed += 1;
                let source = self.lists.key(e);
                let link = self.fwd.link(source).expect("listed node is not linked");
                assert_eq!(link.target, id, "listed node targets another prefix");
                assert_eq!(link.entry, e, "listed node holds another entry handle");
                entry = self.lists.next(e);
            }
        }

        assert_eq!(linked, listed, "links and list entries out of step");
        assert_eq!(self.lists.len(), listed, "orphaned list entries");
    }
}
