//! The radix-12 trie underlying both trees of the forwarding index.
//!
//! Nodes live in a [`Slab`] arena and refer to each other by index, so the
//! cross-links between the two trees and into the source lists are plain
//! `usize` handles that own nothing. Dropping the arena drops every node at
//! once without walking the tree.

use slab::Slab;

use crate::digits::{Digit, RADIX};
use crate::list::EntryId;

/// Index of a node in its trie's arena.
pub(crate) type NodeId = usize;

/// A forwarding carried by a forward-trie node: the reverse-trie node it
/// targets, plus the source-list entry over there that names this node back.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link {
    pub target: NodeId,
    pub entry: EntryId,
}

#[derive(Debug)]
struct Node {
    children: [Option<NodeId>; RADIX],
    /// `None` only for the root.
    parent: Option<NodeId>,
    /// Forward tree only: where this prefix forwards to.
    link: Option<Link>,
    /// Reverse tree only: head of the list of prefixes forwarded here.
    sources: Option<EntryId>,
}

impl Node {
    fn new(parent: Option<NodeId>) -> Self {
        Node {
            children: [None; RADIX],
            parent,
            link: None,
            sources: None,
        }
    }

    fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }
}

/// One tree of the index. The root is permanent and spells the empty string.
#[derive(Debug)]
pub(crate) struct Trie {
    nodes: Slab<Node>,
    root: NodeId,
}

impl Trie {
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let root = nodes.insert(Node::new(None));
        Trie { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `node` carries no payload. The root never counts as vacant,
    /// which is what keeps dead-branch collection from freeing it.
    pub fn is_vacant(&self, node: NodeId) -> bool {
        let n = &self.nodes[node];
        n.parent.is_some() && n.link.is_none() && n.sources.is_none()
    }

    pub fn child(&self, node: NodeId, digit: Digit) -> Option<NodeId> {
        self.nodes[node].children[digit as usize]
    }

    pub fn link(&self, node: NodeId) -> Option<Link> {
        self.nodes[node].link
    }

    pub fn set_link(&mut self, node: NodeId, link: Link) {
        self.nodes[node].link = Some(link);
    }

    pub fn take_link(&mut self, node: NodeId) -> Option<Link> {
        self.nodes[node].link.take()
    }

    pub fn sources(&self, node: NodeId) -> Option<EntryId> {
        self.nodes[node].sources
    }

    pub fn set_sources(&mut self, node: NodeId, head: Option<EntryId>) {
        self.nodes[node].sources = head;
    }

    /// Returns the node spelling `digits`, creating any missing part of the
    /// path. Inserting an already present path is just a lookup.
    pub fn insert(&mut self, digits: &[Digit]) -> NodeId {
        let mut current = self.root;
        for &digit in digits {
            current = match self.nodes[current].children[digit as usize] {
                Some(child) => child,
                None => {
                    let child = self.nodes.insert(Node::new(Some(current)));
                    self.nodes[current].children[digit as usize] = Some(child);
                    child
                }
            };
        }
        current
    }

    /// Returns the node spelling `digits`, if present. Never allocates.
    pub fn find(&self, digits: &[Digit]) -> Option<NodeId> {
        let mut current = self.root;
        for &digit in digits {
            current = self.nodes[current].children[digit as usize]?;
        }
        Some(current)
    }

    /// Walks down from `start` along `digits[*pos..]` and returns the first
    /// occupied descendant, leaving `*pos` on the first digit the walk did
    /// not consume. When the probe falls off the tree, or runs out of digits
    /// on vacant nodes, `*pos` is rolled back to its entry value and the
    /// probe yields `None`. `start` itself is never a result.
    pub fn find_next_occupied(
        &self,
        start: NodeId,
        digits: &[Digit],
        pos: &mut usize,
    ) -> Option<NodeId> {
        if *pos == digits.len() {
            return None;
        }
        let entry = *pos;
        let mut current = self.child(start, digits[*pos]);
        *pos += 1;

        while *pos < digits.len() {
            match current {
                Some(node) if !self.is_vacant(node) => return Some(node),
                Some(node) => {
                    current = self.child(node, digits[*pos]);
                    *pos += 1;
                }
                None => break,
            }
        }

        match current {
            Some(node) if !self.is_vacant(node) => Some(node),
            _ => {
                *pos = entry;
                None
            }
        }
    }

    /// Frees the chain of vacant nodes ending at `node`.
    ///
    /// Does nothing unless `node` is a leaf. Walks toward the root freeing
    /// every vacant node that has become a leaf in the process; the walk
    /// stops on the first occupied or still-branching node and never frees
    /// the root. Invoked after every structural change that can leave a
    /// vacant leaf behind.
    pub fn collect_dead_branch(&mut self, node: NodeId) {
        if self.nodes[node].has_children() {
            return;
        }

        let mut current = node;
        let mut is_leaf = true;
        while is_leaf && self.is_vacant(current) {
            let parent = self.nodes[current]
                .parent
                .expect("vacant nodes are never the root");

            for slot in self.nodes[parent].children.iter_mut() {
                match *slot {
                    Some(child) if child == current => *slot = None,
                    Some(_) => is_leaf = false,
                    None => {}
                }
            }

            self.nodes.remove(current);
            current = parent;
        }
    }

    /// Detaches the node spelling `digits` from its parent, removes it with
    /// its entire subtree, and collects whatever dead branch the parent was
    /// left on. Each removed forwarding is handed to `on_unlink` before its
    /// node goes away. No-op when the path is absent.
    ///
    /// Returns whether a branch was removed.
    pub fn remove_branch<F>(&mut self, digits: &[Digit], on_unlink: F) -> bool
    where
        F: FnMut(Link),
    {
        let Some(node) = self.find(digits) else {
            return false;
        };
        let Some(parent) = self.nodes[node].parent else {
            return false;
        };

        for slot in self.nodes[parent].children.iter_mut() {
            if *slot == Some(node) {
                *slot = None;
            }
        }
        self.remove_subtree(node, on_unlink);
        self.collect_dead_branch(parent);
        true
    }

    /// Removes the subtree rooted at `node`, `node` included.
    ///
    /// Iterative on purpose: paths can be tens of thousands of digits deep,
    /// so the walk keeps its own stack instead of recursing.
    fn remove_subtree<F>(&mut self, node: NodeId, mut on_unlink: F)
    where
        F: FnMut(Link),
    {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let removed = self.nodes.remove(current);
            stack.extend(removed.children.into_iter().flatten());
            if let Some(link) = removed.link {
                on_unlink(link);
            }
        }
    }

    /// Reconstructs the digits spelled by the path from the root to `node`.
    ///
    /// Nodes do not store their own digit; each one is recovered by finding
    /// which slot of the parent points back down. The walk emits digits
    /// deepest first, so the buffer is reversed in place before returning.
    pub fn path(&self, node: NodeId) -> Vec<Digit> {
        let mut digits = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            let digit = self.nodes[parent]
                .children
                .iter()
                .position(|&slot| slot == Some(current))
                .expect("nodes stay linked from their parent");
            digits.push(digit as Digit);
            current = parent;
        }
        digits.reverse();
        digits
    }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|(id, _)| id).collect()
    }

    #[cfg(test)]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    #[cfg(test)]
    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node].children.iter().flatten().count()
    }

    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(s: &str) -> Vec<Digit> {
        crate::digits::to_digits(s).unwrap()
    }

    /// Marks a node occupied without involving a real list entry.
    fn occupy(trie: &mut Trie, node: NodeId) {
        trie.set_sources(node, Some(0));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut trie = Trie::new();
        let a = trie.insert(&digits("12*#"));
        let b = trie.insert(&digits("12*#"));
        assert_eq!(a, b);
        assert_eq!(trie.node_count(), 5);
    }

    #[test]
    fn find_only_sees_inserted_paths() {
        let mut trie = Trie::new();
        let node = trie.insert(&digits("123"));
        assert_eq!(trie.find(&digits("123")), Some(node));
        assert!(trie.find(&digits("124")).is_none());
        assert!(trie.find(&digits("1234")).is_none());
        // prefixes of an inserted path exist as interior nodes
        assert!(trie.find(&digits("12")).is_some());
    }

    #[test]
    fn path_spells_the_inserted_number() {
        let mut trie = Trie::new();
        let node = trie.insert(&digits("90*1#"));
        assert_eq!(trie.path(node), digits("90*1#"));
        assert!(trie.path(trie.root()).is_empty());
    }

    #[test]
    fn probe_finds_nearest_occupied_descendant() {
        let mut trie = Trie::new();
        let shallow = trie.insert(&digits("12"));
        let deep = trie.insert(&digits("12345"));
        occupy(&mut trie, shallow);
        occupy(&mut trie, deep);

        let num = digits("123456789");
        let mut pos = 0;
        assert_eq!(trie.find_next_occupied(trie.root(), &num, &mut pos), Some(shallow));
        assert_eq!(pos, 2);
        assert_eq!(trie.find_next_occupied(shallow, &num, &mut pos), Some(deep));
        assert_eq!(pos, 5);
        // nothing deeper: the position must roll back
        assert_eq!(trie.find_next_occupied(deep, &num, &mut pos), None);
        assert_eq!(pos, 5);
    }

    #[test]
    fn probe_never_returns_its_start() {
        let mut trie = Trie::new();
        let node = trie.insert(&digits("1"));
        occupy(&mut trie, node);

        let num = digits("1");
        let mut pos = 1;
        assert_eq!(trie.find_next_occupied(node, &num, &mut pos), None);
        assert_eq!(pos, 1);
    }

    #[test]
    fn probe_stops_at_an_occupied_terminal_node() {
        let mut trie = Trie::new();
        let node = trie.insert(&digits("123"));
        occupy(&mut trie, node);

        // the probe consumes the whole number and ends exactly on the node
        let num = digits("123");
        let mut pos = 0;
        assert_eq!(trie.find_next_occupied(trie.root(), &num, &mut pos), Some(node));
        assert_eq!(pos, 3);
    }

    #[test]
    fn probe_rolls_back_when_walking_off_the_tree() {
        let mut trie = Trie::new();
        let node = trie.insert(&digits("12345"));
        occupy(&mut trie, node);

        let num = digits("129999");
        let mut pos = 0;
        assert_eq!(trie.find_next_occupied(trie.root(), &num, &mut pos), None);
        assert_eq!(pos, 0);
    }

    #[test]
    fn dead_branch_collapses_up_to_the_fork() {
        let mut trie = Trie::new();
        let long = trie.insert(&digits("12345"));
        let fork = trie.insert(&digits("129"));
        occupy(&mut trie, fork);

        trie.collect_dead_branch(long);
        // "345" freed, "12" kept because "9" hangs off it
        assert_eq!(trie.node_count(), 4);
        assert!(trie.find(&digits("123")).is_none());
        assert_eq!(trie.find(&digits("129")), Some(fork));
    }

    #[test]
    fn dead_branch_ignores_interior_nodes() {
        let mut trie = Trie::new();
        let leaf = trie.insert(&digits("123"));
        let interior = trie.insert(&digits("12"));
        occupy(&mut trie, leaf);

        trie.collect_dead_branch(interior);
        assert_eq!(trie.find(&digits("123")), Some(leaf));
    }

    #[test]
    fn dead_branch_never_frees_the_root() {
        let mut trie = Trie::new();
        let leaf = trie.insert(&digits("77"));
        trie.collect_dead_branch(leaf);
        assert_eq!(trie.node_count(), 1);
        let mut pos = 0;
        assert!(trie.find_next_occupied(trie.root(), &digits("77"), &mut pos).is_none());
    }

    #[test]
    fn remove_branch_excises_the_subtree() {
        let mut trie = Trie::new();
        let kept = trie.insert(&digits("19"));
        let a = trie.insert(&digits("1234"));
        let b = trie.insert(&digits("1235"));
        occupy(&mut trie, kept);
        occupy(&mut trie, a);
        occupy(&mut trie, b);

        assert!(trie.remove_branch(&digits("12"), |_| {}));
        assert!(trie.find(&digits("12")).is_none());
        assert!(trie.find(&digits("1234")).is_none());
        assert_eq!(trie.find(&digits("19")), Some(kept));

        assert!(!trie.remove_branch(&digits("5"), |_| {}));
    }

    #[test]
    fn remove_branch_reports_every_forwarding() {
        let mut trie = Trie::new();
        for (num, target) in [("12", 7), ("123", 8), ("1299", 9)] {
            let node = trie.insert(&digits(num));
            trie.set_link(node, Link { target, entry: 0 });
        }

        let mut seen = Vec::new();
        trie.remove_branch(&digits("12"), |link| seen.push(link.target));
        seen.sort_unstable();
        assert_eq!(seen, [7, 8, 9]);
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn deep_paths_survive_removal_and_drop() {
        let depth = 50_000;
        let num: Vec<Digit> = std::iter::repeat(1).take(depth).collect();

        let mut trie = Trie::new();
        let node = trie.insert(&num);
        occupy(&mut trie, node);
        assert_eq!(trie.path(node).len(), depth);

        trie.remove_branch(&num[..1], |_| {});
        assert_eq!(trie.node_count(), 1);
    }
}
