//! Radix tree text index.
//!
//! A compact prefix tree over tokens. Nodes live in an arena and are
//! addressed by index, so there are no parent pointers and no reference
//! cycles; children are keyed by the first char of their edge label in a
//! `BTreeMap`, which makes every traversal order deterministic. Terminal
//! nodes carry the full token and its posting bitmap.
//!
//! Fuzzy lookup descends the tree carrying a dynamic-programming row of
//! Levenshtein distances between the search term and the path label built so
//! far; a subtree is pruned as soon as the row minimum exceeds the
//! tolerance.

use std::collections::BTreeMap;

use roaring::RoaringBitmap;

use crate::document::Ordinal;

const ROOT: usize = 0;

/// How a term should be matched against the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermSearch<'a> {
    /// The normalized term to look up.
    pub term: &'a str,
    /// Match the term as a whole token only.
    pub exact: bool,
    /// Maximum Levenshtein distance. With `exact` false and tolerance 0 the
    /// term matches as a prefix.
    pub tolerance: u32,
}

#[derive(Clone, Debug, Default)]
struct Terminal {
    token: String,
    postings: RoaringBitmap,
}

#[derive(Clone, Debug, Default)]
struct Node {
    /// Edge label from the parent; empty for the root.
    label: String,
    /// First char of each child's label -> arena index. Keying by char (not
    /// byte) guarantees two sibling labels never share a key prefix, so an
    /// edge split always leaves a non-empty shared label.
    children: BTreeMap<char, usize>,
    terminal: Option<Terminal>,
}

fn first_char(s: &str) -> char {
    s.chars().next().expect("label is never empty")
}

/// A radix tree mapping tokens to document-ordinal posting sets.
#[derive(Clone, Debug)]
pub struct RadixTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    token_count: usize,
}

impl Default for RadixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        RadixTree {
            nodes: vec![Node::default()],
            free: Vec::new(),
            token_count: 0,
        }
    }

    /// Number of distinct tokens stored.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Check whether the tree stores no tokens.
    pub fn is_empty(&self) -> bool {
        self.token_count == 0
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Insert a posting for a token. Idempotent on `(token, ordinal)`.
    pub fn insert(&mut self, token: &str, ordinal: Ordinal) {
        let mut node = ROOT;
        let mut rest = token;

        loop {
            if rest.is_empty() {
                self.mark_terminal(node, token, ordinal);
                return;
            }

            let first = first_char(rest);
            let child = match self.nodes[node].children.get(&first) {
                Some(&child) => child,
                None => {
                    let leaf = self.alloc(Node {
                        label: rest.to_string(),
                        children: BTreeMap::new(),
                        terminal: None,
                    });
                    self.mark_terminal(leaf, token, ordinal);
                    self.nodes[node].children.insert(first, leaf);
                    return;
                }
            };

            let lcp = common_prefix_len(&self.nodes[child].label, rest);
            if lcp == self.nodes[child].label.len() {
                // Full edge match, keep descending.
                node = child;
                rest = &rest[lcp..];
                continue;
            }

            // Partial edge match: split the edge into a shared parent and
            // the old child's suffix.
            let suffix = self.nodes[child].label.split_off(lcp);
            let shared = std::mem::take(&mut self.nodes[child].label);
            let suffix_first = first_char(&suffix);
            self.nodes[child].label = suffix;

            let upper = self.alloc(Node {
                label: shared,
                children: BTreeMap::from([(suffix_first, child)]),
                terminal: None,
            });
            self.nodes[node].children.insert(first, upper);

            if rest.len() == lcp {
                self.mark_terminal(upper, token, ordinal);
            } else {
                let leaf_rest = &rest[lcp..];
                let leaf = self.alloc(Node {
                    label: leaf_rest.to_string(),
                    children: BTreeMap::new(),
                    terminal: None,
                });
                self.mark_terminal(leaf, token, ordinal);
                self.nodes[upper]
                    .children
                    .insert(first_char(leaf_rest), leaf);
            }
            return;
        }
    }

    fn mark_terminal(&mut self, node: usize, token: &str, ordinal: Ordinal) {
        if self.nodes[node].terminal.is_none() {
            self.nodes[node].terminal = Some(Terminal {
                token: token.to_string(),
                postings: RoaringBitmap::new(),
            });
            self.token_count += 1;
        }
        if let Some(terminal) = self.nodes[node].terminal.as_mut() {
            terminal.postings.insert(ordinal);
        }
    }

    /// The posting set of a token, empty if the token is absent.
    pub fn find_exact(&self, token: &str) -> RoaringBitmap {
        match self.locate(token) {
            Some(Location::AtNode(node)) => self.nodes[node]
                .terminal
                .as_ref()
                .map(|t| t.postings.clone())
                .unwrap_or_default(),
            _ => RoaringBitmap::new(),
        }
    }

    /// Union of the posting sets of every token starting with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        if let Some(root) = self.subtree_root(prefix) {
            self.for_each_terminal(root, &mut |terminal| {
                out |= &terminal.postings;
            });
        }
        out
    }

    /// Find every token matching the search, mapped to its posting set.
    ///
    /// - `exact`: the term itself, when present.
    /// - `tolerance == 0`: every token with the term as prefix.
    /// - `tolerance > 0`: every token within the edit distance.
    pub fn find(&self, search: &TermSearch<'_>) -> BTreeMap<String, RoaringBitmap> {
        let mut out = BTreeMap::new();

        if search.exact {
            let postings = self.find_exact(search.term);
            if !postings.is_empty() {
                out.insert(search.term.to_string(), postings);
            }
            return out;
        }

        if search.tolerance == 0 {
            if let Some(root) = self.subtree_root(search.term) {
                self.for_each_terminal(root, &mut |terminal| {
                    out.insert(terminal.token.clone(), terminal.postings.clone());
                });
            }
            return out;
        }

        let term_chars: Vec<char> = search.term.chars().collect();
        let row: Vec<u32> = (0..=term_chars.len() as u32).collect();
        self.fuzzy_walk(ROOT, &term_chars, &row, search.tolerance, &mut out);
        out
    }

    fn fuzzy_walk(
        &self,
        node: usize,
        term: &[char],
        row: &[u32],
        tolerance: u32,
        out: &mut BTreeMap<String, RoaringBitmap>,
    ) {
        if let Some(terminal) = &self.nodes[node].terminal {
            if row[term.len()] <= tolerance {
                out.insert(terminal.token.clone(), terminal.postings.clone());
            }
        }

        for &child in self.nodes[node].children.values() {
            if let Some(next) = advance_row(row, &self.nodes[child].label, term, tolerance) {
                self.fuzzy_walk(child, term, &next, tolerance, out);
            }
        }
    }

    /// Remove a posting. Returns `true` iff the posting was present.
    ///
    /// When the last posting of a token goes, the terminal is unset and
    /// pass-through nodes are merged with their sole child; vacated arena
    /// slots are recycled.
    pub fn remove(&mut self, token: &str, ordinal: Ordinal) -> bool {
        // Record the descent so cleanup can walk back up without parent
        // pointers.
        let mut path = vec![ROOT];
        let mut rest = token;

        while !rest.is_empty() {
            let node = *path.last().expect("path starts at root");
            let first = first_char(rest);
            let Some(&child) = self.nodes[node].children.get(&first) else {
                return false;
            };
            let label_len = self.nodes[child].label.len();
            if !rest.starts_with(self.nodes[child].label.as_str()) {
                return false;
            }
            path.push(child);
            rest = &rest[label_len..];
        }

        let node = *path.last().expect("path starts at root");
        let Some(terminal) = self.nodes[node].terminal.as_mut() else {
            return false;
        };
        if !terminal.postings.remove(ordinal) {
            return false;
        }
        if terminal.postings.is_empty() {
            self.nodes[node].terminal = None;
            self.token_count -= 1;
            self.cleanup(&path);
        }
        true
    }

    fn cleanup(&mut self, path: &[usize]) {
        for window in (1..path.len()).rev() {
            let node = path[window];
            let parent = path[window - 1];

            if self.nodes[node].terminal.is_some() {
                break;
            }

            match self.nodes[node].children.len() {
                0 => {
                    let first = first_char(&self.nodes[node].label);
                    self.nodes[parent].children.remove(&first);
                    self.free.push(node);
                }
                1 => {
                    self.merge_with_child(node);
                    break;
                }
                _ => break,
            }
        }
    }

    /// Absorb the sole child of a pass-through node into the node itself.
    fn merge_with_child(&mut self, node: usize) {
        debug_assert!(node != ROOT);
        debug_assert!(self.nodes[node].children.len() == 1);
        debug_assert!(self.nodes[node].terminal.is_none());

        let child = *self.nodes[node]
            .children
            .values()
            .next()
            .expect("single child");
        let absorbed = std::mem::take(&mut self.nodes[child]);
        self.nodes[node].label.push_str(&absorbed.label);
        self.nodes[node].children = absorbed.children;
        self.nodes[node].terminal = absorbed.terminal;
        self.free.push(child);
    }

    fn locate(&self, term: &str) -> Option<Location> {
        let mut node = ROOT;
        let mut rest = term;

        loop {
            if rest.is_empty() {
                return Some(Location::AtNode(node));
            }
            let first = first_char(rest);
            let &child = self.nodes[node].children.get(&first)?;
            let label = self.nodes[child].label.as_str();

            if rest.len() < label.len() {
                return if label.starts_with(rest) {
                    Some(Location::InsideEdge(child))
                } else {
                    None
                };
            }
            if !rest.starts_with(label) {
                return None;
            }
            node = child;
            rest = &rest[label.len()..];
        }
    }

    /// The node rooting the subtree of all tokens starting with `prefix`.
    fn subtree_root(&self, prefix: &str) -> Option<usize> {
        match self.locate(prefix)? {
            Location::AtNode(node) | Location::InsideEdge(node) => Some(node),
        }
    }

    fn for_each_terminal<F: FnMut(&Terminal)>(&self, node: usize, visit: &mut F) {
        if let Some(terminal) = &self.nodes[node].terminal {
            visit(terminal);
        }
        for &child in self.nodes[node].children.values() {
            self.for_each_terminal(child, visit);
        }
    }
}

enum Location {
    /// The term ends exactly at this node.
    AtNode(usize),
    /// The term ends inside this node's edge label.
    InsideEdge(usize),
}

/// Byte length of the longest common prefix, always at a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    let mut a_chars = a.chars();
    let mut b_chars = b.chars();
    while let (Some(x), Some(y)) = (a_chars.next(), b_chars.next()) {
        if x != y {
            break;
        }
        len += x.len_utf8();
    }
    len
}

/// Advance a Levenshtein DP row over every char of an edge label.
///
/// Returns `None` when the row minimum exceeds the tolerance, which prunes
/// the whole subtree below the edge.
fn advance_row(row: &[u32], label: &str, term: &[char], tolerance: u32) -> Option<Vec<u32>> {
    let mut current = row.to_vec();

    for c in label.chars() {
        let mut next = vec![0u32; term.len() + 1];
        next[0] = current[0] + 1;
        let mut min_in_row = next[0];

        for j in 1..=term.len() {
            let cost = if term[j - 1] == c { 0 } else { 1 };
            next[j] = (next[j - 1] + 1)
                .min(current[j] + 1)
                .min(current[j - 1] + cost);
            min_in_row = min_in_row.min(next[j]);
        }

        if min_in_row > tolerance {
            return None;
        }
        current = next;
    }

    Some(current)
}
