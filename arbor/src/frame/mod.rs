//! The frame tree of a tag.
//!
//! Every tag owns a binary tree: inner nodes split their area in two, leaves hold an ordered list
//! of clients which they arrange with one of the [`Algorithm`]s. Following the selection of every
//! split from the root leads to the focused leaf.
//!
//! Frames are addressed by their path from the root, a list of 0s and 1s.

mod dump;
mod layout;

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    decimal::Decimal,
    newtypes::{FrameId, WinId},
};

pub(crate) use self::{
    dump::{dump, load},
    layout::{
        compute, neighbour, split_rect, Direction, FrameGeometry, FrameLayout,
        LayoutParams,
    },
};

pub(crate) type FramePath = Vec<u8>;

pub(crate) const FRACTION_MIN: Decimal = Decimal::from_raw(1_000);
pub(crate) const FRACTION_MAX: Decimal = Decimal::from_raw(9_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Algorithm {
    Vertical,
    Horizontal,
    Max,
    Grid,
}

impl Algorithm {
    pub(crate) const NAMES: &'static [&'static str] = &["vertical", "horizontal", "max", "grid"];
    const ALL: [Algorithm; 4] = [Self::Vertical, Self::Horizontal, Self::Max, Self::Grid];

    pub(crate) fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    pub(crate) fn cycle(self, delta: i32) -> Self {
        let len = Self::ALL.len() as i32;
        Self::ALL[(self as i32 + delta).rem_euclid(len) as usize]
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|a| a.name() == s)
            .copied()
            .ok_or_else(|| format!("Invalid layout algorithm \"{}\"", s))
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The orientation of a split. `Horizontal` puts the children next to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Vertical,
    Horizontal,
}

impl Align {
    pub(crate) const NAMES: &'static [&'static str] = &["vertical", "horizontal"];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

impl FromStr for Align {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" => Ok(Self::Vertical),
            "horizontal" => Ok(Self::Horizontal),
            _ => Err(format!("Invalid split type \"{}\"", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Leaf {
    pub(crate) id: FrameId,
    pub(crate) clients: Vec<WinId>,
    pub(crate) selection: usize,
    pub(crate) algorithm: Algorithm,
}

impl Leaf {
    pub(crate) fn new(algorithm: Algorithm) -> Self {
        Self {
            id: FrameId::next(),
            clients: Vec::new(),
            selection: 0,
            algorithm,
        }
    }

    pub(crate) fn selected(&self) -> Option<WinId> {
        self.clients.get(self.selection).copied()
    }

    /// Select `win` if it's in this leaf
    pub(crate) fn select(&mut self, win: WinId) -> bool {
        match self.clients.iter().position(|c| *c == win) {
            Some(i) => {
                self.selection = i;
                true
            }
            None => false,
        }
    }

    fn fix_selection(&mut self) {
        if self.selection >= self.clients.len() {
            self.selection = self.clients.len().saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Split {
    pub(crate) id: FrameId,
    pub(crate) align: Align,
    pub(crate) fraction: Decimal,
    pub(crate) selection: usize,
    pub(crate) children: Box<[Frame; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Frame {
    Leaf(Leaf),
    Split(Split),
}

/// Where `split` puts the new, empty frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplitKind {
    Top,
    Bottom,
    Left,
    Right,
    Explode,
}

impl Default for Frame {
    fn default() -> Self {
        Frame::Leaf(Leaf::new(Algorithm::Vertical))
    }
}

impl Frame {
    pub(crate) fn new_leaf(algorithm: Algorithm) -> Self {
        Frame::Leaf(Leaf::new(algorithm))
    }

    pub(crate) fn get(&self, path: &[u8]) -> Option<&Frame> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => match self {
                Frame::Split(s) => s.children.get(*first as usize)?.get(rest),
                Frame::Leaf(_) => None,
            },
        }
    }

    pub(crate) fn get_mut(&mut self, path: &[u8]) -> Option<&mut Frame> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => match self {
                Frame::Split(s) => s.children.get_mut(*first as usize)?.get_mut(rest),
                Frame::Leaf(_) => None,
            },
        }
    }

    pub(crate) fn focused_path(&self) -> FramePath {
        let mut path = Vec::new();
        let mut frame = self;
        while let Frame::Split(s) = frame {
            path.push(s.selection as u8);
            frame = &s.children[s.selection];
        }
        path
    }

    pub(crate) fn focused_leaf(&self) -> &Leaf {
        match self {
            Frame::Leaf(l) => l,
            Frame::Split(s) => s.children[s.selection].focused_leaf(),
        }
    }

    pub(crate) fn focused_leaf_mut(&mut self) -> &mut Leaf {
        match self {
            Frame::Leaf(l) => l,
            Frame::Split(s) => s.children[s.selection].focused_leaf_mut(),
        }
    }

    /// Make the frame at `path` the focused one
    pub(crate) fn focus_path(&mut self, path: &[u8]) {
        if let (Frame::Split(s), Some((first, rest))) = (self, path.split_first()) {
            s.selection = *first as usize & 1;
            s.children[s.selection].focus_path(rest);
        }
    }

    /// All leaves in pre-order together with their paths
    pub(crate) fn leaves(&self) -> Vec<(FramePath, &Leaf)> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, path: &mut FramePath, out: &mut Vec<(FramePath, &'a Leaf)>) {
        match self {
            Frame::Leaf(l) => out.push((path.clone(), l)),
            Frame::Split(s) => {
                for (i, child) in s.children.iter().enumerate() {
                    path.push(i as u8);
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    /// Every frame id in the tree
    pub(crate) fn ids(&self) -> Vec<FrameId> {
        match self {
            Frame::Leaf(l) => vec![l.id],
            Frame::Split(s) => {
                let mut ids = vec![s.id];
                ids.extend(s.children.iter().flat_map(Frame::ids));
                ids
            }
        }
    }

    pub(crate) fn leaf_count(&self) -> usize {
        match self {
            Frame::Leaf(_) => 1,
            Frame::Split(s) => s.children.iter().map(Frame::leaf_count).sum(),
        }
    }

    /// The clients of this subtree in pre-order
    pub(crate) fn clients(&self) -> Vec<WinId> {
        match self {
            Frame::Leaf(l) => l.clients.clone(),
            Frame::Split(s) => s.children.iter().flat_map(Frame::clients).collect(),
        }
    }

    pub(crate) fn find_client(&self, win: WinId) -> Option<FramePath> {
        self.leaves()
            .into_iter()
            .find(|(_, leaf)| leaf.clients.contains(&win))
            .map(|(path, _)| path)
    }

    pub(crate) fn contains_client(&self, win: WinId) -> bool {
        self.find_client(win).is_some()
    }

    pub(crate) fn remove_client(&mut self, win: WinId) -> bool {
        match self {
            Frame::Leaf(l) => match l.clients.iter().position(|c| *c == win) {
                Some(i) => {
                    l.clients.remove(i);
                    if i < l.selection {
                        l.selection -= 1;
                    }
                    l.fix_selection();
                    true
                }
                None => false,
            },
            Frame::Split(s) => s.children.iter_mut().any(|c| c.remove_client(win)),
        }
    }

    /// Insert a client into the focused leaf, right after the selection
    pub(crate) fn insert_focused(&mut self, win: WinId, select: bool) {
        let leaf = self.focused_leaf_mut();
        let index = if leaf.clients.is_empty() {
            0
        } else {
            leaf.selection + 1
        };
        leaf.clients.insert(index, win);
        if select {
            leaf.selection = index;
        }
    }

    /// Insert a client at the end of the leaf at `path`, falls back to the focused leaf
    pub(crate) fn insert_at(&mut self, path: &[u8], win: WinId) {
        match self.get_mut(path) {
            Some(Frame::Leaf(l)) => l.clients.push(win),
            Some(frame) => frame.focused_leaf_mut().clients.push(win),
            None => self.insert_focused(win, false),
        }
    }

    /// Focus the leaf holding `win` and select the client in it
    pub(crate) fn focus_client(&mut self, win: WinId) -> bool {
        let path = match self.find_client(win) {
            Some(path) => path,
            None => return false,
        };
        self.focus_path(&path);
        match self.get_mut(&path) {
            Some(Frame::Leaf(l)) => l.select(win),
            _ => false,
        }
    }

    /// Resolve a frame index relative to this root.
    ///
    /// `0` and `1` descend into a split, `@` jumps to the focused frame, `p` goes up and `r` back
    /// to the root. `.`, `/` and `e` are ignored.
    pub(crate) fn resolve_index(&self, index: &str) -> Option<FramePath> {
        let mut path = Vec::new();
        for c in index.chars() {
            match c {
                '0' | '1' => {
                    if let Some(Frame::Split(_)) = self.get(&path) {
                        path.push(if c == '0' { 0 } else { 1 });
                    }
                }
                '@' => path = self.focused_path(),
                'p' => {
                    path.pop();
                }
                'r' => path.clear(),
                '.' | '/' | 'e' => {}
                _ => return None,
            }
        }
        Some(path)
    }

    /// Split the leaf at `path` into a split holding the old leaf and a new one.
    ///
    /// With [`SplitKind::Explode`] the second half of the clients moves into the new leaf, which
    /// also gets the focus.
    pub(crate) fn split_leaf(
        &mut self,
        path: &[u8],
        kind: SplitKind,
        align: Align,
        fraction: Decimal,
    ) -> bool {
        let frame = match self.get_mut(path) {
            Some(frame) => frame,
            None => return false,
        };
        if !matches!(frame, Frame::Leaf(_)) {
            return false;
        }
        let mut old = match std::mem::take(frame) {
            Frame::Leaf(l) => l,
            // checked above
            Frame::Split(_) => return false,
        };
        let mut new = Leaf::new(old.algorithm);
        let mut selection = match kind {
            SplitKind::Top | SplitKind::Left => 1,
            _ => 0,
        };
        if kind == SplitKind::Explode {
            let selected = old.selected();
            new.clients = old.clients.split_off(old.clients.len() / 2);
            old.fix_selection();
            if let Some(win) = selected {
                new.select(win);
            }
            selection = 1;
        }
        let old = Frame::Leaf(old);
        let new = Frame::Leaf(new);
        let children = if selection == 1 && kind != SplitKind::Explode {
            [new, old]
        } else {
            [old, new]
        };
        *frame = Frame::Split(Split {
            id: FrameId::next(),
            align,
            fraction: fraction.clamp(FRACTION_MIN, FRACTION_MAX),
            selection,
            children: Box::new(children),
        });
        true
    }

    /// Remove the frame at `path` and merge its clients into its sibling.
    ///
    /// The sibling's clients keep their order, the removed ones are appended after them and the
    /// previously selected client stays selected. Returns false for the root.
    pub(crate) fn remove_frame(&mut self, path: &[u8]) -> bool {
        let (idx, parent_path) = match path.split_last() {
            Some((idx, parent)) => (*idx as usize, parent),
            None => return false,
        };
        let parent = match self.get_mut(parent_path) {
            Some(parent) => parent,
            None => return false,
        };
        if !matches!(parent, Frame::Split(_)) {
            return false;
        }
        let split = match std::mem::take(parent) {
            Frame::Split(s) => s,
            Frame::Leaf(_) => return false,
        };
        let [first, second] = *split.children;
        let (removed, mut sibling) = if idx == 0 {
            (first, second)
        } else {
            (second, first)
        };
        let selected = removed.focused_leaf().selected();
        let leaf = sibling.focused_leaf_mut();
        leaf.clients.extend(removed.clients());
        if let Some(win) = selected {
            leaf.select(win);
        }
        *parent = sibling;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(clients: &[WinId], selection: usize) -> Frame {
        let mut l = Leaf::new(Algorithm::Vertical);
        l.clients = clients.to_vec();
        l.selection = selection;
        Frame::Leaf(l)
    }

    #[test]
    fn explode_and_remove() {
        let mut root = leaf(&[1, 2, 3], 2);
        assert!(root.split_leaf(&[], SplitKind::Explode, Align::Vertical, Decimal::half()));
        assert_eq!(root.leaf_count(), 2);
        assert_eq!(root.focused_leaf().clients, vec![2, 3]);
        assert_eq!(root.focused_leaf().selected(), Some(3));

        assert!(root.remove_frame(&root.focused_path()));
        assert_eq!(root.clients(), vec![1, 2, 3]);
        assert_eq!(root.focused_leaf().selected(), Some(3));
    }

    #[test]
    fn split_then_remove_is_identity() {
        let mut root = leaf(&[1, 2], 1);
        let before = root.clients();
        assert!(root.split_leaf(&[], SplitKind::Bottom, Align::Vertical, Decimal::half()));
        assert_eq!(root.focused_path(), vec![0]);
        assert!(root.remove_frame(&[0]));
        assert_eq!(root.clients(), before);
        assert_eq!(root.focused_leaf().selection, 1);
    }

    #[test]
    fn sibling_clients_come_first() {
        let mut root = leaf(&[1], 0);
        root.split_leaf(&[], SplitKind::Right, Align::Horizontal, Decimal::half());
        root.focus_path(&[1]);
        root.insert_focused(2, true);
        root.focus_path(&[0]);
        assert!(root.remove_frame(&[0]));
        assert_eq!(root.clients(), vec![2, 1]);
        assert_eq!(root.focused_leaf().selected(), Some(1));
    }

    #[test]
    fn removing_next_to_a_split_collapses_one_level() {
        let mut root = leaf(&[1], 0);
        root.split_leaf(&[], SplitKind::Right, Align::Horizontal, Decimal::half());
        root.split_leaf(&[1], SplitKind::Bottom, Align::Vertical, Decimal::half());
        root.focus_path(&[0]);
        assert!(root.remove_frame(&[0]));
        assert_eq!(root.leaf_count(), 2);
        assert!(matches!(root.get(&[1]), Some(Frame::Split(_))));
        assert_eq!(root.clients(), vec![1]);
        assert!(!root.remove_frame(&[]));
    }

    #[test]
    fn frame_indices() {
        let mut root = leaf(&[], 0);
        root.split_leaf(&[], SplitKind::Right, Align::Horizontal, Decimal::half());
        root.split_leaf(&[1], SplitKind::Bottom, Align::Vertical, Decimal::half());
        root.focus_path(&[1, 1]);
        assert_eq!(root.resolve_index("@"), Some(vec![1, 1]));
        assert_eq!(root.resolve_index("@p"), Some(vec![1]));
        assert_eq!(root.resolve_index("0"), Some(vec![0]));
        assert_eq!(root.resolve_index("000"), Some(vec![0]));
        assert_eq!(root.resolve_index("1.0"), Some(vec![1, 0]));
        assert_eq!(root.resolve_index("x"), None);
    }

    #[test]
    fn removing_clients_keeps_selection() {
        let mut root = leaf(&[1, 2, 3], 2);
        root.remove_client(1);
        assert_eq!(root.focused_leaf().selected(), Some(3));
        root.remove_client(3);
        assert_eq!(root.focused_leaf().selected(), Some(2));
    }
}
