use crate::{
    frame::{Algorithm, Frame},
    newtypes::{TagId, WinId},
    object::{AttrSpec, AttrType},
};

/// A named workspace: a frame tree for the tiled clients and a list of floating ones.
///
/// Minimized clients belong to a tag without being in either.
#[derive(Debug, Clone)]
pub(crate) struct Tag {
    pub(crate) id: TagId,
    pub(crate) name: String,
    pub(crate) root: Frame,
    pub(crate) floating_clients: Vec<WinId>,
    pub(crate) floating_selection: usize,
    /// Whether the focus is in the floating layer
    pub(crate) floating_focused: bool,
    /// Tag wide floating mode, every client floats
    pub(crate) floating: bool,
    /// Raise order within the normal layer, topmost first
    pub(crate) stack: Vec<WinId>,
}

impl Tag {
    pub(crate) fn new(id: TagId, name: &str, algorithm: Algorithm) -> Self {
        Self {
            id,
            name: name.to_string(),
            root: Frame::new_leaf(algorithm),
            floating_clients: Vec::new(),
            floating_selection: 0,
            floating_focused: false,
            floating: false,
            stack: Vec::new(),
        }
    }

    pub(crate) fn focused_floating(&self) -> Option<WinId> {
        self.floating_clients.get(self.floating_selection).copied()
    }

    /// The client that has the focus when this tag is on the focused monitor
    pub(crate) fn focused_client(&self) -> Option<WinId> {
        if self.floating_focused {
            if let Some(win) = self.focused_floating() {
                return Some(win);
            }
        }
        self.root.focused_leaf().selected()
    }

    /// Tiled and floating clients, minimized ones are not included
    pub(crate) fn clients(&self) -> Vec<WinId> {
        let mut clients = self.root.clients();
        clients.extend(self.floating_clients.iter().copied());
        clients
    }

    pub(crate) fn add_floating(&mut self, win: WinId, focus: bool) {
        self.floating_clients.push(win);
        if focus {
            self.floating_selection = self.floating_clients.len() - 1;
            self.floating_focused = true;
        }
    }

    /// Take a client out of the tree or the floating list
    pub(crate) fn remove(&mut self, win: WinId) -> bool {
        self.stack.retain(|w| *w != win);
        if let Some(i) = self.floating_clients.iter().position(|w| *w == win) {
            self.floating_clients.remove(i);
            if i < self.floating_selection
                || self.floating_selection >= self.floating_clients.len()
            {
                self.floating_selection = self.floating_selection.saturating_sub(1);
            }
            if self.floating_clients.is_empty() {
                self.floating_focused = false;
            }
            return true;
        }
        self.root.remove_client(win)
    }

    /// Give `win` the focus within this tag
    pub(crate) fn focus(&mut self, win: WinId) -> bool {
        if let Some(i) = self.floating_clients.iter().position(|w| *w == win) {
            self.floating_selection = i;
            self.floating_focused = true;
            return true;
        }
        if self.root.focus_client(win) {
            self.floating_focused = false;
            return true;
        }
        false
    }

    pub(crate) fn raise(&mut self, win: WinId) {
        self.stack.retain(|w| *w != win);
        self.stack.insert(0, win);
    }

    pub(crate) const SPECS: &'static [AttrSpec] = &[
        AttrSpec::rw("name", AttrType::String, "The name of the tag"),
        AttrSpec::rw("index", AttrType::Uint, "The position of the tag in the list of tags"),
        AttrSpec::ro("frame_count", AttrType::Int, "Number of frames holding clients"),
        AttrSpec::ro("client_count", AttrType::Int, "Number of clients on this tag"),
        AttrSpec::ro("curframe_windex", AttrType::Int, "Index of the focused client in its frame"),
        AttrSpec::ro("curframe_wcount", AttrType::Int, "Number of clients in the focused frame"),
        AttrSpec::rw("floating", AttrType::Bool, "Whether all clients of the tag float"),
        AttrSpec::rw(
            "floating_focused",
            AttrType::Bool,
            "Whether the floating layer has the focus",
        ),
        AttrSpec::ro("urgent_count", AttrType::Int, "Number of urgent clients"),
        AttrSpec::ro("minimized_count", AttrType::Int, "Number of minimized clients"),
        AttrSpec::ro("visible", AttrType::Bool, "Whether the tag is shown on a monitor"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_focus_falls_back_to_tiling() {
        let mut tag = Tag::new(TagId(0), "main", Algorithm::Vertical);
        tag.root.insert_focused(1, true);
        tag.add_floating(2, true);
        assert_eq!(tag.focused_client(), Some(2));
        assert!(tag.remove(2));
        assert!(!tag.floating_focused);
        assert_eq!(tag.focused_client(), Some(1));
        assert!(tag.focus(1));
        assert_eq!(tag.clients(), vec![1]);
    }

    #[test]
    fn raise_order() {
        let mut tag = Tag::new(TagId(0), "main", Algorithm::Vertical);
        tag.raise(1);
        tag.raise(2);
        tag.raise(1);
        assert_eq!(tag.stack, vec![1, 2]);
    }
}
