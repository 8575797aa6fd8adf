//! Stacking order. Every monitor stacks its tag in four layers, monitors are stacked in the order
//! they were focused.

use std::collections::BTreeMap;

use derive_more::Display;

use crate::{
    states::{Client, Tag},
    display::StackItem,
    newtypes::{FrameId, WinId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum Layer {
    #[display(fmt = "Focus-Layer")]
    Focus,
    #[display(fmt = "Fullscreen-Layer")]
    Fullscreen,
    #[display(fmt = "Normal Layer")]
    Normal,
    #[display(fmt = "Frame Layer")]
    Frame,
}

pub(crate) type Layers = Vec<(Layer, Vec<StackItem>)>;

/// Sort `wins` by the raise order of `tag`, windows never raised keep their order at the bottom
fn by_raise_order(tag: &Tag, mut wins: Vec<WinId>) -> Vec<WinId> {
    wins.sort_by_key(|w| {
        tag.stack
            .iter()
            .position(|s| s == w)
            .unwrap_or(usize::MAX)
    });
    wins
}

/// The layers of a tag shown on a monitor. `lifted` is the focused client if it's put in the
/// focus layer.
pub(crate) fn tag_layers(
    tag: &Tag,
    clients: &BTreeMap<WinId, Client>,
    lifted: Option<WinId>,
    frames: &[FrameId],
) -> Layers {
    let is_fullscreen = |w: &WinId| clients.get(w).map(|c| c.fullscreen).unwrap_or(false);
    let mut focus = Vec::new();
    let mut fullscreen = Vec::new();
    let mut normal = Vec::new();

    let floating = by_raise_order(tag, tag.floating_clients.clone());
    let tiled = by_raise_order(tag, tag.root.clients());
    for win in floating.into_iter().chain(tiled) {
        let item = StackItem::Client(win);
        if Some(win) == lifted {
            focus.push(item);
        } else if is_fullscreen(&win) {
            fullscreen.push(item);
        } else {
            normal.push(item);
        }
    }
    let frames = frames.iter().rev().map(|f| StackItem::Frame(*f)).collect();
    vec![
        (Layer::Focus, focus),
        (Layer::Fullscreen, fullscreen),
        (Layer::Normal, normal),
        (Layer::Frame, frames),
    ]
}

/// Flatten the layers of all monitors, the first monitor ends up on top
pub(crate) fn flatten(monitors: &[Layers]) -> Vec<StackItem> {
    monitors
        .iter()
        .flat_map(|layers| layers.iter().flat_map(|(_, items)| items.iter().copied()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::WindowInfo, frame::Algorithm, newtypes::TagId};

    fn clients(wins: &[WinId]) -> BTreeMap<WinId, Client> {
        wins.iter()
            .map(|w| (*w, Client::new(&WindowInfo::new(*w), TagId(0))))
            .collect()
    }

    #[test]
    fn layers_of_a_tag() {
        let mut tag = Tag::new(TagId(0), "main", Algorithm::Vertical);
        tag.root.insert_focused(1, true);
        tag.root.insert_focused(2, true);
        tag.add_floating(3, false);
        let mut clients = clients(&[1, 2, 3]);
        clients.get_mut(&2).unwrap().fullscreen = true;
        tag.raise(1);

        let layers = tag_layers(&tag, &clients, None, &[FrameId(7)]);
        assert_eq!(layers[1].1, vec![StackItem::Client(2)]);
        assert_eq!(layers[2].1, vec![StackItem::Client(3), StackItem::Client(1)]);
        assert_eq!(layers[3].1, vec![StackItem::Frame(FrameId(7))]);

        // raising a floating client keeps it within the floating part
        tag.raise(3);
        let layers = tag_layers(&tag, &clients, Some(2), &[]);
        assert_eq!(layers[0].1, vec![StackItem::Client(2)]);
        assert!(layers[1].1.is_empty());
        assert_eq!(
            flatten(&[layers]),
            vec![StackItem::Client(2), StackItem::Client(3), StackItem::Client(1)]
        );
    }
}
