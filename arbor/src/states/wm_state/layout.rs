//! Turning the model into window geometry, frame decorations and a stacking order

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    color::Color,
    display::{DisplayAction, FrameLook},
    frame::{self, FrameGeometry, FrameLayout},
    newtypes::{FrameId, WinId},
    rect::Rect,
    stack::{self, Layers},
    states::WMState,
    theme::{DecState, DecType},
};

/// Where a visible client goes and how its border looks
#[derive(Debug, Clone, PartialEq)]
struct Placement {
    win: WinId,
    /// Outer rectangle, including the border
    rect: Rect,
    border: i32,
    color: Color,
}

fn grow(rect: Rect, n: i32) -> Rect {
    Rect::new(rect.x - n, rect.y - n, rect.width + 2 * n, rect.height + 2 * n)
}

/// Whether a frame gets its decoration drawn under the given `show_frame_decorations` mode
fn frame_shown(mode: &str, nonempty: bool, focused: bool, multiple: bool) -> bool {
    match mode {
        "none" => false,
        "nonempty" => nonempty,
        "if_multiple" => multiple || nonempty,
        "if_empty" => !nonempty,
        "focused" => focused || nonempty,
        "focused_if_multiple" => (focused && multiple) || nonempty,
        "all" => true,
        _ => nonempty,
    }
}

impl WMState {
    /// Height of the tab bar of max frames, taken from the active tiling decoration
    pub(crate) fn tab_height(&self) -> i32 {
        if !self.settings.tabbed_max {
            return 0;
        }
        let scheme = self.theme.scheme(DecType::Tiling, DecState::Active);
        scheme.title_height + scheme.title_depth
    }

    pub(crate) fn monitor_layout(&self, index: usize) -> Option<FrameLayout> {
        let monitor = self.monitors.get(index)?;
        let tag = self.tag_by_id(monitor.tag)?;
        Some(frame::compute(
            &tag.root,
            monitor.usable_area(),
            &self.settings.layout_params(self.tab_height()),
        ))
    }

    fn frame_look(
        &self,
        geometry: &FrameGeometry,
        layout: &FrameLayout,
        active: bool,
    ) -> FrameLook {
        let s = &self.settings;
        let selected = self.theme.scheme(DecType::Tiling, DecState::Active).color;
        let normal = self.theme.scheme(DecType::Tiling, DecState::Normal).tab_color;
        let tabs = geometry
            .tabs
            .iter()
            .map(|(win, rect)| {
                let on_top = layout.client(*win).map(|c| c.selected).unwrap_or(false);
                (*rect, if on_top { selected } else { normal })
            })
            .collect();
        FrameLook {
            rect: geometry.rect,
            border_width: geometry.border_width,
            border_color: if active {
                s.frame_border_active_color
            } else {
                s.frame_border_normal_color
            },
            inner_width: s.frame_border_inner_width as i32,
            inner_color: s.frame_border_inner_color,
            background: if active {
                s.frame_bg_active_color
            } else {
                s.frame_bg_normal_color
            },
            transparent: s.frame_bg_transparent,
            transparent_width: s.frame_transparent_width as i32,
            tabs,
        }
    }

    /// Placements, frame decorations and layers of the tag shown on a monitor
    fn arrange_monitor(
        &self,
        index: usize,
        focus: Option<WinId>,
    ) -> (Vec<Placement>, Vec<(FrameId, FrameLook)>, Layers) {
        let (monitor, layout) = match (self.monitors.get(index), self.monitor_layout(index)) {
            (Some(monitor), Some(layout)) => (monitor, layout),
            _ => return Default::default(),
        };
        let tag = match self.tag_by_id(monitor.tag) {
            Some(tag) => tag,
            None => return Default::default(),
        };

        let mut placements = Vec::new();
        for slot in &layout.clients {
            let client = match self.clients.get(&slot.win) {
                Some(client) => client,
                None => continue,
            };
            let focused = focus == Some(slot.win);
            let state = client.decoration_state(focused);
            if client.fullscreen {
                let color = self.theme.scheme(DecType::Tiling, state).color;
                placements.push(Placement { win: slot.win, rect: monitor.rect, border: 0, color });
                continue;
            }
            if tag.floating || client.floating {
                let scheme = self.theme.scheme(DecType::Floating, state);
                placements.push(Placement {
                    win: slot.win,
                    rect: grow(client.float_rect, scheme.border_width),
                    border: scheme.border_width,
                    color: scheme.color,
                });
                continue;
            }
            let scheme = self
                .theme
                .scheme(client.decoration_type(false, slot.minimal), state);
            let border = if slot.minimal { 0 } else { scheme.border_width };
            let mut rect = slot.rect;
            if client.pseudotile {
                let room = slot.rect.shrink(border);
                let content = Rect::new(
                    0,
                    0,
                    client.float_rect.width.min(room.width),
                    client.float_rect.height.min(room.height),
                )
                .centered_in(&room);
                rect = grow(content, border);
            } else if slot.covered && self.settings.hide_covered_windows {
                rect = Rect::new(-rect.width - 1, -rect.height - 1, rect.width, rect.height);
            }
            placements.push(Placement { win: slot.win, rect, border, color: scheme.color });
        }
        for win in &tag.floating_clients {
            let client = match self.clients.get(win) {
                Some(client) => client,
                None => continue,
            };
            let state = client.decoration_state(focus == Some(*win));
            if client.fullscreen {
                let color = self.theme.scheme(DecType::Floating, state).color;
                placements.push(Placement { win: *win, rect: monitor.rect, border: 0, color });
                continue;
            }
            let scheme = self.theme.scheme(DecType::Floating, state);
            placements.push(Placement {
                win: *win,
                rect: grow(client.float_rect, scheme.border_width),
                border: scheme.border_width,
                color: scheme.color,
            });
        }

        let focused_path = tag.root.focused_path();
        let multiple = layout.frames.len() > 1;
        let mode = self.settings.show_frame_decorations.as_str();
        let mut looks = Vec::new();
        for geometry in &layout.frames {
            let focused = geometry.path == focused_path;
            let shown = self.settings.always_show_frame
                || frame_shown(mode, geometry.client_count > 0, focused, multiple);
            if shown {
                let active = focused && index == self.focused_monitor;
                looks.push((geometry.id, self.frame_look(geometry, &layout, active)));
            }
        }

        let lifted = focus
            .filter(|_| self.settings.raise_on_focus_temporarily && index == self.focused_monitor);
        let frame_ids = looks.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        let layers = stack::tag_layers(tag, &self.clients, lifted, &frame_ids);
        (placements, looks, layers)
    }

    /// The layers of every monitor, in stacking order
    pub(crate) fn monitor_layers(&self) -> Vec<(usize, Layers)> {
        let focus = self.focused_client();
        self.monitor_order()
            .into_iter()
            .map(|i| (i, self.arrange_monitor(i, focus).2))
            .collect()
    }

    /// Monitor indices, the most recently focused first
    fn monitor_order(&self) -> Vec<usize> {
        let mut order = self
            .monitor_history
            .iter()
            .filter_map(|id| self.monitors.iter().position(|m| m.id == *id))
            .collect::<Vec<_>>();
        for i in 0..self.monitors.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }
        order
    }

    /// Bring every window, frame and the stacking order up to date. Only differences to what
    /// was sent before are sent to the display server.
    pub(crate) fn apply_layout(&mut self) {
        let focus = self.focused_client();
        let mut placements = Vec::new();
        let mut looks = BTreeMap::new();
        let mut layers = Vec::new();
        for index in self.monitor_order() {
            let (p, l, s) = self.arrange_monitor(index, focus);
            placements.extend(p);
            looks.extend(l);
            layers.push(s);
        }

        let mut shown = BTreeSet::new();
        for p in &placements {
            shown.insert(p.win);
            if let Some(client) = self.clients.get_mut(&p.win) {
                client.decoration_rect = p.rect;
                client.content_rect = p.rect.shrink(p.border);
            }
            if self.synced.geometry.get(&p.win) != Some(&(p.rect, p.border)) {
                self.display.execute(DisplayAction::Configure {
                    id: p.win,
                    rect: p.rect,
                    border: p.border,
                });
                self.synced.geometry.insert(p.win, (p.rect, p.border));
            }
            if self.synced.colors.get(&p.win) != Some(&p.color) {
                self.display.execute(DisplayAction::SetBorderColor {
                    id: p.win,
                    color: p.color,
                });
                self.synced.colors.insert(p.win, p.color);
            }
        }

        for (win, client) in self.clients.iter_mut() {
            let visible = shown.contains(win);
            client.visible = visible;
            if visible == self.synced.mapped.contains(win) {
                continue;
            }
            if visible {
                self.display.execute(DisplayAction::Map(*win));
                self.synced.mapped.insert(*win);
            } else {
                self.display.execute(DisplayAction::Unmap(*win));
                self.synced.mapped.remove(win);
            }
            self.display.execute(DisplayAction::SetWmState {
                id: *win,
                iconic: !visible,
            });
        }
        let clients = &self.clients;
        self.synced.mapped.retain(|w| clients.contains_key(w));
        self.synced.geometry.retain(|w, _| clients.contains_key(w));
        self.synced.colors.retain(|w, _| clients.contains_key(w));

        for (id, look) in &looks {
            if self.synced.frames.get(id) != Some(look) {
                self.display.execute(DisplayAction::ShowFrame {
                    id: *id,
                    look: look.clone(),
                });
                self.synced.frames.insert(*id, look.clone());
                self.synced.created.insert(*id);
            }
        }
        let hidden = self
            .synced
            .frames
            .keys()
            .filter(|id| !looks.contains_key(id))
            .copied()
            .collect::<Vec<_>>();
        for id in hidden {
            self.synced.frames.remove(&id);
            self.display.execute(DisplayAction::HideFrame(id));
        }
        let alive = self
            .tags
            .iter()
            .flat_map(|t| t.root.ids())
            .collect::<BTreeSet<_>>();
        let dead = self
            .synced
            .created
            .iter()
            .filter(|id| !alive.contains(id))
            .copied()
            .collect::<Vec<_>>();
        for id in dead {
            self.synced.created.remove(&id);
            self.display.execute(DisplayAction::DestroyFrame(id));
        }

        let order = stack::flatten(&layers);
        if order != self.synced.stack {
            self.display.execute(DisplayAction::Restack(order.clone()));
            self.synced.stack = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_modes() {
        assert!(!frame_shown("none", true, true, true));
        assert!(frame_shown("nonempty", true, false, false));
        assert!(!frame_shown("nonempty", false, true, true));
        assert!(frame_shown("if_multiple", false, false, true));
        assert!(!frame_shown("if_multiple", false, true, false));
        assert!(frame_shown("if_empty", false, false, false));
        assert!(!frame_shown("if_empty", true, false, false));
        assert!(frame_shown("focused", false, true, false));
        assert!(!frame_shown("focused_if_multiple", false, true, false));
        assert!(frame_shown("focused_if_multiple", false, true, true));
        assert!(frame_shown("all", false, false, false));
    }

    #[test]
    fn grown_rectangles() {
        assert_eq!(grow(Rect::new(10, 10, 100, 50), 2), Rect::new(8, 8, 104, 54));
    }
}
