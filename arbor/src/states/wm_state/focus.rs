use common::ExitCode;

use crate::{
    display::DisplayAction,
    errors::{CommandError, CommandResult},
    frame::{self, Algorithm, Direction, Frame, FrameLayout},
    newtypes::WinId,
    rect::Rect,
    states::WMState,
};

fn no_neighbour() -> CommandError {
    CommandError::new(ExitCode::Forbidden, "No neighbour found")
}

impl WMState {
    /// Layout of the focused tag within the focused monitor
    pub(crate) fn focused_layout(&self) -> Option<FrameLayout> {
        let monitor = self.monitors.get(self.focused_monitor)?;
        let tag = self.tag_by_id(monitor.tag)?;
        Some(frame::compute(
            &tag.root,
            monitor.usable_area(),
            &self.settings.layout_params(self.tab_height()),
        ))
    }

    pub(crate) fn focus_monitor(&mut self, index: usize) {
        if index >= self.monitors.len() {
            return;
        }
        let id = self.monitors[index].id;
        self.monitor_history.retain(|m| *m != id);
        self.monitor_history.insert(0, id);
        if self.focused_monitor != index {
            self.focused_monitor = index;
            let (x, y) = self.monitors[index].rect.center();
            self.display.execute(DisplayAction::WarpPointer { x, y });
        }
    }

    /// Focus a client, bringing its tag onto the focused monitor if it's not visible
    pub(crate) fn focus_window(&mut self, win: WinId, switch_tag: bool) -> CommandResult {
        let client = self.client_or_err(win)?;
        let (tag_id, minimized) = (client.tag, client.minimized);
        if minimized {
            self.set_minimized(win, false)?;
        }
        match self.monitor_of_tag(tag_id) {
            Some(monitor) => self.focus_monitor(monitor),
            None if switch_tag => {
                let tag = self
                    .tag_index(tag_id)
                    .ok_or_else(|| CommandError::invalid("No such tag"))?;
                self.use_tag(self.focused_monitor, tag)?;
            }
            None => {}
        }
        if let Some(tag) = self.tag_mut(tag_id) {
            tag.focus(win);
        }
        if self.settings.raise_on_focus {
            self.raise(win);
        }
        Ok(())
    }

    pub(crate) fn raise(&mut self, win: WinId) {
        let tag = match self.clients.get(&win) {
            Some(client) => client.tag,
            None => return,
        };
        if let Some(tag) = self.tag_mut(tag) {
            tag.raise(win);
        }
    }

    /// Move the focus in a direction: within the focused frame, to the neighbouring frame and
    /// finally to the neighbouring monitor
    pub(crate) fn focus_direction(&mut self, dir: Direction, external_only: bool) -> CommandResult {
        let layout = self.focused_layout().unwrap_or_default();
        let tag = self.focused_tag_index();

        if self.tags[tag].floating_focused {
            let current = self.tags[tag].focused_floating();
            let rects = self.tags[tag]
                .floating_clients
                .iter()
                .filter(|w| Some(**w) != current)
                .filter_map(|w| self.clients.get(w).map(|c| (*w, c.float_rect)))
                .collect::<Vec<_>>();
            let from = current.and_then(|w| self.clients.get(&w)).map(|c| c.float_rect);
            if let Some(next) = from.and_then(|from| frame::neighbour(from, &rects, dir)) {
                self.tags[tag].focus(next);
                return Ok(());
            }
        } else if !external_only {
            if let Some(next) = self.neighbour_in_leaf(&layout, dir) {
                self.tags[tag].focus(next);
                return Ok(());
            }
        }

        let focused_path = self.tags[tag].root.focused_path();
        let from = layout
            .frames
            .iter()
            .find(|f| f.path == focused_path)
            .map(|f| f.rect);
        let candidates = layout
            .frames
            .iter()
            .filter(|f| f.path != focused_path)
            .map(|f| (f.path.clone(), f.rect))
            .collect::<Vec<_>>();
        if let Some(path) = from.and_then(|from| frame::neighbour(from, &candidates, dir)) {
            let tag = &mut self.tags[tag];
            tag.root.focus_path(&path);
            tag.floating_focused = false;
            return Ok(());
        }

        if self.settings.focus_crosses_monitor_boundaries {
            if let Some(monitor) = self.neighbour_monitor(dir) {
                self.focus_monitor(monitor);
                return Ok(());
            }
        }
        Err(no_neighbour())
    }

    /// The client next to the selected one within the focused leaf
    fn neighbour_in_leaf(&self, layout: &FrameLayout, dir: Direction) -> Option<WinId> {
        let leaf = self.focused_tag()?.root.focused_leaf();
        let current = leaf.selected()?;
        if leaf.algorithm == Algorithm::Max {
            return None;
        }
        let from = layout.client(current)?.rect;
        let rects = leaf
            .clients
            .iter()
            .filter(|w| **w != current)
            .filter_map(|w| layout.client(*w).map(|slot| (*w, slot.rect)))
            .collect::<Vec<_>>();
        frame::neighbour(from, &rects, dir)
    }

    pub(crate) fn neighbour_monitor(&self, dir: Direction) -> Option<usize> {
        let from = self.monitors.get(self.focused_monitor)?.rect;
        let rects = self
            .monitors
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.focused_monitor)
            .map(|(i, m)| (i, m.rect))
            .collect::<Vec<_>>();
        frame::neighbour(from, &rects, dir)
    }

    /// Move the focused client in a direction, the counterpart of [`Self::focus_direction`]
    pub(crate) fn shift_direction(&mut self, dir: Direction, external_only: bool) -> CommandResult {
        let win = self.focused_client().ok_or_else(|| CommandError::failed("No client focused"))?;
        let tag = self.focused_tag_index();
        let layout = self.focused_layout().unwrap_or_default();

        let floating_layer = self.is_floating(win) && !self.tags[tag].root.contains_client(win);
        if floating_layer || self.tags[tag].floating {
            return self.shift_floating(win, dir);
        }

        if !external_only {
            let leaf = self.tags[tag].root.focused_leaf();
            if leaf.algorithm == Algorithm::Max && self.settings.max_tab_reorder {
                let index = leaf.selection;
                let target = match dir {
                    Direction::Left | Direction::Up => index.checked_sub(1),
                    Direction::Right | Direction::Down => Some(index + 1),
                };
                if let Some(target) = target.filter(|t| *t < leaf.clients.len()) {
                    let leaf = self.tags[tag].root.focused_leaf_mut();
                    leaf.clients.swap(index, target);
                    leaf.selection = target;
                    return Ok(());
                }
            } else if let Some(other) = self.neighbour_in_leaf(&layout, dir) {
                let leaf = self.tags[tag].root.focused_leaf_mut();
                let a = leaf.clients.iter().position(|w| *w == win);
                let b = leaf.clients.iter().position(|w| *w == other);
                if let (Some(a), Some(b)) = (a, b) {
                    leaf.clients.swap(a, b);
                    leaf.selection = b;
                }
                return Ok(());
            }
        }

        let focused_path = self.tags[tag].root.focused_path();
        let from = layout
            .frames
            .iter()
            .find(|f| f.path == focused_path)
            .map(|f| f.rect);
        let candidates = layout
            .frames
            .iter()
            .filter(|f| f.path != focused_path)
            .map(|f| (f.path.clone(), f.rect))
            .collect::<Vec<_>>();
        if let Some(path) = from.and_then(|from| frame::neighbour(from, &candidates, dir)) {
            let root = &mut self.tags[tag].root;
            root.remove_client(win);
            if let Some(Frame::Leaf(leaf)) = root.get_mut(&path) {
                leaf.clients.push(win);
            }
            root.focus_client(win);
            return Ok(());
        }

        if self.settings.focus_crosses_monitor_boundaries {
            if let Some(monitor) = self.neighbour_monitor(dir) {
                let target = self
                    .tag_index(self.monitors[monitor].tag)
                    .ok_or_else(no_neighbour)?;
                self.move_client_to_tag(win, target)?;
                self.tags[target].focus(win);
                self.focus_monitor(monitor);
                return Ok(());
            }
        }
        Err(no_neighbour())
    }

    /// Floating clients are pushed against the next edge in that direction
    fn shift_floating(&mut self, win: WinId, dir: Direction) -> CommandResult {
        let area = self
            .monitors
            .get(self.focused_monitor)
            .map(|m| m.usable_area())
            .unwrap_or_default();
        let client = self.clients.get_mut(&win).ok_or_else(no_neighbour)?;
        let r = client.float_rect;
        let gap = self.settings.snap_gap as i32;
        let moved = match dir {
            Direction::Left => Rect::new(area.x + gap, r.y, r.width, r.height),
            Direction::Right => {
                Rect::new(area.x + area.width - r.width - gap, r.y, r.width, r.height)
            }
            Direction::Up => Rect::new(r.x, area.y + gap, r.width, r.height),
            Direction::Down => {
                Rect::new(r.x, area.y + area.height - r.height - gap, r.width, r.height)
            }
        };
        if moved == r {
            return Err(no_neighbour());
        }
        client.float_rect = moved;
        Ok(())
    }

    /// Cycle the selection of the focused frame, or of the floating clients if they have the
    /// focus
    pub(crate) fn cycle_selection(&mut self, delta: i64) {
        let tag = self.focused_tag_index();
        let tag = &mut self.tags[tag];
        if tag.floating_focused && !tag.floating_clients.is_empty() {
            let len = tag.floating_clients.len() as i64;
            let selection = tag.floating_selection as i64 + delta;
            tag.floating_selection = selection.rem_euclid(len) as usize;
            return;
        }
        let leaf = tag.root.focused_leaf_mut();
        if leaf.clients.is_empty() {
            return;
        }
        let len = leaf.clients.len() as i64;
        leaf.selection = (leaf.selection as i64 + delta).rem_euclid(len) as usize;
    }

    /// Cycle through all clients of the focused tag in tree order, floating clients last
    pub(crate) fn cycle_all(&mut self, delta: i64, skip_invisible: bool) {
        let tag = self.focused_tag_index();
        let mut order = Vec::new();
        for (_, leaf) in self.tags[tag].root.leaves() {
            if skip_invisible && leaf.algorithm == Algorithm::Max {
                order.extend(leaf.selected());
            } else {
                order.extend(leaf.clients.iter().copied());
            }
        }
        order.extend(self.tags[tag].floating_clients.iter().copied());
        if order.is_empty() {
            return;
        }
        let current = self.tags[tag]
            .focused_client()
            .and_then(|w| order.iter().position(|o| *o == w))
            .unwrap_or(0) as i64;
        let next = order[(current + delta).rem_euclid(order.len() as i64) as usize];
        self.tags[tag].focus(next);
        if self.settings.raise_on_focus {
            self.raise(next);
        }
    }

    pub(crate) fn cycle_frame(&mut self, delta: i64) {
        let tag = self.focused_tag_index();
        let root = &mut self.tags[tag].root;
        let paths = root.leaves().into_iter().map(|(p, _)| p).collect::<Vec<_>>();
        let focused = root.focused_path();
        let current = paths.iter().position(|p| *p == focused).unwrap_or(0) as i64;
        let next = (current + delta).rem_euclid(paths.len() as i64) as usize;
        root.focus_path(&paths[next]);
        self.tags[tag].floating_focused = false;
    }
}
