use crate::{
    display::{DisplayAction, WindowInfo},
    errors::{CommandError, CommandResult},
    newtypes::{format_winid, WinId},
    object::RegexValue,
    rect::Rect,
    rules::{self, ClientChanges, FloatPlacement},
    states::{
        win_state::{DESKTOP_TYPE, DOCK_TYPE},
        Client, Panel, WMState,
    },
};

/// Candidate positions tried by the smart float placement, as fractions of the free space
const SMART_STEPS: i32 = 4;

fn overlap(a: &Rect, b: &Rect) -> i64 {
    a.intersection(b)
        .map(|r| r.width as i64 * r.height as i64)
        .unwrap_or(0)
}

impl WMState {
    /// Take care of a newly mapped window: dock windows become panels, everything else a client
    pub(crate) fn manage(&mut self, info: WindowInfo) {
        let win = info.id;
        if self.clients.contains_key(&win) || self.panels.contains_key(&win) {
            return;
        }
        if info.window_type == DOCK_TYPE {
            log::debug!("new panel {}", format_winid(win));
            self.panels.insert(
                win,
                Panel {
                    win,
                    rect: info.geometry,
                    strut: info.strut,
                },
            );
            self.display.execute(DisplayAction::Map(win));
            self.update_panel_padding();
            return;
        }
        if info.window_type == DESKTOP_TYPE {
            self.display.execute(DisplayAction::Map(win));
            return;
        }

        let focused_tag = self.tags[self.focused_tag_index()].id;
        let mut client = Client::new(&info, focused_tag);
        let (changes, fired) = rules::evaluate(&self.rules, &client);
        self.rules.retain(|r| !fired.contains(&r.label));
        if !changes.manage {
            log::debug!("not managing {}", format_winid(win));
            self.display.execute(DisplayAction::Map(win));
            return;
        }

        let tag = self.tag_for_new_client(&changes, &info);
        client.tag = self.tags[tag].id;
        Self::apply_flags(&mut client, &changes);
        client.fullscreen = changes.fullscreen.unwrap_or(info.fullscreen);
        let floating = client.floating || self.tags[tag].floating;
        if floating || changes.floatplacement.is_some() {
            let fallback = if changes.floating_geometry.is_some() {
                FloatPlacement::None
            } else {
                FloatPlacement::Center
            };
            let placement = changes.floatplacement.unwrap_or(fallback);
            // dialogs are centered over the window they belong to
            let parent = client
                .transient_for
                .and_then(|p| self.clients.get(&p))
                .filter(|p| p.tag == client.tag && p.visible)
                .map(|p| p.decoration_rect);
            client.float_rect = match (placement, parent) {
                (FloatPlacement::Center, Some(parent)) => client.float_rect.centered_in(&parent),
                _ => self.place_floating(tag, client.float_rect, placement),
            };
        }
        let focus = changes
            .focus
            .unwrap_or(!self.settings.focus_stealing_prevention);
        let tag_id = client.tag;
        let fullscreen = client.fullscreen;
        log::info!(
            "managing {} ({}) on tag {}",
            format_winid(win),
            client.class,
            self.tags[tag].name
        );
        self.clients.insert(win, client);
        self.display.execute(DisplayAction::Manage(win));

        let index_path = changes
            .index
            .as_deref()
            .and_then(|index| self.tags[tag].root.resolve_index(index));
        let tag_state = &mut self.tags[tag];
        if self.clients.get(&win).map(|c| c.floating).unwrap_or(false) {
            tag_state.add_floating(win, focus);
        } else if let Some(path) = index_path {
            tag_state.root.insert_at(&path, win);
            if focus {
                tag_state.focus(win);
            }
        } else {
            tag_state.root.insert_focused(win, focus);
            if focus {
                tag_state.focus(win);
            }
        }

        if focus && changes.switchtag && self.monitor_of_tag(tag_id).is_none() {
            if let Err(e) = self.use_tag(self.focused_monitor, tag) {
                log::warn!("switchtag for {}: {}", format_winid(win), e);
            }
        }
        if focus {
            if let Some(monitor) = self.monitor_of_tag(tag_id) {
                self.focus_monitor(monitor);
            }
        }
        if fullscreen {
            self.hooks.emit(["fullscreen", "on", &format_winid(win)]);
        }
        for label in changes.hooks {
            self.hooks.emit(["rule".to_string(), label, format_winid(win)]);
        }
    }

    fn apply_flags(client: &mut Client, changes: &ClientChanges) {
        if let Some(floating) = changes.floating {
            client.floating = floating;
        }
        if let Some(pseudotile) = changes.pseudotile {
            client.pseudotile = pseudotile;
        }
        if let Some(on) = changes.ewmhrequests {
            client.ewmhrequests = on;
        }
        if let Some(on) = changes.ewmhnotify {
            client.ewmhnotify = on;
        }
        // regexes were checked when the rule was added
        if let Some(mask) = &changes.keymask {
            client.keymask = RegexValue::new(mask).unwrap_or_default();
        }
        if let Some(mask) = &changes.keys_inactive {
            client.keys_inactive = RegexValue::new(mask).unwrap_or_default();
        }
        if let Some(rect) = changes.floating_geometry {
            client.float_rect = rect;
        }
    }

    /// The tag a new client goes to: the rule's tag, the rule's monitor, the desktop the client
    /// asked for, or the focused tag
    fn tag_for_new_client(&self, changes: &ClientChanges, info: &WindowInfo) -> usize {
        if let Some(tag) = changes.tag.as_deref().and_then(|name| self.tag_position(name)) {
            return tag;
        }
        if let Some(monitor) = changes
            .monitor
            .as_deref()
            .and_then(|m| self.find_monitor(m).ok())
        {
            if let Some(tag) = self.tag_index(self.monitors[monitor].tag) {
                return tag;
            }
        }
        match info.desktop {
            Some(desktop) if (desktop as usize) < self.tags.len() => desktop as usize,
            _ => self.focused_tag_index(),
        }
    }

    /// The area floating clients of a tag are placed in
    fn floating_area(&self, tag: usize) -> Rect {
        let monitor = self
            .monitor_of_tag(self.tags[tag].id)
            .unwrap_or(self.focused_monitor);
        self.monitors
            .get(monitor)
            .map(|m| m.usable_area())
            .unwrap_or_default()
    }

    pub(crate) fn place_floating(&self, tag: usize, rect: Rect, placement: FloatPlacement) -> Rect {
        let area = self.floating_area(tag);
        match placement {
            FloatPlacement::None => rect,
            FloatPlacement::Center => rect.centered_in(&area),
            FloatPlacement::Smart => {
                let others = self.tags[tag]
                    .floating_clients
                    .iter()
                    .filter_map(|w| self.clients.get(w))
                    .map(|c| c.float_rect)
                    .collect::<Vec<_>>();
                let free_x = (area.width - rect.width).max(0);
                let free_y = (area.height - rect.height).max(0);
                let mut best = rect.centered_in(&area);
                let mut best_overlap = others.iter().map(|o| overlap(&best, o)).sum::<i64>();
                for i in 0..=SMART_STEPS {
                    for j in 0..=SMART_STEPS {
                        let candidate = Rect::new(
                            area.x + free_x * j / SMART_STEPS,
                            area.y + free_y * i / SMART_STEPS,
                            rect.width,
                            rect.height,
                        );
                        let total = others.iter().map(|o| overlap(&candidate, o)).sum::<i64>();
                        if total < best_overlap {
                            best = candidate;
                            best_overlap = total;
                        }
                    }
                }
                best
            }
        }
    }

    /// Forget a window that was destroyed or withdrawn
    pub(crate) fn unmanage(&mut self, win: WinId) {
        if self.panels.remove(&win).is_some() {
            self.update_panel_padding();
            return;
        }
        let client = match self.clients.remove(&win) {
            Some(client) => client,
            None => return,
        };
        log::info!("unmanaging {}", format_winid(win));
        if let Some(tag) = self.tag_mut(client.tag) {
            tag.remove(win);
        }
        if self.drag.as_ref().map(|d| d.win) == Some(win) {
            self.stop_drag();
        }
        self.forget_stale_attrs();
    }

    pub(crate) fn client_or_err(&self, win: WinId) -> Result<&Client, CommandError> {
        self.clients
            .get(&win)
            .ok_or_else(|| {
                CommandError::invalid(format!("No such client \"{}\"", format_winid(win)))
            })
    }

    /// Move a client between the tiling and floating part of its tag, keeping its focus
    pub(crate) fn set_client_floating(&mut self, win: WinId, floating: bool) -> CommandResult {
        let client = self.client_or_err(win)?;
        if client.floating == floating {
            return Ok(());
        }
        let (tag_id, minimized) = (client.tag, client.minimized);
        let was_focused = self.tag_by_id(tag_id).and_then(|t| t.focused_client()) == Some(win);
        if let Some(client) = self.clients.get_mut(&win) {
            client.floating = floating;
        }
        if minimized {
            return Ok(());
        }
        let tag = match self.tag_mut(tag_id) {
            Some(tag) => tag,
            None => return Ok(()),
        };
        tag.remove(win);
        if floating {
            tag.add_floating(win, was_focused);
        } else {
            tag.root.insert_focused(win, was_focused);
            if was_focused {
                tag.focus(win);
            }
        }
        Ok(())
    }

    pub(crate) fn set_fullscreen(&mut self, win: WinId, on: bool) -> CommandResult {
        let client = self
            .clients
            .get_mut(&win)
            .ok_or_else(|| CommandError::invalid("No such client"))?;
        if client.fullscreen != on {
            client.fullscreen = on;
            let state = if on { "on" } else { "off" };
            self.hooks.emit(["fullscreen", state, &format_winid(win)]);
        }
        Ok(())
    }

    pub(crate) fn set_pseudotile(&mut self, win: WinId, on: bool) -> CommandResult {
        let client = self
            .clients
            .get_mut(&win)
            .ok_or_else(|| CommandError::invalid("No such client"))?;
        client.pseudotile = on;
        Ok(())
    }

    /// Minimized clients keep their tag but are neither tiled nor floating
    pub(crate) fn set_minimized(&mut self, win: WinId, on: bool) -> CommandResult {
        let client = self
            .clients
            .get_mut(&win)
            .ok_or_else(|| CommandError::invalid("No such client"))?;
        if client.minimized == on {
            return Ok(());
        }
        client.minimized = on;
        let (tag_id, floating) = (client.tag, client.floating);
        if let Some(tag) = self.tag_mut(tag_id) {
            if on {
                tag.remove(win);
            } else if floating {
                tag.add_floating(win, false);
            } else {
                tag.root.insert_focused(win, false);
            }
        }
        Ok(())
    }

    pub(crate) fn set_urgent(&mut self, win: WinId, on: bool) -> CommandResult {
        let client = self
            .clients
            .get_mut(&win)
            .ok_or_else(|| CommandError::invalid("No such client"))?;
        if client.urgent != on {
            client.urgent = on;
            let state = if on { "on" } else { "off" };
            self.hooks.emit(["urgent", state, &format_winid(win)]);
        }
        Ok(())
    }

    /// Move a client to another tag, it ends up in the focused frame there
    pub(crate) fn move_client_to_tag(&mut self, win: WinId, tag: usize) -> CommandResult {
        let client = self.client_or_err(win)?;
        let (old, floating, minimized) = (client.tag, client.floating, client.minimized);
        let new = self.tags[tag].id;
        if old == new {
            return Ok(());
        }
        if let Some(old_tag) = self.tag_mut(old) {
            old_tag.remove(win);
        }
        if let Some(client) = self.clients.get_mut(&win) {
            client.tag = new;
        }
        if !minimized {
            let target = &mut self.tags[tag];
            if floating {
                target.add_floating(win, false);
            } else {
                target.root.insert_focused(win, false);
            }
        }
        Ok(())
    }

    /// Put a client into the focused frame of the focused tag and focus it there. The focused
    /// frame stays the same.
    pub(crate) fn bring(&mut self, win: WinId) -> CommandResult {
        self.client_or_err(win)?;
        let tag = self.focused_tag_index();
        self.set_minimized(win, false)?;
        self.move_client_to_tag(win, tag)?;
        let floating = self.is_floating(win);
        let target = &mut self.tags[tag];
        if !floating && !target.root.focused_leaf().clients.contains(&win) {
            target.remove(win);
            target.root.insert_focused(win, true);
        }
        target.focus(win);
        Ok(())
    }

    pub(crate) fn close_client(&mut self, win: WinId) -> CommandResult {
        self.client_or_err(win)?;
        self.display.execute(DisplayAction::Close(win));
        Ok(())
    }

    /// Run the rules again for a managed client, only flags and the tag are changed
    pub(crate) fn reapply_rules(&mut self, win: WinId) -> CommandResult {
        let client = self.client_or_err(win)?.clone();
        let (changes, fired) = rules::evaluate(&self.rules, &client);
        self.rules.retain(|r| !fired.contains(&r.label));
        if let Some(tag) = changes.tag.as_deref().and_then(|name| self.tag_position(name)) {
            self.move_client_to_tag(win, tag)?;
        }
        if let Some(floating) = changes.floating {
            self.set_client_floating(win, floating)?;
        }
        if let Some(on) = changes.fullscreen {
            self.set_fullscreen(win, on)?;
        }
        if let Some(client) = self.clients.get_mut(&win) {
            let floating = client.floating;
            Self::apply_flags(client, &changes);
            client.floating = floating;
        }
        if changes.focus == Some(true) {
            self.focus_window(win, changes.switchtag)?;
        }
        for label in changes.hooks {
            self.hooks.emit(["rule".to_string(), label, format_winid(win)]);
        }
        Ok(())
    }

    /// Recompute the padding panels impose on the monitors
    pub(crate) fn update_panel_padding(&mut self) {
        let screen = self
            .monitors
            .iter()
            .map(|m| m.rect)
            .reduce(|a, b| {
                let x = a.x.min(b.x);
                let y = a.y.min(b.y);
                Rect::new(
                    x,
                    y,
                    (a.x + a.width).max(b.x + b.width) - x,
                    (a.y + a.height).max(b.y + b.height) - y,
                )
            })
            .unwrap_or_default();
        let enabled = self.settings.auto_detect_panels;
        for monitor in &mut self.monitors {
            let mut pad = [0; 4];
            if enabled {
                for panel in self.panels.values() {
                    for (side, p) in panel.padding_for(&monitor.rect, &screen).iter().enumerate() {
                        pad[side] = pad[side].max(*p);
                    }
                }
            }
            monitor.pad_automatic = pad;
        }
    }
}
