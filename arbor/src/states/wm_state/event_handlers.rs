use crate::{
    commands::{self, Output},
    display::{DisplayAction, DisplayEvent},
    errors::{CommandError, CommandResult},
    frame::{split_rect, Align, Frame, FRACTION_MAX, FRACTION_MIN},
    keys::{clean_mask, KeyCombo},
    mouse::{Drag, MouseAction, MouseCombo, SplitHandle},
    newtypes::{format_winid, FrameId, WinId},
    rect::Rect,
    states::WMState,
};

impl WMState {
    /// Handle a batch of events. Of all the enter events only the last one is looked at, the
    /// others are stale by the time they are handled.
    pub(crate) fn handle_events(&mut self, events: Vec<DisplayEvent>) {
        let last_enter = events
            .iter()
            .rposition(|e| matches!(e, DisplayEvent::Enter { .. }));
        for (i, event) in events.into_iter().enumerate() {
            if matches!(event, DisplayEvent::Enter { .. }) && Some(i) != last_enter {
                continue;
            }
            if let Err(e) = self.handle_event(event) {
                log::warn!("{}", e);
            }
        }
        self.settle();
    }

    fn handle_event(&mut self, event: DisplayEvent) -> CommandResult {
        match event {
            DisplayEvent::MapRequest(info) => self.manage(info),
            DisplayEvent::Unmanage(win) => self.unmanage(win),
            DisplayEvent::ConfigureRequest { id, rect } => self.on_configure_request(id, rect),
            DisplayEvent::KeyPress { mods, keysym } => self.on_key_press(mods, keysym),
            DisplayEvent::KeyRelease { mods, keysym } => self.on_key_release(mods, keysym),
            DisplayEvent::ButtonPress {
                id,
                mods,
                button,
                x,
                y,
            } => {
                let combo = MouseCombo {
                    mods: clean_mask(mods),
                    button,
                };
                return self.on_button_press(id, combo, (x, y));
            }
            DisplayEvent::Motion { x, y } => self.update_drag(x, y),
            DisplayEvent::ButtonRelease { .. } => {
                if self.drag.is_some() {
                    self.stop_drag();
                }
            }
            DisplayEvent::Enter { id } => self.on_enter(id),
            DisplayEvent::TitleChanged { id, title } => {
                if let Some(client) = self.clients.get_mut(&id) {
                    client.title = title.clone();
                    if self.focused_client() == Some(id) {
                        self.hooks
                            .emit(["window_title_changed".to_string(), format_winid(id), title]);
                    }
                }
            }
            DisplayEvent::UrgencyChanged { id, urgent } => {
                let focused = self.focused_client() == Some(id);
                if self.clients.contains_key(&id) && !(urgent && focused) {
                    return self.set_urgent(id, urgent);
                }
            }
            DisplayEvent::StrutChanged { id, strut } => {
                if let Some(panel) = self.panels.get_mut(&id) {
                    panel.strut = strut;
                    self.update_panel_padding();
                }
            }
            DisplayEvent::FullscreenRequest { id, state } => {
                if let Some(client) = self.clients.get(&id).filter(|c| c.ewmhrequests) {
                    let on = state.unwrap_or(!client.fullscreen);
                    return self.set_fullscreen(id, on);
                }
            }
            DisplayEvent::ActivateRequest(id) => {
                if self.clients.get(&id).map(|c| c.ewmhrequests).unwrap_or(false) {
                    return self.focus_window(id, true);
                }
            }
            DisplayEvent::CloseRequest(id) => return self.close_client(id),
            DisplayEvent::DesktopRequest { id, desktop } => {
                let allowed = self.clients.get(&id).map(|c| c.ewmhrequests).unwrap_or(false);
                if allowed && (desktop as usize) < self.tags.len() {
                    return self.move_client_to_tag(id, desktop as usize);
                }
            }
            DisplayEvent::CurrentDesktopRequest(desktop) => {
                if (desktop as usize) < self.tags.len() {
                    return self.use_tag(self.focused_monitor, desktop as usize);
                }
            }
            DisplayEvent::FrameClicked { frame, x, y } => self.on_frame_clicked(frame, x, y),
            DisplayEvent::ScreensChanged => {
                if self.settings.auto_detect_monitors {
                    return self.detect_monitors();
                }
            }
        }
        Ok(())
    }

    fn on_configure_request(&mut self, win: WinId, rect: Rect) {
        if !self.clients.contains_key(&win) {
            self.display.execute(DisplayAction::Configure {
                id: win,
                rect,
                border: 0,
            });
            return;
        }
        let floating = self.is_floating(win);
        if let Some(client) = self.clients.get_mut(&win) {
            if floating && client.sizehints_floating {
                client.float_rect = rect;
            }
        }
        // clients insist on an answer, even if nothing changes
        self.synced.geometry.remove(&win);
    }

    /// Run the command of a binding, its output goes to the log
    fn run_binding(&mut self, command: &[String]) {
        let mut out = Output::default();
        let status = commands::run(self, command, &mut out);
        if status != 0 {
            log::warn!(
                "binding \"{}\" exited with {}: {}",
                command.join(" "),
                status,
                out.stderr.trim_end()
            );
        }
    }

    fn on_key_press(&mut self, mods: u16, keysym: u32) {
        let mods = clean_mask(mods);
        self.pressed_keys.insert(keysym, mods);
        let combo = KeyCombo {
            mods,
            keysym,
            release: false,
        };
        let command = self
            .keybinds
            .iter()
            .find(|bind| bind.combo == combo)
            .map(|bind| bind.command.clone());
        match command {
            Some(command) => {
                self.display
                    .execute(DisplayAction::AllowKeyEvents { replay: false });
                log::debug!("key {} pressed", combo);
                self.run_binding(&command);
            }
            // only a release is bound, the press belongs to the client
            None => self
                .display
                .execute(DisplayAction::AllowKeyEvents { replay: true }),
        }
    }

    /// Release bindings are looked up with the modifiers that were held when the key was pressed
    fn on_key_release(&mut self, mods: u16, keysym: u32) {
        let mods = self
            .pressed_keys
            .remove(&keysym)
            .unwrap_or_else(|| clean_mask(mods));
        let combo = KeyCombo {
            mods,
            keysym,
            release: true,
        };
        let command = self
            .keybinds
            .iter()
            .find(|bind| bind.combo == combo)
            .map(|bind| bind.command.clone());
        if let Some(command) = command {
            log::debug!("key {} released", combo);
            self.run_binding(&command);
        }
    }

    fn on_button_press(
        &mut self,
        win: WinId,
        combo: MouseCombo,
        pointer: (i32, i32),
    ) -> CommandResult {
        if !self.clients.contains_key(&win) {
            return Ok(());
        }
        let action = self
            .mousebinds
            .iter()
            .find(|bind| bind.combo == combo)
            .map(|bind| bind.action.clone());
        match action {
            Some(MouseAction::Call(command)) => {
                self.run_binding(&command);
                Ok(())
            }
            Some(action) => self.start_drag(win, action, pointer),
            None => {
                self.focus_window(win, false)?;
                if self.settings.raise_on_click {
                    self.raise(win);
                }
                Ok(())
            }
        }
    }

    fn on_enter(&mut self, win: WinId) {
        if !self.settings.focus_follows_mouse || self.drag.is_some() {
            return;
        }
        let tag = match self.clients.get(&win).filter(|c| c.visible) {
            Some(client) => client.tag,
            None => return,
        };
        if let Some(monitor) = self.monitor_of_tag(tag) {
            self.focus_monitor(monitor);
        }
        if let Some(tag) = self.tag_mut(tag) {
            tag.focus(win);
        }
    }

    fn on_frame_clicked(&mut self, frame: FrameId, x: i32, y: i32) {
        let found = self.tags.iter().enumerate().find_map(|(i, tag)| {
            tag.root
                .leaves()
                .into_iter()
                .find(|(_, leaf)| leaf.id == frame)
                .map(|(path, _)| (i, path))
        });
        let (tag, path) = match found {
            Some(found) => found,
            None => return,
        };
        let monitor = match self.monitor_of_tag(self.tags[tag].id) {
            Some(monitor) => monitor,
            None => return,
        };
        self.focus_monitor(monitor);
        let clicked_tab = self.monitor_layout(monitor).and_then(|layout| {
            layout
                .frame(frame)
                .and_then(|g| g.tabs.iter().find(|(_, r)| r.contains_point(x, y)).map(|(w, _)| *w))
        });
        let tag = &mut self.tags[tag];
        tag.root.focus_path(&path);
        tag.floating_focused = false;
        if let Some(win) = clicked_tab {
            tag.root.focus_client(win);
        }
    }

    /// Start dragging a client with the pointer
    pub(crate) fn start_drag(
        &mut self,
        win: WinId,
        action: MouseAction,
        pointer: (i32, i32),
    ) -> CommandResult {
        let client = self.client_or_err(win)?;
        if !client.visible {
            return Err(CommandError::failed("can not drag invisible client"));
        }
        let (tag_id, float_rect, decoration_rect) =
            (client.tag, client.float_rect, client.decoration_rect);
        if self.is_floating(win) {
            self.drag = Some(Drag::new(win, tag_id, action, pointer, float_rect));
        } else {
            let mut drag = Drag::new(win, tag_id, action, pointer, decoration_rect);
            if drag.action != MouseAction::Move {
                drag.splits = self.split_handles(win, drag.corner);
            }
            self.drag = Some(drag);
        }
        self.display.execute(DisplayAction::GrabPointer);
        Ok(())
    }

    /// The closest splits next to the dragged corner of a tiled client
    fn split_handles(&self, win: WinId, (left, top): (bool, bool)) -> Vec<SplitHandle> {
        let tag = match self.clients.get(&win).and_then(|c| self.tag_by_id(c.tag)) {
            Some(tag) => tag,
            None => return Vec::new(),
        };
        let area = self
            .monitor_of_tag(tag.id)
            .map(|m| self.monitors[m].usable_area())
            .unwrap_or_default();
        let path = match tag.root.find_client(win) {
            Some(path) => path,
            None => return Vec::new(),
        };

        // rectangles of all splits on the way down to the client
        let mut ancestors = Vec::new();
        let mut rect = area;
        let mut frame = &tag.root;
        for (depth, child) in path.iter().enumerate() {
            if let Frame::Split(split) = frame {
                ancestors.push((path[..depth].to_vec(), *child, split.align, split.fraction, rect));
                let (first, second) = split_rect(rect, split.align, split.fraction);
                rect = if *child == 0 { first } else { second };
                frame = &split.children[*child as usize];
            }
        }

        let mut handles = Vec::new();
        for align in [Align::Horizontal, Align::Vertical] {
            // the split must lie on the dragged side of the client
            let wanted_child = match align {
                Align::Horizontal => if left { 1 } else { 0 },
                Align::Vertical => if top { 1 } else { 0 },
            };
            let nearest = ancestors
                .iter()
                .rev()
                .find(|(_, child, a, _, _)| *a == align && *child == wanted_child);
            if let Some((path, _, align, fraction, rect)) = nearest {
                handles.push(SplitHandle {
                    path: path.clone(),
                    align: *align,
                    fraction: *fraction,
                    size: match align {
                        Align::Horizontal => rect.width,
                        Align::Vertical => rect.height,
                    },
                });
            }
        }
        handles
    }

    fn update_drag(&mut self, x: i32, y: i32) {
        let drag = match &self.drag {
            Some(drag) => drag.clone(),
            None => return,
        };
        if drag.splits.is_empty() {
            if self.is_floating(drag.win) {
                if let Some(client) = self.clients.get_mut(&drag.win) {
                    client.float_rect = drag.floating_rect(x, y);
                }
            }
            return;
        }
        let fractions = drag.split_fractions(x, y);
        if let Some(tag) = self.tag_mut(drag.tag) {
            for (path, fraction) in fractions {
                if let Some(Frame::Split(split)) = tag.root.get_mut(&path) {
                    split.fraction = fraction.clamp(FRACTION_MIN, FRACTION_MAX);
                }
            }
        }
    }

    /// End the drag. A tiled client that was moved lands in the frame under the pointer.
    pub(crate) fn stop_drag(&mut self) {
        let drag = match self.drag.take() {
            Some(drag) => drag,
            None => return,
        };
        self.display.execute(DisplayAction::UngrabPointer);
        if drag.action != MouseAction::Move || self.is_floating(drag.win) {
            return;
        }
        let (x, y) = self.display.pointer_position();
        let monitor = match self.monitor_of_tag(drag.tag) {
            Some(monitor) => monitor,
            None => return,
        };
        let target = self.monitor_layout(monitor).and_then(|layout| {
            layout
                .frames
                .iter()
                .find(|f| f.rect.contains_point(x, y))
                .map(|f| f.path.clone())
        });
        if let (Some(path), Some(tag)) = (target, self.tag_mut(drag.tag)) {
            if tag.root.find_client(drag.win) == Some(path.clone()) {
                return;
            }
            tag.root.remove_client(drag.win);
            if let Some(Frame::Leaf(leaf)) = tag.root.get_mut(&path) {
                leaf.clients.push(drag.win);
            }
            tag.root.focus_client(drag.win);
        }
    }
}
