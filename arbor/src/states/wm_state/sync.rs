//! Everything that follows from a change of the model: focus, EWMH properties, grabs and hooks

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    color::Color,
    display::{DisplayAction, FrameLook, StackItem},
    keys::KeyCombo,
    mouse::MouseCombo,
    newtypes::{FrameId, WinId},
    rect::Rect,
    states::WMState,
};

/// The state last sent to the display server and the values hooks were last emitted for
#[derive(Debug, Default)]
pub(crate) struct Synced {
    /// `None` until the focus was sent once
    focus: Option<Option<WinId>>,
    pub(super) geometry: HashMap<WinId, (Rect, i32)>,
    pub(super) colors: HashMap<WinId, Color>,
    pub(super) mapped: BTreeSet<WinId>,
    pub(super) frames: BTreeMap<FrameId, FrameLook>,
    /// Frame windows that exist on the display, shown or not
    pub(super) created: BTreeSet<FrameId>,
    pub(super) stack: Vec<StackItem>,
    keys: Option<Vec<KeyCombo>>,
    buttons: Option<Vec<MouseCombo>>,
    desktop_names: Option<Vec<String>>,
    current_desktop: Option<u32>,
    client_list: Option<Vec<WinId>>,
    desktops: HashMap<WinId, u32>,
    net_states: HashMap<WinId, (bool, bool)>,
    /// Focused tag name and monitor index the last `tag_changed` was emitted for
    tag: Option<(String, usize)>,
    tag_flags: Option<Vec<(usize, usize)>>,
}

impl WMState {
    /// Keys grabbed while the focused client has the focus, release bindings are grabbed through
    /// their press
    pub(crate) fn key_grabs(&self) -> Vec<KeyCombo> {
        let client = self.focused_client().and_then(|w| self.clients.get(&w));
        let mut grabs = self
            .keybinds
            .iter()
            .filter(|bind| {
                client
                    .map(|c| c.accepts_binding(&bind.combo.to_string()))
                    .unwrap_or(true)
            })
            .map(|bind| KeyCombo {
                release: false,
                ..bind.combo
            })
            .collect::<Vec<_>>();
        grabs.sort();
        grabs.dedup();
        grabs
    }

    pub(crate) fn button_grabs(&self) -> Vec<MouseCombo> {
        let mut grabs: Vec<MouseCombo> = Vec::new();
        for bind in &self.mousebinds {
            if !grabs.contains(&bind.combo) {
                grabs.push(bind.combo);
            }
        }
        grabs
    }

    /// Run after every command and every batch of events
    pub(crate) fn settle(&mut self) {
        let focus = self.focused_client();
        if let Some(win) = focus {
            if self.clients.get(&win).map(|c| c.urgent).unwrap_or(false) {
                let _ = self.set_urgent(win, false);
            }
        }

        if self.settings.monitors_locked == 0 {
            self.apply_layout();
        }

        if self.synced.focus != Some(focus) {
            self.synced.focus = Some(focus);
            self.display.execute(DisplayAction::Focus(focus));
            self.display.execute(DisplayAction::SetActiveWindow(focus));
            match focus.and_then(|w| self.clients.get(&w)) {
                Some(client) => {
                    let hook = ["focus_changed".to_string(), client.winid(), client.title.clone()];
                    self.hooks.emit(hook);
                }
                None => self.hooks.emit(["focus_changed", "0x0", ""]),
            }
        }

        let keys = self.key_grabs();
        if self.synced.keys.as_ref() != Some(&keys) {
            self.display.execute(DisplayAction::GrabKeys(keys.clone()));
            self.synced.keys = Some(keys);
        }
        let buttons = self.button_grabs();
        if self.synced.buttons.as_ref() != Some(&buttons) {
            self.display.execute(DisplayAction::GrabButtons(buttons.clone()));
            self.synced.buttons = Some(buttons);
        }

        self.sync_ewmh();
        self.emit_tag_hooks();
        self.check_watchers();
        self.display.flush();
    }

    fn sync_ewmh(&mut self) {
        let names = self.tags.iter().map(|t| t.name.clone()).collect::<Vec<_>>();
        if self.synced.desktop_names.as_ref() != Some(&names) {
            self.display
                .execute(DisplayAction::SetNumberOfDesktops(names.len() as u32));
            self.display
                .execute(DisplayAction::SetDesktopNames(names.clone()));
            self.synced.desktop_names = Some(names);
        }
        let current = self.focused_tag_index() as u32;
        if self.synced.current_desktop != Some(current) {
            self.display.execute(DisplayAction::SetCurrentDesktop(current));
            self.synced.current_desktop = Some(current);
        }
        let list = self.clients.keys().copied().collect::<Vec<_>>();
        if self.synced.client_list.as_ref() != Some(&list) {
            self.display.execute(DisplayAction::SetClientList(list.clone()));
            self.synced.client_list = Some(list);
        }

        let mut actions = Vec::new();
        for (win, client) in &self.clients {
            if !client.ewmhnotify {
                continue;
            }
            if let Some(desktop) = self.tag_index(client.tag) {
                let desktop = desktop as u32;
                if self.synced.desktops.insert(*win, desktop) != Some(desktop) {
                    actions.push(DisplayAction::SetWmDesktop { id: *win, desktop });
                }
            }
            let state = (client.fullscreen, client.urgent);
            if self.synced.net_states.insert(*win, state) != Some(state) {
                actions.push(DisplayAction::SetNetWmState {
                    id: *win,
                    fullscreen: state.0,
                    urgent: state.1,
                });
            }
        }
        let clients = &self.clients;
        self.synced.desktops.retain(|w, _| clients.contains_key(w));
        self.synced.net_states.retain(|w, _| clients.contains_key(w));
        for action in actions {
            self.display.execute(action);
        }
    }

    fn emit_tag_hooks(&mut self) {
        let focused = (
            self.tags[self.focused_tag_index()].name.clone(),
            self.focused_monitor,
        );
        if self.synced.tag.as_ref() != Some(&focused) {
            // the very first state is not a change
            if self.synced.tag.is_some() {
                self.hooks
                    .emit(["tag_changed".to_string(), focused.0.clone(), focused.1.to_string()]);
            }
            self.synced.tag = Some(focused);
        }

        let flags = self
            .tags
            .iter()
            .map(|t| {
                let members = self.clients.values().filter(|c| c.tag == t.id);
                let urgent = members.clone().filter(|c| c.urgent).count();
                (members.count(), urgent)
            })
            .collect::<Vec<_>>();
        if self.synced.tag_flags.as_ref() != Some(&flags) {
            if self.synced.tag_flags.is_some() {
                self.hooks.emit(["tag_flags"]);
            }
            self.synced.tag_flags = Some(flags);
        }
    }

    /// Emit `attribute_changed` for every watched attribute whose value changed
    pub(crate) fn check_watchers(&mut self) {
        for path in self.hooks.watched_paths() {
            let value = self
                .resolve_attr(&path)
                .ok()
                .and_then(|(obj, info)| self.attr_value(&obj, &info.name))
                .map(|v| v.to_string());
            self.hooks.update_watched(&path, value);
        }
    }
}
