mod event_handlers;
mod focus;
mod layout;
mod manage;
mod monitors;
mod sync;
mod tags;

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use common::Reply;

use crate::{
    autostart::{Autostart, Children},
    commands::{self, Output},
    display::DisplayServer,
    hook::Hooks,
    keys::KeyBind,
    mouse::{Drag, MouseBind},
    newtypes::{MonitorId, TagId, WinId},
    object::{Obj, UserAttr},
    rect::Rect,
    rules::Rule,
    settings::Settings,
    states::{Client, Monitor, Panel, Tag},
    theme::Theme,
};

pub(crate) use self::sync::Synced;

/// Used when the display server doesn't know of any screen
const FALLBACK_SCREEN: Rect = Rect {
    x: 0,
    y: 0,
    width: 800,
    height: 600,
};

pub(crate) struct WMState {
    pub(crate) display: Box<dyn DisplayServer>,
    pub(crate) settings: Settings,
    pub(crate) theme: Theme,
    pub(crate) clients: BTreeMap<WinId, Client>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) monitors: Vec<Monitor>,
    pub(crate) focused_monitor: usize,
    /// Monitors in the order they were focused, most recent first. This is the stacking order.
    pub(crate) monitor_history: Vec<MonitorId>,
    /// Dock windows, they are never managed
    pub(crate) panels: BTreeMap<WinId, Panel>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) next_rule_label: u64,
    pub(crate) keybinds: Vec<KeyBind>,
    pub(crate) mousebinds: Vec<MouseBind>,
    pub(crate) user_attrs: BTreeMap<Obj, BTreeMap<String, UserAttr>>,
    pub(crate) hooks: Hooks,
    /// Counter for the names of `mktemp` attributes
    pub(crate) tmp_counter: u64,
    pub(crate) autostart: Autostart,
    pub(crate) children: Children,
    pub(crate) drag: Option<Drag>,
    pub(crate) running: bool,
    next_tag_id: u32,
    next_monitor_id: u32,
    /// Modifiers of the keys currently held down, release bindings are looked up with these
    pressed_keys: HashMap<u32, u16>,
    /// What the display server was told last
    synced: Synced,
}

impl std::fmt::Debug for WMState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WMState")
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .field("tags", &self.tags.iter().map(|t| &t.name).collect::<Vec<_>>())
            .field("monitors", &self.monitors.len())
            .field("focused_monitor", &self.focused_monitor)
            .finish()
    }
}

/// Drop rectangles that were seen before, keeping the first occurrence
pub(crate) fn dedup_rects(rects: Vec<Rect>) -> Vec<Rect> {
    let mut unique: Vec<Rect> = Vec::with_capacity(rects.len());
    for rect in rects {
        if !unique.contains(&rect) {
            unique.push(rect);
        }
    }
    unique
}

/// Tag and monitor names may not be empty or consist of digits only
pub(crate) fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().all(|c| c.is_ascii_digit())
}

impl WMState {
    /// Set up tags and monitors. With `import_tags` the desktop names left behind by a previous
    /// window manager become the initial tags.
    pub(crate) fn new(
        display: Box<dyn DisplayServer>,
        autostart: PathBuf,
        import_tags: bool,
    ) -> Self {
        let settings = Settings::default();
        let mut state = Self {
            display,
            settings,
            theme: Theme::default(),
            clients: BTreeMap::new(),
            tags: Vec::new(),
            monitors: Vec::new(),
            focused_monitor: 0,
            monitor_history: Vec::new(),
            panels: BTreeMap::new(),
            rules: Vec::new(),
            next_rule_label: 0,
            keybinds: Vec::new(),
            mousebinds: Vec::new(),
            user_attrs: BTreeMap::new(),
            hooks: Hooks::default(),
            tmp_counter: 0,
            autostart: Autostart::new(autostart),
            children: Children::default(),
            drag: None,
            running: true,
            next_tag_id: 0,
            next_monitor_id: 0,
            pressed_keys: HashMap::new(),
            synced: Synced::default(),
        };

        if import_tags {
            for name in state.display.desktop_names() {
                if valid_name(&name) && state.tag_position(&name).is_none() {
                    state.push_tag(&name);
                }
            }
        }
        if state.tags.is_empty() {
            state.push_tag("default");
        }

        let mut screens = dedup_rects(state.display.screen_rects());
        if screens.is_empty() {
            screens.push(FALLBACK_SCREEN);
        }
        for (rect, tag) in screens.into_iter().zip(0..state.tags.len()) {
            let tag = state.tags[tag].id;
            state.push_monitor(rect, tag);
        }
        log::info!(
            "starting with {} tags on {} monitors",
            state.tags.len(),
            state.monitors.len()
        );
        state
    }

    pub(crate) fn new_tag_id(&mut self) -> TagId {
        self.next_tag_id += 1;
        TagId(self.next_tag_id - 1)
    }

    pub(crate) fn new_monitor_id(&mut self) -> MonitorId {
        self.next_monitor_id += 1;
        MonitorId(self.next_monitor_id - 1)
    }

    fn push_tag(&mut self, name: &str) {
        let id = self.new_tag_id();
        self.tags
            .push(Tag::new(id, name, self.settings.default_algorithm()));
    }

    fn push_monitor(&mut self, rect: Rect, tag: TagId) {
        let id = self.new_monitor_id();
        self.monitors.push(Monitor::new(id, rect, tag));
        self.monitor_history.push(id);
    }

    pub(crate) fn tag_index(&self, id: TagId) -> Option<usize> {
        self.tags.iter().position(|t| t.id == id)
    }

    pub(crate) fn tag_position(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|t| t.name == name)
    }

    pub(crate) fn tag_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        self.tags.iter_mut().find(|t| t.id == id)
    }

    /// Index of the monitor showing the tag
    pub(crate) fn monitor_of_tag(&self, id: TagId) -> Option<usize> {
        self.monitors.iter().position(|m| m.tag == id)
    }

    pub(crate) fn focused_tag(&self) -> Option<&Tag> {
        let monitor = self.monitors.get(self.focused_monitor)?;
        self.tag_by_id(monitor.tag)
    }

    pub(crate) fn focused_tag_index(&self) -> usize {
        self.monitors
            .get(self.focused_monitor)
            .and_then(|m| self.tag_index(m.tag))
            .unwrap_or(0)
    }

    pub(crate) fn focused_client(&self) -> Option<WinId> {
        self.focused_tag()?.focused_client()
    }

    /// Floating either by itself or because its tag is in floating mode
    pub(crate) fn is_floating(&self, win: WinId) -> bool {
        match self.clients.get(&win) {
            Some(client) => {
                client.floating || self.tag_by_id(client.tag).map(|t| t.floating).unwrap_or(false)
            }
            None => false,
        }
    }

    /// Run a command from a client of the socket, the display is brought up to date before
    /// the reply is handed out
    pub fn call(&mut self, args: &[String]) -> Reply {
        if self.settings.verbose {
            log::info!("command: {:?}", args);
        } else {
            log::debug!("command: {:?}", args);
        }
        let mut out = Output::default();
        let status = commands::run(self, args, &mut out);
        self.settle();
        Reply {
            stdout: out.stdout,
            stderr: out.stderr,
            status,
        }
    }

    /// Hooks for the idle subscribers
    pub fn take_hooks(&mut self) -> Vec<Vec<String>> {
        self.hooks.take()
    }

    /// Run the autostart program, it's started again on `reload`
    pub fn run_autostart(&mut self) {
        match self.autostart.start() {
            Ok(Some(previous)) => self.children.adopt(previous),
            Ok(None) => {}
            Err(e) => log::error!("{:?}", e),
        }
    }

    /// Reap exited children, called once per round of the main loop
    pub fn reap_children(&mut self) {
        self.autostart.reap();
        self.children.reap();
        self.check_watchers();
    }
}
