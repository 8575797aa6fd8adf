//! The object tree.
//!
//! Everything the manager knows is reachable from the root by a dotted path like
//! `tags.by-name.web.frame_count`. Objects don't exist as values of their own, an [`Obj`] is only
//! an address that is resolved against the [`WMState`] whenever it's used.

mod attribute;

use std::collections::BTreeMap;

use common::ExitCode;

pub(crate) use self::attribute::{AttrSpec, AttrType, RegexValue, UserAttr, Value};
use crate::{
    autostart::Autostart,
    errors::CommandError,
    frame::{Algorithm, Align, Frame, FramePath, FRACTION_MAX, FRACTION_MIN},
    newtypes::{format_winid, parse_winid, MonitorId, TagId, WinId},
    settings::Settings,
    states::{mon_state::PAD_NAMES, Client, Monitor, Panel, Tag, WMState},
    theme::{self, ThemeNode},
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Obj {
    Root,
    Clients,
    Client(WinId),
    Tags,
    TagsByName,
    Tag(TagId),
    Tiling(TagId),
    Frame(TagId, FramePath),
    Monitors,
    MonitorsByName,
    Monitor(MonitorId),
    Settings,
    Theme(ThemeNode),
    Tmp,
    Autostart,
    Panels,
    Panel(WinId),
}

const COUNT: &[AttrSpec] = &[AttrSpec::ro("count", AttrType::Int, "Number of entries")];

const LEAF_SPECS: &[AttrSpec] = &[
    AttrSpec::ro("index", AttrType::String, "Path of the frame from the root"),
    AttrSpec::rw("algorithm", AttrType::Enum(Algorithm::NAMES), "How the clients are arranged"),
    AttrSpec::rw("selection", AttrType::Int, "Index of the selected client"),
    AttrSpec::ro("client_count", AttrType::Int, "Number of clients in the frame"),
];

const SPLIT_SPECS: &[AttrSpec] = &[
    AttrSpec::ro("index", AttrType::String, "Path of the frame from the root"),
    AttrSpec::ro("split_type", AttrType::Enum(Align::NAMES), "Alignment of the split"),
    AttrSpec::rw("fraction", AttrType::Decimal, "Share of the first child"),
    AttrSpec::rw("selection", AttrType::Int, "Which child has the focus, 0 or 1"),
];

/// Documentation of the children that may or may not exist
const DYNAMIC_CHILDREN: &[(&str, &str)] = &[
    ("focus", "The focused entry"),
    ("dragged", "The client being dragged with the mouse"),
    ("by-name", "Entries indexed by their name"),
];

/// A listing entry of `attr` and `help`
#[derive(Debug, Clone)]
pub(crate) struct AttrInfo {
    pub(crate) name: String,
    pub(crate) ty: AttrType,
    pub(crate) writable: bool,
    pub(crate) user: bool,
    pub(crate) doc: &'static str,
}

impl AttrInfo {
    fn builtin(spec: &AttrSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            ty: spec.ty,
            writable: spec.writable,
            user: false,
            doc: spec.doc,
        }
    }
}

/// Split `a.b.c` into the object path `a.b` and the attribute `c`
pub(crate) fn split_attr_path(path: &str) -> (&str, &str) {
    match path.trim_end_matches('.').rsplit_once('.') {
        Some((object, attr)) => (object, attr),
        None => ("", path.trim_end_matches('.')),
    }
}

/// Join path segments, empty segments are dropped
pub(crate) fn join_path(object: &str, child: &str) -> String {
    object
        .split('.')
        .chain(std::iter::once(child))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

fn frame_index(path: &[u8]) -> String {
    path.iter().map(|i| if *i == 0 { '0' } else { '1' }).collect()
}

impl WMState {
    pub(crate) fn tag_by_id(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub(crate) fn monitor_by_id(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    fn frame_of(&self, tag: TagId, path: &[u8]) -> Option<&Frame> {
        self.tag_by_id(tag)?.root.get(path)
    }

    /// Whether `obj` still refers to something
    pub(crate) fn exists(&self, obj: &Obj) -> bool {
        match obj {
            Obj::Client(win) => self.clients.contains_key(win),
            Obj::Tag(id) | Obj::Tiling(id) => self.tag_by_id(*id).is_some(),
            Obj::Frame(id, path) => self.frame_of(*id, path).is_some(),
            Obj::Monitor(id) => self.monitor_by_id(*id).is_some(),
            Obj::Panel(win) => self.panels.contains_key(win),
            _ => true,
        }
    }

    /// The named children of `obj` in listing order
    pub(crate) fn children(&self, obj: &Obj) -> Vec<(String, Obj)> {
        let mut children = Vec::new();
        match obj {
            Obj::Root => {
                children.push(("autostart".to_string(), Obj::Autostart));
                children.push(("clients".to_string(), Obj::Clients));
                children.push(("monitors".to_string(), Obj::Monitors));
                children.push(("panels".to_string(), Obj::Panels));
                children.push(("settings".to_string(), Obj::Settings));
                children.push(("tags".to_string(), Obj::Tags));
                children.push(("theme".to_string(), Obj::Theme(ThemeNode::Root)));
                children.push(("tmp".to_string(), Obj::Tmp));
            }
            Obj::Clients => {
                for win in self.clients.keys() {
                    children.push((format_winid(*win), Obj::Client(*win)));
                }
                if let Some(win) = self.drag.as_ref().map(|d| d.win) {
                    children.push(("dragged".to_string(), Obj::Client(win)));
                }
                if let Some(win) = self.focused_client() {
                    children.push(("focus".to_string(), Obj::Client(win)));
                }
            }
            Obj::Tags => {
                for (i, tag) in self.tags.iter().enumerate() {
                    children.push((i.to_string(), Obj::Tag(tag.id)));
                }
                children.push(("by-name".to_string(), Obj::TagsByName));
                if let Some(tag) = self.focused_tag() {
                    children.push(("focus".to_string(), Obj::Tag(tag.id)));
                }
            }
            Obj::TagsByName => {
                for tag in &self.tags {
                    children.push((tag.name.clone(), Obj::Tag(tag.id)));
                }
            }
            Obj::Tag(id) => children.push(("tiling".to_string(), Obj::Tiling(*id))),
            Obj::Tiling(id) => {
                if let Some(tag) = self.tag_by_id(*id) {
                    let focused = Obj::Frame(*id, tag.root.focused_path());
                    children.push(("focused_frame".to_string(), focused));
                    children.push(("root".to_string(), Obj::Frame(*id, Vec::new())));
                }
            }
            Obj::Frame(id, path) => {
                if let Some(Frame::Split(_)) = self.frame_of(*id, path) {
                    for i in 0..2u8 {
                        let mut child = path.clone();
                        child.push(i);
                        children.push((i.to_string(), Obj::Frame(*id, child)));
                    }
                }
            }
            Obj::Monitors => {
                for (i, monitor) in self.monitors.iter().enumerate() {
                    children.push((i.to_string(), Obj::Monitor(monitor.id)));
                }
                children.push(("by-name".to_string(), Obj::MonitorsByName));
                if let Some(monitor) = self.monitors.get(self.focused_monitor) {
                    children.push(("focus".to_string(), Obj::Monitor(monitor.id)));
                }
            }
            Obj::MonitorsByName => {
                for monitor in self.monitors.iter().filter(|m| !m.name.is_empty()) {
                    children.push((monitor.name.clone(), Obj::Monitor(monitor.id)));
                }
            }
            Obj::Theme(node) => {
                for (name, child) in node.children() {
                    children.push((name.to_string(), Obj::Theme(child)));
                }
            }
            Obj::Panels => {
                for win in self.panels.keys() {
                    children.push((format_winid(*win), Obj::Panel(*win)));
                }
            }
            Obj::Client(_)
            | Obj::Monitor(_)
            | Obj::Settings
            | Obj::Tmp
            | Obj::Autostart
            | Obj::Panel(_) => {}
        }
        children
    }

    /// Look up a single child. Numeric and window id names are also accepted in other spellings
    /// than the listed ones, e.g. `clients.12345` for `clients.0x3039`.
    pub(crate) fn child(&self, obj: &Obj, name: &str) -> Option<Obj> {
        match obj {
            Obj::Clients => {
                if let Some(win) = parse_winid(name).filter(|w| self.clients.contains_key(w)) {
                    return Some(Obj::Client(win));
                }
            }
            Obj::Monitors => {
                let named = self
                    .monitors
                    .iter()
                    .find(|m| !m.name.is_empty() && m.name == name);
                if let Some(monitor) = named {
                    return Some(Obj::Monitor(monitor.id));
                }
            }
            _ => {}
        }
        self.children(obj)
            .into_iter()
            .find(|(child, _)| child == name)
            .map(|(_, obj)| obj)
    }

    /// Resolve a dotted path, empty segments are skipped
    pub(crate) fn resolve(&self, path: &str) -> Result<Obj, CommandError> {
        let mut obj = Obj::Root;
        let mut walked = Vec::new();
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            obj = self.child(&obj, segment).ok_or_else(|| {
                let parent = if walked.is_empty() {
                    "the root".to_string()
                } else {
                    format!("\"{}\"", walked.join("."))
                };
                CommandError::invalid(format!(
                    "Object {} has no child named \"{}\"",
                    parent, segment
                ))
            })?;
            walked.push(segment);
        }
        Ok(obj)
    }

    /// The canonical path of an object
    pub(crate) fn path_of(&self, obj: &Obj) -> String {
        match obj {
            Obj::Root => String::new(),
            Obj::Clients => "clients".to_string(),
            Obj::Client(win) => format!("clients.{}", format_winid(*win)),
            Obj::Tags => "tags".to_string(),
            Obj::TagsByName => "tags.by-name".to_string(),
            Obj::Tag(id) => match self.tag_index(*id) {
                Some(i) => format!("tags.{}", i),
                None => "tags".to_string(),
            },
            Obj::Tiling(id) => format!("{}.tiling", self.path_of(&Obj::Tag(*id))),
            Obj::Frame(id, path) => {
                let mut s = format!("{}.root", self.path_of(&Obj::Tiling(*id)));
                for i in path {
                    s.push_str(&format!(".{}", i));
                }
                s
            }
            Obj::Monitors => "monitors".to_string(),
            Obj::MonitorsByName => "monitors.by-name".to_string(),
            Obj::Monitor(id) => match self.monitors.iter().position(|m| m.id == *id) {
                Some(i) => format!("monitors.{}", i),
                None => "monitors".to_string(),
            },
            Obj::Settings => "settings".to_string(),
            Obj::Theme(node) => match node {
                ThemeNode::Root => "theme".to_string(),
                ThemeNode::Type(t) => format!("theme.{}", t.name()),
                ThemeNode::State(s) => format!("theme.{}", s.name()),
                ThemeNode::Scheme(t, s) => format!("theme.{}.{}", t.name(), s.name()),
            },
            Obj::Tmp => "tmp".to_string(),
            Obj::Autostart => "autostart".to_string(),
            Obj::Panels => "panels".to_string(),
            Obj::Panel(win) => format!("panels.{}", format_winid(*win)),
        }
    }

    fn builtin_specs(&self, obj: &Obj) -> &'static [AttrSpec] {
        match obj {
            Obj::Clients | Obj::Tags | Obj::Monitors | Obj::Panels => COUNT,
            Obj::Client(_) => Client::SPECS,
            Obj::Tag(_) => Tag::SPECS,
            Obj::Frame(id, path) => match self.frame_of(*id, path) {
                Some(Frame::Split(_)) => SPLIT_SPECS,
                Some(Frame::Leaf(_)) => LEAF_SPECS,
                None => &[],
            },
            Obj::Monitor(_) => Monitor::SPECS,
            Obj::Settings => Settings::SPECS,
            Obj::Theme(_) => theme::SPECS,
            Obj::Autostart => Autostart::SPECS,
            Obj::Panel(_) => Panel::SPECS,
            _ => &[],
        }
    }

    /// Built-in attributes followed by the user's
    pub(crate) fn attributes(&self, obj: &Obj) -> Vec<AttrInfo> {
        let mut attrs = self
            .builtin_specs(obj)
            .iter()
            .map(AttrInfo::builtin)
            .collect::<Vec<_>>();
        if let Some(user) = self.user_attrs.get(obj) {
            attrs.extend(user.iter().map(|(name, attr)| AttrInfo {
                name: name.clone(),
                ty: attr.ty,
                writable: true,
                user: true,
                doc: "",
            }));
        }
        attrs
    }

    pub(crate) fn attr_info(&self, obj: &Obj, name: &str) -> Option<AttrInfo> {
        if let Some(spec) = self.builtin_specs(obj).iter().find(|s| s.name == name) {
            return Some(AttrInfo::builtin(spec));
        }
        self.user_attrs
            .get(obj)
            .and_then(|attrs| attrs.get(name))
            .map(|attr| AttrInfo {
                name: name.to_string(),
                ty: attr.ty,
                writable: true,
                user: true,
                doc: "",
            })
    }

    /// Resolve `path` to an object and one of its attributes
    pub(crate) fn resolve_attr(&self, path: &str) -> Result<(Obj, AttrInfo), CommandError> {
        let (object, name) = split_attr_path(path);
        let obj = self.resolve(object)?;
        let info = self.attr_info(&obj, name).ok_or_else(|| {
            CommandError::invalid(format!("Object \"{}\" has no attribute \"{}\"", object, name))
        })?;
        Ok((obj, info))
    }

    pub(crate) fn attr_value(&self, obj: &Obj, name: &str) -> Option<Value> {
        if let Some(attr) = self.user_attrs.get(obj).and_then(|attrs| attrs.get(name)) {
            return Some(attr.value.clone());
        }
        let count = |n: usize| Some(Value::Int(n as i64));
        match obj {
            Obj::Clients if name == "count" => count(self.clients.len()),
            Obj::Tags if name == "count" => count(self.tags.len()),
            Obj::Monitors if name == "count" => count(self.monitors.len()),
            Obj::Panels if name == "count" => count(self.panels.len()),
            Obj::Client(win) => {
                let client = self.clients.get(win)?;
                match name {
                    "tag" => Some(Value::Str(self.tag_by_id(client.tag)?.name.clone())),
                    "floating_effectively" => Some(Value::Bool(self.is_floating(*win))),
                    _ => client.get(name),
                }
            }
            Obj::Tag(id) => self.tag_attr(*id, name),
            Obj::Frame(id, path) => {
                let index = Value::Str(frame_index(path));
                match self.frame_of(*id, path)? {
                    Frame::Leaf(leaf) => match name {
                        "index" => Some(index),
                        "algorithm" => Some(Value::Enum(leaf.algorithm.name().to_string())),
                        "selection" => Some(Value::Int(leaf.selection as i64)),
                        "client_count" => count(leaf.clients.len()),
                        _ => None,
                    },
                    Frame::Split(split) => match name {
                        "index" => Some(index),
                        "split_type" => Some(Value::Enum(split.align.name().to_string())),
                        "fraction" => Some(Value::Decimal(split.fraction)),
                        "selection" => Some(Value::Int(split.selection as i64)),
                        _ => None,
                    },
                }
            }
            Obj::Monitor(id) => {
                let index = self.monitors.iter().position(|m| m.id == *id)?;
                let monitor = &self.monitors[index];
                match name {
                    "index" => Some(Value::Uint(index as u64)),
                    "name" => Some(Value::Str(monitor.name.clone())),
                    "tag" => Some(Value::Str(self.tag_by_id(monitor.tag)?.name.clone())),
                    "geometry" => Some(Value::Rect(monitor.rect)),
                    "content_geometry" => Some(Value::Rect(monitor.usable_area())),
                    "pad_up" => Some(Value::Uint(monitor.pad[0].max(0) as u64)),
                    "pad_right" => Some(Value::Uint(monitor.pad[1].max(0) as u64)),
                    "pad_down" => Some(Value::Uint(monitor.pad[2].max(0) as u64)),
                    "pad_left" => Some(Value::Uint(monitor.pad[3].max(0) as u64)),
                    "lock_tag" => Some(Value::Bool(monitor.lock_tag)),
                    _ => None,
                }
            }
            Obj::Settings => self.settings.get(name),
            Obj::Theme(node) => self.theme.get(*node, name),
            Obj::Autostart => self.autostart.get(name),
            Obj::Panel(win) => {
                let panel = self.panels.get(win)?;
                match name {
                    "winid" => Some(Value::WinId(panel.win)),
                    "geometry" => Some(Value::Rect(panel.rect)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn tag_attr(&self, id: TagId, name: &str) -> Option<Value> {
        let index = self.tag_index(id)?;
        let tag = &self.tags[index];
        let members = || self.clients.values().filter(move |c| c.tag == id);
        let int = |n: usize| Some(Value::Int(n as i64));
        let leaf = tag.root.focused_leaf();
        match name {
            "name" => Some(Value::Str(tag.name.clone())),
            "index" => Some(Value::Uint(index as u64)),
            "frame_count" => int(tag.root.leaf_count()),
            "client_count" => int(members().count()),
            "curframe_windex" => int(leaf.selection),
            "curframe_wcount" => int(leaf.clients.len()),
            "floating" => Some(Value::Bool(tag.floating)),
            "floating_focused" => Some(Value::Bool(tag.floating_focused)),
            "urgent_count" => int(members().filter(|c| c.urgent).count()),
            "minimized_count" => int(members().filter(|c| c.minimized).count()),
            "visible" => Some(Value::Bool(self.monitor_of_tag(id).is_some())),
            _ => None,
        }
    }

    /// Parse `text` and assign it, nothing changes if any step fails
    /// Like [`Value::parse`], but color names missing from the built-in table are looked up by
    /// the display server
    pub(crate) fn parse_value(
        &self,
        ty: AttrType,
        text: &str,
        current: Option<&Value>,
    ) -> Result<Value, String> {
        Value::parse(ty, text, current).or_else(|e| match ty {
            AttrType::Color => self
                .display
                .lookup_color(text.trim())
                .map(Value::Color)
                .ok_or(e),
            _ => Err(e),
        })
    }

    pub(crate) fn set_attr_text(
        &mut self,
        obj: &Obj,
        name: &str,
        text: &str,
    ) -> Result<(), CommandError> {
        let info = self.attr_info(obj, name).ok_or_else(|| {
            CommandError::invalid(format!(
                "Object \"{}\" has no attribute \"{}\"",
                self.path_of(obj),
                name
            ))
        })?;
        if !info.writable {
            return Err(CommandError::invalid(format!(
                "Attribute \"{}\" is read-only",
                name
            )));
        }
        let current = self.attr_value(obj, name);
        let value = self.parse_value(info.ty, text, current.as_ref()).map_err(|e| {
            CommandError::failed(format!(
                "Invalid value \"{}\" for attribute \"{}\": {}",
                text, name, e
            ))
        })?;
        if info.user {
            if let Some(attr) = self.user_attrs.get_mut(obj).and_then(|a| a.get_mut(name)) {
                attr.value = value;
            }
            return Ok(());
        }
        self.write_builtin(obj, name, value)
    }

    fn write_builtin(&mut self, obj: &Obj, name: &str, value: Value) -> Result<(), CommandError> {
        let bool_value = value.as_bool();
        match obj {
            Obj::Settings => {
                self.settings
                    .set(name, value)
                    .map_err(|e| CommandError::new(ExitCode::SettingNotFound, e))?;
                if name == "auto_detect_panels" {
                    self.update_panel_padding();
                }
                Ok(())
            }
            Obj::Theme(node) => self
                .theme
                .set(*node, name, value)
                .map_err(CommandError::invalid),
            Obj::Client(win) => {
                let win = *win;
                match (name, bool_value) {
                    ("floating", Some(on)) => return self.set_client_floating(win, on),
                    ("fullscreen", Some(on)) => return self.set_fullscreen(win, on),
                    ("pseudotile", Some(on)) => return self.set_pseudotile(win, on),
                    ("minimized", Some(on)) => return self.set_minimized(win, on),
                    ("urgent", Some(on)) => return self.set_urgent(win, on),
                    _ => {
                        let client = self
                            .clients
                            .get_mut(&win)
                            .ok_or_else(|| CommandError::invalid("No such client"))?;
                        let on = bool_value.unwrap_or_default();
                        match name {
                            "sizehints_floating" => client.sizehints_floating = on,
                            "sizehints_tiling" => client.sizehints_tiling = on,
                            "ewmhrequests" => client.ewmhrequests = on,
                            "ewmhnotify" => client.ewmhnotify = on,
                            "keymask" => client.keymask = value.into_regex().unwrap_or_default(),
                            "keys_inactive" => {
                                client.keys_inactive = value.into_regex().unwrap_or_default()
                            }
                            "floating_geometry" => {
                                if let Some(rect) = value.as_rect() {
                                    client.float_rect = rect;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Ok(())
            }
            Obj::Tag(id) => {
                let index = self
                    .tag_index(*id)
                    .ok_or_else(|| CommandError::invalid("No such tag"))?;
                match name {
                    "name" => self.rename_tag(index, value.as_str().unwrap_or_default()),
                    "index" => {
                        let target = value.as_int().unwrap_or_default() as usize;
                        self.move_tag(index, target)
                    }
                    "floating" => {
                        self.tags[index].floating = bool_value.unwrap_or_default();
                        Ok(())
                    }
                    "floating_focused" => {
                        let tag = &mut self.tags[index];
                        let on = bool_value.unwrap_or_default();
                        if on && tag.floating_clients.is_empty() {
                            return Err(CommandError::failed("There are no floating clients"));
                        }
                        tag.floating_focused = on;
                        Ok(())
                    }
                    _ => Ok(()),
                }
            }
            Obj::Frame(id, path) => {
                let index = self
                    .tag_index(*id)
                    .ok_or_else(|| CommandError::invalid("No such tag"))?;
                let frame = self.tags[index]
                    .root
                    .get_mut(path)
                    .ok_or_else(|| CommandError::invalid("No such frame"))?;
                match (frame, name) {
                    (Frame::Leaf(leaf), "algorithm") => {
                        leaf.algorithm = value
                            .as_str()
                            .unwrap_or_default()
                            .parse()
                            .map_err(CommandError::failed)?;
                    }
                    (Frame::Leaf(leaf), "selection") => {
                        let selection = value.as_int().unwrap_or_default();
                        if selection < 0 || selection as usize >= leaf.clients.len().max(1) {
                            return Err(CommandError::failed(format!(
                                "Selection {} is out of range",
                                selection
                            )));
                        }
                        leaf.selection = selection as usize;
                    }
                    (Frame::Split(split), "fraction") => {
                        if let Some(fraction) = value.as_decimal() {
                            split.fraction = fraction.clamp(FRACTION_MIN, FRACTION_MAX);
                        }
                    }
                    (Frame::Split(split), "selection") => match value.as_int() {
                        Some(n @ 0..=1) => split.selection = n as usize,
                        _ => return Err(CommandError::failed("Selection must be 0 or 1")),
                    },
                    _ => {}
                }
                Ok(())
            }
            Obj::Monitor(id) => {
                let index = self
                    .monitors
                    .iter()
                    .position(|m| m.id == *id)
                    .ok_or_else(|| CommandError::new(ExitCode::Forbidden, "No such monitor"))?;
                match name {
                    "name" => self.rename_monitor(index, value.as_str().unwrap_or_default()),
                    "tag" => {
                        let tag = self.find_tag(value.as_str().unwrap_or_default())?;
                        self.use_tag(index, tag)
                    }
                    "geometry" => self.set_monitor_rect(index, value.as_rect().unwrap_or_default()),
                    "lock_tag" => {
                        self.monitors[index].lock_tag = bool_value.unwrap_or_default();
                        Ok(())
                    }
                    pad => {
                        let side = PAD_NAMES.iter().position(|p| *p == pad);
                        if let Some(side) = side {
                            // the value was parsed as uint, it can't be negative
                            let width = value.as_int().unwrap_or_default();
                            self.monitors[index].pad[side] = width.min(i32::MAX as i64) as i32;
                        }
                        Ok(())
                    }
                }
            }
            _ => Err(CommandError::invalid(format!("Attribute \"{}\" is read-only", name))),
        }
    }

    /// Create a user attribute, the name has to start with `my_`
    pub(crate) fn new_user_attr(
        &mut self,
        obj: Obj,
        name: &str,
        ty: AttrType,
        initial: Option<&str>,
    ) -> Result<(), CommandError> {
        if !name.starts_with("my_") {
            return Err(CommandError::failed(format!(
                "The attribute name must begin with \"my_\", but \"{}\" doesn't",
                name
            )));
        }
        if self.attr_info(&obj, name).is_some() {
            return Err(CommandError::failed(format!(
                "An attribute named \"{}\" already exists",
                name
            )));
        }
        let value = match initial {
            Some(text) => self.parse_value(ty, text, None).map_err(|e| {
                CommandError::failed(format!("Invalid value \"{}\": {}", text, e))
            })?,
            None => ty.default_value(),
        };
        self.user_attrs
            .entry(obj)
            .or_insert_with(BTreeMap::new)
            .insert(name.to_string(), UserAttr { ty, value });
        Ok(())
    }

    pub(crate) fn remove_user_attr(&mut self, obj: &Obj, name: &str) -> Result<(), CommandError> {
        let removed = self
            .user_attrs
            .get_mut(obj)
            .and_then(|attrs| attrs.remove(name))
            .is_some();
        if removed {
            return Ok(());
        }
        match self.attr_info(obj, name) {
            Some(_) => Err(CommandError::failed(format!(
                "Cannot remove the built-in attribute \"{}\"",
                name
            ))),
            None => Err(CommandError::invalid(format!("No such attribute \"{}\"", name))),
        }
    }

    /// Drop the user attributes of objects that are gone
    pub(crate) fn forget_stale_attrs(&mut self) {
        let stale = self
            .user_attrs
            .keys()
            .filter(|obj| !self.exists(obj))
            .cloned()
            .collect::<Vec<_>>();
        for obj in stale {
            self.user_attrs.remove(&obj);
        }
    }

    /// Documentation for `help`
    pub(crate) fn help_text(&self, path: &str) -> Result<String, CommandError> {
        if let Ok(obj) = self.resolve(path) {
            let mut text = format!("Object \"{}\"\n", self.path_of(&obj));
            let children = self.children(&obj);
            if !children.is_empty() {
                text.push_str(&format!("\n{} children\n", children.len()));
            }
            let attrs = self.attributes(&obj);
            if !attrs.is_empty() {
                text.push_str(&format!("{} attributes\n", attrs.len()));
            }
            return Ok(text);
        }
        let (object, name) = split_attr_path(path);
        let obj = self.resolve(object)?;
        if let Some(info) = self.attr_info(&obj, name) {
            let value = self
                .attr_value(&obj, name)
                .map(|v| v.to_string())
                .unwrap_or_default();
            let mut text = format!(
                "Attribute \"{}\" of \"{}\"\n\nType: {}\nWritable: {}\nCurrent value: {}\n",
                name,
                self.path_of(&obj),
                info.ty,
                if info.writable { "yes" } else { "no" },
                value
            );
            if !info.doc.is_empty() {
                text.push_str(&format!("\n{}\n", info.doc));
            }
            return Ok(text);
        }
        if let Some((_, doc)) = DYNAMIC_CHILDREN.iter().find(|(child, _)| *child == name) {
            return Ok(format!(
                "Entry \"{}\" of \"{}\"\n\n{}\n\nEntry does not exist\n",
                name,
                self.path_of(&obj),
                doc
            ));
        }
        Err(CommandError::invalid(format!(
            "Object \"{}\" has no child or attribute named \"{}\"",
            object, name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_paths() {
        assert_eq!(split_attr_path("tags.count"), ("tags", "count"));
        assert_eq!(split_attr_path("my_x"), ("", "my_x"));
        assert_eq!(split_attr_path("tags.focus.name."), ("tags.focus", "name"));
        assert_eq!(join_path("clients.", "focus"), "clients.focus");
        assert_eq!(join_path("", "tags"), "tags");
    }
}
