use crate::{
    display::WindowInfo,
    newtypes::{format_winid, TagId, WinId},
    object::{AttrSpec, AttrType, RegexValue, Value},
    rect::Rect,
    theme::{DecState, DecType},
};

pub(crate) const DOCK_TYPE: &str = "_NET_WM_WINDOW_TYPE_DOCK";
pub(crate) const DESKTOP_TYPE: &str = "_NET_WM_WINDOW_TYPE_DESKTOP";

/// A managed top level window
#[derive(Debug, Clone)]
pub(crate) struct Client {
    pub(crate) win: WinId,
    pub(crate) tag: TagId,
    pub(crate) title: String,
    pub(crate) class: String,
    pub(crate) instance: String,
    pub(crate) window_type: String,
    pub(crate) role: String,
    pub(crate) pid: Option<u32>,
    pub(crate) transient_for: Option<WinId>,
    pub(crate) fixed_size: bool,
    /// The geometry used whenever the client floats
    pub(crate) float_rect: Rect,
    /// Where the window content was put last, including nothing of the decoration
    pub(crate) content_rect: Rect,
    /// Where the decoration was put last
    pub(crate) decoration_rect: Rect,
    pub(crate) visible: bool,
    pub(crate) floating: bool,
    pub(crate) fullscreen: bool,
    pub(crate) pseudotile: bool,
    pub(crate) minimized: bool,
    pub(crate) urgent: bool,
    pub(crate) sizehints_floating: bool,
    pub(crate) sizehints_tiling: bool,
    pub(crate) ewmhrequests: bool,
    pub(crate) ewmhnotify: bool,
    pub(crate) keymask: RegexValue,
    pub(crate) keys_inactive: RegexValue,
}

impl Client {
    pub(crate) fn new(info: &WindowInfo, tag: TagId) -> Self {
        Self {
            win: info.id,
            tag,
            title: info.title.clone(),
            class: info.class.clone(),
            instance: info.instance.clone(),
            window_type: info.window_type.clone(),
            role: info.role.clone(),
            pid: info.pid,
            transient_for: info.transient_for,
            fixed_size: info.fixed_size,
            float_rect: info.geometry,
            content_rect: info.geometry,
            decoration_rect: info.geometry,
            visible: false,
            floating: false,
            fullscreen: false,
            pseudotile: false,
            minimized: false,
            urgent: info.urgent,
            sizehints_floating: true,
            sizehints_tiling: false,
            ewmhrequests: true,
            ewmhnotify: true,
            keymask: RegexValue::default(),
            keys_inactive: RegexValue::default(),
        }
    }

    pub(crate) fn winid(&self) -> String {
        format_winid(self.win)
    }

    pub(crate) fn decoration_state(&self, focused: bool) -> DecState {
        if focused {
            DecState::Active
        } else if self.urgent {
            DecState::Urgent
        } else {
            DecState::Normal
        }
    }

    pub(crate) fn decoration_type(&self, floating: bool, minimal: bool) -> DecType {
        if floating {
            DecType::Floating
        } else if minimal {
            DecType::Minimal
        } else {
            DecType::Tiling
        }
    }

    /// Whether a key combination is grabbed while this client has the focus
    pub(crate) fn accepts_binding(&self, combo: &str) -> bool {
        let masked = self
            .keymask
            .get()
            .map(|re| re.is_match(combo))
            .unwrap_or(true);
        let inactive = self
            .keys_inactive
            .get()
            .map(|re| re.is_match(combo))
            .unwrap_or(false);
        masked && !inactive
    }

    pub(crate) const SPECS: &'static [AttrSpec] = &[
        AttrSpec::ro("winid", AttrType::WinId, "The window id"),
        AttrSpec::ro("title", AttrType::String, "The window title"),
        AttrSpec::ro("class", AttrType::String, "The class of the window, WM_CLASS"),
        AttrSpec::ro("instance", AttrType::String, "The instance of the window, WM_CLASS"),
        AttrSpec::ro("window_type", AttrType::String, "The value of _NET_WM_WINDOW_TYPE"),
        AttrSpec::ro("pid", AttrType::Int, "The process id, -1 when unknown"),
        AttrSpec::ro("tag", AttrType::String, "The name of the tag of the client"),
        AttrSpec::rw(
            "floating",
            AttrType::Bool,
            "Whether the client floats above the tiled clients",
        ),
        AttrSpec::ro(
            "floating_effectively",
            AttrType::Bool,
            "Whether the client is floating, either by itself or because its tag is",
        ),
        AttrSpec::rw("fullscreen", AttrType::Bool, "Whether the client covers the whole monitor"),
        AttrSpec::rw(
            "pseudotile",
            AttrType::Bool,
            "Keep the floating size while tiled, centered in the tile",
        ),
        AttrSpec::rw("minimized", AttrType::Bool, "Whether the client is hidden from its tag"),
        AttrSpec::rw("urgent", AttrType::Bool, "The urgency state"),
        AttrSpec::rw("sizehints_floating", AttrType::Bool, "Respect size hints while floating"),
        AttrSpec::rw("sizehints_tiling", AttrType::Bool, "Respect size hints while tiled"),
        AttrSpec::rw("ewmhrequests", AttrType::Bool, "Accept EWMH requests of the client"),
        AttrSpec::rw("ewmhnotify", AttrType::Bool, "Tell the client about its state via EWMH"),
        AttrSpec::rw("keymask", AttrType::Regex, "Only key bindings matching this are active"),
        AttrSpec::rw(
            "keys_inactive",
            AttrType::Regex,
            "Key bindings matching this are passed to the client",
        ),
        AttrSpec::rw("floating_geometry", AttrType::Rect, "Geometry of the client while floating"),
        AttrSpec::ro("content_geometry", AttrType::Rect, "Current geometry of the window content"),
        AttrSpec::ro(
            "decoration_geometry",
            AttrType::Rect,
            "Current geometry including decoration",
        ),
        AttrSpec::ro("visible", AttrType::Bool, "Whether the window is shown"),
    ];

    /// Attributes that can be answered without knowing anything but the client itself
    pub(crate) fn get(&self, name: &str) -> Option<Value> {
        Some(match name {
            "winid" => Value::WinId(self.win),
            "title" => Value::Str(self.title.clone()),
            "class" => Value::Str(self.class.clone()),
            "instance" => Value::Str(self.instance.clone()),
            "window_type" => Value::Str(self.window_type.clone()),
            "pid" => Value::Int(self.pid.map(i64::from).unwrap_or(-1)),
            "floating" => Value::Bool(self.floating),
            "fullscreen" => Value::Bool(self.fullscreen),
            "pseudotile" => Value::Bool(self.pseudotile),
            "minimized" => Value::Bool(self.minimized),
            "urgent" => Value::Bool(self.urgent),
            "sizehints_floating" => Value::Bool(self.sizehints_floating),
            "sizehints_tiling" => Value::Bool(self.sizehints_tiling),
            "ewmhrequests" => Value::Bool(self.ewmhrequests),
            "ewmhnotify" => Value::Bool(self.ewmhnotify),
            "keymask" => Value::Regex(self.keymask.clone()),
            "keys_inactive" => Value::Regex(self.keys_inactive.clone()),
            "floating_geometry" => Value::Rect(self.float_rect),
            "content_geometry" => Value::Rect(self.content_rect),
            "decoration_geometry" => Value::Rect(self.decoration_rect),
            "visible" => Value::Bool(self.visible),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_filters() {
        let mut client = Client::new(&WindowInfo::new(1), TagId(0));
        assert!(client.accepts_binding("Mod1+x"));
        client.keys_inactive = RegexValue::new("Mod1\\+.*").unwrap();
        assert!(!client.accepts_binding("Mod1+x"));
        assert!(client.accepts_binding("Mod4+x"));
        client.keymask = RegexValue::new("Mod4\\+[a-m]").unwrap();
        assert!(client.accepts_binding("Mod4+c"));
        assert!(!client.accepts_binding("Mod4+x"));
    }
}
