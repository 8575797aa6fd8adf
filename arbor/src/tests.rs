//! Whole window manager runs against a display server that only records what it's told

use std::path::PathBuf;

use common::Reply;

use crate::{
    color::Color,
    display::{mock::MockDisplay, DisplayAction, DisplayEvent, WindowInfo},
    keys::KeyCombo,
    newtypes::{format_winid, WinId},
    rect::Rect,
    states::WMState,
};

const MOD1: u16 = 1 << 3;
const KEY_X: u32 = 0x78;

struct Wm {
    state: WMState,
    display: MockDisplay,
}

impl Wm {
    fn new() -> Self {
        Self::with_screens(vec![Rect::new(0, 0, 800, 600)])
    }

    fn with_screens(screens: Vec<Rect>) -> Self {
        let display = MockDisplay::new(screens);
        let state = WMState::new(
            Box::new(display.clone()),
            PathBuf::from("/nonexistent/autostart"),
            false,
        );
        Self { state, display }
    }

    fn call(&mut self, args: &[&str]) -> Reply {
        let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        self.state.call(&args)
    }

    /// Run a command that has to succeed
    fn ok(&mut self, args: &[&str]) -> String {
        let reply = self.call(args);
        assert_eq!(reply.status, 0, "{:?} failed: {}", args, reply.stderr);
        reply.stdout
    }

    fn get(&mut self, path: &str) -> String {
        self.ok(&["get_attr", path])
    }

    fn events(&mut self, events: Vec<DisplayEvent>) {
        self.state.handle_events(events);
    }

    fn map(&mut self, info: WindowInfo) {
        self.events(vec![DisplayEvent::MapRequest(info)]);
    }

    fn map_window(&mut self, win: WinId, class: &str) {
        let mut info = WindowInfo::new(win);
        info.class = class.to_string();
        self.map(info);
    }
}

#[test]
fn tags_are_added_once_and_merged() {
    let mut wm = Wm::new();
    wm.ok(&["add", "foo"]);
    assert_eq!(wm.get("tags.count"), "2");

    assert_ne!(wm.call(&["add", "foo"]).status, 0);
    assert_eq!(wm.get("tags.count"), "2");

    wm.ok(&["merge_tag", "default", "foo"]);
    assert_eq!(wm.get("tags.count"), "1");
    assert_eq!(wm.get("tags.0.name"), "foo");
    assert_eq!(wm.get("monitors.0.tag"), "foo");
}

#[test]
fn explode_then_remove_keeps_the_order() {
    let mut wm = Wm::new();
    wm.ok(&["set", "focus_stealing_prevention", "off"]);
    for win in [0x1, 0x2, 0x3] {
        wm.map_window(win, "Term");
    }
    assert_eq!(wm.ok(&["list_clients"]), "0x1\n0x2\n0x3\n");

    wm.ok(&["split", "explode"]);
    assert_eq!(wm.get("tags.focus.frame_count"), "2");
    assert_eq!(wm.get("tags.focus.curframe_wcount"), "2");

    wm.ok(&["remove"]);
    assert_eq!(wm.get("tags.focus.frame_count"), "1");
    assert!(wm.ok(&["dump"]).contains("0x1 0x2 0x3"));
}

#[test]
fn loaded_layouts_are_listed_per_frame() {
    let mut wm = Wm::new();
    for win in [0x1, 0x2, 0x3, 0x4] {
        wm.map_window(win, "Term");
    }
    let layout = "(split horizontal:0.5:0 (clients max:0 0x1 0x2) (clients max:0 0x3 0x4))";
    wm.ok(&["load", layout]);

    assert_eq!(wm.ok(&["list_clients", "--frame=0"]), "0x1\n0x2\n");
    assert_eq!(wm.ok(&["list_clients", "--frame=1"]), "0x3\n0x4\n");
    assert_eq!(wm.ok(&["dump"]), layout);

    // dumping and loading again changes nothing
    let dumped = wm.ok(&["dump"]);
    wm.ok(&["load", &dumped]);
    assert_eq!(wm.ok(&["dump"]), dumped);
}

#[test]
fn relative_integer_assignment() {
    let mut wm = Wm::new();
    wm.ok(&["new_attr", "int", "my_v", "5"]);
    wm.ok(&["set_attr", "my_v", "+=3"]);
    assert_eq!(wm.get("my_v"), "8");
    wm.ok(&["set_attr", "my_v", "-=-2"]);
    assert_eq!(wm.get("my_v"), "10");
}

#[test]
fn once_rules_fire_for_the_first_client_only() {
    let mut wm = Wm::new();
    wm.ok(&["add", "bar"]);
    wm.ok(&["rule", "once", "class=Foo", "tag=bar"]);

    wm.map_window(0x10, "Foo");
    assert_eq!(wm.get("clients.0x10.tag"), "bar");

    wm.map_window(0x11, "Foo");
    assert_eq!(wm.get("clients.0x11.tag"), "default");
    assert_eq!(wm.ok(&["list_rules"]), "");
}

#[test]
fn press_and_release_bindings() {
    let mut wm = Wm::new();
    wm.ok(&["new_attr", "string", "my_v", "initial"]);
    wm.ok(&["keybind", "Mod1+x", "set_attr", "my_v", "pressed"]);
    wm.ok(&["keybind", "Release-Mod1+x", "set_attr", "my_v", "released"]);
    assert!(wm.display.take_actions().iter().any(|a| matches!(
        a,
        DisplayAction::GrabKeys(keys) if keys.len() == 1 && !keys[0].release
    )));
    assert_eq!(wm.get("my_v"), "initial");

    wm.events(vec![DisplayEvent::KeyPress { mods: MOD1, keysym: KEY_X }]);
    assert_eq!(wm.get("my_v"), "pressed");
    wm.events(vec![DisplayEvent::KeyRelease { mods: MOD1, keysym: KEY_X }]);
    assert_eq!(wm.get("my_v"), "released");
    assert!(wm
        .display
        .take_actions()
        .contains(&DisplayAction::AllowKeyEvents { replay: false }));

    // without the press binding the client gets the key
    wm.ok(&["keyunbind", "Mod1+x"]);
    wm.display.take_actions();
    wm.events(vec![DisplayEvent::KeyPress { mods: MOD1, keysym: KEY_X }]);
    assert!(wm
        .display
        .take_actions()
        .contains(&DisplayAction::AllowKeyEvents { replay: true }));
    assert_eq!(wm.get("my_v"), "released");
}

#[test]
fn cycle_value_edge_cases() {
    let mut wm = Wm::new();
    wm.ok(&["new_attr", "string", "my_c", "x"]);
    wm.ok(&["cycle_value", "my_c", "a", "b", "c"]);
    assert_eq!(wm.get("my_c"), "a");
    wm.ok(&["cycle_value", "my_c", "a", "b", "c"]);
    assert_eq!(wm.get("my_c"), "b");

    wm.ok(&["set_attr", "my_c", "c"]);
    wm.ok(&["cycle_value", "my_c", "a", "b", "c", "c"]);
    assert_eq!(wm.get("my_c"), "c");
}

#[test]
fn colors_are_canonical() {
    let mut wm = Wm::new();
    wm.ok(&["set_attr", "theme.active.color", "#11AA22ff"]);
    assert_eq!(wm.get("theme.active.color"), "#11aa22");
}

#[test]
fn use_index_skips_visible_tags() {
    let mut wm = Wm::new();
    wm.ok(&["add", "a"]);
    wm.ok(&["add", "b"]);
    wm.ok(&["add_monitor", "400x300+800+0", "a"]);
    assert_eq!(wm.get("monitors.count"), "2");

    wm.ok(&["use_index", "+1", "--skip-visible"]);
    assert_eq!(wm.get("tags.focus.name"), "b");
    assert_eq!(wm.get("monitors.1.tag"), "a");
}

#[test]
fn focused_clients_are_never_urgent() {
    let mut wm = Wm::new();
    wm.map_window(0x1, "Term");
    let mut info = WindowInfo::new(0x2);
    info.urgent = true;
    wm.map(info);
    assert_eq!(wm.get("clients.focus.winid"), format_winid(0x1));
    assert_eq!(wm.get("clients.0x2.urgent"), "true");

    wm.ok(&["jumpto", "urgent"]);
    assert_eq!(wm.get("clients.focus.winid"), format_winid(0x2));
    assert_eq!(wm.get("clients.0x2.urgent"), "false");

    // a focused client asking for attention is ignored
    wm.events(vec![DisplayEvent::UrgencyChanged { id: 0x2, urgent: true }]);
    assert_eq!(wm.get("clients.0x2.urgent"), "false");
}

#[test]
fn locked_monitors_keep_their_layout() {
    let mut wm = Wm::new();
    wm.map_window(0x1, "Term");
    wm.display.take_actions();

    wm.ok(&["lock"]);
    wm.ok(&["split", "right"]);
    let configured = |actions: Vec<DisplayAction>| {
        actions
            .iter()
            .any(|a| matches!(a, DisplayAction::Configure { id: 0x1, .. }))
    };
    assert!(!configured(wm.display.take_actions()));

    wm.ok(&["unlock"]);
    assert!(configured(wm.display.take_actions()));
    wm.ok(&["unlock"]);
    assert_eq!(wm.get("settings.monitors_locked"), "0");
}

#[test]
fn clicks_focus_clients() {
    let mut wm = Wm::new();
    wm.map_window(0x1, "Term");
    wm.map_window(0x2, "Term");
    assert_eq!(wm.get("clients.focus.winid"), format_winid(0x1));

    wm.display.take_actions();
    wm.events(vec![DisplayEvent::ButtonPress {
        id: 0x2,
        mods: 0,
        button: 1,
        x: 10,
        y: 10,
    }]);
    assert_eq!(wm.get("clients.focus.winid"), format_winid(0x2));
    assert!(wm
        .display
        .take_actions()
        .contains(&DisplayAction::Focus(Some(0x2))));
}

#[test]
fn dragging_moves_floating_clients() {
    let mut wm = Wm::new();
    wm.map_window(0x1, "Term");
    wm.ok(&["set_attr", "clients.0x1.floating", "true"]);
    wm.ok(&["mousebind", "Mod1-Button1", "move"]);
    let before = wm
        .get("clients.0x1.floating_geometry")
        .parse::<Rect>()
        .unwrap();

    wm.events(vec![DisplayEvent::ButtonPress {
        id: 0x1,
        mods: MOD1,
        button: 1,
        x: 100,
        y: 100,
    }]);
    assert_eq!(wm.get("clients.dragged.winid"), format_winid(0x1));
    wm.events(vec![
        DisplayEvent::Motion { x: 110, y: 120 },
        DisplayEvent::ButtonRelease { button: 1 },
    ]);

    let after = wm
        .get("clients.0x1.floating_geometry")
        .parse::<Rect>()
        .unwrap();
    assert_eq!(after, Rect::new(before.x + 10, before.y + 20, before.width, before.height));
    assert!(wm.display.take_actions().contains(&DisplayAction::UngrabPointer));
    assert_ne!(wm.call(&["get_attr", "clients.dragged.winid"]).status, 0);
}

#[test]
fn panels_pad_the_monitor() {
    let mut wm = Wm::new();
    let mut info = WindowInfo::new(0x50);
    info.window_type = "_NET_WM_WINDOW_TYPE_DOCK".to_string();
    info.geometry = Rect::new(0, 0, 800, 20);
    info.strut = Some([0, 0, 20, 0]);
    wm.map(info);

    assert_eq!(wm.get("clients.count"), "0");
    assert_eq!(wm.get("panels.count"), "1");
    assert!(wm.display.take_actions().contains(&DisplayAction::Map(0x50)));
    assert_eq!(wm.ok(&["monitor_rect", "-p"]), "0 20 800 580\n");

    wm.events(vec![DisplayEvent::StrutChanged { id: 0x50, strut: None }]);
    assert_eq!(wm.ok(&["monitor_rect", "-p"]), "0 20 800 580\n");
    wm.ok(&["set", "auto_detect_panels", "off"]);
    wm.events(vec![DisplayEvent::StrutChanged { id: 0x50, strut: None }]);
    assert_eq!(wm.ok(&["monitor_rect", "-p"]), "0 0 800 600\n");
}

#[test]
fn withdrawn_clients_are_forgotten() {
    let mut wm = Wm::new();
    wm.map_window(0x1, "Term");
    wm.map_window(0x2, "Term");
    wm.state.take_hooks();

    wm.events(vec![DisplayEvent::Unmanage(0x1)]);
    assert_eq!(wm.get("clients.count"), "1");
    assert_eq!(wm.ok(&["list_clients"]), "0x2\n");
    let hooks = wm.state.take_hooks();
    assert!(hooks.contains(&vec!["tag_flags".to_string()]));
    assert!(hooks
        .iter()
        .any(|h| h[0] == "focus_changed" && h[1] == format_winid(0x2)));
}

#[test]
fn fullscreen_requests_emit_hooks() {
    let mut wm = Wm::new();
    wm.map_window(0x1, "Video");
    wm.state.take_hooks();

    wm.events(vec![DisplayEvent::FullscreenRequest { id: 0x1, state: None }]);
    assert_eq!(wm.get("clients.0x1.fullscreen"), "true");
    assert!(wm
        .state
        .take_hooks()
        .contains(&vec!["fullscreen".to_string(), "on".to_string(), format_winid(0x1)]));

    wm.ok(&["set_attr", "clients.0x1.ewmhrequests", "false"]);
    wm.events(vec![DisplayEvent::FullscreenRequest { id: 0x1, state: Some(false) }]);
    assert_eq!(wm.get("clients.0x1.fullscreen"), "true");
}

#[test]
fn unknown_commands_and_errors() {
    let mut wm = Wm::new();
    let reply = wm.call(&["frobnicate"]);
    assert_eq!(reply.status, 2);
    assert!(reply.stderr.contains("frobnicate"));

    let reply = wm.call(&["get_attr", "tags.7.name"]);
    assert_eq!(reply.status, 3);
    assert!(reply.stderr.starts_with("get_attr: "));
}

#[test]
fn command_combinators() {
    let mut wm = Wm::new();
    let reply = wm.call(&["chain", ",", "echo", "a", ",", "false", ",", "echo", "b"]);
    assert_eq!((reply.stdout.as_str(), reply.status), ("a\nb\n", 0));
    assert_eq!(wm.call(&["chain", ",", "echo", "a", ",", "false"]).status, 1);

    let reply = wm.call(&["and", ",", "echo", "a", ",", "false", ",", "echo", "b"]);
    assert_eq!((reply.stdout.as_str(), reply.status), ("a\n", 1));
    let reply = wm.call(&["or", ",", "false", ",", "echo", "a", ",", "echo", "b"]);
    assert_eq!((reply.stdout.as_str(), reply.status), ("a\n", 0));

    assert_eq!(wm.call(&["!", "false"]).status, 0);
    assert_eq!(wm.call(&["!", "true"]).status, 1);
    assert_eq!(wm.call(&["try", "get_attr", "nope"]).status, 0);

    let reply = wm.call(&["silent", "get_attr", "nope"]);
    assert_eq!(reply.status, 3);
    assert_eq!((reply.stdout.as_str(), reply.stderr.as_str()), ("", ""));
}

#[test]
fn sprintf_and_substitute() {
    let mut wm = Wm::new();
    let output = wm.ok(&["sprintf", "X", "%s/%c 100%%", "tags.count", "lit", "echo", "X"]);
    assert_eq!(output, "1/lit 100%\n");

    let reply = wm.call(&["sprintf", "X", "%c %c", "a"]);
    assert_eq!(reply.status, 9);
    assert_ne!(wm.call(&["sprintf", "X", "%d", "echo", "X"]).status, 0);

    assert_eq!(wm.ok(&["substitute", "V", "tags.0.name", "echo", "V", "V"]), "default default\n");
    assert_eq!(wm.call(&["substitute", "V", "tags.0.nope", "echo", "V"]).status, 3);
}

#[test]
fn mktemp_attributes_are_removed_afterwards() {
    let mut wm = Wm::new();
    let mut args = vec!["mktemp", "int", "T"];
    args.extend(["chain", ",", "set_attr", "T", "5", ",", "get_attr", "T"]);
    let output = wm.ok(&args);
    assert_eq!(output, "5");
    assert!(wm.ok(&["attr", "tmp."]).contains("0 attributes."));

    // also when the command fails
    assert_eq!(wm.call(&["mktemp", "bool", "T", "false"]).status, 1);
    assert!(wm.ok(&["attr", "tmp."]).contains("0 attributes."));
}

#[test]
fn compare_needs_numbers_for_ordering() {
    let mut wm = Wm::new();
    wm.ok(&["new_attr", "string", "my_s", "5"]);
    let reply = wm.call(&["compare", "my_s", "gt", "3"]);
    assert_eq!(reply.status, 1);
    assert!(reply.stderr.contains("numeric"));
    wm.ok(&["compare", "tags.count", "lt", "3"]);

    // values that don't parse are compared as text
    let reply = wm.call(&["compare", "tags.count", "=", "one"]);
    assert_eq!((reply.status, reply.stderr.as_str()), (1, ""));
    wm.ok(&["compare", "tags.count", "!=", "one"]);
    wm.ok(&["compare", "tags.count", "=", "1"]);
}

#[test]
fn foreach_reports_removed_entries() {
    let mut wm = Wm::new();
    wm.ok(&["add", "b"]);
    wm.ok(&["add", "c"]);
    let reply = wm.call(&["foreach", "T", "tags.by-name.", "try", "merge_tag", "c", "default"]);
    assert_eq!(reply.status, 3);
    assert!(reply.stderr.contains("tags.by-name.c"));
    assert_eq!(wm.get("tags.count"), "2");

    let output = wm.ok(&["foreach", "T", "tags.by-name.", "echo", "T"]);
    assert_eq!(output, "tags.by-name.default\ntags.by-name.b\n");
}

#[test]
fn help_and_attribute_errors() {
    let mut wm = Wm::new();
    assert!(wm.ok(&["help", "clients.focus"]).contains("Entry does not exist"));
    assert!(wm.ok(&["help", "tags.count"]).contains("Writable: no"));

    let reply = wm.call(&["set_attr", "tags.count", "3"]);
    assert_eq!(reply.status, 3);
    assert!(reply.stderr.contains("read-only"));

    assert_eq!(wm.call(&["set_attr", "monitors.0.pad_up", "-50"]).status, 1);
    assert_eq!(wm.call(&["pad", "0", "-50"]).status, 3);
    assert_eq!(wm.get("monitors.0.pad_up"), "0");
    wm.ok(&["set_attr", "monitors.0.pad_up", "20"]);
    assert_eq!(wm.ok(&["monitor_rect", "-p"]), "0 20 800 580\n");
}

#[test]
fn unknown_color_names_are_asked_from_the_display() {
    let mut wm = Wm::new();
    wm.display
        .colors
        .borrow_mut()
        .push(("DarkSlateGray".to_string(), Color::new(47, 79, 79)));
    wm.ok(&["set_attr", "theme.active.color", "DarkSlateGray"]);
    assert_eq!(wm.get("theme.active.color"), "#2f4f4f");

    let reply = wm.call(&["set_attr", "theme.active.color", "NoSuchColor"]);
    assert_eq!(reply.status, 1);
    assert_eq!(wm.get("theme.active.color"), "#2f4f4f");
}

#[test]
fn monitors_cycle_backwards() {
    let mut wm = Wm::new();
    wm.ok(&["add", "a"]);
    wm.ok(&["add", "b"]);
    wm.ok(&["add_monitor", "400x300+800+0", "a"]);
    wm.ok(&["add_monitor", "400x300+1200+0", "b"]);
    assert_eq!(wm.get("monitors.focus.index"), "0");

    wm.ok(&["cycle_monitor", "-1"]);
    assert_eq!(wm.get("monitors.focus.index"), "2");
    wm.ok(&["cycle_monitor"]);
    assert_eq!(wm.get("monitors.focus.index"), "0");
}

#[test]
fn detected_screens_are_deduplicated() {
    let left = Rect::new(0, 0, 800, 600);
    let right = Rect::new(800, 0, 800, 600);
    let mut wm = Wm::with_screens(vec![left, left, right]);
    assert_eq!(wm.get("monitors.count"), "1");
    assert_eq!(wm.ok(&["detect_monitors", "--list"]), "800x600+0+0\n800x600+800+0\n");

    // the second monitor needs a free tag
    assert_eq!(wm.call(&["detect_monitors"]).status, 1);
    wm.ok(&["add", "a"]);
    wm.ok(&["detect_monitors"]);
    assert_eq!(wm.get("monitors.count"), "2");
    assert_eq!(wm.get("monitors.1.geometry"), "800x600+800+0");
}

#[test]
fn the_last_monitor_stays() {
    let mut wm = Wm::new();
    let reply = wm.call(&["remove_monitor", "0"]);
    assert_eq!(reply.status, 1);
    assert!(reply.stderr.contains("last monitor"));
    assert_eq!(wm.get("monitors.count"), "1");
}

#[test]
fn using_a_tag_shown_elsewhere() {
    let mut wm = Wm::new();
    wm.ok(&["add", "a"]);
    wm.ok(&["add_monitor", "400x300+800+0", "a"]);

    // the monitors swap their tags
    wm.ok(&["use", "a"]);
    assert_eq!(wm.get("monitors.0.tag"), "a");
    assert_eq!(wm.get("monitors.1.tag"), "default");
    assert_eq!(wm.get("monitors.focus.index"), "0");

    // or the other monitor gets the focus
    wm.ok(&["set", "swap_monitors_to_get_tag", "off"]);
    wm.ok(&["use", "default"]);
    assert_eq!(wm.get("monitors.0.tag"), "a");
    assert_eq!(wm.get("monitors.focus.index"), "1");
}

#[test]
fn locked_tags_are_not_switched() {
    let mut wm = Wm::new();
    wm.ok(&["add", "a"]);
    wm.ok(&["lock_tag"]);
    assert_eq!(wm.call(&["use", "a"]).status, 1);
    assert_eq!(wm.get("monitors.0.tag"), "default");

    wm.ok(&["add_monitor", "400x300+800+0", "a"]);
    wm.ok(&["unlock_tag"]);
    wm.ok(&["lock_tag", "1"]);
    let reply = wm.call(&["use", "a"]);
    assert_eq!(reply.status, 1);
    assert!(reply.stderr.contains("locked"));
    assert_eq!(wm.get("monitors.1.tag"), "a");
}

#[test]
fn keymask_limits_the_grabbed_keys() {
    let grabbed = |wm: &Wm| {
        wm.display
            .take_actions()
            .into_iter()
            .rev()
            .find_map(|a| match a {
                DisplayAction::GrabKeys(keys) => Some(keys),
                _ => None,
            })
    };
    let combo = |s: &str| s.parse::<KeyCombo>().unwrap();
    let mut wm = Wm::new();
    wm.ok(&["keybind", "Mod1+x", "true"]);
    wm.ok(&["keybind", "Mod1+y", "true"]);
    wm.map_window(0x1, "Term");
    wm.display.take_actions();

    wm.ok(&["set_attr", "clients.0x1.keymask", "Mod1\\+x"]);
    assert_eq!(grabbed(&wm), Some(vec![combo("Mod1+x")]));
    wm.ok(&["set_attr", "clients.0x1.keys_inactive", "x"]);
    assert_eq!(grabbed(&wm), Some(vec![]));
    wm.ok(&["set_attr", "clients.0x1.keymask", ""]);
    assert_eq!(grabbed(&wm), Some(vec![combo("Mod1+y")]));
}

#[test]
fn dialogs_are_centered_over_their_parent() {
    let mut wm = Wm::new();
    wm.ok(&["split", "right"]);
    wm.map_window(0x1, "Editor");
    wm.ok(&["rule", "class=Dialog", "floating=on"]);
    let mut info = WindowInfo::new(0x2);
    info.class = "Dialog".to_string();
    info.transient_for = Some(0x1);
    let size = info.geometry;
    wm.map(info);

    let parent = wm.state.clients[&0x1].decoration_rect;
    assert!(parent.width < 800);
    assert_eq!(wm.state.clients[&0x2].float_rect, size.centered_in(&parent));
}

#[test]
fn watching_twice_is_reported() {
    let mut wm = Wm::new();
    assert_eq!(wm.call(&["watch", "tags.count"]).stderr, "");
    let reply = wm.call(&["watch", "tags.count"]);
    assert_eq!(reply.status, 0);
    assert!(reply.stderr.contains("already watched"));

    wm.state.take_hooks();
    wm.ok(&["add", "a"]);
    let changed = vec!["attribute_changed", "tags.count", "1", "2"];
    assert!(wm.state.take_hooks().iter().any(|h| *h == changed));
}
