//! Process wide settings, exposed as the attributes of the `settings` object

use crate::{
    color::Color,
    frame::{Algorithm, LayoutParams},
    object::{AttrSpec, AttrType, Value},
};

pub(crate) const FRAME_DECORATIONS: &[&str] = &[
    "none",
    "nonempty",
    "if_multiple",
    "if_empty",
    "focused",
    "focused_if_multiple",
    "all",
];

macro_rules! settings {
    (@ty bool) => { bool };
    (@ty int) => { i64 };
    (@ty uint) => { u64 };
    (@ty color) => { Color };
    (@ty string) => { String };
    (@ty layout) => { String };
    (@ty decorations) => { String };

    (@default string, $e:expr) => { String::from($e) };
    (@default layout, $e:expr) => { String::from($e) };
    (@default decorations, $e:expr) => { String::from($e) };
    (@default $kind:ident, $e:expr) => { $e };

    (@attr bool) => { AttrType::Bool };
    (@attr int) => { AttrType::Int };
    (@attr uint) => { AttrType::Uint };
    (@attr color) => { AttrType::Color };
    (@attr string) => { AttrType::String };
    (@attr layout) => { AttrType::Enum(Algorithm::NAMES) };
    (@attr decorations) => { AttrType::Enum(FRAME_DECORATIONS) };

    (@get bool, $e:expr) => { Value::Bool($e) };
    (@get int, $e:expr) => { Value::Int($e) };
    (@get uint, $e:expr) => { Value::Uint($e) };
    (@get color, $e:expr) => { Value::Color($e) };
    (@get string, $e:expr) => { Value::Str($e.clone()) };
    (@get layout, $e:expr) => { Value::Enum($e.clone()) };
    (@get decorations, $e:expr) => { Value::Enum($e.clone()) };

    (@set bool, $v:expr) => { $v.as_bool().ok_or_else(mismatch) };
    (@set int, $v:expr) => { $v.as_int().ok_or_else(mismatch) };
    (@set uint, $v:expr) => { $v.as_int().map(|n| n.max(0) as u64).ok_or_else(mismatch) };
    (@set color, $v:expr) => { $v.as_color().ok_or_else(mismatch) };
    (@set string, $v:expr) => { $v.as_str().map(String::from).ok_or_else(mismatch) };
    (@set layout, $v:expr) => { $v.as_str().map(String::from).ok_or_else(mismatch) };
    (@set decorations, $v:expr) => { $v.as_str().map(String::from).ok_or_else(mismatch) };

    ($($name:ident : $kind:ident = $default:expr, $doc:literal;)*) => {
        #[derive(Debug, Clone)]
        pub(crate) struct Settings {
            $(pub(crate) $name: settings!(@ty $kind),)*
        }

        impl Default for Settings {
            fn default() -> Self {
                Self {
                    $($name: settings!(@default $kind, $default),)*
                }
            }
        }

        impl Settings {
            pub(crate) const SPECS: &'static [AttrSpec] = &[
                $(AttrSpec::rw(stringify!($name), settings!(@attr $kind), $doc),)*
            ];

            pub(crate) fn get(&self, name: &str) -> Option<Value> {
                match name {
                    $(stringify!($name) => Some(settings!(@get $kind, self.$name)),)*
                    _ => None,
                }
            }

            /// Assign an already parsed value
            pub(crate) fn set(&mut self, name: &str, value: Value) -> Result<(), String> {
                match name {
                    $(stringify!($name) => {
                        self.$name = settings!(@set $kind, value)?;
                        Ok(())
                    })*
                    _ => Err(format!("Setting \"{}\" not found", name)),
                }
            }
        }
    };
}

fn mismatch() -> String {
    "type mismatch".to_string()
}

settings! {
    frame_gap: int = 5, "Gap between frames in pixels";
    frame_padding: int = 0, "Space between a frame border and its windows";
    window_gap: int = 0, "Gap between windows within one frame";
    frame_border_width: int = 2, "Border width of frames";
    frame_border_inner_width: int = 0, "Width of the inner frame border";
    frame_transparent_width: int = 0,
        "Width of the opaque frame background when frame_bg_transparent is set";
    frame_border_active_color: color = Color::new(255, 0, 0),
        "Frame border color of the focused frame";
    frame_border_normal_color: color = Color::new(0, 0, 255), "Frame border color of other frames";
    frame_border_inner_color: color = Color::new(0, 0, 0), "Color of the inner frame border";
    frame_bg_active_color: color = Color::new(0, 0, 0), "Background of the focused frame";
    frame_bg_normal_color: color = Color::new(0, 0, 0), "Background of other frames";
    frame_bg_transparent: bool = false, "Cut a hole into frame backgrounds";
    always_show_frame: bool = false, "Show all frames, even empty ones";
    show_frame_decorations: decorations = "focused_if_multiple",
        "Which frames get decorations drawn";
    default_frame_layout: layout = "vertical", "Algorithm of new frames";
    snap_distance: int = 10, "Distance for floating windows to snap to edges";
    snap_gap: int = 5, "Gap left between snapped windows";
    focus_follows_mouse: bool = false, "Focus the window under the pointer";
    focus_stealing_prevention: bool = true, "Only focus new clients when a rule asks for it";
    focus_crosses_monitor_boundaries: bool = true,
        "Let directional focus continue on the neighbour monitor";
    default_direction_external_only: bool = false,
        "Directional focus and shift skip the windows within a frame";
    swap_monitors_to_get_tag: bool = true,
        "Swap tags with the other monitor when using a tag visible there";
    raise_on_focus: bool = false, "Raise windows when they get the focus";
    raise_on_focus_temporarily: bool = false, "Lift the focused window above the others";
    raise_on_click: bool = true, "Raise windows when clicking on them";
    gapless_grid: bool = true, "Stretch the last row of the grid algorithm";
    tabbed_max: bool = true, "Draw tabs for frames using the max algorithm";
    hide_covered_windows: bool = false, "Move windows hidden in max frames out of the screen";
    max_tab_reorder: bool = true, "shift reorders the tabs of max frames";
    smart_frame_surroundings: bool = false, "No frame gap and border when a tag has a single frame";
    smart_window_surroundings: bool = false,
        "No window gap, padding and decoration for frames with a single window";
    update_dragged_clients: bool = false, "Move windows while dragging, not only on release";
    auto_detect_monitors: bool = false, "Detect monitors when the screen configuration changes";
    auto_detect_panels: bool = true, "Pad monitors automatically for panels";
    monitors_locked: uint = 0u64, "Layout is not applied while this is greater than zero";
    wmname: string = "arbor", "The window manager name announced to clients";
    ellipsis: string = "...", "Appended to shortened window titles";
    verbose: bool = false, "Log every command";
}

impl Settings {
    pub(crate) fn default_algorithm(&self) -> Algorithm {
        self.default_frame_layout
            .parse()
            .unwrap_or(Algorithm::Vertical)
    }

    pub(crate) fn layout_params(&self, tab_height: i32) -> LayoutParams {
        LayoutParams {
            frame_gap: self.frame_gap as i32,
            frame_border_width: self.frame_border_width as i32,
            frame_padding: self.frame_padding as i32,
            window_gap: self.window_gap as i32,
            smart_frame_surroundings: self.smart_frame_surroundings,
            smart_window_surroundings: self.smart_window_surroundings,
            gapless_grid: self.gapless_grid,
            tabbed_max: self.tabbed_max,
            tab_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_setting_is_reachable() {
        let settings = Settings::default();
        for spec in Settings::SPECS {
            assert!(settings.get(spec.name).is_some(), "{}", spec.name);
        }
        assert!(settings.get("no_such_setting").is_none());
    }

    #[test]
    fn typed_assignment() {
        let mut settings = Settings::default();
        settings.set("frame_gap", Value::Int(12)).unwrap();
        assert_eq!(settings.frame_gap, 12);
        assert!(settings.set("frame_gap", Value::Bool(true)).is_err());
        settings
            .set("default_frame_layout", Value::Enum("grid".into()))
            .unwrap();
        assert_eq!(settings.default_algorithm(), Algorithm::Grid);
    }
}
