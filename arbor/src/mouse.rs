//! Mouse bindings and the state of an ongoing drag

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    decimal::Decimal,
    errors::ParseComboError,
    frame::{Align, FramePath},
    keys::{format_modifiers, parse_modifier, split_combo},
    newtypes::{TagId, WinId},
    rect::Rect,
};

/// Floating windows never get smaller than this while resizing
const MIN_DRAG_SIZE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MouseCombo {
    pub(crate) mods: u16,
    pub(crate) button: u8,
}

impl FromStr for MouseCombo {
    type Err = ParseComboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_combo(s)?;
        let (button, modifiers) = parts.split_last().ok_or(ParseComboError::Empty)?;
        let button = button
            .strip_prefix("Button")
            .and_then(|b| b.parse::<u8>().ok())
            .filter(|b| (1..=9).contains(b))
            .ok_or_else(|| ParseComboError::Button(button.to_string()))?;
        let mut mods = 0;
        for name in modifiers {
            mods |= parse_modifier(name)
                .ok_or_else(|| ParseComboError::Modifier(name.to_string()))?;
        }
        Ok(Self { mods, button })
    }
}

impl Display for MouseCombo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for m in format_modifiers(self.mods) {
            write!(f, "{}+", m)?;
        }
        write!(f, "Button{}", self.button)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MouseAction {
    Move,
    Resize,
    Zoom,
    Call(Vec<String>),
}

impl MouseAction {
    pub(crate) const NAMES: &'static [&'static str] = &["move", "resize", "zoom", "call"];

    /// Parse the action of a drag, `call` needs a command and is only valid for bindings
    pub(crate) fn parse_drag(s: &str) -> Option<Self> {
        match s {
            "move" => Some(Self::Move),
            "resize" => Some(Self::Resize),
            "zoom" => Some(Self::Zoom),
            _ => None,
        }
    }
}

impl Display for MouseAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MouseAction::Move => write!(f, "move"),
            MouseAction::Resize => write!(f, "resize"),
            MouseAction::Zoom => write!(f, "zoom"),
            MouseAction::Call(cmd) => write!(f, "call\t{}", cmd.join("\t")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MouseBind {
    pub(crate) combo: MouseCombo,
    pub(crate) action: MouseAction,
}

/// A tiled client is resized by moving the fractions of the splits around it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SplitHandle {
    pub(crate) path: FramePath,
    pub(crate) align: Align,
    pub(crate) fraction: Decimal,
    /// Size of the split along its axis, to turn pixels into fractions
    pub(crate) size: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Drag {
    pub(crate) win: WinId,
    pub(crate) tag: TagId,
    pub(crate) action: MouseAction,
    pub(crate) start: (i32, i32),
    pub(crate) start_rect: Rect,
    /// Which corner is dragged: left or right, top or bottom
    pub(crate) corner: (bool, bool),
    /// Set when the dragged client is tiled
    pub(crate) splits: Vec<SplitHandle>,
}

impl Drag {
    pub(crate) fn new(
        win: WinId,
        tag: TagId,
        action: MouseAction,
        start: (i32, i32),
        start_rect: Rect,
    ) -> Self {
        let (cx, cy) = start_rect.center();
        Self {
            win,
            tag,
            action,
            start,
            start_rect,
            corner: (start.0 < cx, start.1 < cy),
            splits: Vec::new(),
        }
    }

    /// The floating geometry for the pointer at `(x, y)`
    pub(crate) fn floating_rect(&self, x: i32, y: i32) -> Rect {
        let (dx, dy) = (x - self.start.0, y - self.start.1);
        let r = self.start_rect;
        match self.action {
            MouseAction::Move => Rect::new(r.x + dx, r.y + dy, r.width, r.height),
            MouseAction::Resize => {
                let (left, top) = self.corner;
                let (x, width) = if left {
                    let width = (r.width - dx).max(MIN_DRAG_SIZE);
                    (r.x + r.width - width, width)
                } else {
                    (r.x, (r.width + dx).max(MIN_DRAG_SIZE))
                };
                let (y, height) = if top {
                    let height = (r.height - dy).max(MIN_DRAG_SIZE);
                    (r.y + r.height - height, height)
                } else {
                    (r.y, (r.height + dy).max(MIN_DRAG_SIZE))
                };
                Rect::new(x, y, width, height)
            }
            MouseAction::Zoom => {
                let (left, top) = self.corner;
                let dx = if left { -dx } else { dx };
                let dy = if top { -dy } else { dy };
                let width = (r.width + 2 * dx).max(MIN_DRAG_SIZE);
                let height = (r.height + 2 * dy).max(MIN_DRAG_SIZE);
                let (cx, cy) = r.center();
                Rect::new(cx - width / 2, cy - height / 2, width, height)
            }
            MouseAction::Call(_) => r,
        }
    }

    /// The new fractions of the splits next to a tiled client
    pub(crate) fn split_fractions(&self, x: i32, y: i32) -> Vec<(FramePath, Decimal)> {
        let (dx, dy) = (x - self.start.0, y - self.start.1);
        self.splits
            .iter()
            .map(|s| {
                let delta = match s.align {
                    Align::Horizontal => dx,
                    Align::Vertical => dy,
                };
                let change = Decimal::ratio(delta, s.size.max(1));
                (s.path.clone(), s.fraction + change)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_combos() {
        let combo = "Mod4-Button1".parse::<MouseCombo>().unwrap();
        assert_eq!(combo.button, 1);
        assert_eq!(combo.to_string(), "Mod4+Button1");
        assert!("Mod4-Button0".parse::<MouseCombo>().is_err());
        assert!("Mod4-x".parse::<MouseCombo>().is_err());
    }

    #[test]
    fn floating_drags() {
        let rect = Rect::new(100, 100, 200, 100);
        let moving = Drag::new(1, TagId(0), MouseAction::Move, (150, 150), rect);
        assert_eq!(moving.floating_rect(160, 140), Rect::new(110, 90, 200, 100));

        // grabbed near the bottom right corner
        let resizing = Drag::new(1, TagId(0), MouseAction::Resize, (290, 190), rect);
        assert_eq!(resizing.floating_rect(300, 200), Rect::new(100, 100, 210, 110));

        // grabbed near the top left corner, the opposite corner stays put
        let resizing = Drag::new(1, TagId(0), MouseAction::Resize, (110, 110), rect);
        assert_eq!(resizing.floating_rect(100, 120), Rect::new(90, 110, 210, 90));

        let zooming = Drag::new(1, TagId(0), MouseAction::Zoom, (290, 190), rect);
        assert_eq!(zooming.floating_rect(300, 190), Rect::new(90, 100, 220, 100));
    }

    #[test]
    fn tiled_drags_move_fractions() {
        let start = Rect::new(0, 0, 500, 500);
        let mut drag = Drag::new(1, TagId(0), MouseAction::Resize, (0, 0), start);
        drag.splits.push(SplitHandle {
            path: vec![],
            align: Align::Horizontal,
            fraction: Decimal::half(),
            size: 1000,
        });
        let fractions = drag.split_fractions(100, 50);
        assert_eq!(fractions, vec![(vec![], "0.6".parse().unwrap())]);
    }
}
