//! Window decoration themes.
//!
//! The theme is a small tree: `theme` itself, the client types `tiling`, `floating` and
//! `minimal`, the states `active`, `normal` and `urgent`, and the nine combinations like
//! `theme.tiling.active`. Only the combinations are used for drawing, everything above them
//! passes its values down unless a more specific node has its own value.

use std::collections::HashMap;

use crate::{
    color::Color,
    object::{AttrSpec, AttrType, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum DecType {
    Tiling,
    Floating,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum DecState {
    Active,
    Normal,
    Urgent,
}

impl DecType {
    pub(crate) const ALL: [DecType; 3] = [Self::Tiling, Self::Floating, Self::Minimal];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Tiling => "tiling",
            Self::Floating => "floating",
            Self::Minimal => "minimal",
        }
    }
}

impl DecState {
    pub(crate) const ALL: [DecState; 3] = [Self::Active, Self::Normal, Self::Urgent];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Normal => "normal",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ThemeNode {
    Root,
    Type(DecType),
    State(DecState),
    Scheme(DecType, DecState),
}

impl ThemeNode {
    pub(crate) fn children(self) -> Vec<(&'static str, ThemeNode)> {
        match self {
            ThemeNode::Root => DecType::ALL
                .iter()
                .map(|t| (t.name(), ThemeNode::Type(*t)))
                .chain(DecState::ALL.iter().map(|s| (s.name(), ThemeNode::State(*s))))
                .collect(),
            ThemeNode::Type(t) => DecState::ALL
                .iter()
                .map(|s| (s.name(), ThemeNode::Scheme(t, *s)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a value stored at `self` is visible at `other`
    fn covers(self, other: ThemeNode) -> bool {
        match (self, other) {
            (ThemeNode::Root, _) => true,
            (ThemeNode::Type(a), ThemeNode::Scheme(b, _)) => a == b,
            (ThemeNode::State(a), ThemeNode::Scheme(_, b)) => a == b,
            (a, b) => a == b,
        }
    }
}

pub(crate) const RESET: &str = "reset";

pub(crate) const SPECS: &[AttrSpec] = &[
    AttrSpec::rw("border_width", AttrType::Int, "Total width of the border"),
    AttrSpec::rw("color", AttrType::Color, "Color of the border"),
    AttrSpec::rw("inner_width", AttrType::Int, "Width of the inner part of the border"),
    AttrSpec::rw("inner_color", AttrType::Color, "Color of the inner border"),
    AttrSpec::rw("outer_width", AttrType::Int, "Width of the outer part of the border"),
    AttrSpec::rw("outer_color", AttrType::Color, "Color of the outer border"),
    AttrSpec::rw("padding_top", AttrType::Int, "Space above the window content"),
    AttrSpec::rw("padding_right", AttrType::Int, "Space right of the window content"),
    AttrSpec::rw("padding_bottom", AttrType::Int, "Space below the window content"),
    AttrSpec::rw("padding_left", AttrType::Int, "Space left of the window content"),
    AttrSpec::rw("background_color", AttrType::Color, "Color behind the window content"),
    AttrSpec::rw("tight_decoration", AttrType::Bool, "Shrink the decoration to the size hints"),
    AttrSpec::rw("title_height", AttrType::Int, "Height of the title bar, 0 disables it"),
    AttrSpec::rw("title_depth", AttrType::Int, "Space below the title text"),
    AttrSpec::rw("title_font", AttrType::Font, "Font of the title"),
    AttrSpec::rw("title_color", AttrType::Color, "Color of the title text"),
    AttrSpec::rw("tab_color", AttrType::Color, "Background of inactive tabs"),
    AttrSpec::rw("tab_title_color", AttrType::Color, "Title color of inactive tabs"),
    AttrSpec::rw(RESET, AttrType::String, "Writing this resets all values below this object"),
];

fn default_value(node: ThemeNode, attr: &str) -> Option<Value> {
    let state = match node {
        ThemeNode::State(s) | ThemeNode::Scheme(_, s) => Some(s),
        _ => None,
    };
    let minimal = matches!(
        node,
        ThemeNode::Type(DecType::Minimal) | ThemeNode::Scheme(DecType::Minimal, _)
    );
    Some(match attr {
        "border_width" if minimal => Value::Int(0),
        "border_width" => Value::Int(1),
        "color" => Value::Color(match state {
            Some(DecState::Active) => Color::new(0x9f, 0xbc, 0x00),
            Some(DecState::Urgent) => Color::new(0xff, 0x75, 0x75),
            _ => Color::new(0x45, 0x45, 0x45),
        }),
        "inner_width" | "outer_width" | "padding_top" | "padding_right" | "padding_bottom"
        | "padding_left" | "title_height" | "title_depth" => Value::Int(0),
        "inner_color" | "outer_color" | "background_color" => Value::Color(Color::black()),
        "tight_decoration" => Value::Bool(false),
        "title_font" => Value::Font("fixed".to_string()),
        "title_color" | "tab_title_color" => Value::Color(Color::new(0xff, 0xff, 0xff)),
        "tab_color" => Value::Color(Color::new(0x22, 0x22, 0x22)),
        RESET => Value::Str(String::new()),
        _ => return None,
    })
}

/// The resolved decoration of one client
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scheme {
    pub(crate) border_width: i32,
    pub(crate) color: Color,
    pub(crate) title_height: i32,
    pub(crate) title_depth: i32,
    pub(crate) tab_color: Color,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Theme {
    /// Values written explicitly, with a stamp telling which write was more recent
    values: HashMap<(ThemeNode, &'static str), (Value, u64)>,
    stamp: u64,
}

impl Theme {
    pub(crate) fn spec(attr: &str) -> Option<&'static AttrSpec> {
        SPECS.iter().find(|s| s.name == attr)
    }

    fn own(&self, node: ThemeNode, attr: &str) -> Option<&(Value, u64)> {
        let spec = Self::spec(attr)?;
        self.values.get(&(node, spec.name))
    }

    pub(crate) fn get(&self, node: ThemeNode, attr: &str) -> Option<Value> {
        Self::spec(attr)?;
        if let Some((value, _)) = self.own(node, attr) {
            return Some(value.clone());
        }
        let inherited = match node {
            ThemeNode::Scheme(t, s) => {
                let by_type = self.own(ThemeNode::Type(t), attr);
                let by_state = self.own(ThemeNode::State(s), attr);
                match (by_type, by_state) {
                    (Some(a), Some(b)) => Some(if a.1 > b.1 { a } else { b }),
                    (a, b) => a.or(b),
                }
            }
            _ => None,
        };
        if let Some((value, _)) = inherited {
            return Some(value.clone());
        }
        if node != ThemeNode::Root {
            if let Some((value, _)) = self.own(ThemeNode::Root, attr) {
                return Some(value.clone());
            }
        }
        default_value(node, attr)
    }

    pub(crate) fn set(&mut self, node: ThemeNode, attr: &str, value: Value) -> Result<(), String> {
        let spec = Self::spec(attr).ok_or_else(|| format!("No such attribute \"{}\"", attr))?;
        if spec.name == RESET {
            self.reset(node);
            return Ok(());
        }
        self.stamp += 1;
        self.values.insert((node, spec.name), (value, self.stamp));
        Ok(())
    }

    /// Forget the values of `node` and everything below it
    pub(crate) fn reset(&mut self, node: ThemeNode) {
        self.values.retain(|(n, _), _| !node.covers(*n));
    }

    pub(crate) fn scheme(&self, t: DecType, s: DecState) -> Scheme {
        let node = ThemeNode::Scheme(t, s);
        let int = |attr| {
            self.get(node, attr)
                .and_then(|v| v.as_int())
                .unwrap_or_default() as i32
        };
        let color = |attr| {
            self.get(node, attr)
                .and_then(|v| v.as_color())
                .unwrap_or_else(Color::black)
        };
        Scheme {
            border_width: int("border_width"),
            color: color("color"),
            title_height: int("title_height"),
            title_depth: int("title_depth"),
            tab_color: color("tab_color"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: ThemeNode = ThemeNode::Scheme(DecType::Tiling, DecState::Active);

    #[test]
    fn writes_propagate_down() {
        let mut theme = Theme::default();
        theme.set(ThemeNode::Root, "border_width", Value::Int(5)).unwrap();
        for t in DecType::ALL {
            for s in DecState::ALL {
                assert_eq!(theme.get(ThemeNode::Scheme(t, s), "border_width"), Some(Value::Int(5)));
            }
        }
    }

    #[test]
    fn specific_values_win() {
        let mut theme = Theme::default();
        theme.set(ACTIVE, "border_width", Value::Int(7)).unwrap();
        theme.set(ThemeNode::Root, "border_width", Value::Int(5)).unwrap();
        assert_eq!(theme.get(ACTIVE, "border_width"), Some(Value::Int(7)));

        // between a type and a state the newer write is used
        let normal = ThemeNode::State(DecState::Normal);
        theme.set(normal, "color", Value::Color(Color::new(1, 1, 1))).unwrap();
        let floating = ThemeNode::Type(DecType::Floating);
        theme.set(floating, "color", Value::Color(Color::new(2, 2, 2))).unwrap();
        let floating_normal = ThemeNode::Scheme(DecType::Floating, DecState::Normal);
        assert_eq!(theme.get(floating_normal, "color"), Some(Value::Color(Color::new(2, 2, 2))));
        let tiling_normal = ThemeNode::Scheme(DecType::Tiling, DecState::Normal);
        assert_eq!(theme.get(tiling_normal, "color"), Some(Value::Color(Color::new(1, 1, 1))));
    }

    #[test]
    fn reset_clears_the_subtree() {
        let mut theme = Theme::default();
        theme.set(ACTIVE, "border_width", Value::Int(7)).unwrap();
        theme.set(ThemeNode::Type(DecType::Floating), "border_width", Value::Int(3)).unwrap();
        theme
            .set(ThemeNode::Type(DecType::Tiling), RESET, Value::Str(String::new()))
            .unwrap();
        assert_eq!(theme.get(ACTIVE, "border_width"), Some(Value::Int(1)));
        let floating = ThemeNode::Scheme(DecType::Floating, DecState::Active);
        assert_eq!(theme.get(floating, "border_width"), Some(Value::Int(3)));
        theme.reset(ThemeNode::Root);
        assert_eq!(theme.get(floating, "border_width"), Some(Value::Int(1)));
    }
}
