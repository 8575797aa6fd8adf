//! Typed attribute values and their textual form

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use regex::Regex;

use crate::{
    color::Color,
    decimal::Decimal,
    newtypes::{format_winid, parse_winid, WinId},
    rect::Rect,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrType {
    Bool,
    Int,
    Uint,
    String,
    Color,
    Rect,
    Font,
    Regex,
    Decimal,
    WinId,
    Enum(&'static [&'static str]),
}

impl AttrType {
    /// Types that `new_attr` can create
    pub(crate) fn from_user(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "uint" => Self::Uint,
            "string" => Self::String,
            "color" => Self::Color,
            "rectangle" => Self::Rect,
            "decimal" => Self::Decimal,
            _ => return None,
        })
    }

    pub(crate) const USER_TYPES: &'static [&'static str] =
        &["bool", "color", "decimal", "int", "rectangle", "string", "uint"];

    /// The one letter abbreviation used in the `attr` listing
    pub(crate) fn short(&self) -> char {
        match self {
            Self::Bool => 'b',
            Self::Int => 'i',
            Self::Uint => 'u',
            Self::String => 's',
            Self::Color => 'c',
            Self::Rect => 'R',
            Self::Font => 'f',
            Self::Regex => 'r',
            Self::Decimal => 'd',
            Self::WinId => 'w',
            Self::Enum(_) => 'n',
        }
    }

    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Decimal)
    }

    /// Values offered by completion, if the type has a closed set of them
    pub(crate) fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::Bool => &["false", "off", "on", "toggle", "true"],
            Self::Enum(values) => values,
            _ => &[],
        }
    }

    pub(crate) fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Uint => Value::Uint(0),
            Self::String => Value::Str(String::new()),
            Self::Color => Value::Color(Color::black()),
            Self::Rect => Value::Rect(Rect::default()),
            Self::Font => Value::Font(String::new()),
            Self::Regex => Value::Regex(RegexValue::default()),
            Self::Decimal => Value::Decimal(Decimal::default()),
            Self::WinId => Value::WinId(0),
            Self::Enum(values) => Value::Enum(values.first().copied().unwrap_or_default().into()),
        }
    }
}

impl Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::String => "string",
            Self::Color => "color",
            Self::Rect => "rectangle",
            Self::Font => "font",
            Self::Regex => "regex",
            Self::Decimal => "decimal",
            Self::WinId => "windowid",
            Self::Enum(_) => "enum",
        };
        write!(f, "{}", name)
    }
}

/// A regex attribute, the empty string means "unset"
#[derive(Debug, Clone, Default)]
pub(crate) struct RegexValue {
    source: String,
    regex: Option<Regex>,
}

impl RegexValue {
    pub(crate) fn new(source: &str) -> Result<Self, regex::Error> {
        if source.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            source: source.to_string(),
            regex: Some(Regex::new(source)?),
        })
    }

    pub(crate) fn get(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for RegexValue {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Str(String),
    Color(Color),
    Rect(Rect),
    Font(String),
    Regex(RegexValue),
    Decimal(Decimal),
    WinId(WinId),
    Enum(String),
}

fn relative<T: FromStr>(s: &str) -> Option<(bool, Result<T, T::Err>)> {
    if let Some(n) = s.strip_prefix("+=") {
        Some((true, n.parse()))
    } else {
        s.strip_prefix("-=").map(|n| (false, n.parse()))
    }
}

impl Value {
    /// Parse `text` as a value of type `ty`.
    ///
    /// `current` is needed for the relative forms `+=N`, `-=N` and for `toggle`.
    pub(crate) fn parse(
        ty: AttrType,
        text: &str,
        current: Option<&Value>,
    ) -> Result<Value, String> {
        let invalid = || format!("invalid {} \"{}\"", ty, text);
        match ty {
            AttrType::Bool => match text {
                "true" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "off" | "0" => Ok(Value::Bool(false)),
                "toggle" => match current {
                    Some(Value::Bool(b)) => Ok(Value::Bool(!b)),
                    _ => Ok(Value::Bool(true)),
                },
                _ => Err(format!(
                    "only on/off/true/false/toggle are valid booleans, but \"{}\" is not",
                    text
                )),
            },
            AttrType::Int => {
                if let Some((add, delta)) = relative::<i64>(text) {
                    let delta = delta.map_err(|_| invalid())?;
                    let base = match current {
                        Some(Value::Int(n)) => *n,
                        _ => 0,
                    };
                    let value = if add {
                        base.checked_add(delta)
                    } else {
                        base.checked_sub(delta)
                    };
                    return value.map(Value::Int).ok_or_else(invalid);
                }
                text.parse().map(Value::Int).map_err(|_| invalid())
            }
            AttrType::Uint => {
                if let Some((add, delta)) = relative::<i64>(text) {
                    let delta = delta.map_err(|_| invalid())?;
                    let base = match current {
                        Some(Value::Uint(n)) => *n as i64,
                        _ => 0,
                    };
                    let value = if add { base + delta } else { base - delta };
                    // relative changes saturate at zero
                    return Ok(Value::Uint(value.max(0) as u64));
                }
                text.parse().map(Value::Uint).map_err(|_| invalid())
            }
            AttrType::Decimal => {
                if let Some((add, delta)) = relative::<Decimal>(text) {
                    let delta = delta.map_err(|_| invalid())?;
                    let base = match current {
                        Some(Value::Decimal(d)) => *d,
                        _ => Decimal::default(),
                    };
                    return Ok(Value::Decimal(if add { base + delta } else { base - delta }));
                }
                text.parse().map(Value::Decimal).map_err(|_| invalid())
            }
            AttrType::String => Ok(Value::Str(text.to_string())),
            AttrType::Font => Ok(Value::Font(text.to_string())),
            AttrType::Color => text
                .parse()
                .map(Value::Color)
                .map_err(|e: crate::errors::ParseColorError| e.to_string()),
            AttrType::Rect => text
                .parse()
                .map(Value::Rect)
                .map_err(|e: crate::errors::ParseRectError| e.to_string()),
            AttrType::Regex => RegexValue::new(text)
                .map(Value::Regex)
                .map_err(|e| format!("invalid regex \"{}\": {}", text, e)),
            AttrType::WinId => parse_winid(text).map(Value::WinId).ok_or_else(invalid),
            AttrType::Enum(values) => {
                if values.contains(&text) {
                    Ok(Value::Enum(text.to_string()))
                } else {
                    Err(format!(
                        "invalid value \"{}\", expected one of: {}",
                        text,
                        values.join(", ")
                    ))
                }
            }
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub(crate) fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Uint(n) => Some(*n as i64),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Font(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub(crate) fn as_rect(&self) -> Option<Rect> {
        match self {
            Value::Rect(r) => Some(*r),
            _ => None,
        }
    }

    pub(crate) fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub(crate) fn into_regex(self) -> Option<RegexValue> {
        match self {
            Value::Regex(r) => Some(r),
            _ => None,
        }
    }

    /// Numeric view used by `compare`
    pub(crate) fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Int(n) => Some(Decimal::from_raw(n.saturating_mul(10_000))),
            Value::Uint(n) => Some(Decimal::from_raw((*n as i64).saturating_mul(10_000))),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Str(s) | Value::Font(s) | Value::Enum(s) => write!(f, "{}", s),
            Value::Color(c) => write!(f, "{}", c),
            Value::Rect(r) => write!(f, "{}", r),
            Value::Regex(r) => write!(f, "{}", r.source()),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::WinId(w) => write!(f, "{}", format_winid(*w)),
        }
    }
}

/// Static description of a built-in attribute
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttrSpec {
    pub(crate) name: &'static str,
    pub(crate) ty: AttrType,
    pub(crate) writable: bool,
    pub(crate) doc: &'static str,
}

impl AttrSpec {
    pub(crate) const fn ro(name: &'static str, ty: AttrType, doc: &'static str) -> Self {
        Self {
            name,
            ty,
            writable: false,
            doc,
        }
    }

    pub(crate) const fn rw(name: &'static str, ty: AttrType, doc: &'static str) -> Self {
        Self {
            name,
            ty,
            writable: true,
            doc,
        }
    }
}

/// An attribute created with `new_attr` or `mktemp`
#[derive(Debug, Clone)]
pub(crate) struct UserAttr {
    pub(crate) ty: AttrType,
    pub(crate) value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_integers() {
        let five = Value::Int(5);
        assert_eq!(Value::parse(AttrType::Int, "+=3", Some(&five)), Ok(Value::Int(8)));
        assert_eq!(Value::parse(AttrType::Int, "-=-2", Some(&five)), Ok(Value::Int(7)));
        assert!(Value::parse(AttrType::Int, "+=x", Some(&five)).is_err());
        let two = Value::Uint(2);
        assert_eq!(Value::parse(AttrType::Uint, "-=5", Some(&two)), Ok(Value::Uint(0)));
        assert!(Value::parse(AttrType::Uint, "-1", None).is_err());
    }

    #[test]
    fn booleans() {
        let on = Value::Bool(true);
        assert_eq!(Value::parse(AttrType::Bool, "toggle", Some(&on)), Ok(Value::Bool(false)));
        assert_eq!(Value::parse(AttrType::Bool, "on", None), Ok(Value::Bool(true)));
        assert_eq!(Value::parse(AttrType::Bool, "0", None), Ok(Value::Bool(false)));
        assert!(Value::parse(AttrType::Bool, "yes", None).is_err());
    }

    #[test]
    fn regexes_validate_eagerly() {
        assert!(Value::parse(AttrType::Regex, "(", None).is_err());
        let v = Value::parse(AttrType::Regex, "Mod1\\+.*", None).unwrap();
        assert_eq!(v.to_string(), "Mod1\\+.*");
    }

    #[test]
    fn enums() {
        const ALGOS: &[&str] = &["vertical", "horizontal"];
        assert!(Value::parse(AttrType::Enum(ALGOS), "grid", None).is_err());
        assert_eq!(
            Value::parse(AttrType::Enum(ALGOS), "horizontal", None),
            Ok(Value::Enum("horizontal".into()))
        );
    }
}
