//! Rules decide what happens to a window when it's managed.
//!
//! A rule is written as a list of tokens: conditions like `class=Firefox` or `title~.*vim.*`,
//! consequences like `tag=web` and a few flags (`once`, `not`, `printlabel`, `prepend`). Every
//! token may be prefixed by `--`.

use std::{
    fmt::{self, Display},
    time::Instant,
};

use regex::Regex;

use crate::{
    states::Client,
    object::{AttrType, Value},
    rect::Rect,
};

pub(crate) const CONDITIONS: &[&str] = &[
    "instance",
    "class",
    "title",
    "pid",
    "maxage",
    "windowtype",
    "windowrole",
    "fixedsize",
];

pub(crate) const CONSEQUENCES: &[&str] = &[
    "tag",
    "monitor",
    "focus",
    "switchtag",
    "manage",
    "index",
    "pseudotile",
    "fullscreen",
    "ewmhrequests",
    "ewmhnotify",
    "hook",
    "keymask",
    "keys_inactive",
    "floating",
    "floatplacement",
    "floating_geometry",
];

pub(crate) const FLAGS: &[&str] = &["not", "!", "once", "printlabel", "prepend"];

pub(crate) const FLOAT_PLACEMENTS: &[&str] = &["center", "none", "smart"];

#[derive(Debug, Clone)]
enum Matcher {
    Equals(String),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub(crate) struct Condition {
    name: String,
    negated: bool,
    op: char,
    source: String,
    matcher: Matcher,
}

impl Condition {
    fn matches(&self, client: &Client, birth: Instant) -> bool {
        let result = match self.name.as_str() {
            "instance" => self.matches_str(&client.instance),
            "class" => self.matches_str(&client.class),
            "title" => self.matches_str(&client.title),
            "windowtype" => self.matches_str(&client.window_type),
            "windowrole" => self.matches_str(&client.role),
            "pid" => match (&self.matcher, client.pid) {
                (Matcher::Equals(pid), Some(actual)) => pid.parse::<u32>().ok() == Some(actual),
                (Matcher::Regex(re), Some(actual)) => re.is_match(&actual.to_string()),
                (_, None) => false,
            },
            "maxage" => match &self.matcher {
                Matcher::Equals(secs) => secs
                    .parse::<u64>()
                    .map(|secs| birth.elapsed().as_secs() <= secs)
                    .unwrap_or(false),
                Matcher::Regex(_) => false,
            },
            "fixedsize" => client.fixed_size,
            _ => false,
        };
        result != self.negated
    }

    fn matches_str(&self, value: &str) -> bool {
        match &self.matcher {
            Matcher::Equals(s) => s == value,
            Matcher::Regex(re) => re.is_match(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FloatPlacement {
    Center,
    None,
    Smart,
}

/// Everything the rules decided about a new client
#[derive(Debug, Clone)]
pub(crate) struct ClientChanges {
    pub(crate) tag: Option<String>,
    pub(crate) monitor: Option<String>,
    pub(crate) focus: Option<bool>,
    pub(crate) switchtag: bool,
    pub(crate) manage: bool,
    pub(crate) index: Option<String>,
    pub(crate) floating: Option<bool>,
    pub(crate) pseudotile: Option<bool>,
    pub(crate) fullscreen: Option<bool>,
    pub(crate) ewmhrequests: Option<bool>,
    pub(crate) ewmhnotify: Option<bool>,
    pub(crate) keymask: Option<String>,
    pub(crate) keys_inactive: Option<String>,
    pub(crate) floatplacement: Option<FloatPlacement>,
    pub(crate) floating_geometry: Option<Rect>,
    pub(crate) hooks: Vec<String>,
}

impl Default for ClientChanges {
    fn default() -> Self {
        Self {
            tag: None,
            monitor: None,
            focus: None,
            switchtag: false,
            manage: true,
            index: None,
            floating: None,
            pseudotile: None,
            fullscreen: None,
            ewmhrequests: None,
            ewmhnotify: None,
            keymask: None,
            keys_inactive: None,
            floatplacement: None,
            floating_geometry: None,
            hooks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Consequence {
    name: String,
    value: String,
}

fn parse_bool(value: &str, current: Option<bool>) -> Result<bool, String> {
    let current = current.map(Value::Bool);
    Value::parse(AttrType::Bool, value, current.as_ref()).map(|v| v.as_bool().unwrap_or(false))
}

impl Consequence {
    fn validate(&self) -> Result<(), String> {
        match self.name.as_str() {
            "focus" | "switchtag" | "manage" | "pseudotile" | "fullscreen" | "ewmhrequests"
            | "ewmhnotify" | "floating" => parse_bool(&self.value, None).map(|_| ()),
            "keymask" | "keys_inactive" => Regex::new(&self.value)
                .map(|_| ())
                .map_err(|e| format!("invalid regex \"{}\": {}", self.value, e)),
            "floatplacement" => {
                if FLOAT_PLACEMENTS.contains(&self.value.as_str()) {
                    Ok(())
                } else {
                    Err(format!("invalid float placement \"{}\"", self.value))
                }
            }
            "floating_geometry" => self
                .value
                .parse::<Rect>()
                .map(|_| ())
                .map_err(|e| e.to_string()),
            _ => Ok(()),
        }
    }

    fn apply(&self, changes: &mut ClientChanges) {
        let flag = |current: Option<bool>| parse_bool(&self.value, current).ok();
        match self.name.as_str() {
            "tag" => changes.tag = Some(self.value.clone()),
            "monitor" => changes.monitor = Some(self.value.clone()),
            "focus" => changes.focus = flag(changes.focus),
            "switchtag" => changes.switchtag = flag(Some(changes.switchtag)).unwrap_or(false),
            "manage" => changes.manage = flag(Some(changes.manage)).unwrap_or(true),
            "index" => changes.index = Some(self.value.clone()),
            "pseudotile" => changes.pseudotile = flag(changes.pseudotile),
            "fullscreen" => changes.fullscreen = flag(changes.fullscreen),
            "ewmhrequests" => changes.ewmhrequests = flag(changes.ewmhrequests),
            "ewmhnotify" => changes.ewmhnotify = flag(changes.ewmhnotify),
            "floating" => changes.floating = flag(changes.floating),
            "hook" => changes.hooks.push(self.value.clone()),
            "keymask" => changes.keymask = Some(self.value.clone()),
            "keys_inactive" => changes.keys_inactive = Some(self.value.clone()),
            "floatplacement" => {
                changes.floatplacement = match self.value.as_str() {
                    "center" => Some(FloatPlacement::Center),
                    "none" => Some(FloatPlacement::None),
                    "smart" => Some(FloatPlacement::Smart),
                    _ => changes.floatplacement,
                }
            }
            "floating_geometry" => {
                if let Ok(rect) = self.value.parse() {
                    changes.floating_geometry = Some(rect);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub(crate) label: String,
    pub(crate) once: bool,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) consequences: Vec<Consequence>,
    pub(crate) birth: Instant,
}

/// A parsed `rule` command
#[derive(Debug)]
pub(crate) struct RuleRequest {
    pub(crate) rule: Rule,
    pub(crate) printlabel: bool,
    pub(crate) prepend: bool,
    /// Whether the label was chosen by the user
    pub(crate) explicit_label: bool,
}

/// Split `name=value` or `name~value`, whichever operator comes first
fn split_token(token: &str) -> Option<(&str, char, &str)> {
    let pos = token.find(|c| c == '=' || c == '~')?;
    let op = token[pos..].chars().next()?;
    Some((&token[..pos], op, &token[pos + 1..]))
}

impl RuleRequest {
    pub(crate) fn parse(args: &[String], default_label: String) -> Result<Self, String> {
        let mut rule = Rule {
            label: default_label,
            once: false,
            conditions: Vec::new(),
            consequences: Vec::new(),
            birth: Instant::now(),
        };
        let mut printlabel = false;
        let mut prepend = false;
        let mut explicit_label = false;
        let mut negated = false;
        for arg in args {
            let token = arg.strip_prefix("--").unwrap_or(arg);
            match token {
                "not" | "!" => {
                    negated = !negated;
                    continue;
                }
                "once" => rule.once = true,
                "printlabel" => printlabel = true,
                "prepend" => prepend = true,
                "fixedsize" => {
                    rule.conditions.push(Condition {
                        name: token.to_string(),
                        negated,
                        op: '=',
                        source: String::new(),
                        matcher: Matcher::Equals(String::new()),
                    });
                    negated = false;
                }
                _ => {
                    let (name, op, value) = split_token(token)
                        .ok_or_else(|| format!("Unknown rule flag \"{}\"", token))?;
                    if name == "label" {
                        if op != '=' {
                            return Err("Unknown rule label operation, expected \"=\"".to_string());
                        }
                        if value.is_empty() {
                            return Err("Rule label cannot be empty".to_string());
                        }
                        rule.label = value.to_string();
                        explicit_label = true;
                    } else if CONDITIONS.contains(&name) {
                        let matcher = if op == '~' {
                            let re = Regex::new(&format!("^(?:{})$", value))
                                .map_err(|e| format!("Cannot parse regex \"{}\": {}", value, e))?;
                            Matcher::Regex(re)
                        } else {
                            Matcher::Equals(value.to_string())
                        };
                        rule.conditions.push(Condition {
                            name: name.to_string(),
                            negated,
                            op,
                            source: value.to_string(),
                            matcher,
                        });
                        negated = false;
                    } else if CONSEQUENCES.contains(&name) {
                        if op != '=' {
                            return Err(format!(
                                "Unknown rule consequence operation \"{}\" for \"{}\"",
                                op, name
                            ));
                        }
                        let consequence = Consequence {
                            name: name.to_string(),
                            value: value.to_string(),
                        };
                        consequence.validate()?;
                        rule.consequences.push(consequence);
                    } else {
                        return Err(format!("Unknown argument \"{}\"", token));
                    }
                }
            }
        }
        Ok(Self {
            rule,
            printlabel,
            prepend,
            explicit_label,
        })
    }
}

impl Rule {
    pub(crate) fn matches(&self, client: &Client) -> bool {
        self.conditions
            .iter()
            .all(|c| c.matches(client, self.birth))
    }

    pub(crate) fn apply(&self, changes: &mut ClientChanges) {
        for consequence in &self.consequences {
            consequence.apply(changes);
        }
    }
}

/// Printed by `list_rules`
impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "label={}\t", self.label)?;
        if self.once {
            write!(f, "once\t")?;
        }
        for c in &self.conditions {
            if c.negated {
                write!(f, "not\t")?;
            }
            if c.name == "fixedsize" {
                write!(f, "fixedsize\t")?;
            } else {
                write!(f, "{}{}{}\t", c.name, c.op, c.source)?;
            }
        }
        for c in &self.consequences {
            write!(f, "{}={}\t", c.name, c.value)?;
        }
        Ok(())
    }
}

/// Run all rules against a client, `once` rules that fired are returned for removal
pub(crate) fn evaluate(rules: &[Rule], client: &Client) -> (ClientChanges, Vec<String>) {
    let mut changes = ClientChanges::default();
    let mut fired = Vec::new();
    for rule in rules {
        if rule.matches(client) {
            rule.apply(&mut changes);
            if rule.once {
                fired.push(rule.label.clone());
            }
        }
    }
    (changes, fired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::WindowInfo, newtypes::TagId};

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn client(class: &str, title: &str) -> Client {
        let mut info = WindowInfo::new(1);
        info.class = class.to_string();
        info.title = title.to_string();
        Client::new(&info, TagId(0))
    }

    #[test]
    fn conditions_and_negation() {
        let rule = RuleRequest::parse(&args("class=Foo not title~.*vim.* tag=bar"), "0".into())
            .unwrap()
            .rule;
        assert!(rule.matches(&client("Foo", "bash")));
        assert!(!rule.matches(&client("Foo", "nvim - file")));
        assert!(!rule.matches(&client("Bar", "bash")));
        // regexes have to match the whole value
        let rule = RuleRequest::parse(&args("--class~Fo"), "1".into()).unwrap().rule;
        assert!(!rule.matches(&client("Foo", "")));
    }

    #[test]
    fn consequences_merge_in_order() {
        let first = RuleRequest::parse(&args("tag=one focus=on"), "0".into()).unwrap().rule;
        let second = RuleRequest::parse(&args("class=Foo tag=two hook=seen once"), "1".into())
            .unwrap()
            .rule;
        let (changes, fired) = evaluate(&[first, second], &client("Foo", ""));
        assert_eq!(changes.tag.as_deref(), Some("two"));
        assert_eq!(changes.focus, Some(true));
        assert_eq!(changes.hooks, vec!["seen".to_string()]);
        assert_eq!(fired, vec!["1".to_string()]);
    }

    #[test]
    fn invalid_rules() {
        assert!(RuleRequest::parse(&args("foo=bar"), "0".into()).is_err());
        assert!(RuleRequest::parse(&args("focus=maybe"), "0".into()).is_err());
        assert!(RuleRequest::parse(&args("class~("), "0".into()).is_err());
        assert!(RuleRequest::parse(&args("tag~x"), "0".into()).is_err());
        assert!(RuleRequest::parse(&args("label="), "0".into()).is_err());
        let request = RuleRequest::parse(&args("label=term printlabel"), "0".into()).unwrap();
        assert_eq!(request.rule.label, "term");
        assert!(request.printlabel && request.explicit_label);
        assert_eq!(request.rule.to_string(), "label=term\t");
    }
}
