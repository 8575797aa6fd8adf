use std::fmt::Write;

use common::ExitCode;

use super::{expect_args, Command, Complete, Output};
use crate::{
    errors::{CommandError, CommandResult},
    object::{join_path, split_attr_path, AttrType, Obj, Value},
    settings::Settings,
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "get_attr", run: get_attr, complete: complete_get },
    Command { name: "set_attr", run: set_attr, complete: complete_set },
    Command { name: "attr", run: attr, complete: complete_set },
    Command { name: "object_tree", run: object_tree, complete: complete_object },
    Command { name: "new_attr", run: new_attr, complete: complete_new_attr },
    Command { name: "remove_attr", run: remove_attr, complete: complete_get },
    Command { name: "help", run: help, complete: complete_get },
    Command { name: "cycle_value", run: cycle_value, complete: complete_cycle_value },
    Command { name: "compare", run: compare, complete: complete_compare },
    Command { name: "watch", run: watch, complete: complete_get },
    Command { name: "get", run: get, complete: complete_setting::<1> },
    Command { name: "set", run: set, complete: complete_setting::<2> },
    Command { name: "toggle", run: toggle, complete: complete_setting::<1> },
];

const OPERATORS: &[&str] = &["=", "!=", "le", "lt", "ge", "gt"];

fn value_text(state: &WMState, obj: &Obj, name: &str) -> String {
    state
        .attr_value(obj, name)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn get_attr(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let (obj, info) = state.resolve_attr(&args[0])?;
    out.print(value_text(state, &obj, &info.name));
    Ok(())
}

fn set_attr(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let (obj, info) = state.resolve_attr(&args[0])?;
    state.set_attr_text(&obj, &info.name, &args[1])
}

/// Description of an object: its children and its attributes with their values
fn describe(state: &WMState, obj: &Obj) -> String {
    let mut text = String::new();
    let children = state.children(obj);
    let colon = if children.is_empty() { "." } else { ":" };
    let _ = writeln!(text, "{} children{}", children.len(), colon);
    for (name, _) in &children {
        let _ = writeln!(text, "  {}.", name);
    }
    let attrs = state.attributes(obj);
    let colon = if attrs.is_empty() { "." } else { ":" };
    let _ = writeln!(text, "{} attributes{}", attrs.len(), colon);
    if !attrs.is_empty() {
        text.push_str(" .---- type\n | .-- writable\n V V\n");
    }
    for info in attrs {
        let value = match state.attr_value(obj, &info.name) {
            Some(Value::Str(s)) => format!("\"{}\"", s),
            Some(value) => value.to_string(),
            None => String::new(),
        };
        let _ = writeln!(
            text,
            " {} {} {:<20} = {}",
            info.ty.short(),
            if info.writable { 'w' } else { '-' },
            info.name,
            value
        );
    }
    text
}

/// `attr [PATH [VALUE]]`
fn attr(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let path = args.first().map(String::as_str).unwrap_or_default();
    if let Some(value) = args.get(1) {
        let (obj, info) = state.resolve_attr(path)?;
        return state.set_attr_text(&obj, &info.name, value);
    }
    if path.is_empty() || path.ends_with('.') {
        let obj = state.resolve(path)?;
        out.print(describe(state, &obj));
        return Ok(());
    }
    match state.resolve(path) {
        Ok(obj) => out.print(describe(state, &obj)),
        Err(not_an_object) => {
            let (object, name) = split_attr_path(path);
            let obj = state.resolve(object)?;
            if state.attr_info(&obj, name).is_none() {
                return Err(not_an_object);
            }
            out.println(value_text(state, &obj, name));
        }
    }
    Ok(())
}

fn draw_tree(state: &WMState, obj: &Obj, prefix: &str, out: &mut String) {
    let children = state.children(obj);
    let count = children.len();
    for (i, (name, child)) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let _ = writeln!(out, "{}{} {}", prefix, if last { "└" } else { "├" }, name);
        let deeper = format!("{}{} ", prefix, if last { " " } else { "│" });
        draw_tree(state, &child, &deeper, out);
    }
}

/// `object_tree [PATH]`
fn object_tree(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let path = args.first().map(String::as_str).unwrap_or_default();
    let obj = state.resolve(path)?;
    let mut text = String::new();
    let label = state.path_of(&obj);
    let _ = writeln!(text, "{}", if label.is_empty() { "root" } else { label.as_str() });
    draw_tree(state, &obj, "", &mut text);
    out.print(text);
    Ok(())
}

/// `new_attr TYPE PATH [VALUE]`
fn new_attr(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let ty = AttrType::from_user(&args[0]).ok_or_else(|| {
        CommandError::failed(format!(
            "Unknown attribute type \"{}\", expected one of: {}",
            args[0],
            AttrType::USER_TYPES.join(", ")
        ))
    })?;
    let (object, name) = split_attr_path(&args[1]);
    let obj = state.resolve(object)?;
    state.new_user_attr(obj, name, ty, args.get(2).map(String::as_str))
}

fn remove_attr(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let (object, name) = split_attr_path(&args[0]);
    let obj = state.resolve(object)?;
    state.remove_user_attr(&obj, name)
}

fn help(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let path = args.first().map(String::as_str).unwrap_or_default();
    if let Some(command) = super::find(path) {
        out.println(format!("Command \"{}\"", command.name));
        return Ok(());
    }
    out.print(state.help_text(path)?);
    Ok(())
}

/// The path of a setting, `cycle_value` and friends accept setting names on their own
fn attr_or_setting(state: &WMState, path: &str) -> String {
    if state.resolve_attr(path).is_err() && Settings::SPECS.iter().any(|s| s.name == path) {
        return format!("settings.{}", path);
    }
    path.to_string()
}

/// `cycle_value PATH VALUES…`: the value after the current one, the first one if the current
/// value isn't listed
fn cycle_value(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let path = attr_or_setting(state, &args[0]);
    let (obj, info) = state.resolve_attr(&path)?;
    let current = value_text(state, &obj, &info.name);
    let values = &args[1..];
    let next = match values.iter().position(|v| *v == current) {
        Some(i) if i + 1 < values.len() => &values[i + 1],
        _ => &values[0],
    };
    state.set_attr_text(&obj, &info.name, next)
}

/// `compare PATH OPERATOR VALUE`, the result is the exit status only
fn compare(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 3)?;
    let (obj, info) = state.resolve_attr(&args[0])?;
    let current = state
        .attr_value(&obj, &info.name)
        .ok_or_else(|| CommandError::invalid(format!("Attribute \"{}\" has no value", args[0])))?;
    let (op, text) = (args[1].as_str(), args[2].as_str());
    let holds = match op {
        "=" | "!=" => {
            let equal = match state.parse_value(info.ty, text, Some(&current)) {
                Ok(value) => value == current,
                Err(_) => current.to_string() == text,
            };
            equal == (op == "=")
        }
        "le" | "lt" | "ge" | "gt" => {
            let left = current.as_number().filter(|_| info.ty.is_numeric()).ok_or_else(|| {
                CommandError::failed(format!(
                    "Operator {} needs a numeric attribute, but \"{}\" is of type {}",
                    op, args[0], info.ty
                ))
            })?;
            let right = Value::parse(AttrType::Decimal, text, None)
                .ok()
                .and_then(|v| v.as_number())
                .ok_or_else(|| CommandError::failed(format!("\"{}\" is not a number", text)))?;
            match op {
                "le" => left <= right,
                "lt" => left < right,
                "ge" => left >= right,
                _ => left > right,
            }
        }
        _ => {
            return Err(CommandError::failed(format!(
                "Unknown operator \"{}\", expected one of: {}",
                op,
                OPERATORS.join(" ")
            )))
        }
    };
    if holds {
        Ok(())
    } else {
        Err(CommandError::silent(ExitCode::Error))
    }
}

/// `watch PATH`: changes of the attribute are reported by the `attribute_changed` hook
fn watch(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let path = args[0].trim_end_matches('.');
    let (obj, info) = state.resolve_attr(path)?;
    let current = state.attr_value(&obj, &info.name).map(|v| v.to_string());
    if !state.hooks.watch(path, current) {
        out.eprintln(format!("watch: \"{}\" is already watched", path));
    }
    Ok(())
}

fn setting_not_found(name: &str) -> CommandError {
    CommandError::new(ExitCode::SettingNotFound, format!("Setting \"{}\" not found", name))
}

fn get(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let value = state.settings.get(&args[0]).ok_or_else(|| setting_not_found(&args[0]))?;
    out.println(value.to_string());
    Ok(())
}

fn set(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    if state.settings.get(&args[0]).is_none() {
        return Err(setting_not_found(&args[0]));
    }
    state.set_attr_text(&Obj::Settings, &args[0], &args[1])
}

fn toggle(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    match state.settings.get(&args[0]) {
        Some(Value::Bool(_)) => state.set_attr_text(&Obj::Settings, &args[0], "toggle"),
        Some(_) => Err(CommandError::failed(format!(
            "Setting \"{}\" is not a boolean",
            args[0]
        ))),
        None => Err(setting_not_found(&args[0])),
    }
}

/// Offer children and attributes of the object the needle is in.
fn complete_path(state: &WMState, c: &mut Complete, writable_only: bool, attributes: bool) {
    let needle = c.needle().to_string();
    let object = match needle.rsplit_once('.') {
        Some((object, _)) => object,
        None => "",
    };
    let obj = match state.resolve(object) {
        Ok(obj) => obj,
        Err(_) => return,
    };
    for (name, _) in state.children(&obj) {
        c.partial(format!("{}.", join_path(object, &name)));
    }
    if !attributes {
        return;
    }
    for info in state.attributes(&obj) {
        if info.writable || !writable_only {
            c.full(join_path(object, &info.name));
        }
    }
}

fn complete_get(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_path(state, c, false, true),
        _ => c.none(),
    }
}

fn complete_object(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_path(state, c, false, false),
        _ => c.none(),
    }
}

/// Suggestions for a new value of the attribute at `path`
fn complete_value(state: &WMState, path: &str, c: &mut Complete) {
    if let Ok((_, info)) = state.resolve_attr(path) {
        if info.writable {
            c.full_all(info.ty.suggestions());
        }
    }
}

fn complete_set(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_path(state, c, true, true),
        1 => complete_value(state, &before[0], c),
        _ => c.none(),
    }
}

fn complete_new_attr(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(AttrType::USER_TYPES),
        1 => complete_path(state, c, false, false),
        2 => {}
        _ => c.none(),
    }
}

fn complete_cycle_value(state: &WMState, before: &[String], c: &mut Complete) {
    match before.first() {
        None => complete_path(state, c, true, true),
        Some(path) => complete_value(state, &attr_or_setting(state, path), c),
    }
}

fn complete_compare(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_path(state, c, false, true),
        1 => c.full_all(OPERATORS),
        2 => {
            if let Ok((_, info)) = state.resolve_attr(&before[0]) {
                c.full_all(info.ty.suggestions());
            }
        }
        _ => c.none(),
    }
}

fn complete_setting<const N: usize>(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(Settings::SPECS.iter().map(|s| s.name)),
        n if n < N => complete_value(state, &format!("settings.{}", before[0]), c),
        _ => c.none(),
    }
}

