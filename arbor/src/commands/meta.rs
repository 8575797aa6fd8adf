//! Commands that run other commands, and the ones that don't touch the window management model

use std::{env, path::Path};

use common::ExitCode;
use regex::Regex;

use super::{
    complete, complete_nested, expect_args, no_args, run, run_nested, up_to, Command, Complete,
    Output,
};
use crate::{
    errors::{CommandError, CommandResult},
    object::{join_path, split_attr_path, AttrType, Obj},
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "chain", run: chain, complete: complete_separated },
    Command { name: "and", run: and, complete: complete_separated },
    Command { name: "or", run: or, complete: complete_separated },
    Command { name: "!", run: negate, complete: complete_nested },
    Command { name: "try", run: try_, complete: complete_nested },
    Command { name: "silent", run: silent, complete: complete_nested },
    Command { name: "echo", run: echo, complete: |_, _, _| {} },
    Command { name: "true", run: |_, _, _| Ok(()), complete: no_args },
    Command {
        name: "false",
        run: |_, _, _| Err(CommandError::silent(ExitCode::Error)),
        complete: no_args,
    },
    Command { name: "setenv", run: setenv, complete: complete_env::<2> },
    Command { name: "getenv", run: getenv, complete: complete_env::<1> },
    Command { name: "unsetenv", run: unsetenv, complete: complete_env::<1> },
    Command { name: "export", run: export, complete: up_to::<1> },
    Command { name: "emit_hook", run: emit_hook, complete: |_, _, _| {} },
    Command { name: "list_commands", run: list_commands, complete: no_args },
    Command { name: "complete", run: complete_cmd, complete: complete_complete },
    Command { name: "complete_shell", run: complete_shell, complete: complete_complete },
    Command { name: "version", run: version, complete: no_args },
    Command { name: "quit", run: quit, complete: no_args },
    Command { name: "reload", run: reload, complete: no_args },
    Command { name: "spawn", run: spawn, complete: |_, _, _| {} },
    Command { name: "substitute", run: substitute, complete: complete_substitute },
    Command { name: "sprintf", run: sprintf, complete: complete_sprintf },
    Command { name: "foreach", run: foreach, complete: complete_foreach },
    Command { name: "mktemp", run: mktemp, complete: complete_mktemp },
];

/// Split `SEP cmd… SEP cmd…` into the command lines
fn segments(args: &[String]) -> Result<Vec<&[String]>, CommandError> {
    let (sep, rest) = args.split_first().ok_or_else(CommandError::need_more_args)?;
    Ok(rest.split(|a| a == sep).collect())
}

fn chain(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let mut status = 0;
    for segment in segments(args)? {
        status = run(state, segment, out);
    }
    status_result(status)
}

fn and(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    for segment in segments(args)? {
        let status = run(state, segment, out);
        if status != 0 {
            return status_result(status);
        }
    }
    Ok(())
}

fn or(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let mut status = 0;
    for segment in segments(args)? {
        status = run(state, segment, out);
        if status == 0 {
            return Ok(());
        }
    }
    status_result(status)
}

fn status_result(status: i32) -> CommandResult {
    match status {
        0 => Ok(()),
        status => Err(CommandError::silent(ExitCode::from_code(status))),
    }
}

/// The separator is offered as soon as the current command line has a word
fn complete_separated(state: &WMState, before: &[String], c: &mut Complete) {
    let sep = match before.first() {
        Some(sep) => sep,
        None => return,
    };
    let line = match before[1..].rsplit(|a| a == sep).next() {
        Some(line) => line,
        None => &[],
    };
    if !line.is_empty() {
        c.full(sep);
    }
    complete_nested(state, line, c);
}

fn negate(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    match run(state, args, out) {
        0 => Err(CommandError::silent(ExitCode::Error)),
        _ => Ok(()),
    }
}

fn try_(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    run(state, args, out);
    Ok(())
}

fn silent(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    run_nested(state, args, &mut Output::default())
}

fn echo(_: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    out.println(args.join(" "));
    Ok(())
}

fn complete_env<const N: usize>(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(env::vars().map(|(name, _)| name)),
        n if n >= N => c.none(),
        _ => {}
    }
}

fn setenv(_: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    env::set_var(&args[0], &args[1]);
    Ok(())
}

fn getenv(_: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    match env::var(&args[0]) {
        Ok(value) => {
            out.println(value);
            Ok(())
        }
        Err(_) => Err(CommandError::silent(ExitCode::EnvUnset)),
    }
}

fn unsetenv(_: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    env::remove_var(&args[0]);
    Ok(())
}

/// `export NAME=VALUE`
fn export(_: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let (name, value) = args[0].split_once('=').ok_or_else(|| {
        CommandError::failed(format!("Expected NAME=VALUE but got \"{}\"", args[0]))
    })?;
    env::set_var(name, value);
    Ok(())
}

fn emit_hook(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    state.hooks.emit(args.iter().cloned());
    Ok(())
}

fn list_commands(_: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    for name in super::names() {
        out.println(name);
    }
    Ok(())
}

fn run_completion(
    state: &WMState,
    args: &[String],
    out: &mut Output,
    shell: bool,
) -> CommandResult {
    expect_args(args, 1)?;
    let position = args[0]
        .parse::<usize>()
        .map_err(|_| CommandError::failed(format!("Invalid position \"{}\"", args[0])))?;
    let line = &args[1..];
    let needle = line.get(position).map(String::as_str).unwrap_or_default();
    let mut c = Complete::new(needle, shell);
    complete(state, position, line, &mut c);
    for word in c.words() {
        out.println(word);
    }
    if c.words().is_empty() && c.no_parameter {
        return Err(CommandError::silent(ExitCode::NoParameterExpected));
    }
    Ok(())
}

fn complete_cmd(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    run_completion(state, args, out, false)
}

fn complete_shell(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    run_completion(state, args, out, true)
}

fn complete_complete(state: &WMState, before: &[String], c: &mut Complete) {
    if let Some((_, line)) = before.split_first() {
        complete_nested(state, line, c);
    }
}

fn version(_: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    out.println(format!("arbor {}", env!("CARGO_PKG_VERSION")));
    Ok(())
}

fn quit(state: &mut WMState, _: &[String], _: &mut Output) -> CommandResult {
    log::info!("quit requested");
    state.running = false;
    Ok(())
}

fn reload(state: &mut WMState, _: &[String], _: &mut Output) -> CommandResult {
    state.hooks.emit(["reload"]);
    state.run_autostart();
    Ok(())
}

fn spawn(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let pid = state
        .children
        .spawn(Path::new(&args[0]), &args[1..])
        .map_err(|e| CommandError::failed(format!("Could not spawn \"{}\": {}", args[0], e)))?;
    log::debug!("spawned {} with pid {}", args[0], pid);
    Ok(())
}

/// Replace every argument equal to `ident` by `value`
fn bind_ident(ident: &str, value: &str, command: &[String]) -> Vec<String> {
    command
        .iter()
        .map(|arg| if arg == ident { value.to_string() } else { arg.clone() })
        .collect()
}

fn attr_text(state: &WMState, path: &str) -> Result<String, CommandError> {
    let (obj, info) = state.resolve_attr(path)?;
    Ok(state
        .attr_value(&obj, &info.name)
        .map(|v| v.to_string())
        .unwrap_or_default())
}

/// `substitute IDENT ATTRIBUTE COMMAND…`
fn substitute(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 3)?;
    let value = attr_text(state, &args[1])?;
    let command = bind_ident(&args[0], &value, &args[2..]);
    run_nested(state, &command, out)
}

fn complete_attr_path(state: &WMState, c: &mut Complete) {
    let (object, _) = split_attr_path(c.needle());
    let object = if c.needle().ends_with('.') {
        c.needle().trim_end_matches('.').to_string()
    } else if c.needle().contains('.') {
        object.to_string()
    } else {
        String::new()
    };
    let obj = match state.resolve(&object) {
        Ok(obj) => obj,
        Err(_) => return,
    };
    for (name, _) in state.children(&obj) {
        c.partial(format!("{}.", join_path(&object, &name)));
    }
    for info in state.attributes(&obj) {
        c.full(join_path(&object, &info.name));
    }
}

fn complete_substitute(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => {}
        1 => complete_attr_path(state, c),
        _ => {
            let line = &before[2..];
            if line.is_empty() {
                c.full(&before[0]);
            }
            complete_nested(state, line, c);
        }
    }
}

/// Expand a format string. Returns the text and the number of arguments used.
fn expand_format(
    state: &WMState,
    format: &str,
    args: &[String],
) -> Result<(String, usize), CommandError> {
    let mut text = String::new();
    let mut used = 0;
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => text.push('%'),
            Some(kind @ ('s' | 'c')) => {
                let arg = args.get(used).ok_or_else(CommandError::need_more_args)?;
                used += 1;
                if kind == 's' {
                    text.push_str(&attr_text(state, arg)?);
                } else {
                    text.push_str(arg);
                }
            }
            Some(other) => {
                return Err(CommandError::failed(format!(
                    "Invalid format type %{} in \"{}\"",
                    other, format
                )))
            }
            None => {
                return Err(CommandError::failed(format!(
                    "Dangling % at the end of \"{}\"",
                    format
                )))
            }
        }
    }
    Ok((text, used))
}

/// Number of arguments consumed by a format string
fn placeholders(format: &str) -> usize {
    format
        .replace("%%", "")
        .matches(|c| c == '%')
        .count()
}

/// `sprintf IDENT FORMAT [ARGS…] COMMAND…`
fn sprintf(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let (text, used) = expand_format(state, &args[1], &args[2..])?;
    let command = bind_ident(&args[0], &text, &args[2 + used..]);
    run_nested(state, &command, out)
}

fn complete_sprintf(state: &WMState, before: &[String], c: &mut Complete) {
    if before.len() < 2 {
        return;
    }
    let needed = placeholders(&before[1]);
    let given = before.len() - 2;
    if given < needed {
        complete_attr_path(state, c);
        return;
    }
    let line = &before[2 + needed..];
    if line.is_empty() {
        c.full(&before[0]);
    }
    complete_nested(state, line, c);
}

#[derive(Debug, Default)]
struct ForeachOptions {
    unique: bool,
    recursive: bool,
    filter: Option<Regex>,
}

const FOREACH_FLAGS: &[&str] = &["--unique", "--recursive", "--filter-name="];

/// Take the options following the object, returns the number of arguments they used
fn foreach_options(args: &[String]) -> Result<(ForeachOptions, usize), CommandError> {
    let mut options = ForeachOptions::default();
    let mut used = 0;
    for arg in args {
        match arg.as_str() {
            "--unique" => options.unique = true,
            "--recursive" => options.recursive = true,
            _ => match arg.strip_prefix("--filter-name=") {
                Some(pattern) => {
                    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                        CommandError::failed(format!("Invalid regex \"{}\": {}", pattern, e))
                    })?;
                    options.filter = Some(regex);
                }
                None => break,
            },
        }
        used += 1;
    }
    Ok((options, used))
}

/// The children of `obj` together with their paths, depth first when `recursive`
fn collect_children(
    state: &WMState,
    path: &str,
    obj: &Obj,
    options: &ForeachOptions,
    seen: &mut Vec<Obj>,
    out: &mut Vec<(String, Obj)>,
) {
    for (name, child) in state.children(obj) {
        let child_path = join_path(path, &name);
        let duplicate = seen.contains(&child);
        let matches = options
            .filter
            .as_ref()
            .map(|re| re.is_match(&name))
            .unwrap_or(true);
        if options.unique && duplicate {
            continue;
        }
        seen.push(child.clone());
        if matches {
            out.push((child_path.clone(), child.clone()));
        }
        if options.recursive && !duplicate {
            collect_children(state, &child_path, &child, options, seen, out);
        }
    }
}

/// `foreach IDENT OBJECT [--unique] [--recursive] [--filter-name=REGEX] COMMAND…`
fn foreach(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 3)?;
    let ident = &args[0];
    let path = args[1].trim_end_matches('.');
    let obj = state.resolve(path)?;
    let (options, used) = foreach_options(&args[2..])?;
    let command = &args[2 + used..];
    if command.is_empty() {
        return Err(CommandError::need_more_args());
    }

    let mut children = Vec::new();
    collect_children(state, path, &obj, &options, &mut Vec::new(), &mut children);
    let mut status = 0;
    // once an entry went missing the loop can't succeed anymore
    let mut stale = false;
    for (child_path, child) in children {
        if !state.exists(&child) {
            out.eprintln(format!("foreach: \"{}\" does not exist anymore", child_path));
            stale = true;
            continue;
        }
        // indices shift when entries are removed
        let bound = match state.resolve(&child_path) {
            Ok(current) if current == child => child_path,
            _ => state.path_of(&child),
        };
        status = run(state, &bind_ident(ident, &bound, command), out);
    }
    if stale && status == 0 {
        status = ExitCode::InvalidArgument.code();
    }
    status_result(status)
}

fn complete_foreach(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => {}
        1 => {
            let needle = c.needle().to_string();
            let object = needle.rsplit_once('.').map(|(o, _)| o).unwrap_or_default();
            if let Ok(obj) = state.resolve(object) {
                for (name, _) in state.children(&obj) {
                    c.partial(format!("{}.", join_path(object, &name)));
                }
            }
        }
        _ => {
            let options = before[2..]
                .iter()
                .take_while(|a| FOREACH_FLAGS.iter().any(|f| a.starts_with(f)))
                .count();
            let line = &before[2 + options..];
            if line.is_empty() {
                c.full_all(&FOREACH_FLAGS[..2]);
                c.partial(FOREACH_FLAGS[2]);
                c.full(&before[0]);
            }
            complete_nested(state, line, c);
        }
    }
}

/// `mktemp TYPE IDENT COMMAND…`, the attribute lives in `tmp` while the command runs
fn mktemp(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    expect_args(args, 3)?;
    let ty = AttrType::from_user(&args[0])
        .ok_or_else(|| CommandError::failed(format!("Unknown attribute type \"{}\"", args[0])))?;
    state.tmp_counter += 1;
    let name = format!("my_{}", state.tmp_counter);
    state.new_user_attr(Obj::Tmp, &name, ty, None)?;
    let path = format!("tmp.{}", name);
    let result = run_nested(state, &bind_ident(&args[1], &path, &args[2..]), out);
    if let Err(e) = state.remove_user_attr(&Obj::Tmp, &name) {
        log::debug!("mktemp: {} is gone already: {}", path, e);
    }
    result
}

fn complete_mktemp(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(AttrType::USER_TYPES),
        1 => {}
        _ => {
            let line = &before[2..];
            if line.is_empty() {
                c.full(&before[1]);
            }
            complete_nested(state, line, c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split(' ').map(String::from).collect()
    }

    #[test]
    fn separated_segments() {
        let a = args(", echo a , , echo b");
        let segments = segments(&a).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], &a[1..3]);
        assert!(segments[1].is_empty());
    }

    #[test]
    fn identifiers_match_whole_arguments() {
        assert_eq!(
            bind_ident("X", "tags.0", &args("echo X Xs")),
            args("echo tags.0 Xs")
        );
    }

    #[test]
    fn format_placeholders() {
        assert_eq!(placeholders("%s and %c but 100%%"), 2);
        assert_eq!(placeholders("plain"), 0);
    }

    #[test]
    fn foreach_flags() {
        let (options, used) = foreach_options(&args("--unique --filter-name=[0-9]+ echo")).unwrap();
        assert_eq!(used, 2);
        assert!(options.unique && !options.recursive);
        let re = options.filter.unwrap();
        assert!(re.is_match("12"));
        assert!(!re.is_match("a12"));
        assert!(foreach_options(&args("--filter-name=( echo")).is_err());
    }
}
