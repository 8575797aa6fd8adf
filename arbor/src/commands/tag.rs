use super::{expect_args, no_args, parse_switch, Command, Complete, Output, SWITCHES};
use crate::{
    errors::{CommandError, CommandResult},
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "add", run: add, complete: |_, before, c| if !before.is_empty() { c.none() } },
    Command { name: "merge_tag", run: merge_tag, complete: complete_tags::<2> },
    Command { name: "rename", run: rename, complete: complete_tags::<1> },
    Command { name: "use", run: use_, complete: complete_tags::<1> },
    Command { name: "use_index", run: use_index, complete: complete_index },
    Command { name: "use_previous", run: use_previous, complete: no_args },
    Command { name: "move", run: move_, complete: complete_tags::<1> },
    Command { name: "move_index", run: move_index, complete: complete_index },
    Command { name: "tag_status", run: tag_status, complete: complete_monitors },
    Command { name: "floating", run: floating, complete: complete_floating },
];

fn add(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    state.add_tag(&args[0])?;
    Ok(())
}

/// `merge_tag TAG [TARGET]`, the target defaults to the focused tag
fn merge_tag(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let src = state.find_tag(&args[0])?;
    let dst = match args.get(1) {
        Some(name) => state.find_tag(name)?,
        None => state.focused_tag_index(),
    };
    state.merge_tag(src, dst)
}

fn rename(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let index = state.find_tag(&args[0])?;
    state.rename_tag(index, &args[1])
}

fn use_(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let tag = state.find_tag(&args[0])?;
    state.use_tag(state.focused_monitor, tag)
}

fn skip_visible(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "--skip-visible")
}

fn use_index(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    state.use_index(&args[0], skip_visible(args))
}

fn use_previous(state: &mut WMState, _: &[String], _: &mut Output) -> CommandResult {
    state.use_previous()
}

fn focused_or_err(state: &WMState) -> Result<crate::newtypes::WinId, CommandError> {
    state
        .focused_client()
        .ok_or_else(|| CommandError::invalid("No client is focused"))
}

/// Send the focused client to another tag
fn move_(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let tag = state.find_tag(&args[0])?;
    let win = focused_or_err(state)?;
    state.move_client_to_tag(win, tag)
}

fn move_index(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let tag = state.tag_index_arg(&args[0], skip_visible(args))?;
    let win = focused_or_err(state)?;
    state.move_client_to_tag(win, tag)
}

/// One character per tag describing its state as seen from `monitor`, e.g. `\t#main\t:web\t`
fn tag_status(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let monitor = state.find_monitor(args.first().map(String::as_str).unwrap_or_default())?;
    let mut text = String::from("\t");
    for tag in &state.tags {
        let members = state.clients.values().filter(|c| c.tag == tag.id);
        let urgent = members.clone().any(|c| c.urgent);
        let nonempty = members.count() > 0;
        let flag = match state.monitor_of_tag(tag.id) {
            Some(m) if m == monitor && m == state.focused_monitor => '#',
            Some(m) if m == monitor => '+',
            Some(m) if m == state.focused_monitor => '%',
            Some(_) => '-',
            None if urgent => '!',
            None if nonempty => ':',
            None => '.',
        };
        text.push(flag);
        text.push_str(&tag.name);
        text.push('\t');
    }
    out.print(text);
    Ok(())
}

/// `floating [TAG] [on|off|toggle|status]`, tag wide floating mode
fn floating(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let (tag, switch) = match args.first() {
        Some(first) if SWITCHES.contains(&first.as_str()) || first == "status" => {
            (state.focused_tag_index(), Some(first))
        }
        Some(name) => (state.find_tag(name)?, args.get(1)),
        None => (state.focused_tag_index(), None),
    };
    let current = state.tags[tag].floating;
    if switch.map(String::as_str) == Some("status") {
        out.println(if current { "on" } else { "off" });
        return Ok(());
    }
    state.tags[tag].floating = parse_switch(switch, current)?;
    Ok(())
}

fn complete_tags<const N: usize>(state: &WMState, before: &[String], c: &mut Complete) {
    if before.len() >= N {
        c.none();
        return;
    }
    c.full_all(state.tags.iter().map(|t| &t.name));
}

fn complete_index(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(["+1", "-1"]),
        1 => c.full("--skip-visible"),
        _ => c.none(),
    }
}

pub(super) fn complete_monitors(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.is_empty() {
        c.none();
        return;
    }
    for (i, monitor) in state.monitors.iter().enumerate() {
        c.full(i.to_string());
        if !monitor.name.is_empty() {
            c.full(&monitor.name);
        }
    }
}

fn complete_floating(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => {
            c.full_all(SWITCHES);
            c.full("status");
            c.full_all(state.tags.iter().map(|t| &t.name));
        }
        1 if !SWITCHES.contains(&before[0].as_str()) && before[0] != "status" => {
            c.full_all(SWITCHES);
            c.full("status");
        }
        _ => c.none(),
    }
}
