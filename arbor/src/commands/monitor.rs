use super::{expect_args, no_args, tag::complete_monitors, up_to, Command, Complete, Output};
use crate::{
    errors::{CommandError, CommandResult},
    rect::Rect,
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "add_monitor", run: add_monitor, complete: complete_add_monitor },
    Command { name: "remove_monitor", run: remove_monitor, complete: complete_monitors },
    Command { name: "set_monitors", run: set_monitors, complete: |_, _, _| {} },
    Command { name: "detect_monitors", run: detect_monitors, complete: complete_detect },
    Command { name: "move_monitor", run: move_monitor, complete: complete_move_monitor },
    Command { name: "rename_monitor", run: rename_monitor, complete: complete_rename },
    Command { name: "focus_monitor", run: focus_monitor, complete: complete_monitors },
    Command { name: "cycle_monitor", run: cycle_monitor, complete: complete_cycle },
    Command { name: "list_monitors", run: list_monitors, complete: no_args },
    Command { name: "monitor_rect", run: monitor_rect, complete: complete_monitor_rect },
    Command { name: "pad", run: pad, complete: complete_pad },
    Command { name: "list_padding", run: list_padding, complete: complete_monitors },
    Command { name: "lock", run: lock, complete: no_args },
    Command { name: "unlock", run: unlock, complete: no_args },
    Command { name: "lock_tag", run: lock_tag, complete: complete_monitors },
    Command { name: "unlock_tag", run: unlock_tag, complete: complete_monitors },
    Command { name: "shift_to_monitor", run: shift_to_monitor, complete: complete_monitors },
];

fn parse_rect(arg: &str) -> Result<Rect, CommandError> {
    arg.parse::<Rect>()
        .map_err(|e| CommandError::failed(e.to_string()))
}

fn monitor_arg(state: &WMState, args: &[String]) -> Result<usize, CommandError> {
    state.find_monitor(args.first().map(String::as_str).unwrap_or_default())
}

/// `add_monitor RECT [TAG [NAME]]`
fn add_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let rect = parse_rect(&args[0])?;
    let tag = match args.get(1) {
        Some(name) => Some(state.find_tag(name)?),
        None => None,
    };
    state.add_monitor(rect, tag, args.get(2).map(String::as_str))
}

fn remove_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let index = state.find_monitor(&args[0])?;
    state.remove_monitor(index)
}

fn set_monitors(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let rects = args
        .iter()
        .map(|a| parse_rect(a))
        .collect::<Result<Vec<_>, _>>()?;
    state.set_monitors(rects)
}

/// With `--list` (or `-l`) only print what would be set, `--no-disjoin` is accepted and ignored
fn detect_monitors(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    for arg in args {
        match arg.as_str() {
            "-l" | "--list" => {
                for rect in state.detected_screens() {
                    out.println(rect.to_string());
                }
                return Ok(());
            }
            "--no-disjoin" => {}
            other => {
                return Err(CommandError::failed(format!("Unknown argument \"{}\"", other)))
            }
        }
    }
    state.detect_monitors()
}

/// `move_monitor MON RECT [PADUP [PADRIGHT [PADDOWN [PADLEFT]]]]`
fn move_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let index = state.find_monitor(&args[0])?;
    let rect = parse_rect(&args[1])?;
    let pad = parse_pads(state.monitors[index].pad, &args[2..])?;
    state.set_monitor_rect(index, rect)?;
    state.monitors[index].pad = pad;
    Ok(())
}

fn rename_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let index = state.find_monitor(&args[0])?;
    state.rename_monitor(index, &args[1])
}

fn focus_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let index = state.find_monitor(&args[0])?;
    state.focus_monitor(index);
    Ok(())
}

fn cycle_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let delta = match args.first() {
        Some(arg) => arg
            .parse::<i64>()
            .map_err(|_| CommandError::failed(format!("Invalid number \"{}\"", arg)))?,
        None => 1,
    };
    state.cycle_monitor(delta);
    Ok(())
}

fn list_monitors(state: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    for (i, monitor) in state.monitors.iter().enumerate() {
        let tag = state
            .tag_by_id(monitor.tag)
            .map(|t| t.name.as_str())
            .unwrap_or_default();
        let mut line = format!("{}: {} with tag \"{}\"", i, monitor.rect, tag);
        if !monitor.name.is_empty() {
            line.push_str(&format!(" \"{}\"", monitor.name));
        }
        if i == state.focused_monitor {
            line.push_str(" [FOCUS]");
        }
        if monitor.lock_tag {
            line.push_str(" [LOCKED]");
        }
        out.println(line);
    }
    Ok(())
}

/// `monitor_rect [-p] [MON]`, prints `X Y WIDTH HEIGHT`. With `-p` the padding is left out.
fn monitor_rect(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let padded = args.first().map(String::as_str) == Some("-p");
    let rest = if padded { &args[1..] } else { args };
    let monitor = &state.monitors[monitor_arg(state, rest)?];
    let rect = if padded {
        monitor.usable_area()
    } else {
        monitor.rect
    };
    out.println(format!("{} {} {} {}", rect.x, rect.y, rect.width, rect.height));
    Ok(())
}

/// Padding values in the order up, right, down, left. Missing or empty values keep `current`.
fn parse_pads(current: [i32; 4], args: &[String]) -> Result<[i32; 4], CommandError> {
    let mut pad = current;
    for (value, arg) in pad.iter_mut().zip(args) {
        if arg.is_empty() {
            continue;
        }
        let width = arg
            .parse::<u32>()
            .map_err(|_| CommandError::invalid(format!("Invalid padding \"{}\"", arg)))?;
        *value = width.min(i32::MAX as u32) as i32;
    }
    Ok(pad)
}

/// `pad MON [UP [RIGHT [DOWN [LEFT]]]]`
fn pad(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let index = state.find_monitor(&args[0])?;
    let pad = parse_pads(state.monitors[index].pad, &args[1..])?;
    state.monitors[index].pad = pad;
    Ok(())
}

fn list_padding(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let [up, right, down, left] = state.monitors[monitor_arg(state, args)?].effective_pad();
    out.println(format!("{} {} {} {}", up, right, down, left));
    Ok(())
}

fn lock(state: &mut WMState, _: &[String], _: &mut Output) -> CommandResult {
    state.lock();
    Ok(())
}

fn unlock(state: &mut WMState, _: &[String], _: &mut Output) -> CommandResult {
    state.unlock();
    Ok(())
}

fn lock_tag(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let index = monitor_arg(state, args)?;
    state.monitors[index].lock_tag = true;
    Ok(())
}

fn unlock_tag(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let index = monitor_arg(state, args)?;
    state.monitors[index].lock_tag = false;
    Ok(())
}

/// Send the focused client to the tag shown on another monitor
fn shift_to_monitor(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let index = state.find_monitor(&args[0])?;
    let win = state
        .focused_client()
        .ok_or_else(|| CommandError::invalid("No client is focused"))?;
    let tag = state
        .tag_index(state.monitors[index].tag)
        .ok_or_else(|| CommandError::failed("Monitor shows no tag"))?;
    state.move_client_to_tag(win, tag)
}

fn complete_add_monitor(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => {}
        1 => c.full_all(
            state
                .tags
                .iter()
                .filter(|t| state.monitor_of_tag(t.id).is_none())
                .map(|t| &t.name),
        ),
        2 => {}
        _ => c.none(),
    }
}

fn complete_detect(_: &WMState, before: &[String], c: &mut Complete) {
    if before.iter().any(|a| a == "-l" || a == "--list") {
        c.none();
        return;
    }
    c.full_all(["-l", "--list", "--no-disjoin"]);
}

fn complete_move_monitor(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_monitors(state, before, c),
        1 => c.full_all(state.monitors.iter().map(|m| m.rect.to_string())),
        _ => up_to::<6>(state, before, c),
    }
}

fn complete_rename(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_monitors(state, before, c),
        1 => {}
        _ => c.none(),
    }
}

fn complete_cycle(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(["+1", "-1"]),
        _ => c.none(),
    }
}

fn complete_monitor_rect(state: &WMState, before: &[String], c: &mut Complete) {
    match before {
        [] => {
            c.full("-p");
            complete_monitors(state, before, c);
        }
        [flag] if flag == "-p" => complete_monitors(state, &[], c),
        _ => c.none(),
    }
}

fn complete_pad(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_monitors(state, before, c),
        _ => up_to::<5>(state, before, c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn missing_pads_keep_their_value() {
        assert_eq!(parse_pads([1, 2, 3, 4], &strings(&["10"])), Ok([10, 2, 3, 4]));
        assert_eq!(
            parse_pads([1, 2, 3, 4], &strings(&["", "", "30"])),
            Ok([1, 2, 30, 4])
        );
        assert!(parse_pads([0; 4], &strings(&["x"])).is_err());
    }

    #[test]
    fn pads_are_never_negative() {
        let err = parse_pads([1, 2, 3, 4], &strings(&["-50"])).unwrap_err();
        assert_eq!(err.code, common::ExitCode::InvalidArgument);
    }
}
