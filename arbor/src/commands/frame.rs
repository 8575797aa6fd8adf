//! Commands working on the frame tree and the clients in it

use std::fmt::Write;

use common::ExitCode;

use super::{expect_args, no_args, parse_switch, Command, Complete, Output, SWITCHES};
use crate::{
    decimal::Decimal,
    display::StackItem,
    errors::{CommandError, CommandResult},
    frame::{
        self, Algorithm, Align, Direction, Frame, FramePath, SplitKind, FRACTION_MAX, FRACTION_MIN,
    },
    newtypes::{format_winid, parse_winid, WinId},
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "split", run: split, complete: complete_split },
    Command { name: "remove", run: remove, complete: no_args },
    Command { name: "focus", run: focus, complete: complete_direction },
    Command { name: "shift", run: shift, complete: complete_direction },
    Command { name: "resize", run: resize, complete: complete_resize },
    Command { name: "cycle", run: cycle, complete: complete_delta },
    Command { name: "cycle_all", run: cycle_all, complete: complete_cycle_all },
    Command { name: "cycle_frame", run: cycle_frame, complete: complete_delta },
    Command { name: "cycle_layout", run: cycle_layout, complete: complete_cycle_layout },
    Command { name: "set_layout", run: set_layout, complete: complete_algorithm },
    Command { name: "dump", run: dump, complete: complete_tag_frame },
    Command { name: "load", run: load, complete: complete_load },
    Command { name: "layout", run: layout, complete: complete_tag_frame },
    Command { name: "list_clients", run: list_clients, complete: complete_list_clients },
    Command { name: "close", run: close, complete: complete_client },
    Command { name: "close_or_remove", run: close_or_remove, complete: no_args },
    Command { name: "close_and_remove", run: close_and_remove, complete: no_args },
    Command { name: "jumpto", run: jumpto, complete: complete_client },
    Command { name: "bring", run: bring, complete: complete_client },
    Command { name: "raise", run: raise, complete: complete_client },
    Command { name: "fullscreen", run: fullscreen, complete: complete_switch },
    Command { name: "pseudotile", run: pseudotile, complete: complete_switch },
    Command { name: "stack", run: stack, complete: no_args },
];

const SPLIT_MODES: &[&str] = &[
    "top", "bottom", "left", "right", "horizontal", "vertical", "auto", "explode",
];

const RESIZE_STEP: Decimal = Decimal::from_raw(200);

/// A client argument: a window id, `urgent` for the first urgent client or nothing for the
/// focused one
pub(super) fn client_arg(state: &WMState, arg: Option<&String>) -> Result<WinId, CommandError> {
    let arg = arg.map(String::as_str).unwrap_or_default();
    let found = match arg {
        "" => state.focused_client(),
        "urgent" => state
            .clients
            .values()
            .find(|c| c.urgent)
            .map(|c| c.win),
        _ => parse_winid(arg).filter(|w| state.clients.contains_key(w)),
    };
    found.ok_or_else(|| {
        if arg.is_empty() {
            CommandError::invalid("No client is focused")
        } else {
            CommandError::invalid(format!("Could not find client \"{}\"", arg))
        }
    })
}

fn parse_direction(arg: &str) -> Result<Direction, CommandError> {
    Direction::parse(arg).ok_or_else(|| {
        CommandError::failed(format!(
            "Invalid direction \"{}\", expected one of: {}",
            arg,
            Direction::NAMES.join(", ")
        ))
    })
}

fn parse_delta(arg: Option<&String>) -> Result<i64, CommandError> {
    match arg {
        None => Ok(1),
        Some(arg) => arg
            .parse::<i64>()
            .map_err(|_| CommandError::failed(format!("Invalid number \"{}\"", arg))),
    }
}

/// `split MODE [FRACTION [FRAMEINDEX]]`
fn split(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let fraction = match args.get(1) {
        Some(f) => f
            .parse::<Decimal>()
            .map_err(|e| CommandError::failed(e.to_string()))?,
        None => Decimal::half(),
    };
    let tag = state.focused_tag_index();
    let path = match args.get(2) {
        Some(index) => state.tags[tag]
            .root
            .resolve_index(index)
            .ok_or_else(|| CommandError::failed(format!("Invalid frame index \"{}\"", index)))?,
        None => state.tags[tag].root.focused_path(),
    };
    let rect = state
        .focused_layout()
        .and_then(|layout| layout.frames.into_iter().find(|f| f.path == path))
        .map(|f| f.rect)
        .unwrap_or_default();
    let wide = || if rect.width > rect.height { Align::Horizontal } else { Align::Vertical };
    let (kind, align) = match args[0].as_str() {
        "top" => (SplitKind::Top, Align::Vertical),
        "bottom" | "vertical" => (SplitKind::Bottom, Align::Vertical),
        "left" => (SplitKind::Left, Align::Horizontal),
        "right" | "horizontal" => (SplitKind::Right, Align::Horizontal),
        "auto" => match wide() {
            Align::Horizontal => (SplitKind::Right, Align::Horizontal),
            Align::Vertical => (SplitKind::Bottom, Align::Vertical),
        },
        "explode" => (SplitKind::Explode, wide()),
        other => {
            return Err(CommandError::failed(format!(
                "Invalid split mode \"{}\", expected one of: {}",
                other,
                SPLIT_MODES.join(", ")
            )))
        }
    };
    if !state.tags[tag].root.split_leaf(&path, kind, align, fraction) {
        return Err(CommandError::failed("Only frames holding clients can be split"));
    }
    Ok(())
}

/// Merge the focused frame into its neighbour, nothing happens for the root frame
fn remove(state: &mut WMState, _: &[String], _: &mut Output) -> CommandResult {
    let tag = state.focused_tag_index();
    let path = state.tags[tag].root.focused_path();
    state.tags[tag].root.remove_frame(&path);
    Ok(())
}

/// Direction and the `-i`/`-e` flags in any order
fn direction_args(state: &WMState, args: &[String]) -> Result<(Direction, bool), CommandError> {
    let mut external_only = state.settings.default_direction_external_only;
    let mut dir = None;
    for arg in args {
        match arg.as_str() {
            "-i" => external_only = false,
            "-e" => external_only = true,
            _ => dir = Some(parse_direction(arg)?),
        }
    }
    let dir = dir.ok_or_else(CommandError::need_more_args)?;
    Ok((dir, external_only))
}

fn focus(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let (dir, external_only) = direction_args(state, args)?;
    state.focus_direction(dir, external_only)
}

fn shift(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let (dir, external_only) = direction_args(state, args)?;
    state.shift_direction(dir, external_only)
}

/// The closest split above `path` dividing along `align`. Splits where `path` lies on the side
/// of `dir` are preferred.
fn resize_target(root: &Frame, path: &[u8], align: Align, side: u8) -> Option<FramePath> {
    let matching =
        |i: usize| matches!(root.get(&path[..i]), Some(Frame::Split(s)) if s.align == align);
    let preferred = (0..path.len())
        .rev()
        .find(|i| matching(*i) && path[*i] == side);
    preferred
        .or_else(|| (0..path.len()).rev().find(|i| matching(*i)))
        .map(|i| path[..i].to_vec())
}

/// `resize DIRECTION [DELTA]`, moves the border of the focused frame
fn resize(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let dir = parse_direction(&args[0])?;
    let delta = match args.get(1) {
        Some(d) => d
            .parse::<Decimal>()
            .map_err(|e| CommandError::failed(e.to_string()))?,
        None => RESIZE_STEP,
    };
    let tag = state.focused_tag_index();
    let root = &mut state.tags[tag].root;
    let path = root.focused_path();
    let (align, side) = match dir {
        Direction::Left => (Align::Horizontal, 1),
        Direction::Right => (Align::Horizontal, 0),
        Direction::Up => (Align::Vertical, 1),
        Direction::Down => (Align::Vertical, 0),
    };
    let target = resize_target(root, &path, align, side)
        .ok_or_else(|| CommandError::new(ExitCode::Forbidden, "No neighbour found"))?;
    if let Some(Frame::Split(s)) = root.get_mut(&target) {
        let moved = match dir {
            Direction::Right | Direction::Down => s.fraction + delta,
            Direction::Left | Direction::Up => s.fraction - delta,
        };
        s.fraction = moved.clamp(FRACTION_MIN, FRACTION_MAX);
    }
    Ok(())
}

fn cycle(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    state.cycle_selection(parse_delta(args.first())?);
    Ok(())
}

/// `cycle_all [--skip-invisible] [DELTA]`
fn cycle_all(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let skip_invisible = args.iter().any(|a| a == "--skip-invisible");
    let delta = parse_delta(args.iter().find(|a| *a != "--skip-invisible"))?;
    state.cycle_all(delta, skip_invisible);
    Ok(())
}

fn cycle_frame(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    state.cycle_frame(parse_delta(args.first())?);
    Ok(())
}

fn parse_algorithm(name: &str) -> Result<Algorithm, CommandError> {
    name.parse::<Algorithm>().map_err(CommandError::failed)
}

/// `cycle_layout [DELTA [ALGORITHMS…]]`, the list restricts the algorithms cycled through
fn cycle_layout(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let delta = parse_delta(args.first())?;
    let list = args
        .iter()
        .skip(1)
        .map(|a| parse_algorithm(a))
        .collect::<Result<Vec<_>, _>>()?;
    let tag = state.focused_tag_index();
    let leaf = state.tags[tag].root.focused_leaf_mut();
    leaf.algorithm = if list.is_empty() {
        leaf.algorithm.cycle(delta as i32)
    } else {
        match list.iter().position(|a| *a == leaf.algorithm) {
            Some(i) => list[(i as i64 + delta).rem_euclid(list.len() as i64) as usize],
            None => list[0],
        }
    };
    Ok(())
}

fn set_layout(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let algorithm = parse_algorithm(&args[0])?;
    let tag = state.focused_tag_index();
    state.tags[tag].root.focused_leaf_mut().algorithm = algorithm;
    Ok(())
}

/// Tag and frame given by the optional `[TAG [FRAMEINDEX]]` arguments
fn tag_and_frame(state: &WMState, args: &[String]) -> Result<(usize, FramePath), CommandError> {
    let tag = match args.first().filter(|a| !a.is_empty()) {
        Some(name) => state.find_tag(name)?,
        None => state.focused_tag_index(),
    };
    let path = match args.get(1) {
        Some(index) => state.tags[tag]
            .root
            .resolve_index(index)
            .ok_or_else(|| CommandError::failed(format!("Invalid frame index \"{}\"", index)))?,
        None => Vec::new(),
    };
    Ok((tag, path))
}

fn dump(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let (tag, path) = tag_and_frame(state, args)?;
    if let Some(frame) = state.tags[tag].root.get(&path) {
        out.print(frame::dump(frame));
    }
    Ok(())
}

/// Keep the clients `keep` agrees to, in their order
fn retain_clients(frame: &mut Frame, keep: &mut dyn FnMut(WinId) -> bool) {
    match frame {
        Frame::Leaf(leaf) => {
            let selected = leaf.selected();
            leaf.clients.retain(|w| keep(*w));
            match selected.filter(|w| leaf.clients.contains(w)) {
                Some(win) => {
                    leaf.select(win);
                }
                None => leaf.selection = leaf.selection.min(leaf.clients.len().saturating_sub(1)),
            }
        }
        Frame::Split(s) => {
            for child in s.children.iter_mut() {
                retain_clients(child, keep);
            }
        }
    }
}

/// `load [TAG] LAYOUT`. Windows of other tags listed in the layout are moved to the tag, unknown
/// windows are dropped and tiled clients missing from it go to the focused frame.
fn load(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let (tag, text) = match args {
        [text] => (state.focused_tag_index(), text),
        [name, text, ..] => (state.find_tag(name)?, text),
        [] => return Err(CommandError::need_more_args()),
    };
    let mut root = frame::load(text).map_err(|e| CommandError::failed(e.to_string()))?;
    let tag_id = state.tags[tag].id;
    let previous = state.tags[tag].root.clients();

    let mut listed = Vec::new();
    retain_clients(&mut root, &mut |win| {
        let keep = state.clients.contains_key(&win) && !listed.contains(&win);
        if keep {
            listed.push(win);
        }
        keep
    });
    for win in &listed {
        let (old_tag, floating, minimized) = match state.clients.get(win) {
            Some(c) => (c.tag, c.floating, c.minimized),
            None => continue,
        };
        if old_tag != tag_id || floating || minimized {
            if let Some(old) = state.tag_mut(old_tag) {
                old.remove(*win);
            }
            if let Some(client) = state.clients.get_mut(win) {
                client.tag = tag_id;
                client.floating = false;
                client.minimized = false;
            }
        }
    }
    for win in previous.into_iter().filter(|w| !listed.contains(w)) {
        root.insert_focused(win, false);
    }
    state.tags[tag].root = root;
    Ok(())
}

fn draw_layout(
    frame: &Frame,
    focused: &[u8],
    path: &mut FramePath,
    prefix: &str,
    text: &mut String,
) {
    match frame {
        Frame::Leaf(leaf) => {
            let _ = write!(text, "{}:", leaf.algorithm);
            for win in &leaf.clients {
                let _ = write!(text, " {}", format_winid(*win));
            }
            if path.as_slice() == focused {
                text.push_str(" [FOCUS]");
            }
            text.push('\n');
        }
        Frame::Split(s) => {
            let _ = writeln!(
                text,
                "{} {} selection={}",
                s.align.name(),
                s.fraction,
                s.selection
            );
            for (i, child) in s.children.iter().enumerate() {
                let last = i == 1;
                let _ = write!(text, "{}{} ", prefix, if last { "└" } else { "├" });
                let deeper = format!("{}{} ", prefix, if last { " " } else { "│" });
                path.push(i as u8);
                draw_layout(child, focused, path, &deeper, text);
                path.pop();
            }
        }
    }
}

/// The frame tree in a human readable form
fn layout(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let (tag, path) = tag_and_frame(state, args)?;
    let root = &state.tags[tag].root;
    let focused = root.focused_path();
    if let Some(frame) = root.get(&path) {
        let mut text = String::new();
        let mut walked = path.clone();
        draw_layout(frame, &focused, &mut walked, "", &mut text);
        out.print(text);
    }
    Ok(())
}

/// `list_clients [--frame=INDEX] [--tag=TAG]`
fn list_clients(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let mut tag = state.focused_tag_index();
    let mut frame = None;
    for arg in args {
        if let Some(name) = arg.strip_prefix("--tag=") {
            tag = state.find_tag(name)?;
        } else if let Some(index) = arg.strip_prefix("--frame=") {
            frame = Some(index.to_string());
        } else {
            return Err(CommandError::failed(format!("Unknown argument \"{}\"", arg)));
        }
    }
    let clients = match frame {
        Some(index) => {
            let root = &state.tags[tag].root;
            let path = root
                .resolve_index(&index)
                .ok_or_else(|| CommandError::failed(format!("Invalid frame index \"{}\"", index)))?;
            root.get(&path).map(Frame::clients).unwrap_or_default()
        }
        None => state.tags[tag].clients(),
    };
    for win in clients {
        out.println(format_winid(win));
    }
    Ok(())
}

fn close(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let win = client_arg(state, args.first())?;
    state.close_client(win)
}

/// Close the focused client, or remove the focused frame if it's empty
fn close_or_remove(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    match state.focused_client() {
        Some(win) => state.close_client(win),
        None => remove(state, args, out),
    }
}

/// Close the focused client and remove its frame if it was the last client there
fn close_and_remove(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let win = client_arg(state, None)?;
    let last = state
        .focused_tag()
        .map(|t| t.root.focused_leaf().clients.len() <= 1 && !t.floating_focused)
        .unwrap_or(false);
    state.close_client(win)?;
    if last {
        remove(state, args, out)?;
    }
    Ok(())
}

fn jumpto(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let win = client_arg(state, args.first())?;
    state.focus_window(win, true)?;
    state.raise(win);
    Ok(())
}

fn bring(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    let win = client_arg(state, args.first())?;
    state.bring(win)
}

fn raise(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let win = client_arg(state, args.first())?;
    state.raise(win);
    Ok(())
}

fn fullscreen(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let win = client_arg(state, None)?;
    let current = state.client_or_err(win)?.fullscreen;
    state.set_fullscreen(win, parse_switch(args.first(), current)?)
}

fn pseudotile(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    let win = client_arg(state, None)?;
    let current = state.client_or_err(win)?.pseudotile;
    state.set_pseudotile(win, parse_switch(args.first(), current)?)
}

/// The stacking order as a tree of monitors and their layers
fn stack(state: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    let mut text = String::new();
    for (index, layers) in state.monitor_layers() {
        let tag = state
            .monitors
            .get(index)
            .and_then(|m| state.tag_by_id(m.tag))
            .map(|t| t.name.as_str())
            .unwrap_or_default();
        let _ = writeln!(text, "Monitor {} with tag \"{}\"", index, tag);
        for (layer, items) in layers {
            let _ = writeln!(text, "  {}", layer);
            for item in items {
                match item {
                    StackItem::Client(win) => {
                        let title = state
                            .clients
                            .get(&win)
                            .map(|c| c.title.as_str())
                            .unwrap_or_default();
                        let _ = writeln!(text, "    Client {} \"{}\"", format_winid(win), title);
                    }
                    StackItem::Frame(id) => {
                        let _ = writeln!(text, "    Frame {}", id.0);
                    }
                }
            }
        }
    }
    out.print(text);
    Ok(())
}

fn complete_split(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(SPLIT_MODES),
        1 => c.full_all(["0.3", "0.5", "0.7"]),
        2 => {}
        _ => c.none(),
    }
}

fn complete_direction(_: &WMState, before: &[String], c: &mut Complete) {
    if before.iter().any(|a| Direction::parse(a).is_some()) {
        c.full_all(["-i", "-e"].iter().filter(|f| !before.iter().any(|a| a == *f)));
        if before.len() >= 2 {
            c.none();
        }
        return;
    }
    c.full_all(Direction::NAMES);
    c.full_all(["-i", "-e"]);
}

fn complete_resize(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(Direction::NAMES),
        1 => c.full_all(["+0.02", "-0.02", "+0.05", "-0.05"]),
        _ => c.none(),
    }
}

fn complete_delta(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(["+1", "-1"]),
        _ => c.none(),
    }
}

fn complete_cycle_all(_: &WMState, before: &[String], c: &mut Complete) {
    let skip = before.iter().any(|a| a == "--skip-invisible");
    let given = if skip { 2 } else { 1 };
    if before.len() >= given && before.iter().any(|a| a.starts_with(['+', '-'])) {
        c.none();
        return;
    }
    if !skip {
        c.full("--skip-invisible");
    }
    c.full_all(["+1", "-1"]);
}

fn complete_algorithm(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(Algorithm::NAMES),
        _ => c.none(),
    }
}

fn complete_cycle_layout(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(["+1", "-1"]),
        _ => c.full_all(Algorithm::NAMES),
    }
}

fn complete_tag_frame(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(state.tags.iter().map(|t| &t.name)),
        1 => c.full_all(["@", "0", "1"]),
        _ => c.none(),
    }
}

fn complete_load(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(state.tags.iter().map(|t| &t.name)),
        1 => {}
        _ => c.none(),
    }
}

fn complete_list_clients(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.iter().any(|a| a.starts_with("--tag=")) {
        for tag in &state.tags {
            c.full(format!("--tag={}", tag.name));
        }
    }
    if !before.iter().any(|a| a.starts_with("--frame=")) {
        c.partial("--frame=");
    }
}

pub(super) fn complete_client(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.is_empty() {
        c.none();
        return;
    }
    c.full("urgent");
    c.full_all(state.clients.keys().map(|w| format_winid(*w)));
}

fn complete_switch(_: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(SWITCHES),
        _ => c.none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_prefers_the_border_in_direction() {
        // the focused frame is the left child of the inner split
        let root = frame::load(
            "(split horizontal:0.5:1 (clients vertical:0) \
             (split horizontal:0.5:0 (clients vertical:0) (clients vertical:0)))",
        )
        .unwrap();
        let path = root.focused_path();
        assert_eq!(path, vec![1, 0]);
        assert_eq!(resize_target(&root, &path, Align::Horizontal, 0), Some(vec![1]));
        assert_eq!(resize_target(&root, &path, Align::Horizontal, 1), Some(vec![]));
        assert_eq!(resize_target(&root, &path, Align::Vertical, 0), None);
    }

    #[test]
    fn retained_clients_keep_the_selection() {
        let mut root = frame::load("(clients max:2 0x1 0x2 0x3)").unwrap();
        retain_clients(&mut root, &mut |w| w != 1);
        assert_eq!(frame::dump(&root), "(clients max:1 0x2 0x3)");
        retain_clients(&mut root, &mut |w| w == 2);
        assert_eq!(frame::dump(&root), "(clients max:0 0x2)");
    }
}
