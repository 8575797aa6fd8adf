//! Key and mouse bindings

use super::{complete_nested, expect_args, frame::client_arg, Command, Complete, Output};
use crate::{
    errors::{CommandError, CommandResult},
    keys::{self, KeyBind, KeyCombo},
    mouse::{MouseAction, MouseBind, MouseCombo},
    newtypes::format_winid,
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "keybind", run: keybind, complete: complete_keybind },
    Command { name: "keyunbind", run: keyunbind, complete: complete_keyunbind },
    Command { name: "list_keybinds", run: list_keybinds, complete: super::no_args },
    Command { name: "mousebind", run: mousebind, complete: complete_mousebind },
    Command { name: "mouseunbind", run: mouseunbind, complete: complete_mouseunbind },
    Command { name: "list_mousebinds", run: list_mousebinds, complete: super::no_args },
    Command { name: "drag", run: drag, complete: complete_drag },
];

const BUTTONS: &[&str] = &["Button1", "Button2", "Button3", "Button4", "Button5"];

/// `keybind COMBO COMMAND…`, an existing binding of the combo is replaced
fn keybind(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let combo = args[0]
        .parse::<KeyCombo>()
        .map_err(|e| CommandError::failed(e.to_string()))?;
    let bind = KeyBind {
        combo,
        command: args[1..].to_vec(),
    };
    log::debug!("binding {} to {:?}", bind.combo, bind.command);
    match state.keybinds.iter_mut().find(|b| b.combo == bind.combo) {
        Some(existing) => *existing = bind,
        None => state.keybinds.push(bind),
    }
    Ok(())
}

/// `keyunbind COMBO|--all|-F`
fn keyunbind(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    if args[0] == "--all" || args[0] == "-F" {
        state.keybinds.clear();
        return Ok(());
    }
    let combo = args[0]
        .parse::<KeyCombo>()
        .map_err(|e| CommandError::failed(e.to_string()))?;
    let before = state.keybinds.len();
    state.keybinds.retain(|b| b.combo != combo);
    if state.keybinds.len() == before {
        return Err(CommandError::failed(format!("Key \"{}\" is not bound", args[0])));
    }
    Ok(())
}

fn list_keybinds(state: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    for bind in &state.keybinds {
        let mut line = bind.combo.to_string();
        for arg in &bind.command {
            line.push('\t');
            line.push_str(arg);
        }
        out.println(line);
    }
    Ok(())
}

/// `mousebind COMBO ACTION [COMMAND…]`, `call` takes the command run on a click
fn mousebind(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let combo = args[0]
        .parse::<MouseCombo>()
        .map_err(|e| CommandError::failed(e.to_string()))?;
    let action = match args[1].as_str() {
        "call" if args.len() < 3 => return Err(CommandError::need_more_args()),
        "call" => MouseAction::Call(args[2..].to_vec()),
        other => MouseAction::parse_drag(other).ok_or_else(|| {
            CommandError::failed(format!(
                "Unknown mouse action \"{}\", expected one of: {}",
                other,
                MouseAction::NAMES.join(", ")
            ))
        })?,
    };
    let bind = MouseBind { combo, action };
    match state.mousebinds.iter_mut().find(|b| b.combo == bind.combo) {
        Some(existing) => *existing = bind,
        None => state.mousebinds.push(bind),
    }
    Ok(())
}

/// `mouseunbind [COMBO|--all]`, without arguments all bindings go
fn mouseunbind(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    match args.first().map(String::as_str) {
        None | Some("--all") | Some("-F") => {
            state.mousebinds.clear();
            Ok(())
        }
        Some(arg) => {
            let combo = arg
                .parse::<MouseCombo>()
                .map_err(|e| CommandError::failed(e.to_string()))?;
            let before = state.mousebinds.len();
            state.mousebinds.retain(|b| b.combo != combo);
            if state.mousebinds.len() == before {
                return Err(CommandError::failed(format!(
                    "Mouse button \"{}\" is not bound",
                    arg
                )));
            }
            Ok(())
        }
    }
}

fn list_mousebinds(state: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    for bind in &state.mousebinds {
        out.println(format!("{}\t{}", bind.combo, bind.action));
    }
    Ok(())
}

/// `drag WIN move|resize|zoom`, starts a drag as if the client was clicked
fn drag(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 2)?;
    let win = client_arg(state, args.first())?;
    let action = MouseAction::parse_drag(&args[1]).ok_or_else(|| {
        CommandError::failed(format!("Unknown drag action \"{}\"", args[1]))
    })?;
    let pointer = state.display.pointer_position();
    state.start_drag(win, action, pointer)
}

/// Complete a combo: the modifiers so far plus one more modifier or one of `finals`
fn complete_combo(c: &mut Complete, finals: &[&str]) {
    let needle = c.needle().to_string();
    let prefix = match needle.rfind(|ch| ch == '-' || ch == '+') {
        Some(i) => &needle[..=i],
        None => "",
    };
    for word in keys::completion_words() {
        c.partial(format!("{}{}", prefix, word));
    }
    for word in finals {
        c.full(format!("{}{}", prefix, word));
    }
}

fn complete_keybind(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_combo(c, &[]),
        _ => complete_nested(state, &before[1..], c),
    }
}

fn complete_keyunbind(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.is_empty() {
        c.none();
        return;
    }
    c.full_all(["--all", "-F"]);
    c.full_all(state.keybinds.iter().map(|b| b.combo.to_string()));
}

fn complete_mousebind(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => complete_combo(c, BUTTONS),
        1 => c.full_all(MouseAction::NAMES),
        _ if before[1] == "call" => complete_nested(state, &before[2..], c),
        _ => c.none(),
    }
}

fn complete_mouseunbind(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.is_empty() {
        c.none();
        return;
    }
    c.full_all(["--all", "-F"]);
    c.full_all(state.mousebinds.iter().map(|b| b.combo.to_string()));
}

fn complete_drag(state: &WMState, before: &[String], c: &mut Complete) {
    match before.len() {
        0 => c.full_all(state.clients.keys().map(|w| format_winid(*w))),
        1 => c.full_all(["move", "resize", "zoom"]),
        _ => c.none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combos_complete_modifier_by_modifier() {
        let mut c = Complete::new("Mod4-S", false);
        complete_combo(&mut c, &[]);
        assert_eq!(c.words(), &["Mod4-Shift+".to_string(), "Mod4-Super+".to_string()]);

        let mut c = Complete::new("Mod1+B", true);
        complete_combo(&mut c, BUTTONS);
        assert_eq!(c.words()[0], "Mod1+Button1 ");
        assert_eq!(c.words().len(), BUTTONS.len());
    }
}
