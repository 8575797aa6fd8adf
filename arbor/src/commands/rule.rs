use common::ExitCode;

use super::{expect_args, frame::client_arg, no_args, Command, Complete, Output};
use crate::{
    errors::{CommandError, CommandResult},
    rules::{RuleRequest, CONDITIONS, CONSEQUENCES, FLAGS, FLOAT_PLACEMENTS},
    states::WMState,
};

pub(super) const COMMANDS: &[Command] = &[
    Command { name: "rule", run: rule, complete: complete_rule },
    Command { name: "unrule", run: unrule, complete: complete_unrule },
    Command { name: "list_rules", run: list_rules, complete: no_args },
    Command { name: "apply_rules", run: apply_rules, complete: complete_apply_rules },
];

/// `rule [FLAGS…] [CONDITIONS…] [CONSEQUENCES…]`
fn rule(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    let request = RuleRequest::parse(args, state.next_rule_label.to_string())
        .map_err(CommandError::failed)?;
    if !request.explicit_label {
        state.next_rule_label += 1;
    }
    if request.printlabel {
        out.println(&request.rule.label);
    }
    log::debug!("adding rule {}", request.rule);
    if request.prepend {
        state.rules.insert(0, request.rule);
    } else {
        state.rules.push(request.rule);
    }
    Ok(())
}

/// `unrule LABEL|--all|-F`, removes every rule with the label
fn unrule(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    if args[0] == "--all" || args[0] == "-F" {
        state.rules.clear();
        state.next_rule_label = 0;
        return Ok(());
    }
    let before = state.rules.len();
    state.rules.retain(|r| r.label != args[0]);
    if state.rules.len() == before {
        return Err(CommandError::new(
            ExitCode::InvalidArgument,
            format!("Couldn't find any rules with label \"{}\"", args[0]),
        ));
    }
    Ok(())
}

fn list_rules(state: &mut WMState, _: &[String], out: &mut Output) -> CommandResult {
    for rule in &state.rules {
        out.println(rule.to_string());
    }
    Ok(())
}

/// `apply_rules WIN|--all`
fn apply_rules(state: &mut WMState, args: &[String], _: &mut Output) -> CommandResult {
    expect_args(args, 1)?;
    if args[0] == "--all" {
        let wins = state.clients.keys().copied().collect::<Vec<_>>();
        for win in wins {
            state.reapply_rules(win)?;
        }
        return Ok(());
    }
    let win = client_arg(state, args.first())?;
    state.reapply_rules(win)
}

fn complete_rule(state: &WMState, _: &[String], c: &mut Complete) {
    let needle = c.needle().to_string();
    c.full_all(FLAGS);
    match needle.split_once(|ch| ch == '=' || ch == '~') {
        None => {
            for name in CONDITIONS {
                c.partial(format!("{}=", name));
                c.partial(format!("{}~", name));
            }
            for name in CONSEQUENCES.iter().chain(&["label"]) {
                c.partial(format!("{}=", name));
            }
        }
        Some((name, _)) => {
            let prefix = &needle[..=name.len()];
            let values: Vec<String> = match name {
                "tag" => state.tags.iter().map(|t| t.name.clone()).collect(),
                "floatplacement" => FLOAT_PLACEMENTS.iter().map(|s| s.to_string()).collect(),
                "focus" | "switchtag" | "manage" | "floating" | "pseudotile" | "fullscreen"
                | "ewmhrequests" | "ewmhnotify" => {
                    vec!["on".into(), "off".into(), "true".into(), "false".into()]
                }
                _ => Vec::new(),
            };
            for value in values {
                c.full(format!("{}{}", prefix, value));
            }
        }
    }
}

fn complete_unrule(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.is_empty() {
        c.none();
        return;
    }
    c.full_all(["--all", "-F"]);
    c.full_all(state.rules.iter().map(|r| &r.label));
}

fn complete_apply_rules(state: &WMState, before: &[String], c: &mut Complete) {
    if !before.is_empty() {
        c.none();
        return;
    }
    c.full("--all");
    c.full_all(state.clients.keys().map(|w| crate::newtypes::format_winid(*w)));
}
