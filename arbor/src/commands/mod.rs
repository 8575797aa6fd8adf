//! The command language. Every command gets its arguments without its own name and writes to an
//! [`Output`]; failures are [`CommandError`]s that [`run`] turns into an exit status.

mod attr;
mod bind;
mod frame;
mod meta;
mod monitor;
mod rule;
mod tag;

use std::fmt::Write;

use common::ExitCode;

use crate::{
    errors::{CommandError, CommandResult},
    states::WMState,
};

/// What a command prints, handed back to the caller over the socket
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Output {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl Output {
    pub(crate) fn print(&mut self, text: impl AsRef<str>) {
        self.stdout.push_str(text.as_ref());
    }

    pub(crate) fn println(&mut self, text: impl AsRef<str>) {
        self.stdout.push_str(text.as_ref());
        self.stdout.push('\n');
    }

    pub(crate) fn eprintln(&mut self, text: impl AsRef<str>) {
        self.stderr.push_str(text.as_ref());
        self.stderr.push('\n');
    }
}

type Run = fn(&mut WMState, &[String], &mut Output) -> CommandResult;
type Completer = fn(&WMState, &[String], &mut Complete);

pub(crate) struct Command {
    pub(crate) name: &'static str,
    run: Run,
    /// Called with the arguments before the one being completed
    complete: Completer,
}

/// Collects the completion candidates for one argument
#[derive(Debug, Default)]
pub(crate) struct Complete {
    needle: String,
    /// Completed words get a trailing space, for shells that insert the words as they are
    shell: bool,
    words: Vec<String>,
    no_parameter: bool,
}

impl Complete {
    pub(crate) fn new(needle: &str, shell: bool) -> Self {
        Self {
            needle: needle.to_string(),
            shell,
            ..Self::default()
        }
    }

    pub(crate) fn needle(&self) -> &str {
        &self.needle
    }

    /// Offer a complete word
    pub(crate) fn full(&mut self, word: impl AsRef<str>) {
        let word = word.as_ref();
        if word.starts_with(&self.needle) {
            let suffix = if self.shell { " " } else { "" };
            self.words.push(format!("{}{}", word, suffix));
        }
    }

    /// Offer the beginning of a word, like an object path that goes on
    pub(crate) fn partial(&mut self, word: impl AsRef<str>) {
        let word = word.as_ref();
        if word.starts_with(&self.needle) {
            self.words.push(word.to_string());
        }
    }

    pub(crate) fn full_all<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.full(word);
        }
    }

    /// The command takes no argument at this position
    pub(crate) fn none(&mut self) {
        self.no_parameter = true;
    }

    pub(crate) fn words(&self) -> &[String] {
        &self.words
    }
}

fn all() -> impl Iterator<Item = &'static Command> {
    meta::COMMANDS
        .iter()
        .chain(attr::COMMANDS)
        .chain(tag::COMMANDS)
        .chain(frame::COMMANDS)
        .chain(monitor::COMMANDS)
        .chain(bind::COMMANDS)
        .chain(rule::COMMANDS)
}

pub(crate) fn find(name: &str) -> Option<&'static Command> {
    all().find(|c| c.name == name)
}

pub(crate) fn names() -> Vec<&'static str> {
    let mut names = all().map(|c| c.name).collect::<Vec<_>>();
    names.sort_unstable();
    names
}

/// Run a command line and return its exit status, errors end up on stderr prefixed with the
/// command name
pub(crate) fn run(state: &mut WMState, args: &[String], out: &mut Output) -> i32 {
    let (name, rest) = match args.split_first() {
        Some(split) => split,
        None => return ExitCode::Success.code(),
    };
    let command = match find(name) {
        Some(command) => command,
        None => {
            out.eprintln(format!("Command \"{}\" not found", name));
            return ExitCode::CommandNotFound.code();
        }
    };
    match (command.run)(state, rest, out) {
        Ok(()) => ExitCode::Success.code(),
        Err(e) => {
            if !e.msg.is_empty() {
                let _ = writeln!(out.stderr, "{}: {}", name, e.msg);
            }
            e.code.code()
        }
    }
}

/// Run a nested command line and turn its status back into a result
pub(crate) fn run_nested(state: &mut WMState, args: &[String], out: &mut Output) -> CommandResult {
    match run(state, args, out) {
        0 => Ok(()),
        status => Err(CommandError::silent(ExitCode::from_code(status))),
    }
}

/// Complete the argument at `index` of `args`
pub(crate) fn complete(state: &WMState, index: usize, args: &[String], c: &mut Complete) {
    if index == 0 {
        c.full_all(names());
        return;
    }
    let command = match args.first().and_then(|name| find(name)) {
        Some(command) => command,
        None => return,
    };
    let before = &args[1..index.min(args.len())];
    (command.complete)(state, before, c);
}

/// Completer of commands without arguments
fn no_args(_: &WMState, _: &[String], c: &mut Complete) {
    c.none();
}

/// Accept at most `n` arguments, the values of which can't be completed
fn up_to<const N: usize>(_: &WMState, before: &[String], c: &mut Complete) {
    if before.len() >= N {
        c.none();
    }
}

/// Complete a nested command line, used by all commands that run other commands
fn complete_nested(state: &WMState, args: &[String], c: &mut Complete) {
    let mut line = args.to_vec();
    line.push(c.needle().to_string());
    complete(state, args.len(), &line, c);
}

/// Check the number of arguments
fn expect_args(args: &[String], min: usize) -> CommandResult {
    if args.len() < min {
        return Err(CommandError::need_more_args());
    }
    Ok(())
}

/// Parse `on`, `off`, `toggle` and friends against the current state
fn parse_switch(arg: Option<&String>, current: bool) -> Result<bool, CommandError> {
    match arg.map(String::as_str) {
        None | Some("toggle") => Ok(!current),
        Some("on") | Some("true") | Some("1") => Ok(true),
        Some("off") | Some("false") | Some("0") => Ok(false),
        Some(other) => Err(CommandError::failed(format!(
            "Invalid argument \"{}\", expected on, off or toggle",
            other
        ))),
    }
}

const SWITCHES: &[&str] = &["on", "off", "toggle"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_unique() {
        let names = names();
        let mut unique = names.clone();
        unique.dedup();
        assert_eq!(names, unique);
    }

    #[test]
    fn completion_words() {
        let mut c = Complete::new("to", true);
        c.full_all(["toggle", "true", "tag"]);
        c.partial("tags.");
        assert_eq!(c.words(), &["toggle ".to_string()]);

        let mut c = Complete::new("ta", false);
        c.full("tag");
        c.partial("tags.");
        assert_eq!(c.words(), &["tag".to_string(), "tags.".to_string()]);
    }

    #[test]
    fn switches() {
        assert_eq!(parse_switch(None, true), Ok(false));
        assert_eq!(parse_switch(Some(&"on".to_string()), true), Ok(true));
        assert!(parse_switch(Some(&"maybe".to_string()), true).is_err());
    }
}
