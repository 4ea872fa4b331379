//! The fixed set of shell commands and the table that dispatches them.

use std::{collections::BTreeMap, fmt::Display, io::Write};

use tracing::debug;

use crate::error::CommandError;
use crate::level::Level;
use crate::path::{resolve, resolve_key, split_key};

/// A command handler. It gets the current level and every argument of the
/// line (the command name included) and returns the level that becomes
/// current afterwards.
pub type Handler =
    for<'c, 'o, 'a, 'tx> fn(&'c mut Context<'o>, Level<'tx>, &'a [String]) -> Level<'tx>;

/// Output settings shared by every command of a session.
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Print values as byte lists instead of text.
    pub raw: bool,
}

/// Everything a handler may touch besides the level it runs on.
pub struct Context<'a> {
    out: &'a mut dyn Write,
    options: Options,
    commands: &'a CommandTable,
    error: Option<std::io::Error>,
}

impl<'a> Context<'a> {
    pub fn new(out: &'a mut dyn Write, options: Options, commands: &'a CommandTable) -> Self {
        Self {
            out,
            options,
            commands,
            error: None,
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Print one line of output. After the first write failure the rest of
    /// the command's output is dropped; [`Context::finish`] returns it.
    pub fn println(&mut self, line: impl Display) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{line}") {
            self.error = Some(err);
        }
    }

    pub fn report(&mut self, err: CommandError) {
        debug!(error = ?err, "command failed");
        self.println(err);
    }

    pub fn finish(self) -> std::io::Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// One entry of the command table.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub handler: Handler,
}

/// Maps command names to their handlers. Built once and only read after.
pub struct CommandTable {
    commands: BTreeMap<&'static str, Command>,
}

impl CommandTable {
    /// The commands understood by the shell.
    pub fn builtin() -> Self {
        let commands = [
            Command {
                name: "ls",
                usage: "ls [path]",
                summary: "list keys for buckets and values at this level. '/' denotes buckets",
                handler: ls,
            },
            Command {
                name: "cd",
                usage: "cd [path]",
                summary: "change bucket level. '..' goes back, no path goes to root.",
                handler: cd,
            },
            Command {
                name: "get",
                usage: "get <path>",
                summary: "dump bucket entry.",
                handler: get,
            },
            Command {
                name: "put",
                usage: "put <path> <value>",
                summary: "add bucket entry.",
                handler: put,
            },
            Command {
                name: "mkdir",
                usage: "mkdir <path>",
                summary: "creates a new bucket.",
                handler: mkdir,
            },
            Command {
                name: "help",
                usage: "help",
                summary: "print this list of commands.",
                handler: help,
            },
        ];

        Self {
            commands: commands.into_iter().map(|c| (c.name, c)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }
}

fn ls<'tx>(cx: &mut Context<'_>, level: Level<'tx>, args: &[String]) -> Level<'tx> {
    let target = match args.get(1) {
        Some(path) => match resolve(&level, path) {
            Some(target) => target,
            None => {
                cx.report(CommandError::Navigation {
                    action: "list path".into(),
                    path: path.clone(),
                });
                return level;
            }
        },
        None => level.clone(),
    };

    for entry in target.list() {
        cx.println(entry);
    }
    level
}

fn cd<'tx>(cx: &mut Context<'_>, level: Level<'tx>, args: &[String]) -> Level<'tx> {
    let Some(path) = args.get(1) else {
        return level.top();
    };

    resolve(&level, path).unwrap_or_else(|| {
        cx.report(CommandError::Navigation {
            action: "change directory to".into(),
            path: path.clone(),
        });
        level
    })
}

fn get<'tx>(cx: &mut Context<'_>, level: Level<'tx>, args: &[String]) -> Level<'tx> {
    let Some(path) = args.get(1) else {
        cx.report(CommandError::MissingOperand("Missing key in get command"));
        return level;
    };

    match resolve_key(&level, path).and_then(|(target, key)| target.get(key)) {
        Some(data) => {
            let text = format_value(&data, cx.options().raw);
            cx.println(text);
        }
        None => {
            let (_, key) = split_key(path);
            cx.report(CommandError::NoData(key.into()));
        }
    }
    level
}

fn put<'tx>(cx: &mut Context<'_>, level: Level<'tx>, args: &[String]) -> Level<'tx> {
    let (Some(path), Some(value)) = (args.get(1), args.get(2)) else {
        cx.report(CommandError::MissingOperand(
            "Put command must specify key and value",
        ));
        return level;
    };

    match resolve_key(&level, path) {
        Some((target, key)) => {
            if let Err(source) = target.put(key, value) {
                cx.report(CommandError::WriteRejected {
                    action: format!("store {value} at {key}"),
                    source,
                });
            }
        }
        None => cx.report(CommandError::Navigation {
            action: format!("put {value} at path"),
            path: path.clone(),
        }),
    }
    level
}

fn mkdir<'tx>(cx: &mut Context<'_>, level: Level<'tx>, args: &[String]) -> Level<'tx> {
    let Some(path) = args.get(1) else {
        cx.report(CommandError::MissingOperand(
            "Mkdir command must specify key",
        ));
        return level;
    };

    match resolve_key(&level, path) {
        Some((target, key)) => {
            if let Err(source) = target.mkdir(key) {
                cx.report(CommandError::WriteRejected {
                    action: format!("create bucket at key {key}"),
                    source,
                });
            }
        }
        None => cx.report(CommandError::Navigation {
            action: "create bucket at path".into(),
            path: path.clone(),
        }),
    }
    level
}

fn help<'tx>(cx: &mut Context<'_>, level: Level<'tx>, _args: &[String]) -> Level<'tx> {
    let commands = cx.commands;
    for command in commands.iter() {
        cx.println(format_args!("\t{} - {}", command.usage, command.summary));
    }
    cx.println("\texit - exit program.");
    level
}

/// Render a stored value: as text, or as a byte list like `[104 105]`.
pub fn format_value(data: &[u8], raw: bool) -> String {
    if !raw {
        return String::from_utf8_lossy(data).into_owned();
    }

    let bytes: Vec<String> = data.iter().map(u8::to_string).collect();
    format!("[{}]", bytes.join(" "))
}
