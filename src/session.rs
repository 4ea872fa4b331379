use std::io::{BufRead, Write};

use tracing::{debug, trace};

use crate::{
    commands::{CommandTable, Context, Options},
    error::CommandError,
    level::Level,
    tokenizer::tokenize,
};

/// Printed before every line read by [`Session::run`].
pub const PROMPT: &str = "$ ";

/// Name of the command that ends the session.
pub const EXIT_COMMAND: &str = "exit";

/// What the loop should do after a line has been executed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One shell session: the current level plus the commands that act on it.
pub struct Session<'tx> {
    level: Level<'tx>,
    commands: &'tx CommandTable,
    options: Options,
}

impl<'tx> Session<'tx> {
    pub fn new(root: Level<'tx>, commands: &'tx CommandTable, options: Options) -> Self {
        Self {
            level: root,
            commands,
            options,
        }
    }

    /// The level commands currently run against.
    pub fn level(&self) -> &Level<'tx> {
        &self.level
    }

    /// Tokenize and dispatch a single line, writing its output to `out`.
    pub fn execute(&mut self, line: &str, out: &mut dyn Write) -> std::io::Result<Flow> {
        let args = tokenize(line.trim());
        let Some(name) = args.first() else {
            return Ok(Flow::Continue);
        };

        if name == EXIT_COMMAND {
            return Ok(Flow::Exit);
        }

        match self.commands.get(name) {
            Some(command) => {
                trace!(command = command.name, args = ?&args[1..], "dispatching");
                let mut cx = Context::new(out, self.options, self.commands);
                self.level = (command.handler)(&mut cx, self.level.clone(), &args);
                cx.finish()?;
            }
            None => writeln!(out, "{}", CommandError::UnknownCommand(name.clone()))?,
        }

        Ok(Flow::Continue)
    }

    /// Read lines from `input` until `exit` or end of input.
    pub fn run<I, O>(&mut self, mut input: I, mut output: O) -> std::io::Result<()>
    where
        I: BufRead,
        O: Write,
    {
        let mut buffer = String::new();

        loop {
            output.write_all(PROMPT.as_bytes())?;
            output.flush()?;

            buffer.clear();
            if input.read_line(&mut buffer)? == 0 {
                debug!("end of input");
                break;
            }

            if self.execute(&buffer, &mut output)? == Flow::Exit {
                break;
            }
        }

        writeln!(output)?;
        output.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Tx;
    use std::io::Cursor;

    fn run_script(tx: &Tx<'_>, options: Options, script: &str) -> String {
        let table = CommandTable::builtin();
        let mut session = Session::new(Level::root(tx), &table, options);
        let mut output = Vec::new();

        session
            .run(Cursor::new(script.as_bytes()), &mut output)
            .unwrap();

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let tx = Tx::in_memory();

        let output = run_script(&tx, Options::default(), "");

        assert_eq!(output, "$ \n");
    }

    #[test]
    fn test_exit_stops_reading() {
        // Arrange
        let tx = Tx::in_memory();
        let script = "mkdir a\nexit\nmkdir b\n";

        // Act
        let output = run_script(&tx, Options::default(), script);

        // Assert
        assert_eq!(output, "$ $ \n");
        assert_eq!(Level::root(&tx).list(), vec!["a/"]);
    }

    #[test]
    fn test_full_session() {
        // Arrange
        let tx = Tx::in_memory();
        let script = [
            "mkdir users",
            "cd users",
            "put ferris \"the crab\"",
            "mkdir admins",
            "ls",
            "get ferris",
            "cd admins",
            "get ../ferris",
            "cd ..",
            "cd ../users/./admins",
            "put root yes",
            "cd",
            "ls users/admins",
        ]
        .join("\n");

        // Act
        let output = run_script(&tx, Options::default(), &script);

        // Assert
        let expected = [
            "$ $ $ $ $ admins/",
            "ferris",
            "$ the crab",
            "$ $ the crab",
            "$ $ $ $ $ root",
            "$ ",
            "",
        ]
        .join("\n");
        assert_eq!(output, expected);
    }

    #[test]
    fn test_errors_do_not_end_session() {
        // Arrange
        let tx = Tx::in_memory();
        let script = "frobnicate\ncd nowhere\nget\nput k v\nls nowhere\nmkdir ok\n";

        // Act
        let output = run_script(&tx, Options::default(), script);

        // Assert
        assert_eq!(
            output,
            [
                "$ Unrecognized command: frobnicate",
                "$ Unable to change directory to nowhere",
                "$ Missing key in get command",
                "$ Unable to store v at k: cannot store values at root level",
                "$ Unable to list path nowhere",
                "$ $ ",
                "",
            ]
            .join("\n")
        );
        assert_eq!(Level::root(&tx).list(), vec!["ok/"]);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let tx = Tx::in_memory();

        let output = run_script(&tx, Options::default(), "\n   \n\t\n");

        assert_eq!(output, "$ $ $ $ \n");
    }

    #[test]
    fn test_execute_tracks_level() {
        // Arrange
        let tx = Tx::in_memory();
        let table = CommandTable::builtin();
        let mut session = Session::new(Level::root(&tx), &table, Options::default());
        let mut sink = Vec::new();

        // Act
        session.execute("mkdir a", &mut sink).unwrap();
        session.execute("cd a", &mut sink).unwrap();
        let flow = session.execute("  exit  ", &mut sink).unwrap();

        // Assert
        assert_eq!(session.level().display_path(), "/a");
        assert_eq!(flow, Flow::Exit);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_raw_option_reaches_handlers() {
        let tx = Tx::in_memory();
        let script = "mkdir a\nput a/k AB\nget a/k\n";

        let output = run_script(&tx, Options { raw: true }, script);

        assert_eq!(output, "$ $ $ [65 66]\n$ \n");
    }
}
