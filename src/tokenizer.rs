//! Splits a command line into arguments.
//!
//! # Grammar
//!
//! ```md
//! line     := (blank argument)* blank;
//! argument := (quoted | bare)+;
//! quoted   := '"' ('\"' | ^'"')* '"'?;
//! bare     := (^('"' | blank))+;
//! ```
//!
//! Quoted and bare pieces that touch are glued into one argument, so
//! `do"I begin?"` is the single argument `doI begin?`. A quote that is never
//! closed runs to the end of the line. Inside quotes `\"` is a literal quote;
//! any other backslash is kept as is.

use tracing::warn;
use winnow::{
    combinator::{alt, opt, preceded, repeat, terminated},
    prelude::*,
    token::{none_of, take_while},
};

type ParserResult<T> = winnow::PResult<T>;

/// Split `line` into its arguments.
///
/// An empty or blank line has no arguments. An empty trailing argument
/// (`""` at the very end of the line) is dropped.
pub fn tokenize(line: &str) -> Vec<String> {
    match line_arguments.parse(line) {
        Ok((mut args, separated)) => {
            if !separated && args.last().is_some_and(String::is_empty) {
                args.pop();
            }
            args
        }
        // The grammar accepts every line; this arm is not expected to run.
        Err(err) => {
            warn!("unable to split {line:?}: {err:?}");
            Vec::new()
        }
    }
}

/// Parse every argument of a line, and whether blanks follow the last one.
fn line_arguments(input: &mut &str) -> ParserResult<(Vec<String>, bool)> {
    (repeat(0.., preceded(blank, argument)), blank)
        .map(|(args, trailing): (Vec<String>, &str)| (args, !trailing.is_empty()))
        .parse_next(input)
}

fn argument(input: &mut &str) -> ParserResult<String> {
    repeat(1.., alt((quoted, bare)))
        .fold(String::new, |mut arg, piece: String| {
            arg.push_str(&piece);
            arg
        })
        .parse_next(input)
}

fn quoted(input: &mut &str) -> ParserResult<String> {
    preceded(
        '"',
        terminated(
            repeat(0.., alt(("\\\"".value('"'), none_of('"')))),
            opt('"'),
        ),
    )
    .parse_next(input)
}

fn bare(input: &mut &str) -> ParserResult<String> {
    take_while(1.., |c: char| c != '"' && !c.is_whitespace())
        .map(String::from)
        .parse_next(input)
}

fn blank<'i>(input: &mut &'i str) -> ParserResult<&'i str> {
    take_while(0.., char::is_whitespace).parse_next(input)
}
