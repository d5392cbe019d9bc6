//! Migration script parser.
//!
//! A script is split into an `Up` and a `Down` section by annotation comments:
//!
//! ```sql
//! -- +migrate Up
//! CREATE TABLE users (id INTEGER PRIMARY KEY);
//!
//! -- +migrate StatementBegin
//! CREATE MACRO add_one(x) AS x + 1;
//! -- +migrate StatementEnd
//!
//! -- +migrate Down
//! DROP TABLE users;
//! ```
//!
//! Outside a `StatementBegin`/`StatementEnd` block, a statement ends at the
//! first line whose last non-comment word ends with `;`. Plain `-- ` comment
//! lines are dropped and lines before the first annotation are ignored.

use crate::migration::Migration;
use crate::migration_id::MigrationId;
use std::fmt;
use thiserror::Error;

const COMMAND_MARKER: &str = "+migrate";
const COMMAND_PREFIX: &str = "-- +migrate";
const OPTION_NO_TRANSACTION: &str = "notransaction";

/// Errors produced while splitting a script into statements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The script bytes are not UTF-8
    #[error("content is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// `-- +migrate` with nothing after it
    #[error("line {line}: incomplete migration command")]
    MissingCommand { line: usize },

    /// `-- +migrate Foo` for an unrecognized `Foo`
    #[error("line {line}: unknown migration command '{command}'")]
    UnknownCommand { line: usize, command: String },

    /// A direction annotation while the previous statement is still open
    #[error(
        "line {line}: the statement before '-- +migrate {direction}' must be ended by a \
         semicolon or '-- +migrate StatementEnd'"
    )]
    UnterminatedBeforeDirection { line: usize, direction: Direction },

    /// End of input inside a `StatementBegin` block
    #[error("line {line}: saw '-- +migrate StatementBegin' with no matching '-- +migrate StatementEnd'")]
    UnclosedStatementBlock { line: usize },

    /// Neither `Up` nor `Down` annotation present
    #[error("no Up/Down annotations found, so no statements would be executed")]
    NoAnnotations,

    /// Trailing text that never reached a terminator
    #[error("line {line}: the last statement must be ended by a semicolon or '-- +migrate StatementEnd'")]
    UnterminatedStatement { line: usize },
}

/// Section of a migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("Up"),
            Direction::Down => f.write_str("Down"),
        }
    }
}

/// A `-- +migrate <name> [options...]` line.
struct Command<'a> {
    name: &'a str,
    options: Vec<&'a str>,
}

impl Command<'_> {
    fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| *o == option)
    }
}

fn parse_command(line: &str, line_no: usize) -> Result<Command<'_>, ParseError> {
    // First word is "--"
    let mut words = line.split_whitespace().skip(1);
    match words.next() {
        Some(COMMAND_MARKER) => {}
        other => {
            return Err(ParseError::UnknownCommand {
                line: line_no,
                command: other.unwrap_or_default().to_string(),
            })
        }
    }
    let name = words
        .next()
        .ok_or(ParseError::MissingCommand { line: line_no })?;
    Ok(Command {
        name,
        options: words.collect(),
    })
}

/// Whether the last word before any trailing `--` comment ends with `;`.
fn ends_with_semicolon(line: &str) -> bool {
    line.split_whitespace()
        .take_while(|word| !word.starts_with("--"))
        .last()
        .is_some_and(|word| word.ends_with(';'))
}

/// Accumulates the statements of both sections.
#[derive(Default)]
struct Sections {
    up: Vec<String>,
    down: Vec<String>,
    up_transactional: Option<bool>,
}

impl Sections {
    fn push(&mut self, direction: Direction, statement: &str) {
        let statement = statement.trim_end();
        if statement.trim().is_empty() {
            return;
        }
        match direction {
            Direction::Up => self.up.push(statement.to_string()),
            Direction::Down => self.down.push(statement.to_string()),
        }
    }
}

/// Parse a migration script into a [`Migration`] with the given id.
///
/// Pure: performs no I/O. The returned migration has no `path`; the caller
/// attaches one when the script came from disk.
pub fn parse_migration(id: MigrationId, content: &[u8]) -> Result<Migration, ParseError> {
    let text = std::str::from_utf8(content).map_err(|e| ParseError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;

    let mut sections = Sections::default();
    let mut direction: Option<Direction> = None;
    let mut block_start: Option<usize> = None;
    let mut block_ended = false;
    let mut buf = String::new();
    let mut buf_start: Option<usize> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if line.starts_with("-- ") && !line.starts_with("-- +") {
            continue;
        }

        if line.starts_with(COMMAND_PREFIX) {
            let command = parse_command(line, line_no)?;
            match command.name {
                "Up" | "Down" => {
                    let next = if command.name == "Up" {
                        Direction::Up
                    } else {
                        Direction::Down
                    };
                    if block_start.is_some() || !buf.trim().is_empty() {
                        return Err(ParseError::UnterminatedBeforeDirection {
                            line: line_no,
                            direction: next,
                        });
                    }
                    buf.clear();
                    buf_start = None;
                    if next == Direction::Up {
                        // notransaction on any Up annotation sticks
                        sections.up_transactional = Some(
                            sections.up_transactional.unwrap_or(true)
                                && !command.has_option(OPTION_NO_TRANSACTION),
                        );
                    }
                    for option in &command.options {
                        if *option != OPTION_NO_TRANSACTION {
                            log::warn!("line {line_no}: ignoring unknown migrate option '{option}'");
                        }
                    }
                    direction = Some(next);
                }
                "StatementBegin" => {
                    if direction.is_some() {
                        block_start = Some(line_no);
                    }
                }
                "StatementEnd" => {
                    if direction.is_some() {
                        block_ended = block_start.is_some();
                        block_start = None;
                    }
                }
                other => {
                    return Err(ParseError::UnknownCommand {
                        line: line_no,
                        command: other.to_string(),
                    })
                }
            }
        }

        let Some(current) = direction else {
            continue;
        };

        if !line.starts_with("-- +") {
            if buf_start.is_none() && !line.trim().is_empty() {
                buf_start = Some(line_no);
            }
            buf.push_str(line);
            buf.push('\n');
        }

        if (block_start.is_none() && ends_with_semicolon(line)) || block_ended {
            block_ended = false;
            sections.push(current, &buf);
            buf.clear();
            buf_start = None;
        }
    }

    if let Some(line) = block_start {
        return Err(ParseError::UnclosedStatementBlock { line });
    }
    if direction.is_none() {
        return Err(ParseError::NoAnnotations);
    }
    if !buf.trim().is_empty() {
        return Err(ParseError::UnterminatedStatement {
            line: buf_start.unwrap_or(1),
        });
    }

    Ok(Migration {
        id,
        up_statements: sections.up,
        down_statements: sections.down,
        transactional: sections.up_transactional.unwrap_or(true),
        path: None,
    })
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
