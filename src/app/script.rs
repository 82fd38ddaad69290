//! Recorded event scripts
//!
//! One step per line, `#` starts a comment:
//!
//! ```text
//! # time  status data1 data2
//! 0       0x90   0     127
//! 200     0x90   0     0
//! 450     idle
//! 500     keys 0x99  36    100
//! ```
//!
//! A `keys` token sends the message on the keys port instead of the
//! button port.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::input::{EventError, InputEvent};
use crate::runtime::Millis;
use crate::surface::Port;

/// Errors reading or parsing a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected `<time_ms> idle` or `<time_ms> [keys] <status> <data1> <data2>`")]
    Malformed { line: usize },

    #[error("line {line}: `{text}` is not a number")]
    InvalidNumber { line: usize, text: String },

    #[error("line {line}: time {at_ms} goes back before {previous}")]
    OutOfOrder {
        line: usize,
        at_ms: Millis,
        previous: Millis,
    },

    #[error("line {line}: {source}")]
    Event {
        line: usize,
        #[source]
        source: EventError,
    },
}

/// What happens at one point in a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Message(Port, InputEvent),
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub at_ms: Millis,
    /// One-based source line
    pub line: usize,
    pub kind: StepKind,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StepKind::Message(Port::Buttons, event) => write!(f, "{:>6}ms {event}", self.at_ms),
            StepKind::Message(Port::Keys, event) => write!(f, "{:>6}ms keys {event}", self.at_ms),
            StepKind::Idle => write!(f, "{:>6}ms idle", self.at_ms),
        }
    }
}

/// Parsed script, steps in time order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Reads and parses a script file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut steps: Vec<Step> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }

            let step = parse_step(line, content)?;
            if let Some(previous) = steps.last()
                && step.at_ms < previous.at_ms
            {
                return Err(ScriptError::OutOfOrder {
                    line,
                    at_ms: step.at_ms,
                    previous: previous.at_ms,
                });
            }
            steps.push(step);
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time of the last step
    pub fn duration(&self) -> Millis {
        self.steps.last().map_or(0, |step| step.at_ms)
    }
}

fn parse_step(line: usize, content: &str) -> Result<Step, ScriptError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    let (time, rest) = fields.split_first().ok_or(ScriptError::Malformed { line })?;
    let at_ms = parse_number(line, time)?;

    let kind = match rest {
        ["idle"] => StepKind::Idle,
        fields => {
            let (port, event) = parse_routed(line, fields)?;
            StepKind::Message(port, event)
        }
    };

    Ok(Step { at_ms, line, kind })
}

/// Parses a bare `[keys] <status> <data1> <data2>` message
pub(crate) fn parse_message(line: usize, content: &str) -> Result<(Port, InputEvent), ScriptError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    parse_routed(line, &fields)
}

fn parse_routed(line: usize, fields: &[&str]) -> Result<(Port, InputEvent), ScriptError> {
    match fields {
        ["keys", status, data1, data2] => Ok((Port::Keys, parse_fields(line, [*status, *data1, *data2])?)),
        [status, data1, data2] => Ok((Port::Buttons, parse_fields(line, [*status, *data1, *data2])?)),
        _ => Err(ScriptError::Malformed { line }),
    }
}

fn parse_fields(line: usize, fields: [&str; 3]) -> Result<InputEvent, ScriptError> {
    let bytes = [
        parse_byte(line, fields[0])?,
        parse_byte(line, fields[1])?,
        parse_byte(line, fields[2])?,
    ];
    InputEvent::from_bytes(&bytes).map_err(|source| ScriptError::Event { line, source })
}

fn parse_number(line: usize, text: &str) -> Result<u64, ScriptError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| ScriptError::InvalidNumber {
        line,
        text: text.to_string(),
    })
}

fn parse_byte(line: usize, text: &str) -> Result<u8, ScriptError> {
    let value = parse_number(line, text)?;
    u8::try_from(value).map_err(|_| ScriptError::InvalidNumber {
        line,
        text: text.to_string(),
    })
}
