//! Control surface: a synchronous command adapter over the engine
//!
//! Both front-ends speak the same small grammar. The TUI feeds it from its
//! command bar; `line` mode feeds it from stdin or a script file.
//!
//! ```text
//! list
//! get <name>
//! set <name> <value> [for <seconds>]
//! sweep <name> <start> <stop> <step> [every <seconds>] [shuffle [seed <n>]]
//! cancel <name>
//! wait <seconds>
//! help
//! quit
//! ```
//!
//! Commands never block on the engine's timers. `wait` only yields a
//! `Reply::Pause`; the line session sleeps on it, the TUI refuses it.

use crate::engine::{Activity, Engine, SweepOrder, duration_from_secs};
use crate::error::Result;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Delay between sweep steps when `every` is omitted
pub const DEFAULT_SWEEP_DELAY_SECS: f64 = 1.0;

/// A parsed operator command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Get {
        name: String,
    },
    Set {
        name: String,
        value: String,
        duration: Option<f64>,
    },
    Sweep {
        name: String,
        start: f64,
        stop: f64,
        step: f64,
        delay: f64,
        order: SweepOrder,
    },
    Cancel {
        name: String,
    },
    Wait {
        seconds: f64,
    },
    Help,
    Quit,
}

/// Errors from parsing a command line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{command}' needs <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("<{argument}> must be a number, got '{text}'")]
    InvalidNumber {
        argument: &'static str,
        text: String,
    },

    #[error("Unexpected '{0}'")]
    UnexpectedArgument(String),
}

struct Tokens<'a> {
    command: &'static str,
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn required(&mut self, argument: &'static str) -> std::result::Result<&'a str, CommandError> {
        self.inner.next().ok_or(CommandError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn number(&mut self, argument: &'static str) -> std::result::Result<f64, CommandError> {
        let text = self.required(argument)?;
        text.parse().map_err(|_| CommandError::InvalidNumber {
            argument,
            text: text.to_string(),
        })
    }

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }

    fn finish(mut self) -> std::result::Result<(), CommandError> {
        match self.inner.next() {
            Some(extra) => Err(CommandError::UnexpectedArgument(extra.to_string())),
            None => Ok(()),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        let command: &'static str = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => "list",
            "get" => "get",
            "set" => "set",
            "sweep" => "sweep",
            "cancel" => "cancel",
            "wait" => "wait",
            "help" | "?" => "help",
            "quit" | "exit" => "quit",
            _ => return Err(CommandError::UnknownCommand(verb.to_string())),
        };
        let mut tokens = Tokens {
            command,
            inner: words,
        };

        let parsed = match command {
            "list" => Self::List,
            "help" => Self::Help,
            "quit" => Self::Quit,
            "get" => Self::Get {
                name: tokens.required("name")?.to_string(),
            },
            "cancel" => Self::Cancel {
                name: tokens.required("name")?.to_string(),
            },
            "wait" => Self::Wait {
                seconds: tokens.number("seconds")?,
            },
            "set" => {
                let name = tokens.required("name")?.to_string();
                let value = tokens.required("value")?.to_string();
                let duration = match tokens.next() {
                    None => None,
                    Some(word) if word.eq_ignore_ascii_case("for") => {
                        Some(tokens.number("seconds")?)
                    }
                    Some(other) => return Err(CommandError::UnexpectedArgument(other.to_string())),
                };
                Self::Set {
                    name,
                    value,
                    duration,
                }
            }
            _ => {
                let name = tokens.required("name")?.to_string();
                let start = tokens.number("start")?;
                let stop = tokens.number("stop")?;
                let step = tokens.number("step")?;
                let mut delay = DEFAULT_SWEEP_DELAY_SECS;
                let mut order = SweepOrder::Ascending;
                while let Some(word) = tokens.next() {
                    match word.to_ascii_lowercase().as_str() {
                        "every" => delay = tokens.number("seconds")?,
                        "shuffle" => order = SweepOrder::shuffled(),
                        "seed" if order != SweepOrder::Ascending => {
                            let seed = tokens.required("seed")?;
                            let seed = seed.parse().map_err(|_| CommandError::InvalidNumber {
                                argument: "seed",
                                text: seed.to_string(),
                            })?;
                            order = SweepOrder::seeded(seed);
                        }
                        _ => return Err(CommandError::UnexpectedArgument(word.to_string())),
                    }
                }
                Self::Sweep {
                    name,
                    start,
                    stop,
                    step,
                    delay,
                    order,
                }
            }
        };
        tokens.finish()?;
        Ok(parsed)
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Lines to show the operator
    Lines(Vec<String>),
    /// The session should end
    Quit,
    /// A line session should pause before its next command
    Pause(Duration),
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self::Lines(vec![text.into()])
    }

    /// Lines to show, empty for `Quit` and `Pause`
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Lines(lines) => lines,
            Self::Quit | Self::Pause(_) => &[],
        }
    }
}

/// Help text for the command grammar
pub fn help_lines() -> Vec<String> {
    [
        "list                                   Show every variable",
        "get <name>                             Show a variable's value",
        "set <name> <value> [for <s>]           Set a value, optionally for s seconds",
        "sweep <name> <start> <stop> <step>     Step a continuous variable through a range",
        "      [every <s>] [shuffle [seed <n>]]   (default every 1s, ascending)",
        "cancel <name>                          Stop a running sweep",
        "wait <s>                               Pause a line-mode session",
        "quit                                   Leave",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Executes commands against an engine
pub struct ControlSurface<'a> {
    engine: &'a Engine,
}

impl<'a> ControlSurface<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Execute a parsed command
    pub fn execute(&self, command: Command) -> Result<Reply> {
        debug!("Executing {:?}", command);
        match command {
            Command::List => {
                let lines = self
                    .engine
                    .list_variables()?
                    .into_iter()
                    .map(|v| {
                        let mut line = format!("{:<14} {:<12} {}", v.name, v.value, v.domain);
                        if v.activity != Activity::Idle {
                            line.push_str(&format!("  [{}]", v.activity));
                        }
                        line
                    })
                    .collect();
                Ok(Reply::Lines(lines))
            }
            Command::Get { name } => {
                let value = self.engine.get_value(&name)?;
                let mut line = format!("• Current value for {} is '{}'", name, value);
                let activity = self.engine.activity(&name)?;
                if activity != Activity::Idle {
                    line.push_str(&format!(" ({})", activity));
                }
                Ok(Reply::line(line))
            }
            Command::Set {
                name,
                value,
                duration,
            } => {
                let value = self.engine.domain(&name)?.parse_value(&value)?;
                self.engine.set_value(&name, value.clone(), duration)?;
                Ok(Reply::line(match duration {
                    Some(secs) => format!(
                        "• Value for {} is set to '{}' for {} seconds",
                        name, value, secs
                    ),
                    None => format!("• Value for {} is changed to '{}'", name, value),
                }))
            }
            Command::Sweep {
                name,
                start,
                stop,
                step,
                delay,
                order,
            } => {
                let count = self
                    .engine
                    .start_sweep(&name, start, stop, step, order, delay)?;
                Ok(Reply::line(format!(
                    "• Sweeping {} through {} value(s) from {} to {} by {}, {} every {}s",
                    name, count, start, stop, step, order, delay
                )))
            }
            Command::Cancel { name } => {
                let was_running = self.engine.cancel_sweep(&name)?;
                let value = self.engine.get_value(&name)?;
                Ok(Reply::line(if was_running {
                    format!("• Sweep on {} cancelled at '{}'", name, value)
                } else {
                    format!("• No sweep running on {}", name)
                }))
            }
            Command::Wait { seconds } => {
                Ok(Reply::Pause(duration_from_secs("wait", seconds)?))
            }
            Command::Help => Ok(Reply::Lines(help_lines())),
            Command::Quit => Ok(Reply::Quit),
        }
    }

    /// Parse and execute one line, rendering any failure as a reply line
    pub fn execute_line(&self, line: &str) -> Reply {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => return Reply::Lines(Vec::new()),
            Err(e) => return Reply::line(format!("✗ {}", e)),
        };
        match self.execute(command) {
            Ok(reply) => reply,
            Err(e) => {
                if !e.is_user_error() {
                    warn!("Command failed: {}", e);
                }
                Reply::line(format!("✗ {}", e))
            }
        }
    }

    /// Run a line-oriented session until `quit` or end of input.
    ///
    /// Blank lines and lines starting with `#` are skipped, so command
    /// scripts can be commented.
    pub fn run_session<R: BufRead, W: Write>(
        &self,
        input: R,
        output: &mut W,
        prompt: bool,
    ) -> Result<()> {
        if prompt {
            write!(output, "> ")?;
            output.flush()?;
        }
        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                match self.execute_line(trimmed) {
                    Reply::Quit => return Ok(()),
                    Reply::Pause(period) => thread::sleep(period),
                    Reply::Lines(lines) => {
                        for text in lines {
                            writeln!(output, "{}", text)?;
                        }
                    }
                }
            }
            if prompt {
                write!(output, "> ")?;
                output.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("list".parse::<Command>(), Ok(Command::List));
        assert_eq!("LS".parse::<Command>(), Ok(Command::List));
        assert_eq!("?".parse::<Command>(), Ok(Command::Help));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!(
            "get spindle".parse::<Command>(),
            Ok(Command::Get {
                name: "spindle".to_string()
            })
        );
    }

    #[test]
    fn test_parse_set_with_and_without_duration() {
        assert_eq!(
            "set spindle ACTIVE".parse::<Command>(),
            Ok(Command::Set {
                name: "spindle".to_string(),
                value: "ACTIVE".to_string(),
                duration: None,
            })
        );
        assert_eq!(
            "set spindle ACTIVE for 5".parse::<Command>(),
            Ok(Command::Set {
                name: "spindle".to_string(),
                value: "ACTIVE".to_string(),
                duration: Some(5.0),
            })
        );
    }

    #[test]
    fn test_parse_sweep_defaults_and_options() {
        assert_eq!(
            "sweep c1 0 1 0.25".parse::<Command>(),
            Ok(Command::Sweep {
                name: "c1".to_string(),
                start: 0.0,
                stop: 1.0,
                step: 0.25,
                delay: DEFAULT_SWEEP_DELAY_SECS,
                order: SweepOrder::Ascending,
            })
        );
        assert_eq!(
            "sweep c1 0 10 2 every 0.1 shuffle seed 9".parse::<Command>(),
            Ok(Command::Sweep {
                name: "c1".to_string(),
                start: 0.0,
                stop: 10.0,
                step: 2.0,
                delay: 0.1,
                order: SweepOrder::seeded(9),
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!(
            "jump c1".parse::<Command>(),
            Err(CommandError::UnknownCommand(_))
        ));
        assert_eq!(
            "set spindle".parse::<Command>(),
            Err(CommandError::MissingArgument {
                command: "set",
                argument: "value"
            })
        );
        assert!(matches!(
            "sweep c1 0 ten 1".parse::<Command>(),
            Err(CommandError::InvalidNumber { argument: "stop", .. })
        ));
        assert!(matches!(
            "set c1 1 during 5".parse::<Command>(),
            Err(CommandError::UnexpectedArgument(_))
        ));
        assert!(matches!(
            "get c1 c2".parse::<Command>(),
            Err(CommandError::UnexpectedArgument(_))
        ));
        // A seed only makes sense for a shuffled sweep
        assert!("sweep c1 0 1 0.5 seed 3".parse::<Command>().is_err());
    }
}
