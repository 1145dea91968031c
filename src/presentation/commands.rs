// Terminal command parsing
use crate::application::intents::Intent;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Intent(Intent),
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("{0}")]
    InvalidValue(String),
}

pub const HELP: &str = "commands: open | close | add <filter> | remove <filter> | \
select <suggestion> | scale <Daily|Weekly|Monthly> | agg <Sum|Avg|Count> | query [text] | quit";

/// Parse one input line. Arguments keep their inner spaces.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (line, ""),
    };

    let intent = match name.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(Command::Quit),
        "open" => Intent::OpenDropdown(true),
        "close" => Intent::OpenDropdown(false),
        "add" => Intent::AddFilter(required(arg, "add")?),
        "remove" => Intent::RemoveFilter(required(arg, "remove")?),
        "select" => Intent::SelectSuggestion(required(arg, "select")?),
        "scale" => Intent::SetScale(
            required(arg, "scale")?
                .parse()
                .map_err(CommandError::InvalidValue)?,
        ),
        "agg" => Intent::SetAggregator(
            required(arg, "agg")?
                .parse()
                .map_err(CommandError::InvalidValue)?,
        ),
        "query" => Intent::SetFreeText(arg.to_string()),
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Command::Intent(intent))
}

fn required(arg: &str, command: &'static str) -> Result<String, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument(command))
    } else {
        Ok(arg.to_string())
    }
}
