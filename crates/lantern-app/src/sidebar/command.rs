//! Input line parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything not starting with `/` is sent to the model.
    Prompt(String),
    Retry,
    Status,
    History,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(name) = trimmed.strip_prefix('/') else {
            return Command::Prompt(trimmed.to_string());
        };
        match name.to_ascii_lowercase().as_str() {
            "retry" => Command::Retry,
            "status" => Command::Status,
            "history" => Command::History,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a message and press Enter to ask the model.
  /retry     retry loading the model after a failure
  /status    show the engine state
  /history   print the conversation
  /quit      exit";
