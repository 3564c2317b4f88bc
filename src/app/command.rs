//! Parsing of the quiz prompt's input lines

use crate::quiz::DifficultyTier;

/// Parsed command from the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move to the next section: :next or :n
    Next,
    /// Move to the previous section: :prev or :p
    Prev,
    /// Jump to a section, 1-based: :goto <n>
    Goto(usize),
    /// Clear the result and answer again: :retry
    Retry,
    /// Request a fresh question after a failure: :regen
    Regenerate,
    /// Print the whole passage: :passage
    Passage,
    /// Show score and skill statistics: :stats
    Stats,
    /// Start the current passage over: :restart
    Restart,
    /// Generate a new passage, optionally at a given tier: :new [tier]
    New(Option<DifficultyTier>),
    /// Quit the application: :q or :quit
    Quit,
    /// Show help: :help or :h
    Help,
    /// Nothing to do: (empty command)
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument could not be understood
    InvalidArgument { command: String, argument: String },
}

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    /// Starts with `:`
    Command(ParseResult),
    /// Anything else that is not blank
    Answer(String),
    Blank,
}

/// Classify a prompt line as a command or an answer
pub fn parse_line(input: &str) -> Line {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Line::Blank
    } else if let Some(command) = trimmed.strip_prefix(':') {
        Line::Command(parse_command(command))
    } else {
        Line::Answer(trimmed.to_string())
    }
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "next" | "n" => ParseResult::Ok(Command::Next),
        "prev" | "p" | "back" => ParseResult::Ok(Command::Prev),
        "goto" | "g" => {
            if args.is_empty() {
                return ParseResult::MissingArgument("goto".to_string());
            }
            match args.parse::<usize>() {
                Ok(n) if n > 0 => ParseResult::Ok(Command::Goto(n)),
                _ => invalid("goto", args),
            }
        }
        "retry" | "r" => ParseResult::Ok(Command::Retry),
        "regen" | "regenerate" => ParseResult::Ok(Command::Regenerate),
        "passage" | "text" => ParseResult::Ok(Command::Passage),
        "stats" | "s" => ParseResult::Ok(Command::Stats),
        "restart" => ParseResult::Ok(Command::Restart),
        "new" => {
            if args.is_empty() {
                return ParseResult::Ok(Command::New(None));
            }
            match DifficultyTier::parse(args) {
                Some(tier) => ParseResult::Ok(Command::New(Some(tier))),
                None => invalid("new", args),
            }
        }
        "quit" | "q" => ParseResult::Ok(Command::Quit),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

fn invalid(command: &str, argument: &str) -> ParseResult {
    ParseResult::InvalidArgument { command: command.to_string(), argument: argument.to_string() }
}

/// Help text listing every command
pub const HELP: &str = "\
Type your answer and press Enter to submit it.

  :next, :n          next section
  :prev, :p          previous section
  :goto <n>          jump to section n
  :retry, :r         clear the result and answer again
  :regen             ask for a new question after a failure
  :passage           show the whole passage
  :stats             show score and skill statistics
  :restart           start this passage over
  :new [tier]        new passage (beginner, intermediate, advanced)
  :help, :h          this help
  :quit, :q          quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_command() {
        assert!(matches!(parse_command("q"), ParseResult::Ok(Command::Quit)));
        assert!(matches!(parse_command("quit"), ParseResult::Ok(Command::Quit)));
        assert!(matches!(parse_command("Q"), ParseResult::Ok(Command::Quit)));
    }

    #[test]
    fn parse_navigation_commands() {
        assert_eq!(parse_command("next"), ParseResult::Ok(Command::Next));
        assert_eq!(parse_command("n"), ParseResult::Ok(Command::Next));
        assert_eq!(parse_command("prev"), ParseResult::Ok(Command::Prev));
        assert_eq!(parse_command("back"), ParseResult::Ok(Command::Prev));
    }

    #[test]
    fn parse_goto_command() {
        assert_eq!(parse_command("goto 3"), ParseResult::Ok(Command::Goto(3)));
        assert_eq!(parse_command("g 1"), ParseResult::Ok(Command::Goto(1)));
    }

    #[test]
    fn parse_goto_bad_args() {
        assert!(matches!(parse_command("goto"), ParseResult::MissingArgument(_)));
        assert!(matches!(parse_command("goto 0"), ParseResult::InvalidArgument { .. }));
        assert!(matches!(parse_command("goto two"), ParseResult::InvalidArgument { .. }));
    }

    #[test]
    fn parse_new_command() {
        assert_eq!(parse_command("new"), ParseResult::Ok(Command::New(None)));
        assert_eq!(
            parse_command("new advanced"),
            ParseResult::Ok(Command::New(Some(DifficultyTier::Advanced)))
        );
        assert!(matches!(parse_command("new expert"), ParseResult::InvalidArgument { .. }));
    }

    #[test]
    fn parse_restart_command() {
        assert_eq!(parse_command("restart"), ParseResult::Ok(Command::Restart));
        assert_eq!(parse_command("RESTART now"), ParseResult::Ok(Command::Restart));
        assert!(HELP.contains(":restart"));
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse_command("unknown"), ParseResult::UnknownCommand(_)));
    }

    #[test]
    fn parse_empty_is_nop() {
        assert!(matches!(parse_command(""), ParseResult::Ok(Command::Nop)));
        assert!(matches!(parse_command("   "), ParseResult::Ok(Command::Nop)));
    }

    #[test]
    fn lines_without_colon_are_answers() {
        assert_eq!(parse_line("  They dance to share directions. "), Line::Answer(
            "They dance to share directions.".to_string()
        ));
        assert_eq!(parse_line(":stats"), Line::Command(ParseResult::Ok(Command::Stats)));
        assert_eq!(parse_line("   "), Line::Blank);
    }
}
