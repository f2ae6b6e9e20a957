//! Parser for mirror commands in comment text.
//!
//! Collaborators drive the mirror from pull request comments: a comment whose
//! body opens with the command prefix asks the service to start or stop
//! mirroring that pull request.

/// Prefix that marks a comment body as a command for this service.
pub const COMMAND_PREFIX: &str = "w3c-test:";

/// A recognized mirror command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create (or refresh) the checkout for the pull request commented on.
    Mirror,

    /// Delete the checkout for the pull request commented on.
    Unmirror,
}

/// Parses a mirror command from comment text.
///
/// # Parsing Rules
///
/// - The prefix must open the comment: no leading whitespace, case-sensitive
/// - The token immediately after the prefix must be exactly `mirror` or
///   `unmirror`, terminated by whitespace or end-of-input
/// - Anything after that token is ignored
///
/// # Examples
///
/// ```
/// use pr_mirror::commands::{parse_command, Command, COMMAND_PREFIX};
///
/// assert_eq!(parse_command("w3c-test:mirror", COMMAND_PREFIX), Some(Command::Mirror));
/// assert_eq!(parse_command("w3c-test:unmirror now", COMMAND_PREFIX), Some(Command::Unmirror));
/// // The token must end at a word boundary:
/// assert_eq!(parse_command("w3c-test:mirrors", COMMAND_PREFIX), None);
/// assert_eq!(parse_command("please w3c-test:mirror", COMMAND_PREFIX), None);
/// ```
pub fn parse_command(text: &str, prefix: &str) -> Option<Command> {
    let rest = text.strip_prefix(prefix)?;
    let (word, _) = split_first_word(rest);

    match word {
        "mirror" => Some(Command::Mirror),
        "unmirror" => Some(Command::Unmirror),
        _ => None,
    }
}

/// Splits text at the first whitespace, returning (word, rest).
/// If no whitespace, returns (text, "").
fn split_first_word(text: &str) -> (&str, &str) {
    match text.find(|c: char| c.is_ascii_whitespace()) {
        Some(pos) => (&text[..pos], &text[pos..]),
        None => (text, ""),
    }
}
