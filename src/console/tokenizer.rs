//! Command line tokenizer.
//!
//! Splits one inbound command line into argument tokens.
//!
//! # Grammar
//!
//! - Whitespace separates tokens.
//! - A `"..."` span keeps whitespace literally and is concatenated with any
//!   unquoted characters directly before or after it (`a"b c"d` is one token).
//! - `\` outside quotes copies the next character into the current token,
//!   whitespace included.
//! - `\` inside quotes copies the next character (including `"`) without
//!   closing the span.
//!
//! There is no variable expansion, nesting or comment syntax.
//!
//! # Example
//!
//! ```
//! use ble_wifi_console::console::tokenize;
//!
//! let tokens = tokenize(r#"conn "My Wifi" "pa ss""#).unwrap();
//! assert_eq!(tokens, vec!["conn", "My Wifi", "pa ss"]);
//! ```

use std::fmt;

/// Tokenizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tokens.
    Init,
    /// Building an unquoted token.
    Token,
    /// Inside a quoted span.
    WaitQuote,
    /// Next character is literal, then back to `Token`.
    EscapePlain,
    /// Next character is literal, then back to `WaitQuote`.
    EscapeQuoted,
}

/// Errors reported for lines that cannot be tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Line ended inside a quoted span.
    UnclosedQuote,
    /// Line ended right after a backslash.
    TrailingEscape,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnclosedQuote => write!(f, "unclosed quote"),
            Self::TrailingEscape => {
                write!(f, "trailing escape with no following character")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Split a command line into tokens.
///
/// An empty or all-whitespace line yields an empty vector.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = State::Init;

    for c in line.chars() {
        state = match state {
            State::Init => match c {
                '"' => State::WaitQuote,
                '\\' => State::EscapePlain,
                c if c.is_whitespace() => State::Init,
                c => {
                    current.push(c);
                    State::Token
                }
            },
            State::Token => match c {
                '"' => State::WaitQuote,
                '\\' => State::EscapePlain,
                c if c.is_whitespace() => {
                    tokens.push(std::mem::take(&mut current));
                    State::Init
                }
                c => {
                    current.push(c);
                    State::Token
                }
            },
            State::WaitQuote => match c {
                // Closing quote keeps the token open so `"a"b` stays one token
                '"' => State::Token,
                '\\' => State::EscapeQuoted,
                c => {
                    current.push(c);
                    State::WaitQuote
                }
            },
            State::EscapePlain => {
                current.push(c);
                State::Token
            }
            State::EscapeQuoted => {
                current.push(c);
                State::WaitQuote
            }
        };
    }

    match state {
        State::Init => {}
        State::Token => tokens.push(current),
        State::WaitQuote => return Err(ParseError::UnclosedQuote),
        State::EscapePlain | State::EscapeQuoted => return Err(ParseError::TrailingEscape),
    }

    Ok(tokens)
}
