//! Tokens cut from an utterance.
//!
//! ```
//! use hark::analysis::token::Token;
//!
//! let token = Token::new("joke", 3, 10..14);
//! assert_eq!(token.text, "joke");
//! assert_eq!(&"tell me a joke"[token.span.clone()], "joke");
//! ```

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One word of an utterance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Index among the words of the utterance.
    pub index: usize,
    /// Byte range in the utterance.
    pub span: Range<usize>,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, index: usize, span: Range<usize>) -> Self {
        Token {
            text: text.into(),
            index,
            span,
        }
    }

    /// Whether the token is a vocabulary word rather than punctuation or
    /// whitespace.
    pub fn is_word(&self) -> bool {
        self.text.chars().any(char::is_alphanumeric)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Tokens of one utterance, in order.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_word() {
        assert!(Token::new("what's", 0, 0..6).is_word());
        assert!(Token::new("42", 0, 0..2).is_word());
        assert!(!Token::new(", ", 0, 0..2).is_word());
        assert_eq!(Token::new("hey", 0, 0..3).to_string(), "hey");
    }
}
