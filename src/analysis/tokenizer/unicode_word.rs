//! Word segmentation by Unicode word boundaries (UAX #29).
//!
//! Segments without an alphanumeric character (spaces, punctuation) are
//! dropped, so contractions such as `what's` stay whole while commas and
//! question marks never reach a classifier's vocabulary.
//!
//! ```
//! use hark::analysis::tokenizer::Tokenizer;
//! use hark::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let words: Vec<String> = UnicodeWordTokenizer::new()
//!     .tokenize("what's the weather, today?")
//!     .unwrap()
//!     .map(|token| token.text)
//!     .collect();
//! assert_eq!(words, ["what's", "the", "weather", "today"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let words: Vec<Token> = text
            .split_word_bound_indices()
            .map(|(start, segment)| Token::new(segment, 0, start..start + segment.len()))
            .filter(Token::is_word)
            .enumerate()
            .map(|(index, token)| Token { index, ..token })
            .collect();

        Ok(Box::new(words.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
