//! Text analysis for Hark.
//!
//! Utterances are not normalized here (that is the host's job); this module
//! only splits text into the words a classifier learns as its vocabulary.

pub mod token;
pub mod tokenizer;

use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Collect the token texts produced by `tokenizer` for `text`.
pub fn token_texts(tokenizer: &dyn Tokenizer, text: &str) -> Result<Vec<String>> {
    Ok(tokenizer.tokenize(text)?.map(|token| token.text).collect())
}
