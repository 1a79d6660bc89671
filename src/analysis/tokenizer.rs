//! Splitting utterances into words.

use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod unicode_word;

/// Turns an utterance into words.
///
/// Classifiers own their tokenizer and are trained on the registry's thread
/// pool, hence `Send + Sync`.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Short identifier, shown in `Debug` output.
    fn name(&self) -> &'static str;
}
