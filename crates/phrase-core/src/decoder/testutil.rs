#![cfg(test)]

use crate::lm::NgramModel;
use crate::phrase_table::MemoryPhraseTable;

/// Split on whitespace into owned tokens.
pub fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Shared phrase table for decoder tests: word-by-word entries for
/// "le chat noir" plus the phrase "chat noir" -> "black cat".
pub fn chat_noir_table() -> MemoryPhraseTable {
    MemoryPhraseTable::from_entries(
        10,
        vec![
            ("le", "the", -0.1),
            ("chat", "cat", -0.2),
            ("noir", "black", -0.3),
            ("chat noir", "black cat", -0.15),
        ],
    )
    .unwrap()
}

/// Word-by-word entries only, so "the black cat" needs reordering.
pub fn word_table() -> MemoryPhraseTable {
    MemoryPhraseTable::from_entries(
        10,
        vec![
            ("le", "the", -0.1),
            ("chat", "cat", -0.2),
            ("noir", "black", -0.3),
        ],
    )
    .unwrap()
}

/// Bigram model that likes "<s> the black cat </s>" and has to back off
/// for everything else.
pub fn chat_noir_lm() -> NgramModel {
    NgramModel::builder(2)
        .ngram("<s>", -99.0, -0.5)
        .ngram("</s>", -1.0, 0.0)
        .ngram("the", -1.0, -0.5)
        .ngram("cat", -1.0, -0.5)
        .ngram("black", -1.0, -0.5)
        .ngram("<s> the", -0.2, 0.0)
        .ngram("the black", -0.3, 0.0)
        .ngram("black cat", -0.3, 0.0)
        .ngram("cat </s>", -0.3, 0.0)
        .build()
        .unwrap()
}
