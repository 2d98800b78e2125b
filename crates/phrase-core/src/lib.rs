//! Phrase-based stack decoding.
//!
//! Segments a tokenized source sentence into phrases, picks a target
//! rendering for each, and reorders them under a distortion limit, scoring
//! every path with a phrase table and an n-gram language model.

pub mod coverage;
pub mod decoder;
pub mod lm;
pub mod phrase_table;
pub mod settings;

pub use coverage::Coverage;
pub use decoder::{decode, decode_with_deadline, DecodeError, Translation};
pub use lm::{LanguageModel, NgramModel};
pub use phrase_table::{MemoryPhraseTable, PhraseTable, TargetPhrase};
pub use settings::{BeamSize, SearchSettings, Settings};
