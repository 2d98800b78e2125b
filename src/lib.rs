//! Phrase-based statistical machine translation.
//!
//! The decoder itself lives in [`phrase_core`] and is re-exported here.
//! This crate adds decoding of many sentences on a worker pool and
//! optional JSON tracing.

pub mod batch;
pub mod trace_init;

pub use batch::{BatchDecoder, BatchError, SentenceResult};
pub use phrase_core::decoder::{
    explain, ExplainOption, ExplainResult, ScoreBreakdown, SearchStats, TranslatedPhrase,
};
pub use phrase_core::settings::{
    load_settings, parse_settings_toml, BatchSettings, FailurePolicy, SettingsError,
};
pub use phrase_core::{
    coverage, decode, decode_with_deadline, decoder, lm, phrase_table, settings, BeamSize,
    Coverage, DecodeError, LanguageModel, MemoryPhraseTable, NgramModel, PhraseTable,
    SearchSettings, Settings, TargetPhrase, Translation,
};
