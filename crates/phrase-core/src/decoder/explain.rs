use serde::Serialize;

use crate::lm::LanguageModel;
use crate::phrase_table::PhraseTable;
use crate::settings::SearchSettings;

use super::options::{collect_options, PhraseOption};
use super::{translate, DecodeError, Translation};

/// Full diagnostic result for a single sentence.
#[derive(Debug, Serialize)]
pub struct ExplainResult {
    pub source: Vec<String>,
    /// Every translation option the search could draw from.
    pub options: Vec<ExplainOption>,
    /// The winning path, or the best partial path when `complete` is false.
    pub translation: Translation,
    pub complete: bool,
}

/// A translation option for diagnostic display.
#[derive(Debug, Serialize)]
pub struct ExplainOption {
    pub start: usize,
    pub end: usize,
    pub source: String,
    pub target: String,
    pub log_prob: f64,
}

impl From<&PhraseOption> for ExplainOption {
    fn from(o: &PhraseOption) -> Self {
        Self {
            start: o.start,
            end: o.end,
            source: o.source.clone(),
            target: o.target.clone(),
            log_prob: o.log_prob,
        }
    }
}

/// Decode `source` and capture the option inventory and per-phrase score
/// breakdown. A sentence without a full-coverage path is reported with
/// `complete = false` instead of an error.
pub fn explain<L, S>(
    table: &dyn PhraseTable,
    lm: &L,
    source: &[S],
    settings: &SearchSettings,
) -> Result<ExplainResult, DecodeError>
where
    L: LanguageModel + ?Sized,
    S: AsRef<str>,
{
    let options = collect_options(table, source, settings.max_candidates_per_span)?;
    let (translation, complete) = match translate(lm, &options, settings, None) {
        Ok(t) => (t, true),
        Err(DecodeError::NoCoveragePath { partial, .. }) => (*partial, false),
        Err(e) => return Err(e),
    };

    Ok(ExplainResult {
        source: source.iter().map(|t| t.as_ref().to_string()).collect(),
        options: options.iter().map(ExplainOption::from).collect(),
        translation,
        complete,
    })
}
