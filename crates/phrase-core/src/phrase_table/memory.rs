use std::collections::HashMap;

use tracing::debug;

use super::{PhraseTable, PhraseTableError, TargetPhrase};

/// Hash-backed phrase table.
///
/// Each source phrase keeps its candidates sorted by descending
/// log-probability and truncated to the table's limit. Candidates with equal
/// log-probability keep insertion order.
#[derive(Debug, Clone)]
pub struct MemoryPhraseTable {
    entries: HashMap<String, Vec<TargetPhrase>>,
    limit: usize,
}

impl Default for MemoryPhraseTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPhraseTable {
    /// A table that keeps every candidate.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            limit: usize::MAX,
        }
    }

    /// A table that keeps at most `k` candidates per source phrase.
    pub fn with_limit(k: usize) -> Result<Self, PhraseTableError> {
        if k == 0 {
            return Err(PhraseTableError::ZeroLimit);
        }
        Ok(Self {
            entries: HashMap::new(),
            limit: k,
        })
    }

    /// Build a table from `(source, target, log_prob)` triples.
    pub fn from_entries<S, T, I>(k: usize, entries: I) -> Result<Self, PhraseTableError>
    where
        S: AsRef<str>,
        T: AsRef<str>,
        I: IntoIterator<Item = (S, T, f64)>,
    {
        let mut table = Self::with_limit(k)?;
        for (source, target, log_prob) in entries {
            table.insert(source.as_ref(), target.as_ref(), log_prob)?;
        }
        Ok(table)
    }

    /// Add one candidate. Whitespace inside source and target is normalized
    /// to single spaces.
    pub fn insert(
        &mut self,
        source: &str,
        target: &str,
        log_prob: f64,
    ) -> Result<(), PhraseTableError> {
        let source = normalize(source);
        if source.is_empty() {
            return Err(PhraseTableError::EmptySource);
        }
        let target = normalize(target);
        if target.is_empty() {
            return Err(PhraseTableError::EmptyTarget(source));
        }
        if log_prob.is_nan() {
            return Err(PhraseTableError::NanLogProb { phrase: source, target });
        }

        let candidates = self.entries.entry(source).or_default();
        let pos = candidates.partition_point(|c| c.log_prob >= log_prob);
        if pos >= self.limit {
            return Ok(());
        }
        candidates.insert(pos, TargetPhrase::new(target, log_prob));
        candidates.truncate(self.limit);
        Ok(())
    }

    /// Give every word without a single-word entry an identity translation
    /// (the word itself, log-probability 0). Returns the number of entries added.
    pub fn add_identity_fallback<'a, I>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for word in words {
            let word = word.trim();
            if word.is_empty() || word.contains(char::is_whitespace) || self.contains(word) {
                continue;
            }
            self.entries
                .insert(word.to_string(), vec![TargetPhrase::new(word, 0.0)]);
            added += 1;
        }
        debug!(added, "identity fallback");
        added
    }

    /// Number of distinct source phrases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PhraseTable for MemoryPhraseTable {
    fn lookup(&self, source: &str) -> &[TargetPhrase] {
        self.entries.get(source).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_missing_is_empty() {
        let table = MemoryPhraseTable::new();
        assert!(table.lookup("chat").is_empty());
        assert!(!table.contains("chat"));
    }

    #[test]
    fn candidates_sorted_best_first() {
        let table = MemoryPhraseTable::from_entries(
            10,
            vec![
                ("chat", "cat", -0.7),
                ("chat", "chat", -2.0),
                ("chat", "tomcat", -0.1),
            ],
        )
        .unwrap();
        let texts: Vec<&str> = table.lookup("chat").iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["tomcat", "cat", "chat"]);
    }

    #[test]
    fn top_k_truncation() {
        let table = MemoryPhraseTable::from_entries(
            2,
            vec![
                ("noir", "dark", -1.5),
                ("noir", "black", -0.2),
                ("noir", "noir", -3.0),
                ("noir", "sombre", -0.9),
            ],
        )
        .unwrap();
        let texts: Vec<&str> = table.lookup("noir").iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["black", "sombre"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let table =
            MemoryPhraseTable::from_entries(10, vec![("a", "first", -1.0), ("a", "second", -1.0)])
                .unwrap();
        assert_eq!(table.lookup("a")[0].text, "first");
        assert_eq!(table.lookup("a")[1].text, "second");
    }

    #[test]
    fn whitespace_normalized() {
        let mut table = MemoryPhraseTable::new();
        table.insert("  chat   noir ", "black  cat", -0.15).unwrap();
        assert_eq!(table.lookup("chat noir")[0].text, "black cat");
    }

    #[test]
    fn rejects_malformed_entries() {
        let mut table = MemoryPhraseTable::new();
        assert!(matches!(
            table.insert(" ", "x", 0.0),
            Err(PhraseTableError::EmptySource)
        ));
        assert!(matches!(
            table.insert("x", "", 0.0),
            Err(PhraseTableError::EmptyTarget(_))
        ));
        assert!(matches!(
            table.insert("x", "y", f64::NAN),
            Err(PhraseTableError::NanLogProb { .. })
        ));
        assert!(matches!(
            MemoryPhraseTable::with_limit(0),
            Err(PhraseTableError::ZeroLimit)
        ));
    }

    #[test]
    fn identity_fallback_only_for_unknown_words() {
        let mut table = MemoryPhraseTable::from_entries(10, vec![("le", "the", -0.1)]).unwrap();
        let added = table.add_identity_fallback(["le", "chat", "chat", "", "noir"]);
        assert_eq!(added, 2);
        assert_eq!(table.lookup("le")[0].text, "the");
        assert_eq!(table.lookup("chat"), &[TargetPhrase::new("chat", 0.0)]);
        assert_eq!(table.lookup("noir")[0].log_prob, 0.0);
        assert_eq!(table.len(), 3);
    }
}
