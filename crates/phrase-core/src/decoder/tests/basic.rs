use std::time::{Duration, Instant};

use crate::decoder::testutil::{chat_noir_lm, chat_noir_table, tokens, word_table};
use crate::decoder::{decode, decode_with_deadline, DecodeError};
use crate::phrase_table::MemoryPhraseTable;
use crate::settings::{BeamSize, SearchSettings};

fn settings(beam: BeamSize, distortion_limit: usize) -> SearchSettings {
    SearchSettings {
        beam_size: beam,
        distortion_limit,
        ..SearchSettings::default()
    }
}

#[test]
fn test_phrase_beats_word_by_word() {
    let table = chat_noir_table();
    let lm = chat_noir_lm();
    let result = decode(&table, &lm, &tokens("le chat noir"), &SearchSettings::default()).unwrap();

    assert_eq!(result.text, "the black cat");
    let sources: Vec<&str> = result.phrases.iter().map(|p| p.source.as_str()).collect();
    assert_eq!(sources, vec!["le", "chat noir"]);
    // tm -0.25, lm: the -0.2, black -0.3, cat -0.3, </s> -0.3
    assert!((result.score - (-1.35)).abs() < 1e-9);
}

#[test]
fn test_reordering_needs_distortion_limit() {
    let table = word_table();
    let lm = chat_noir_lm();
    let source = tokens("le chat noir");

    // With limit 1, "black" can be placed before "cat" but "cat" can never
    // come back for position 1 afterwards.
    let monotone = decode(&table, &lm, &source, &settings(BeamSize::Unbounded, 1)).unwrap();
    assert_eq!(monotone.text, "the cat black");

    let reordered = decode(&table, &lm, &source, &settings(BeamSize::Unbounded, 2)).unwrap();
    assert_eq!(reordered.text, "the black cat");
    let starts: Vec<usize> = reordered.phrases.iter().map(|p| p.source_start).collect();
    assert_eq!(starts, vec![0, 2, 1]);
    // jumps of 1 and 2 at -0.01 each
    assert!((reordered.breakdown.distortion - (-0.03)).abs() < 1e-9);
}

#[test]
fn test_breakdown_matches_score() {
    let table = word_table();
    let lm = chat_noir_lm();
    let result = decode(&table, &lm, &tokens("le chat noir"), &SearchSettings::default()).unwrap();
    assert!((result.breakdown.total() - result.score).abs() < 1e-9);
    let phrase_sum: f64 = result
        .phrases
        .iter()
        .map(|p| p.translation + p.language_model + p.distortion)
        .sum();
    assert!((phrase_sum - result.score).abs() < 1e-9);
}

#[test]
fn test_narrow_beam_still_translates() {
    let table = chat_noir_table();
    let lm = chat_noir_lm();
    let result = decode(
        &table,
        &lm,
        &tokens("le chat noir"),
        &settings(BeamSize::bounded(1).unwrap(), 10),
    )
    .unwrap();
    assert_eq!(result.text, "the black cat");
    assert!(result.stats.pruned > 0);
}

#[test]
fn test_recombination_happens() {
    let table = word_table();
    let lm = chat_noir_lm();
    let result = decode(
        &table,
        &lm,
        &tokens("le chat noir"),
        &settings(BeamSize::Unbounded, 10),
    )
    .unwrap();
    // "the black cat" and "black the cat" both end on "cat" at index 1 with
    // full coverage: only one of them can stay in the last group.
    assert!(result.stats.recombined + result.stats.discarded > 0);
    assert_eq!(result.stats.pruned, 0);
    assert_eq!(result.stats.group_sizes[0], 1);
    assert_eq!(result.stats.group_sizes.len(), 4);
}

#[test]
fn test_unreachable_coverage_fails_softly() {
    let table = MemoryPhraseTable::from_entries(10, vec![("le", "the", -0.1)]).unwrap();
    let lm = chat_noir_lm();
    let err = decode(&table, &lm, &tokens("le xyz"), &SearchSettings::default()).unwrap_err();

    match err {
        DecodeError::NoCoveragePath {
            len,
            deepest,
            partial,
        } => {
            assert_eq!(len, 2);
            assert_eq!(deepest, 1);
            assert_eq!(partial.text, "the");
        }
        other => panic!("expected NoCoveragePath, got {other:?}"),
    }
}

#[test]
fn test_identity_fallback_fills_gaps() {
    let mut table = MemoryPhraseTable::from_entries(10, vec![("le", "the", -0.1)]).unwrap();
    let source = tokens("le xyz");
    table.add_identity_fallback(source.iter().map(String::as_str));
    let lm = chat_noir_lm();
    let result = decode(&table, &lm, &source, &SearchSettings::default()).unwrap();
    assert_eq!(result.text, "the xyz");
}

#[test]
fn test_empty_sentence() {
    let table = chat_noir_table();
    let lm = chat_noir_lm();
    let empty: Vec<String> = Vec::new();
    let result = decode(&table, &lm, &empty, &SearchSettings::default()).unwrap();
    assert_eq!(result.text, "");
    assert_eq!(result.score, 0.0);
    assert!(result.phrases.is_empty());
}

#[test]
fn test_single_word() {
    let table = chat_noir_table();
    let lm = chat_noir_lm();
    let result = decode(&table, &lm, &["chat"], &SearchSettings::default()).unwrap();
    assert_eq!(result.text, "cat");
    assert_eq!(result.phrases.len(), 1);
}

#[test]
fn test_decode_deterministic() {
    let table = word_table();
    let lm = chat_noir_lm();
    let source = tokens("le chat noir le chat");
    let first = decode(&table, &lm, &source, &SearchSettings::default()).unwrap();
    for _ in 0..10 {
        let again = decode(&table, &lm, &source, &SearchSettings::default()).unwrap();
        assert_eq!(again.text, first.text, "decoding must be deterministic");
        assert_eq!(again.score.to_bits(), first.score.to_bits());
        assert_eq!(again.stats, first.stats);
    }
}

#[test]
fn test_past_deadline_times_out() {
    let table = chat_noir_table();
    let lm = chat_noir_lm();
    let deadline = Instant::now()
        .checked_sub(Duration::from_millis(1))
        .unwrap_or_else(Instant::now);
    let err = decode_with_deadline(
        &table,
        &lm,
        &tokens("le chat noir"),
        &SearchSettings::default(),
        Some(deadline),
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::TimedOut { .. }));
}

#[test]
fn test_malformed_input_rejected() {
    let table = chat_noir_table();
    let lm = chat_noir_lm();
    let err = decode(&table, &lm, &["le", ""], &SearchSettings::default()).unwrap_err();
    assert!(matches!(err, DecodeError::EmptyToken { position: 1 }));
}
