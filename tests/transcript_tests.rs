// Unit tests for transcript accumulation
//
// These tests verify that final fragments are persisted and joined with
// single spaces, and that at most one interim result is held at a time.

use voiceboard::TranscriptAccumulator;

#[test]
fn test_finals_join_with_single_spaces() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_final("hola");
    acc.append_final("equipo");
    acc.append_final("gracias");

    assert_eq!(acc.transcription(), "hola equipo gracias");
    assert_eq!(acc.fragment_count(), 3);
}

#[test]
fn test_empty_finals_are_skipped() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_final("hola");
    acc.append_final("");
    acc.append_final("   ");
    acc.append_final("equipo");

    // No doubled spaces from the skipped fragments
    assert_eq!(acc.transcription(), "hola equipo");
    assert_eq!(acc.fragment_count(), 2);
}

#[test]
fn test_interim_is_never_persisted() {
    let mut acc = TranscriptAccumulator::new();
    acc.set_interim("hol");
    acc.set_interim("hola equ");
    acc.append_final("hola equipo");

    assert_eq!(acc.transcription(), "hola equipo");
    assert_eq!(acc.interim(), None, "A final supersedes the pending interim");
    assert_eq!(acc.fragment_count(), 1);
}

#[test]
fn test_live_preview_appends_interim() {
    let mut acc = TranscriptAccumulator::new();

    // Interim alone, before any final
    acc.set_interim("hola");
    assert_eq!(acc.live_preview(), "hola");
    assert_eq!(acc.transcription(), "");

    acc.append_final("hola");
    acc.set_interim("equ");
    assert_eq!(acc.live_preview(), "hola equ");
    assert_eq!(acc.transcription(), "hola");

    acc.clear_interim();
    assert_eq!(acc.live_preview(), "hola");
}

#[test]
fn test_whitespace_interim_clears() {
    let mut acc = TranscriptAccumulator::new();
    acc.set_interim("hola");
    acc.set_interim("   ");

    assert_eq!(acc.interim(), None);
    assert!(acc.is_empty());
}

#[test]
fn test_clear_interim_keeps_finals() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_final("hola");
    acc.set_interim("equ");
    acc.clear_interim();

    assert_eq!(acc.transcription(), "hola");
    assert_eq!(acc.interim(), None);
    assert!(!acc.is_empty());
}

#[test]
fn test_reset_clears_everything() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_final("hola");
    acc.set_interim("equ");
    acc.reset();

    assert_eq!(acc.transcription(), "");
    assert_eq!(acc.interim(), None);
    assert_eq!(acc.fragment_count(), 0);
    assert!(acc.is_empty());
}

#[test]
fn test_fragments_are_trimmed() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_final("  hola  ");
    acc.set_interim("  equ  ");

    assert_eq!(acc.transcription(), "hola");
    assert_eq!(acc.interim(), Some("equ"));
    assert_eq!(acc.live_preview(), "hola equ");
}
