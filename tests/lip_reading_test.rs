//! End-to-end behavior of the temporal lip-pattern classifier


use proptest::prelude::*;
use signease::landmarks::FaceLandmarks;
use signease::lip_reading::{LipReader, NO_FACE_STATUS};
use std::time::{Duration, Instant};
use test_helpers::{
    blank_frame, mouth, mouth_frames, scripted_reader, steady, HELLO_SEQUENCE, NO_OPENNESS, WATER_OPENNESS,
};

/// Feed `count` frames one tenth of a second apart, starting at `start`
fn feed(reader: &mut LipReader, count: usize, start: Instant) -> Vec<signease::lip_reading::FrameOutcome> {
    let frame = blank_frame();
    (0..count)
        .map(|i| reader.ingest_frame_at(&frame, start + Duration::from_millis(100 * i as u64)))
        .collect()
}

#[test]
fn test_scoring_waits_for_min_sequence_length() {
    let mut reader = scripted_reader(steady(WATER_OPENNESS, 10));
    let outcomes = feed(&mut reader, 10, Instant::now());

    for (i, outcome) in outcomes.iter().take(9).enumerate() {
        assert_eq!(outcome.status, format!("Analyzing... ({}/10 frames)", i + 1));
        assert_eq!(outcome.matched_word, None);
        assert_eq!(outcome.confidence, 0.0);
        assert!(outcome.bounding_box.is_some());
    }

    // Tenth frame is scored
    assert_eq!(outcomes[9].matched_word.as_deref(), Some("water"));
    assert!((outcomes[9].confidence - 0.8).abs() < 1e-3);
}

#[test]
fn test_hello_sequence_emits() {
    let mut reader = scripted_reader(mouth_frames(&HELLO_SEQUENCE));
    let outcomes = feed(&mut reader, 10, Instant::now());
    let last = &outcomes[9];

    assert_eq!(last.matched_word.as_deref(), Some("hello"));
    assert!((last.confidence - 0.9674).abs() < 1e-3);
    assert!(last.emitted);
    assert_eq!(reader.current_text(), "hello ");
    assert_eq!(reader.last_word(), Some("hello"));

    // Emission consumes the window
    assert_eq!(last.status, "Analyzing... (0/10 frames)");
    assert_eq!(reader.sequence_length(), 0);
    assert_eq!(reader.buffer().movement_len(), 0);

    let stats = reader.stats();
    assert_eq!(stats.frames_seen, 10);
    assert_eq!(stats.detections_emitted, 1);
    assert_eq!(stats.words_emitted, 1);
}

#[test]
fn test_cooldown_blocks_second_word() {
    let mut frames = mouth_frames(&HELLO_SEQUENCE);
    frames.extend(steady(WATER_OPENNESS, 11));
    let mut reader = scripted_reader(frames);
    let start = Instant::now();

    feed(&mut reader, 10, start);
    assert_eq!(reader.current_text(), "hello ");

    // Water is recognized one second later but the cooldown holds it back
    let within = feed(&mut reader, 10, start + Duration::from_millis(1000));
    assert_eq!(within[9].matched_word.as_deref(), Some("water"));
    assert!(!within[9].emitted);
    assert_eq!(reader.current_text(), "hello ");
    assert_eq!(reader.sequence_length(), 10);

    // After the cooldown the same window emits
    let frame = blank_frame();
    let after = reader.ingest_frame_at(&frame, start + Duration::from_secs(3));
    assert!(after.emitted);
    assert_eq!(reader.current_text(), "hello water ");
    assert_eq!(reader.stats().words_emitted, 2);
}

/// Two back-to-back hello windows
fn hello_twice() -> LipReader {
    let mut frames = mouth_frames(&HELLO_SEQUENCE);
    frames.extend(mouth_frames(&HELLO_SEQUENCE));
    scripted_reader(frames)
}

#[test]
fn test_hello_replayed_within_cooldown_is_not_emitted() {
    let mut reader = hello_twice();
    let start = Instant::now();

    let first = feed(&mut reader, 10, start);
    assert!(first[9].emitted);

    // The replayed window ends one second after the first emission
    let replay = feed(&mut reader, 10, start + Duration::from_millis(1000));
    assert_eq!(replay[9].matched_word.as_deref(), Some("hello"));
    assert!(!replay[9].emitted);
    assert_eq!(reader.current_text(), "hello ");
    assert_eq!(reader.sequence_length(), 10);
    assert_eq!(reader.stats().words_emitted, 1);
}

#[test]
fn test_hello_replayed_after_cooldown_is_not_repeated() {
    let mut reader = hello_twice();
    let start = Instant::now();
    assert!(feed(&mut reader, 10, start)[9].emitted);

    // Past the cooldown only the last-word guard holds it back
    let late = feed(&mut reader, 10, start + Duration::from_secs(3));
    assert_eq!(late[9].matched_word.as_deref(), Some("hello"));
    assert!(!late[9].emitted);
    assert_eq!(reader.current_text(), "hello ");
    assert_eq!(reader.stats().words_emitted, 1);
}

#[test]
fn test_repeated_word_is_suppressed_until_cleared() {
    let mut reader = scripted_reader(steady(WATER_OPENNESS, 30));
    let start = Instant::now();

    let first = feed(&mut reader, 10, start);
    assert!(first[9].emitted);

    // Same word after the cooldown is not repeated
    let repeat = feed(&mut reader, 10, start + Duration::from_secs(3));
    assert_eq!(repeat[9].matched_word.as_deref(), Some("water"));
    assert!(!repeat[9].emitted);
    assert_eq!(reader.current_text(), "water ");

    reader.clear_text();
    assert_eq!(reader.current_text(), "");
    assert_eq!(reader.last_word(), None);
    assert_eq!(reader.sequence_length(), 0);

    let again = feed(&mut reader, 10, start + Duration::from_secs(6));
    assert!(again[9].emitted);
    assert_eq!(reader.current_text(), "water ");
}

#[test]
fn test_match_below_emission_threshold_is_reported_not_emitted() {
    let mut reader = scripted_reader(steady(NO_OPENNESS, 10));
    let outcomes = feed(&mut reader, 10, Instant::now());
    let last = &outcomes[9];

    assert_eq!(last.matched_word.as_deref(), Some("no"));
    assert!(last.confidence > 0.6 && last.confidence < 0.65);
    assert!(!last.emitted);
    assert_eq!(reader.current_text(), "");
    assert_eq!(reader.stats().detections_emitted, 0);
}

#[test]
fn test_wide_open_mouth_matches_nothing() {
    let mut reader = scripted_reader(steady(1.0, 10));
    let outcomes = feed(&mut reader, 10, Instant::now());
    assert_eq!(outcomes[9].matched_word, None);
    assert_eq!(outcomes[9].confidence, 0.0);
    assert_eq!(outcomes[9].status, "Analyzing... (10/10 frames)");
}

#[test]
fn test_face_loss_resets_window() {
    let mut frames = steady(WATER_OPENNESS, 9);
    frames.push(None);
    frames.extend(steady(WATER_OPENNESS, 10));
    let mut reader = scripted_reader(frames);

    let outcomes = feed(&mut reader, 20, Instant::now());
    assert_eq!(outcomes[9].status, NO_FACE_STATUS);
    assert!(outcomes[9].features.is_none());
    assert!(outcomes[..19].iter().all(|o| !o.emitted));
    // A full window after the gap is needed before anything is emitted
    assert!(outcomes[19].emitted);
    assert_eq!(reader.stats().frames_seen, 20);
}

#[test]
fn test_clear_text_keeps_counters() {
    let mut reader = scripted_reader(mouth_frames(&HELLO_SEQUENCE));
    feed(&mut reader, 10, Instant::now());
    let before = reader.stats();

    reader.clear_text();
    assert_eq!(reader.stats(), before);
    assert_eq!(reader.current_text(), "");
}

#[test]
fn test_outcome_serializes_to_json() {
    let mut reader = scripted_reader(vec![mouth(WATER_OPENNESS)]);
    let outcome = reader.ingest_frame(&blank_frame());
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "Analyzing... (1/10 frames)");
    assert!(json["matched_word"].is_null());
    assert!(json["features"]["openness"].as_f64().unwrap() > 0.29);
    assert!(json["bounding_box"].is_object());
}

fn frame_strategy() -> impl Strategy<Value = Option<FaceLandmarks>> {
    prop_oneof![
        1 => Just(None),
        4 => (0.0f64..1.2).prop_map(mouth),
    ]
}

proptest! {
    #[test]
    fn prop_no_face_never_emits(frames in prop::collection::vec(frame_strategy(), 1..80)) {
        let count = frames.len();
        let mut reader = scripted_reader(frames);
        let start = Instant::now();
        let frame = blank_frame();

        for i in 0..count {
            let outcome = reader.ingest_frame_at(&frame, start + Duration::from_millis(300 * i as u64));
            if outcome.status == NO_FACE_STATUS {
                prop_assert!(!outcome.emitted);
                prop_assert_eq!(outcome.matched_word, None);
                prop_assert_eq!(reader.sequence_length(), 0);
            }
            let len = reader.sequence_length();
            prop_assert_eq!(reader.buffer().movement_len(), len.saturating_sub(1));
            prop_assert!(len <= 30);
        }
        prop_assert_eq!(reader.stats().detections_emitted, reader.stats().words_emitted);
    }
}
