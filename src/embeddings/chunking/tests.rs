use super::*;

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn default_config() {
    let config = ChunkingConfig::default();
    assert_eq!(config.chunk_size, 512);
    assert_eq!(config.chunk_overlap, 50);
}

#[test]
fn empty_text_has_no_chunks() {
    let chunks = chunk_words("  \n\t ", &ChunkingConfig::default()).expect("should chunk");
    assert!(chunks.is_empty());
}

#[test]
fn short_text_is_single_chunk() {
    let chunks =
        chunk_words("cats are   mammals\n", &ChunkingConfig::default()).expect("should chunk");
    assert_eq!(chunks, vec!["cats are mammals"]);
}

#[test]
fn windows_overlap() {
    let config = ChunkingConfig {
        chunk_size: 4,
        chunk_overlap: 1,
    };
    let chunks = chunk_words(&numbered_words(10), &config).expect("should chunk");

    assert_eq!(
        chunks,
        vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]
    );
}

#[test]
fn last_window_may_be_short() {
    let config = ChunkingConfig {
        chunk_size: 4,
        chunk_overlap: 2,
    };
    let chunks = chunk_words(&numbered_words(7), &config).expect("should chunk");

    assert_eq!(chunks, vec!["w0 w1 w2 w3", "w2 w3 w4 w5", "w4 w5 w6"]);
}

#[test]
fn exact_fit_has_no_trailing_chunk() {
    let config = ChunkingConfig {
        chunk_size: 5,
        chunk_overlap: 0,
    };
    let chunks = chunk_words(&numbered_words(10), &config).expect("should chunk");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1], "w5 w6 w7 w8 w9");
}

#[test]
fn every_word_is_covered() {
    let config = ChunkingConfig {
        chunk_size: 7,
        chunk_overlap: 3,
    };
    let chunks = chunk_words(&numbered_words(50), &config).expect("should chunk");

    for i in 0..50 {
        let word = format!("w{}", i);
        assert!(
            chunks
                .iter()
                .any(|c| c.split_whitespace().any(|w| w == word)),
            "{} missing from chunks",
            word
        );
    }
    assert!(chunks.iter().all(|c| c.split_whitespace().count() <= 7));
}

#[test]
fn invalid_config_is_rejected() {
    let zero = ChunkingConfig {
        chunk_size: 0,
        chunk_overlap: 0,
    };
    assert!(chunk_words("some text", &zero).is_err());

    let overlap_too_big = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 10,
    };
    assert!(chunk_words("some text", &overlap_too_big).is_err());
}
