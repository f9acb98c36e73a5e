use crate::index::MemoryIndex;
use crate::scoring::ClassicSimilarity;
use crate::tokens::{CannedTokenStream, KeywordTokenStream, OwnedToken};

#[test]
fn test_position_gap_between_values() {
    let mut index = MemoryIndex::new();
    index
        .add_field_with("f", KeywordTokenStream::new(["a", "b"]), 1.0, 100, 1)
        .unwrap();
    index
        .add_field_with("f", KeywordTokenStream::new(["c", "d"]), 1.0, 100, 1)
        .unwrap();

    let field = index.field("f").unwrap();
    assert_eq!(field.num_tokens(), 4);
    assert_eq!(field.sum_total_term_freq(), 4);

    let view = index.view();
    let terms = view.terms("f").unwrap();
    assert_eq!(terms.len(), 4);

    let position_of = |term: &[u8]| {
        let mut cursor = terms.cursor();
        assert!(cursor.seek_exact(term));
        cursor.postings().map(|p| p.position).collect::<Vec<_>>()
    };
    assert_eq!(position_of(b"a"), vec![0]);
    assert_eq!(position_of(b"b"), vec![1]);
    assert_eq!(position_of(b"c"), vec![102]);
    assert_eq!(position_of(b"d"), vec![103]);
}

#[test]
fn test_repeated_value_extends_term_postings() {
    let mut index = MemoryIndex::new();
    index
        .add_field_with("f", KeywordTokenStream::new(["x", "y"]), 1.0, 10, 1)
        .unwrap();
    index
        .add_field_with("f", KeywordTokenStream::new(["x"]), 1.0, 10, 1)
        .unwrap();

    let view = index.view();
    let terms = view.terms("f").unwrap();
    assert_eq!(terms.len(), 2);

    let mut cursor = terms.cursor();
    assert!(cursor.seek_exact(b"x"));
    assert_eq!(cursor.freq(), 2);
    let positions: Vec<i32> = cursor.postings().map(|p| p.position).collect();
    // Second value resumes at last_position (1) + gap (10) + increment.
    assert_eq!(positions, vec![0, 12]);
}

#[test]
fn test_boost_accumulates_multiplicatively() {
    let mut index = MemoryIndex::new();
    index
        .add_field_with("f", KeywordTokenStream::new(["a", "b"]), 2.0, 0, 1)
        .unwrap();
    index
        .add_field_with("f", KeywordTokenStream::new(["c", "d"]), 3.0, 0, 1)
        .unwrap();

    let field = index.field("f").unwrap();
    assert!((field.boost() - 6.0).abs() < 1e-6);

    // The combined boost feeds the cached norm: 6 / sqrt(4).
    let view = index.view();
    let similarity = ClassicSimilarity::default();
    let norm = view.norm("f", &similarity).unwrap();
    assert!((norm - 3.0).abs() < 1e-6);
}

#[test]
fn test_offset_gap_between_values() {
    let mut index = MemoryIndex::with_offsets(true);
    index
        .add_field("f", KeywordTokenStream::new(["ab", "cd"]))
        .unwrap();
    index
        .add_field("f", KeywordTokenStream::new(["ef"]))
        .unwrap();

    let view = index.view();
    let terms = view.terms("f").unwrap();
    let mut cursor = terms.cursor();

    assert!(cursor.seek_exact(b"cd"));
    let offsets: Vec<_> = cursor.postings().map(|p| p.offset.unwrap()).collect();
    assert_eq!(offsets, vec![(3, 5)]);

    // Second value starts past the first value's last end offset (5)
    // plus the default offset gap (1).
    assert!(cursor.seek_exact(b"ef"));
    let offsets: Vec<_> = cursor.postings().map(|p| p.offset.unwrap()).collect();
    assert_eq!(offsets, vec![(6, 8)]);
}

#[test]
fn test_overlapping_tokens() {
    let mut index = MemoryIndex::new();
    index
        .add_field(
            "f",
            CannedTokenStream::new(vec![
                OwnedToken::new("wifi", 1),
                OwnedToken::new("wireless", 0),
                OwnedToken::new("network", 1),
            ]),
        )
        .unwrap();

    let field = index.field("f").unwrap();
    assert_eq!(field.num_tokens(), 3);
    assert_eq!(field.num_overlap_tokens(), 1);

    let view = index.view();
    let terms = view.terms("f").unwrap();
    let mut cursor = terms.cursor();

    // The synonym shares its position with the token it overlaps.
    assert!(cursor.seek_exact(b"wifi"));
    assert_eq!(cursor.postings().map(|p| p.position).collect::<Vec<_>>(), vec![0]);
    assert!(cursor.seek_exact(b"wireless"));
    assert_eq!(cursor.postings().map(|p| p.position).collect::<Vec<_>>(), vec![0]);
    assert!(cursor.seek_exact(b"network"));
    assert_eq!(cursor.postings().map(|p| p.position).collect::<Vec<_>>(), vec![1]);

    // Overlaps are discounted from the norm length: 2 effective tokens.
    let similarity = ClassicSimilarity::default();
    let norm = view.norm("f", &similarity).unwrap();
    assert!((norm - 1.0 / 2f32.sqrt()).abs() < 1e-6);
}

#[test]
fn test_high_frequency_term_crosses_slice_levels() {
    // One term repeated enough to chain through several slice sizes,
    // with offsets on so each posting is three ints wide.
    let mut index = MemoryIndex::with_offsets(true);
    let keywords: Vec<String> = (0..2000).map(|_| "drum".to_string()).collect();
    index.add_field("f", KeywordTokenStream::new(keywords)).unwrap();

    let view = index.view();
    let terms = view.terms("f").unwrap();
    let mut cursor = terms.cursor();
    assert!(cursor.seek_exact(b"drum"));
    assert_eq!(cursor.freq(), 2000);

    let postings: Vec<_> = cursor.postings().collect();
    assert_eq!(postings.len(), 2000);
    for (i, posting) in postings.iter().enumerate() {
        assert_eq!(posting.position, i as i32);
        let (start, end) = posting.offset.unwrap();
        assert_eq!(start, 5 * i as i32);
        assert_eq!(end, 5 * i as i32 + 4);
    }
}
