//! Tests for pagination module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use test_case::test_case;

// ============================================================================
// Known Token Vectors
// ============================================================================

const TOKEN_INDEX_PAIRS: &[(&str, u32)] = &[
    ("CAAQAA", 0),
    ("CH8QAA", 127),
    ("CIABEAA", 128),
    ("CIEBEAA", 129),
    ("CP8_EAA", 8191),
    ("CIBAEAA", 8192),
    ("CIFAEAA", 8193),
    ("CP9_EAA", 16383),
    ("CICAARAA", 16384),
    ("CIGAARAA", 16385),
    ("CP-_ARAA", 24575),
    ("CIDAARAA", 24576),
    ("CIHAARAA", 24577),
    ("CP__ARAA", 32767),
    ("CICAAhAA", 32768),
    ("CIGAAhAA", 32769),
    ("CP-_AhAA", 40959),
    ("CIDAAhAA", 40960),
    ("CIHAAhAA", 40961),
    ("CP__AhAA", 49151),
    ("CICAAxAA", 49152),
    ("CIGAAxAA", 49153),
    ("CP-_AxAA", 57343),
    ("CIDAAxAA", 57344),
    ("CIHAAxAA", 57345),
    ("CP__AxAA", 65535),
    ("CICABBAA", 65536),
    ("CIGABBAA", 65537),
    ("CP-_BBAA", 73727),
    ("CIDABBAA", 73728),
    ("CIHABBAA", 73729),
    ("CP__BBAA", 81919),
    ("CICABRAA", 81920),
    ("CIGABRAA", 81921),
    ("CP-_BRAA", 90111),
    ("CIDABRAA", 90112),
    ("CIHABRAA", 90113),
    ("CP__BRAA", 98303),
    ("CICABhAA", 98304),
    ("CIGABhAA", 98305),
    ("CJ-NBhAA", 99999),
    ("CP-_BhAA", 106_495),
    ("CIDABhAA", 106_496),
    ("CIHABhAA", 106_497),
    ("CP__BhAA", 114_687),
    ("CICABxAA", 114_688),
    ("CIGABxAA", 114_689),
    ("CIDABxAA", 122_880),
    ("CICACBAA", 131_072),
    ("CICAChAA", 163_840),
    ("CICACxAA", 180_224),
    ("CIDADBAA", 204_800),
    ("CICADRAA", 212_992),
    ("CIDADRAA", 221_184),
    ("CICADhAA", 229_376),
    ("CICAQRAA", 1_064_960),
];

fn as_previous_form(token: &str) -> String {
    format!("{}_", &token[..token.len() - 1])
}

#[test_case(0, "CAAQAA" ; "zero")]
#[test_case(127, "CH8QAA" ; "largest short token")]
#[test_case(128, "CIABEAA" ; "smallest medium token")]
#[test_case(8191, "CP8_EAA" ; "below 8192")]
#[test_case(16383, "CP9_EAA" ; "largest medium token")]
#[test_case(99999, "CJ-NBhAA" ; "long token")]
fn test_literal_vectors(index: i64, token: &str) {
    assert_eq!(encode(index).unwrap(), token);
    assert_eq!(decode(token).unwrap(), index as u32);
}

#[test]
fn test_encode_matches_vector_table() {
    for &(token, index) in TOKEN_INDEX_PAIRS {
        assert_eq!(encode(i64::from(index)).unwrap(), token, "index {index}");
    }
}

#[test]
fn test_decode_matches_vector_table() {
    for &(token, index) in TOKEN_INDEX_PAIRS {
        assert_eq!(decode(token).unwrap(), index, "token {token}");
    }
}

#[test]
fn test_previous_tokens_replace_last_char() {
    for &(token, index) in TOKEN_INDEX_PAIRS {
        let expected = as_previous_form(token);
        assert_eq!(encode_previous(i64::from(index)).unwrap(), expected);
        assert_eq!(decode(&expected).unwrap(), index);
    }
}

#[test]
fn test_previous_next_previous_keeps_index() {
    for &(_, index) in TOKEN_INDEX_PAIRS {
        let prev = encode_previous(i64::from(index)).unwrap();
        let n = decode(&prev).unwrap();
        let next = encode(i64::from(n)).unwrap();
        assert_eq!(decode(&next).unwrap(), index);
    }
}

#[test]
fn test_tokens_reencode_exactly() {
    for &(token, _) in TOKEN_INDEX_PAIRS {
        let parsed: PageToken = token.parse().unwrap();
        assert!(!parsed.is_previous());
        assert_eq!(parsed.to_string(), token);

        let prev = as_previous_form(token);
        let parsed: PageToken = prev.parse().unwrap();
        assert!(parsed.is_previous());
        assert_eq!(parsed.to_string(), prev);
    }
}

#[test]
fn test_round_trip_dense_low_range() {
    for index in 0..=20_000u32 {
        let token = encode(i64::from(index)).unwrap();
        assert_eq!(decode(&token).unwrap(), index, "token {token}");
    }
}

#[test]
fn test_round_trip_sparse_full_range() {
    let mut index = 0u32;
    while index <= MAX_INDEX {
        let token = PageToken::next(i64::from(index)).unwrap();
        let decoded = PageToken::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
        index += 4093;
    }
    let last = PageToken::next(i64::from(MAX_INDEX)).unwrap();
    assert_eq!(PageToken::decode(&last.encode()).unwrap(), last);
}

#[test]
fn test_token_lengths_by_magnitude() {
    assert_eq!(encode(0).unwrap().len(), 6);
    assert_eq!(encode(127).unwrap().len(), 6);
    assert_eq!(encode(128).unwrap().len(), 7);
    assert_eq!(encode(16383).unwrap().len(), 7);
    assert_eq!(encode(16384).unwrap().len(), 8);
    assert_eq!(encode(i64::from(MAX_INDEX)).unwrap().len(), 8);
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_negative_index_clamps_to_zero() {
    assert_eq!(encode(-1).unwrap(), "CAAQAA");
    assert_eq!(encode(-1).unwrap(), encode(0).unwrap());
    assert_eq!(encode(i64::MIN).unwrap(), "CAAQAA");
    assert_eq!(PageToken::previous(-5).unwrap().index(), 0);
}

#[test]
fn test_index_beyond_max_is_rejected() {
    let err = encode(i64::from(MAX_INDEX) + 1).unwrap_err();
    assert!(matches!(err, Error::Range { .. }));
}

#[test_case("CAAQ" ; "too short")]
#[test_case("" ; "empty")]
#[test_case("CA+QAA" ; "plus sign")]
#[test_case("CA/QAA" ; "slash")]
#[test_case("CAAQA=" ; "padding")]
fn test_invalid_tokens(token: &str) {
    let err = decode(token).unwrap_err();
    assert!(matches!(err, Error::InvalidToken { .. }), "{err}");
}

#[test]
fn test_page_token_variants() {
    let token = PageToken::next(99999).unwrap();
    assert_eq!(token.index(), 99999);
    assert!(!token.is_previous());

    let prev = token.as_previous();
    assert!(prev.is_previous());
    assert_eq!(prev.index(), 99999);
    assert_eq!(prev.to_string(), "CJ-NBhA_");
    assert_eq!(prev.as_next(), token);
}

#[test]
fn test_digits_decompose_compose() {
    let d = Digits::decompose(99999);
    assert_eq!(
        d,
        Digits {
            d65536: 1,
            d16384: 2,
            d8192: 0,
            d128: 13,
            d16: 1,
            d1: 15,
        }
    );
    assert_eq!(d.compose(), 99999);

    let d = Digits::decompose(8192 + 5);
    assert_eq!(d.d8192, 1);
    assert_eq!(d.d1, 5);
    assert_eq!(d.compose(), 8197);
}

// ============================================================================
// RequestRange Tests
// ============================================================================

#[test]
fn test_range_invalid_start_index() {
    let err = RequestRange::new(-1, 10, 50).unwrap_err();
    assert!(matches!(err, Error::Range { ref parameter, .. } if parameter == "start_index"));
}

#[test]
fn test_range_start_index_above_u32_names_bound() {
    let too_big = i64::from(u32::MAX) + 1;
    let err = RequestRange::new(too_big, 10, 50).unwrap_err();

    assert!(matches!(err, Error::Range { ref parameter, value, .. }
        if parameter == "start_index" && value == too_big));
    assert_eq!(
        err.to_string(),
        format!(
            "Invalid value {too_big} for 'start_index': must be between 0 and {}",
            u32::MAX
        )
    );
}

#[test]
fn test_range_invalid_number_of_items() {
    let err = RequestRange::new(0, 0, 50).unwrap_err();
    assert!(matches!(err, Error::Range { ref parameter, .. } if parameter == "number_of_items"));
}

#[test_case(0 ; "zero")]
#[test_case(51 ; "above max")]
#[test_case(-3 ; "negative")]
fn test_range_invalid_page_size(page_size: i64) {
    let err = RequestRange::new(0, 10, page_size).unwrap_err();
    assert!(matches!(err, Error::Range { ref parameter, .. } if parameter == "page_size"));
}

#[test]
fn test_range_first_defaults() {
    let range = RequestRange::first(120).unwrap();
    assert_eq!(range.start_index(), 0);
    assert_eq!(range.number_of_items(), 120);
    assert_eq!(range.page_size(), MAX_PAGE_SIZE);
    assert_eq!(range.page_count(), 3);
}

#[test]
fn test_page_count_law() {
    for page_size in 1..=50i64 {
        for items in 1..150i64 {
            let range = PageTokenRange::new(0, items, page_size).unwrap();
            let expected = (items as f64 / page_size as f64).ceil() as usize;
            assert_eq!(range.page_tokens().count(), expected);
            assert_eq!(range.page_tokens().len(), expected);
        }
    }
}

#[test]
fn test_page_tokens_ascending_offsets() {
    let range = PageTokenRange::new(10, 95, 20).unwrap();
    let indices: Vec<u32> = range.page_tokens().map(|t| t.index()).collect();
    assert_eq!(indices, vec![10, 30, 50, 70, 90]);
    assert!(range.page_tokens().all(|t| !t.is_previous()));
}

#[test]
fn test_page_tokens_are_restartable() {
    let range = PageTokenRange::new(0, 150, 50).unwrap();
    let first: Vec<String> = range.page_tokens().map(|t| t.to_string()).collect();
    let second: Vec<String> = (&range).into_iter().map(|t| t.to_string()).collect();
    assert_eq!(first, vec!["CAAQAA", "CDIQAA", "CGQQAA"]);
    assert_eq!(first, second);
}

#[test]
fn test_page_token_range_rejects_unencodable_pages() {
    let err = PageTokenRange::new(i64::from(MAX_INDEX), 100, 50).unwrap_err();
    assert!(matches!(err, Error::Range { .. }));

    // A single page at the last offset is still fine
    let range = PageTokenRange::new(i64::from(MAX_INDEX), 50, 50).unwrap();
    assert_eq!(range.page_count(), 1);
}

#[test]
fn test_range_with_number_of_items() {
    let range = PageTokenRange::new(0, 5000, 5).unwrap();
    let shrunk = range.with_number_of_items(12).unwrap();
    assert_eq!(shrunk.range().number_of_items(), 12);
    assert_eq!(shrunk.range().page_size(), 5);
    assert_eq!(shrunk.page_count(), 3);
    assert!(range.with_number_of_items(0).is_err());
}
