use proptest::prelude::*;

use super::simd;
use super::{ChunkParser, HeadScanner};

// ===== scan primitives =====

#[test]
fn first_cr_or_lf_minimal_offset() {
    assert_eq!(simd::first_cr_or_lf(b""), None);
    assert_eq!(simd::first_cr_or_lf(b"abc"), None);
    assert_eq!(simd::first_cr_or_lf(b"\r"), Some(0));
    assert_eq!(simd::first_cr_or_lf(b"\n"), Some(0));
    assert_eq!(simd::first_cr_or_lf(b"ab\rcd\nef"), Some(2));
    assert_eq!(simd::first_cr_or_lf(b"ab\ncd\ref"), Some(2));

    // hits in every lane of a word, and past the word boundary
    for i in 0..64 {
        let mut buf = vec![b'x'; 64];
        buf[i] = b'\n';
        assert_eq!(simd::first_cr_or_lf(&buf), Some(i), "lane {i}");
        buf[i] = b'\r';
        assert_eq!(simd::first_cr_or_lf(&buf), Some(i), "lane {i}");
    }
}

#[test]
fn index_of_byte_in_word() {
    for i in 0..size_of::<usize>() {
        let mut bytes = [b'a'; size_of::<usize>()];
        bytes[i] = b':';
        let word = usize::from_ne_bytes(bytes);
        assert_eq!(simd::index_of_byte_in_word(word, b':'), Some(i));
        assert_eq!(simd::index_of_byte_in_word(word, b'z'), None);
    }
}

// ===== head scanner =====

fn scan_all(input: &[u8]) -> (usize, bool) {
    let mut scanner = HeadScanner::new();
    let consumed = scanner.feed(input);
    (consumed, scanner.is_finished())
}

#[test]
fn head_terminator_variants() {
    // every accepted blank-line spelling, terminator included in the count
    assert_eq!(scan_all(b"a: b\r\n\r\nrest"), (8, true));
    assert_eq!(scan_all(b"a: b\n\nrest"), (6, true));
    assert_eq!(scan_all(b"a: b\r\n\nrest"), (7, true));
    assert_eq!(scan_all(b"a: b\n\r\nrest"), (7, true));
}

#[test]
fn head_bare_cr_never_terminates() {
    assert_eq!(scan_all(b"a: b\r\r"), (6, false));
    assert_eq!(scan_all(b"a\rb\r\nc\r\n\r\n"), (10, true));
}

#[test]
fn head_incomplete() {
    assert_eq!(scan_all(b""), (0, false));
    assert_eq!(scan_all(b"a: b\r\n"), (6, false));
    assert_eq!(scan_all(b"a: b\r\n\r"), (7, false));
}

#[test]
fn head_at_line_boundary_accepts_immediate_blank_line() {
    // a trailer block can be nothing but its final blank line
    let mut scanner = HeadScanner::at_line_boundary();
    assert_eq!(scanner.feed(b"\r\nrest"), 2);
    assert!(scanner.is_finished());

    let mut scanner = HeadScanner::at_line_boundary();
    assert_eq!(scanner.feed(b"expires: now\r\n\r\n"), 16);
    assert!(scanner.is_finished());
}

#[test]
fn head_resumes_across_chunks() {
    let input = b"content-type: text/html\r\ndate: now\r\n\r\ntail";
    let boundary = input.len() - 4;

    for split in 0..boundary {
        let mut scanner = HeadScanner::new();
        let mut consumed = scanner.feed(&input[..split]);
        assert_eq!(consumed, split);
        consumed += scanner.feed(&input[consumed..]);
        assert!(scanner.is_finished(), "split {split}");
        assert_eq!(consumed, boundary, "split {split}");
    }
}

// ===== chunk parser =====

fn parse_all(input: &[u8]) -> (ChunkParser, usize) {
    let mut parser = ChunkParser::new();
    let consumed = parser.feed(input);
    (parser, consumed)
}

#[test]
fn chunk_size_line() {
    let (parser, consumed) = parse_all(b"4\r\ngood");
    assert!(parser.is_finished());
    assert_eq!(parser.length(), 4);
    assert_eq!(consumed, 3);

    let (parser, consumed) = parse_all(b"1a2B\r\n");
    assert!(parser.is_finished());
    assert_eq!(parser.length(), 0x1a2b);
    assert_eq!(consumed, 6);

    // bare LF terminator
    let (parser, consumed) = parse_all(b"0\n");
    assert!(parser.is_finished());
    assert_eq!(parser.length(), 0);
    assert_eq!(consumed, 2);
}

#[test]
fn chunk_extension_skipped() {
    let (parser, consumed) = parse_all(b"5;name=value\r\nhello");
    assert!(parser.is_finished());
    assert_eq!(parser.length(), 5);
    assert_eq!(consumed, 14);
}

#[test]
fn chunk_invalid_bytes() {
    assert!(parse_all(b"4x\r\n").0.is_invalid());
    assert!(parse_all(b"\r\n").0.is_invalid());
    assert!(parse_all(b"4\rx").0.is_invalid());
}

#[test]
fn chunk_invalid_is_sticky() {
    let (mut parser, _) = parse_all(b"zz\r\n");
    assert!(parser.is_invalid());
    parser.feed(b"4\r\n");
    assert!(parser.is_invalid());
}

#[test]
fn chunk_suffix_states() {
    let mut parser = ChunkParser::new();
    assert_eq!(parser.feed(b"4\r\n"), 3);
    assert_eq!(parser.length(), 4);

    // after the 4-byte body, the suffix CRLF precedes the next size line
    parser.restart();
    assert_eq!(parser.feed(b"\r\n0\r\n"), 5);
    assert!(parser.is_finished());
    assert_eq!(parser.length(), 0);

    // bare LF suffix
    let mut parser = ChunkParser::new();
    parser.feed(b"1\n");
    parser.restart();
    assert_eq!(parser.feed(b"\n3\n"), 3);
    assert!(parser.is_finished());
    assert_eq!(parser.length(), 3);

    // garbage where the suffix belongs
    let mut parser = ChunkParser::new();
    parser.feed(b"1\r\n");
    parser.restart();
    parser.feed(b"xx");
    assert!(parser.is_invalid());
}

#[test]
fn chunk_overflow_detected_at_first_overflowing_digit() {
    let mut parser = ChunkParser::new();
    // 16 f digits hold the maximum value
    let consumed = parser.feed(b"ffffffffffffffff");
    assert_eq!(consumed, 16);
    assert!(!parser.is_invalid());
    assert_eq!(parser.length(), u64::MAX);

    // the 17th digit cannot fit
    parser.feed(b"f");
    assert!(parser.is_invalid());

    // the wraparound-prone shape: 0x1fffffffffffffff * 16 wraps above the
    // previous value, checked arithmetic still refuses it
    let (parser, _) = parse_all(b"1ffffffffffffffff\r\n");
    assert!(parser.is_invalid());
}

#[test]
fn chunk_resumes_across_splits() {
    let input = b"2b;ext=1\r\n";

    for split in 0..input.len() {
        let mut parser = ChunkParser::new();
        let consumed = parser.feed(&input[..split]);
        assert_eq!(consumed, split);
        parser.feed(&input[split..]);
        assert!(parser.is_finished(), "split {split}");
        assert_eq!(parser.length(), 0x2b, "split {split}");
    }
}

// ===== laws =====

proptest! {
    #[test]
    fn head_scan_chunk_invariance(
        head in "[a-z-]{1,12}: [ -~]{0,24}(\r\n[a-z-]{1,12}: [ -~]{0,24}){0,4}",
        cuts in proptest::collection::vec(0usize..64, 0..6),
    ) {
        let mut block = head.into_bytes();
        block.extend_from_slice(b"\r\n\r\n");
        block.extend_from_slice(b"trailing payload");
        let boundary = block.len() - 16;

        let mut scanner = HeadScanner::new();
        let mut consumed = 0;

        for cut in cuts {
            let at = consumed + (cut % (block.len() - consumed).max(1));
            consumed += scanner.feed(&block[consumed..at.min(boundary + 16)]);
            if scanner.is_finished() {
                break;
            }
        }
        if !scanner.is_finished() {
            consumed += scanner.feed(&block[consumed..]);
        }

        prop_assert!(scanner.is_finished());
        prop_assert_eq!(consumed, boundary);
    }

    #[test]
    fn chunk_size_round_trip(n in proptest::num::u64::ANY) {
        let line = format!("{n:x}\r\n");
        let (parser, consumed) = parse_all(line.as_bytes());
        prop_assert!(parser.is_finished());
        prop_assert_eq!(parser.length(), n);
        prop_assert_eq!(consumed, line.len());
    }

    #[test]
    fn chunk_size_overflow_rejected(n in proptest::num::u64::ANY, lead in "[1-9a-f]") {
        // a 17-digit size with a non-zero lead names a value of at least 2^64
        let line = format!("{lead}{n:016x}\r\n");
        let (parser, _) = parse_all(line.as_bytes());
        prop_assert!(parser.is_invalid());
    }
}
