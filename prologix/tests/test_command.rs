//! Tests of the line encoding and the GPIB termination enum.

use std::collections::HashSet;

use rstest::*;

use prologix::{Encoder, GpibTerm, escape_binary};

#[fixture]
fn enc() -> Encoder {
    Encoder::default()
}

#[rstest]
#[case("EOI")]
#[case("eoi")]
#[case("Eoi")]
#[case("  eOi ")]
fn test_controller_command_lowercase(enc: Encoder, #[case] name: &str) {
    assert_eq!(enc.controller(name, "1"), b"++eoi 1\n");
}

#[rstest]
fn test_controller_command_terminator() {
    let enc = Encoder::new(b'\r');
    assert_eq!(enc.terminator(), b'\r');
    assert_eq!(enc.controller("read", " eoi "), b"++read eoi\r");
    assert_eq!(enc.controller("VER", ""), b"++ver\r");
}

#[rstest]
#[case("*IDN?", b"*IDN?\n".as_slice())]
#[case("  :SOUR:Volt 1.5\r\n", b":SOUR:Volt 1.5\n".as_slice())]
#[case("", b"\n".as_slice())]
fn test_instrument_command(enc: Encoder, #[case] text: &str, #[case] exp: &[u8]) {
    assert_eq!(enc.instrument(text), exp);
}

#[rstest]
fn test_instrument_binary(enc: Encoder) {
    assert_eq!(enc.instrument_binary(b"+\n"), b"\x1b+\x1b\n\n");
}

#[rstest]
fn test_escape_binary() {
    assert_eq!(
        escape_binary(b"a\rb\nc\x1bd+e"),
        b"a\x1b\rb\x1b\nc\x1b\x1bd\x1b+e"
    );
    assert!(escape_binary(b"").is_empty());
}

#[rstest]
fn test_gpib_term_codes() {
    let codes: Vec<u8> = GpibTerm::ALL.iter().map(|t| t.code()).collect();
    assert_eq!(codes, vec![0, 1, 2, 3]);

    for term in GpibTerm::ALL {
        assert_eq!(GpibTerm::try_from(term.code()), Ok(term));
    }
    assert_eq!(GpibTerm::try_from(4u8), Err(4));
    assert_eq!(GpibTerm::default(), GpibTerm::AppendCrLf);
}

#[rstest]
fn test_gpib_term_descriptions() {
    let descriptions: HashSet<&str> = GpibTerm::ALL.iter().map(|t| t.description()).collect();
    assert_eq!(descriptions.len(), 4);
    assert!(descriptions.iter().all(|d| !d.is_empty()));
    assert!(format!("{}", GpibTerm::AppendLf).contains("LF"));
}
