//! Test cases for the LoopbackTransport.

use rstest::*;

use prologix::{LoopbackTransport, Transport};

/// Create a loopback transport that contains no lines.
#[fixture]
fn emp_lbk() -> LoopbackTransport {
    LoopbackTransport::new(Vec::<&str>::new(), Vec::<&str>::new())
}

/// Read a whole reply including its delimiter.
fn read_line(lbk: &mut LoopbackTransport, delimiter: u8) -> Vec<u8> {
    let mut line = Vec::new();
    loop {
        let byte = lbk.read_byte().unwrap().unwrap();
        line.push(byte);
        if byte == delimiter {
            return line;
        }
    }
}

/// Ensure `finalize` method passes if an empty loopback transport is used.
#[rstest]
fn finalize_test(mut emp_lbk: LoopbackTransport) {
    emp_lbk.finalize();
}

/// Ensure `finalize` method panics if lines are left in the loopback transport.
#[rstest]
#[case(vec!["cmd"], vec![])]
#[case(vec![], vec!["resp"])]
#[case(vec!["cmd"], vec!["resp"])]
#[should_panic]
fn finalize_test_panic(#[case] from_host: Vec<&str>, #[case] from_inst: Vec<&str>) {
    let mut lbk = LoopbackTransport::new(from_host, from_inst);
    lbk.finalize();
}

#[rstest]
fn write_raw() {
    let mut lbk = LoopbackTransport::new(vec!["cmd1", "cmd2"], Vec::<&str>::new());
    lbk.write_raw(b"cmd1\n").unwrap();
    lbk.write_raw(b"cmd2\n").unwrap();
}

#[rstest]
#[should_panic]
fn write_raw_mismatch() {
    let mut lbk = LoopbackTransport::new(vec!["cmd1"], Vec::<&str>::new());
    let _ = lbk.write_raw(b"cmd3\n");
}

#[rstest]
#[should_panic]
fn write_raw_wrong_terminator() {
    let mut lbk = LoopbackTransport::new(vec!["cmd1"], Vec::<&str>::new());
    let _ = lbk.write_raw(b"cmd1\r\n");
}

#[rstest]
fn read_replies() {
    let mut lbk = LoopbackTransport::new(Vec::<&str>::new(), vec!["resp1", "resp2"]);
    assert_eq!(read_line(&mut lbk, b'\n'), b"resp1\n");
    assert_eq!(read_line(&mut lbk, b'\n'), b"resp2\n");
}

#[rstest]
fn custom_terminators() {
    let mut lbk = LoopbackTransport::new(vec!["cmd"], vec!["resp"]).with_terminators(b'\r', 4);
    lbk.write_raw(b"cmd\r").unwrap();
    assert_eq!(read_line(&mut lbk, 4), b"resp\x04");
}

#[rstest]
#[should_panic]
fn read_without_reply(mut emp_lbk: LoopbackTransport) {
    let _ = emp_lbk.read_byte();
}
