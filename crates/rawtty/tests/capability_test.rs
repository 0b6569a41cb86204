//! TERM-based capability detection

use rawtty::{is_unsupported_term, is_unsupported_term_value};
use serial_test::serial;
use std::env;
use test_case::test_case;

struct TermVar(Option<String>);

impl TermVar {
    fn set(value: Option<&str>) -> Self {
        let saved = TermVar(env::var("TERM").ok());
        match value {
            Some(value) => env::set_var("TERM", value),
            None => env::remove_var("TERM"),
        }
        saved
    }
}

impl Drop for TermVar {
    fn drop(&mut self) {
        match &self.0 {
            Some(value) => env::set_var("TERM", value),
            None => env::remove_var("TERM"),
        }
    }
}

#[test_case("dumb")]
#[test_case("DUMB")]
#[test_case("Dumb")]
#[test_case("cons25")]
#[test_case("Cons25")]
#[test_case("emacs")]
#[test_case("EMACS")]
#[serial]
fn denylisted_terms_are_unsupported(term: &str) {
    let _guard = TermVar::set(Some(term));
    assert!(is_unsupported_term());
}

#[test_case(None; "unset")]
#[test_case(Some("xterm-256color"); "xterm")]
#[test_case(Some("screen"); "screen")]
#[test_case(Some("dumb-ish"); "prefix match")]
#[serial]
fn other_terms_are_supported(term: Option<&str>) {
    let _guard = TermVar::set(term);
    assert!(!is_unsupported_term());
}

#[test]
fn value_check_does_not_read_environment() {
    assert!(is_unsupported_term_value(Some("eMacs")));
    assert!(!is_unsupported_term_value(Some("vt100")));
    assert!(!is_unsupported_term_value(None));
}
