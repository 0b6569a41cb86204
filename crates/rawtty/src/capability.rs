//! Detection of terminals that cannot be driven in raw mode

use std::env;
use tracing::debug;

/// Terminal types known not to honor raw-mode control.
const UNSUPPORTED_TERMS: [&str; 3] = ["dumb", "cons25", "emacs"];

/// Check `TERM` against the list of terminals without raw-mode support.
///
/// An unset or non-unicode `TERM` counts as supported.
pub fn is_unsupported_term() -> bool {
    let term = env::var("TERM").ok();
    let unsupported = is_unsupported_term_value(term.as_deref());
    if unsupported {
        debug!("TERM={:?} does not support raw mode", term);
    }
    unsupported
}

/// Same check as [`is_unsupported_term`] for a caller-supplied value.
pub fn is_unsupported_term_value(term: Option<&str>) -> bool {
    match term {
        Some(term) => UNSUPPORTED_TERMS
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(term)),
        None => false,
    }
}
