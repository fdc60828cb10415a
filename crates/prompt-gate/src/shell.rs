//! Shell quoting.
//!
//! Everything inside single quotes is literal to a POSIX shell and to bash,
//! with no escape sequences. The only character that can end the literal is
//! `'` itself, so each one is emitted as `'"'"'` (close, double-quoted quote,
//! reopen). NUL is the one byte no shell word can hold; callers reject it
//! before quoting.

use std::borrow::Cow;

/// Quote `s` as exactly one shell word, always single-quoted.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\"'\"'");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Quote `s` only if it contains anything besides plain word characters.
///
/// Used for configured program names, which are usually bare words such as
/// `opencode` and read better unquoted in the command line.
pub fn quote_word(s: &str) -> Cow<'_, str> {
    if !s.is_empty() && s.chars().all(is_plain_word_char) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(quote(s))
    }
}

fn is_plain_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}
