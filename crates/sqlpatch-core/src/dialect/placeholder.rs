//! Parameter placeholder styles.

use std::fmt::Write;

/// How bound parameters are written in SQL text.
///
/// Statement builders always render `?`; the dialect's format rewrites them
/// afterwards. A doubled `??` is an escaped literal question mark. Text
/// inside quoted identifiers (`"..."`, `` `...` ``, `[...]`) and string
/// literals (`'...'`) is never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderFormat {
    /// `?` (SQLite, MySQL).
    #[default]
    Question,
    /// `$1, $2, ...` (PostgreSQL).
    Dollar,
    /// `:1, :2, ...` (Oracle).
    Colon,
    /// `@p1, @p2, ...` (SQL Server).
    AtP,
}

impl PlaceholderFormat {
    /// Rewrites the `?` placeholders of `sql` into this format.
    #[must_use]
    pub fn replace(self, sql: &str) -> String {
        let prefix = match self {
            Self::Question => return sql.to_string(),
            Self::Dollar => "$",
            Self::Colon => ":",
            Self::AtP => "@p",
        };

        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0_usize;
        let mut chars = sql.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(close) = closing_quote(c) {
                out.push(c);
                // A doubled quote inside the run closes and reopens it.
                for q in chars.by_ref() {
                    out.push(q);
                    if q == close {
                        break;
                    }
                }
                continue;
            }
            if c != '?' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'?') {
                chars.next();
                out.push('?');
                continue;
            }
            n += 1;
            let _ = write!(out, "{prefix}{n}");
        }
        out
    }
}

const fn closing_quote(c: char) -> Option<char> {
    match c {
        '"' | '`' | '\'' => Some(c),
        '[' => Some(']'),
        _ => None,
    }
}
