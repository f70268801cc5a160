// src/scanner.rs

/// Character-level cursor over script text.
///
/// The cursor is a byte index into `s`; `base` is the absolute offset of `s`
/// inside the full script so that positions reported from nested groups still
/// point into the original text. None of the scanning routines fail: absence of
/// a token or an unbalanced group comes back as `None` and the caller decides
/// which error that is.
pub struct Scanner<'a> {
    s: &'a str,
    i: usize,
    base: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0, base: 0 }
    }

    pub fn with_offset(s: &'a str, base: usize) -> Self {
        Self { s, i: 0, base }
    }

    /// Absolute position of the cursor in the full script.
    pub fn position(&self) -> usize {
        self.base + self.i
    }

    pub fn source(&self) -> &'a str {
        self.s
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    /// Exact, case-sensitive match of `token` at the cursor.
    pub fn is_token(&self, token: &str) -> bool {
        !token.is_empty() && self.rest().starts_with(token)
    }

    /// Consumes `token` if it is at the cursor.
    pub fn eat_token(&mut self, token: &str) -> bool {
        if self.is_token(token) {
            self.i += token.len();
            true
        } else {
            false
        }
    }

    /// Leaves the cursor on the first non-whitespace character.
    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    /// Accumulates text until one of `candidates` matches at the cursor.
    ///
    /// On a match the cursor moves past the token and the token is returned;
    /// otherwise the cursor ends at end of input and everything scanned comes
    /// back as text. Double-quoted literals are copied whole, so a token inside
    /// a string never matches.
    pub fn eat_to_tokens(&mut self, candidates: &[&'static str]) -> (String, Option<&'static str>) {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                let start = self.i;
                self.skip_quoted();
                text.push_str(&self.s[start..self.i]);
                continue;
            }
            if let Some(token) = candidates.iter().copied().find(|t| self.is_token(t)) {
                self.i += token.len();
                return (text, Some(token));
            }
            text.push(c);
            self.i += c.len_utf8();
        }
        (text, None)
    }

    /// Cursor just after an opening `(`: returns the group interior and leaves
    /// the cursor on the matching `)`. `None` if input ends first.
    pub fn try_eat_group(&mut self) -> Option<&'a str> {
        let start = self.i;
        let mut depth = 1usize;
        while let Some(c) = self.peek_char() {
            match c {
                '"' => {
                    self.skip_quoted();
                    continue;
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&self.s[start..self.i]);
                    }
                }
                _ => {}
            }
            self.i += c.len_utf8();
        }
        None
    }

    // Moves past a double-quoted literal, honouring backslash escapes. An
    // unterminated literal runs to end of input.
    fn skip_quoted(&mut self) {
        self.i += 1;
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            match c {
                '\\' => {
                    if let Some(nc) = self.peek_char() {
                        self.i += nc.len_utf8();
                    }
                }
                '"' => return,
                _ => {}
            }
        }
    }

    pub fn parse_identifier(&mut self) -> Option<&'a str> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() || (c == '.' && self.i > start && !self.s[..self.i].ends_with('.')) {
                self.i += 1;
            } else {
                break;
            }
        }
        let ident = &self.s[start..self.i];
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) || ident.ends_with('.') {
            self.i = start;
            return None;
        }
        Some(ident)
    }

    /// Reads `-?digits(.digits)?` at the cursor.
    pub fn parse_number_literal(&mut self) -> Option<f64> {
        let start = self.i;
        if self.peek_char() == Some('-') {
            self.i += 1;
        }
        let digits_start = self.i;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == digits_start {
            self.i = start;
            return None;
        }
        if self.peek_char() == Some('.') {
            self.i += 1;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    self.i += 1;
                } else {
                    break;
                }
            }
        }
        match self.s[start..self.i].parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.i = start;
                None
            }
        }
    }

    /// Reads a double-quoted literal with backslash escapes. `None` when the
    /// cursor is not on a quote or the literal never closes.
    pub fn parse_quoted_string(&mut self) -> Option<String> {
        if self.peek_char() != Some('"') {
            return None;
        }
        let start = self.i;
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == '"' {
                return Some(out);
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    match nc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        _ => {
                            out.push('\\');
                            out.push(nc);
                        }
                    }
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        self.i = start;
        None
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{COMPARATOR_TOKENS, LOGICAL_TOKENS};
    use pretty_assertions::assert_eq;

    #[test]
    fn is_token_checks_bounds() {
        let sc = Scanner::new("a =");
        assert!(!sc.is_token("a =="));
        assert!(sc.is_token("a ="));
        assert!(!sc.is_token(""));
    }

    #[test]
    fn skip_ws_stops_on_first_significant_char() {
        let mut sc = Scanner::new("   \t x");
        sc.skip_ws();
        assert_eq!(sc.peek_char(), Some('x'));
        assert_eq!(sc.position(), 5);
    }

    #[test]
    fn eat_to_tokens_splits_at_first_match() {
        let mut sc = Scanner::new("a == 1 && b != 2");
        let (text, token) = sc.eat_to_tokens(&LOGICAL_TOKENS);
        assert_eq!(text, "a == 1 ");
        assert_eq!(token, Some("&&"));
        assert_eq!(sc.rest(), " b != 2");
    }

    #[test]
    fn eat_to_tokens_prefers_longest_comparator() {
        let mut sc = Scanner::new("level <= 5");
        let (text, token) = sc.eat_to_tokens(&COMPARATOR_TOKENS);
        assert_eq!(text, "level ");
        assert_eq!(token, Some("<="));
        assert_eq!(sc.rest(), " 5");
    }

    #[test]
    fn eat_to_tokens_without_match_consumes_everything() {
        let mut sc = Scanner::new("just text");
        let (text, token) = sc.eat_to_tokens(&LOGICAL_TOKENS);
        assert_eq!(text, "just text");
        assert_eq!(token, None);
        assert!(sc.eof());
    }

    #[test]
    fn eat_to_tokens_ignores_tokens_in_strings() {
        let mut sc = Scanner::new(r#"name == "a && b" || x == 1"#);
        let (text, token) = sc.eat_to_tokens(&LOGICAL_TOKENS);
        assert_eq!(text, r#"name == "a && b" "#);
        assert_eq!(token, Some("||"));
    }

    #[test]
    fn group_interior_is_returned_with_cursor_on_close() {
        let mut sc = Scanner::new("(a == 1 || (b == 2)) && c == 3");
        assert!(sc.consume_char('('));
        let group = sc.try_eat_group();
        assert_eq!(group, Some("a == 1 || (b == 2)"));
        assert_eq!(sc.peek_char(), Some(')'));
    }

    #[test]
    fn unbalanced_group_is_none() {
        let mut sc = Scanner::new("(a == 1 || (b == 2)");
        assert!(sc.consume_char('('));
        assert_eq!(sc.try_eat_group(), None);
    }

    #[test]
    fn parens_in_strings_do_not_count() {
        let mut sc = Scanner::new(r#"(a == ")")"#);
        assert!(sc.consume_char('('));
        assert_eq!(sc.try_eat_group(), Some(r#"a == ")""#));
    }

    #[test]
    fn literals() {
        assert_eq!(Scanner::new(r#""a\"b""#).parse_quoted_string(), Some("a\"b".to_string()));
        assert_eq!(Scanner::new(r#""open"#).parse_quoted_string(), None);
        assert_eq!(Scanner::new("-12.5").parse_number_literal(), Some(-12.5));
        assert_eq!(Scanner::new("-").parse_number_literal(), None);
        assert_eq!(Scanner::new("user.name").parse_identifier(), Some("user.name"));
        assert_eq!(Scanner::new("9lives").parse_identifier(), None);
        assert_eq!(Scanner::new("user..name").parse_identifier(), None);
        assert_eq!(Scanner::new("user.").parse_identifier(), None);
    }
}
