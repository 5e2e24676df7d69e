//! Position in header text

/// Read position in a text, always on a character boundary
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(text: &'t str) -> Self {
        Self { text, pos: 0 }
    }

    /// Unconsumed text
    pub fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Whether the cursor sits at the start of the text or of a line
    pub fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text[..self.pos].ends_with('\n')
    }

    /// Consume `len` bytes; `len` must end on a character boundary
    pub fn advance(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.text.len());
    }

    /// Whether the previous character and the next one both belong to
    /// the same identifier
    pub fn continues_word(&self) -> bool {
        let before = self.text[..self.pos].chars().next_back();
        let after = self.rest().chars().next();
        matches!((before, after), (Some(b), Some(a)) if is_ident_char(b) && is_ident_char(a))
    }

    /// Consume a single character
    pub fn skip_char(&mut self) {
        let len = self.rest().chars().next().map_or(1, char::len_utf8);
        self.advance(len);
    }

    /// Consume a whole identifier, or a single character elsewhere
    pub fn skip_token(&mut self) {
        let rest = self.rest();
        let word = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        if word > 0 {
            self.advance(word);
        } else {
            self.skip_char();
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_char_multibyte() {
        let mut cursor = Cursor::new("é\nx");
        cursor.skip_char();
        assert_eq!(cursor.rest(), "\nx");
        assert!(!cursor.at_line_start());
        cursor.skip_char();
        assert!(cursor.at_line_start());
        cursor.advance(10);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_skip_token() {
        let mut cursor = Cursor::new("ODE_X(1)");
        cursor.skip_token();
        assert_eq!(cursor.rest(), "(1)");
        assert!(!cursor.continues_word());
        cursor.skip_token();
        assert_eq!(cursor.rest(), "1)");
    }
}
