//! Lexical primitives.
//!
//! A `Cursor` walks a single line by byte offset. All character classes used
//! by the grammar are ASCII, so every position the cursor stops at is also a
//! UTF-8 character boundary; the only place that steps over arbitrary text
//! (`bump_char`) advances by a whole character.

/// Position-tracking reader over one line of text.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move back (or forward) to an offset previously returned by `pos`.
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Unconsumed text.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Text consumed since `start`.
    pub fn since(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub fn starts_with(&self, lit: &str) -> bool {
        self.rest().starts_with(lit)
    }

    /// Consume `lit` if the input continues with it.
    pub fn eat(&mut self, lit: &str) -> bool {
        if self.starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Consume one byte if it equals `b`.
    pub fn eat_byte(&mut self, b: u8) -> bool {
        self.eat_if(|c| c == b)
    }

    /// Consume one byte if it satisfies `pred`.
    pub fn eat_if(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        match self.peek() {
            Some(c) if pred(c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Consume the longest run of bytes satisfying `pred`.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Consume exactly `n` bytes satisfying `pred`, or nothing.
    pub fn eat_exactly(&mut self, n: usize, pred: impl Fn(u8) -> bool) -> bool {
        let bytes = self.rest().as_bytes();
        if bytes.len() >= n && bytes[..n].iter().all(|&c| pred(c)) {
            self.pos += n;
            true
        } else {
            false
        }
    }

    /// Skip a whitespace run; returns how many bytes were skipped.
    pub fn skip_spaces(&mut self) -> usize {
        self.eat_while(is_space).len()
    }

    /// Step over one character, whatever it is.
    pub fn bump_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume everything up to (not including) the next occurrence of
    /// `needle`. Consumes nothing and returns `None` when it never occurs.
    pub fn eat_until(&mut self, needle: &str) -> Option<&'a str> {
        let offset = self.rest().find(needle)?;
        let start = self.pos;
        self.pos += offset;
        Some(&self.src[start..self.pos])
    }

    /// Consume the remainder of the line.
    pub fn eat_rest(&mut self) -> &'a str {
        let rest = self.rest();
        self.pos = self.src.len();
        rest
    }
}

pub fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

pub fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

pub fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

pub fn is_lower(c: u8) -> bool {
    c.is_ascii_lowercase()
}

/// Characters of a line field name (`nscanned`, `$cmd`, `keyUpdates`).
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

/// Characters of a document key; dotted paths are allowed.
pub fn is_key_char(c: u8) -> bool {
    is_ident_char(c) || c == b'.'
}

/// Characters of a namespace (`test.foo`, `local.oplog.$main`, `admin.$cmd`).
pub fn is_ns_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b':' | b'$')
}

/// Characters of a plan stage name (`IXSCAN`, `COUNT_SCAN`).
pub fn is_stage_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == b'_'
}

/// Characters of a component name (`QUERY`, `REPL`, `WRITE`).
pub fn is_component_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c == b'_'
}
