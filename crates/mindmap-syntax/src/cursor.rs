/// A line-oriented cursor over MMD source text.
///
/// Works in byte offsets. Every position the lexer stops at is either the
/// start of input, just after an ASCII marker, or just after a newline, so
/// slicing at `pos()` always lands on a char boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The full source text.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'a str {
        &self.s[self.i.min(self.s.len())..]
    }

    /// Peeks at the next character without advancing.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    /// Consumes characters while `pred` holds.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        let consumed: usize = self
            .rest()
            .chars()
            .take_while(|c| pred(*c))
            .map(char::len_utf8)
            .sum();
        self.i += consumed;
    }

    /// Consumes the rest of the current line including its `\n`, if any.
    pub fn eat_line(&mut self) {
        match self.rest().find('\n') {
            Some(offset) => self.i += offset + 1,
            None => self.i = self.s.len(),
        }
    }

    /// Moves to the end of input.
    pub fn eat_all(&mut self) {
        self.i = self.s.len();
    }
}
