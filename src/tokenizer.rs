//////////////////////////////////////////////////////////////
/// Tokenizer
///
/// A whitespace-delimited scanner over a source string. `head` marks the
/// start of the next token; `tail` is its length once found. Integer
/// literals (optionally signed decimal) are distinguished from word names
/// by attempting to parse the scanned slice (§4.C).
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Integer(i64),
    Word(String),
}

pub struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    head: usize,
    tail: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            source,
            bytes: source.as_bytes(),
            head: 0,
            tail: 0,
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    fn is_white(b: u8) -> bool {
        b == 9 || b == 10 || b == 32
    }

    /// Advance `head` past any run of whitespace.
    fn skip_white(&mut self) {
        while self.head < self.bytes.len() && Self::is_white(self.bytes[self.head]) {
            self.head += 1;
        }
    }

    /// Advance `tail` until the next whitespace byte or end of source.
    fn find_white(&mut self) {
        self.tail = 0;
        while self.head + self.tail < self.bytes.len() && !Self::is_white(self.bytes[self.head + self.tail]) {
            self.tail += 1;
        }
    }

    /// True iff any non-whitespace character remains from `head` onward.
    pub fn more_tokens(&self) -> bool {
        let mut i = self.head;
        while i < self.bytes.len() {
            if !Self::is_white(self.bytes[i]) {
                return true;
            }
            i += 1;
        }
        false
    }

    /// Scan and consume the next token, or `None` if the source is
    /// exhausted. A slice that parses as a signed decimal integer is
    /// emitted as `Token::Integer`; otherwise it is emitted as a
    /// `Token::Word`. A bare `-` does not parse as an integer and falls
    /// through to `Word`, so it is read as the subtraction word rather
    /// than a malformed negative literal (§9).
    pub fn word(&mut self) -> Option<Token> {
        self.skip_white();
        if self.head >= self.bytes.len() {
            return None;
        }
        self.find_white();
        let slice = &self.source[self.head..self.head + self.tail];
        let token = match slice.parse::<i64>() {
            Ok(n) => Token::Integer(n),
            Err(_) => Token::Word(slice.to_string()),
        };
        self.head += self.tail;
        self.tail = 0;
        Some(token)
    }
}

//////////////////////////////////////////////
/// TESTS
///
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_integers_and_words() {
        let mut t = Tokenizer::new(": double dup + ;");
        assert_eq!(t.word(), Some(Token::Word(":".to_string())));
        assert_eq!(t.word(), Some(Token::Word("double".to_string())));
        assert_eq!(t.word(), Some(Token::Word("dup".to_string())));
        assert_eq!(t.word(), Some(Token::Word("+".to_string())));
        assert_eq!(t.word(), Some(Token::Word(";".to_string())));
        assert_eq!(t.word(), None);
    }

    #[test]
    fn negative_literal_parses_as_integer() {
        let mut t = Tokenizer::new("-42 foo");
        assert_eq!(t.word(), Some(Token::Integer(-42)));
        assert_eq!(t.word(), Some(Token::Word("foo".to_string())));
    }

    #[test]
    fn bare_minus_is_a_word_not_a_literal() {
        let mut t = Tokenizer::new("3 4 -");
        assert_eq!(t.word(), Some(Token::Integer(3)));
        assert_eq!(t.word(), Some(Token::Integer(4)));
        assert_eq!(t.word(), Some(Token::Word("-".to_string())));
    }

    #[test]
    fn more_tokens_reports_exhaustion() {
        let mut t = Tokenizer::new("  1  ");
        assert!(t.more_tokens());
        t.word();
        assert!(!t.more_tokens());
        assert_eq!(t.word(), None);
    }

    #[test]
    fn tabs_and_newlines_are_whitespace() {
        let mut t = Tokenizer::new("1\t2\n3");
        assert_eq!(t.word(), Some(Token::Integer(1)));
        assert_eq!(t.word(), Some(Token::Integer(2)));
        assert_eq!(t.word(), Some(Token::Integer(3)));
    }

    #[test]
    fn empty_source_has_no_tokens() {
        let mut t = Tokenizer::new("");
        assert!(!t.more_tokens());
        assert_eq!(t.word(), None);
    }
}
