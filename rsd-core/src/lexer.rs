//! Dual-mode tokenizer over a buffered byte source.
//!
//! Each input source gets its own `Lexer`. On first use a short prefix is
//! sniffed to fix the decoding mode for the life of that source: any first
//! byte with the high bit set selects the packed binary encoding, anything
//! else the text encoding. Both modes produce the same [`Token`] set.
//!
//! # Text encoding
//!
//! Whitespace-delimited tokens. `#` starts a comment running to end of
//! line. Quoted strings support `\n \r \t \b \f \\ \" \'` and up to three
//! octal digits. Numeric literals are floats iff they contain `.`, `e`,
//! or `E`. `[` and `]` bound arrays. Bare identifiers are symbols.
//!
//! # Binary encoding
//!
//! Tag-prefixed tokens, multi-byte payloads big-endian:
//!
//! | tag  | token      | payload                    |
//! |------|------------|----------------------------|
//! | 0x80 | Integer    | 4-byte i32                 |
//! | 0x81 | Float      | 8-byte IEEE f64            |
//! | 0x82 | Str        | u32 length + raw bytes     |
//! | 0x83 | Symbol     | u32 length + raw bytes     |
//! | 0x84 | ArrayOpen  | none                       |
//! | 0x85 | ArrayClose | none                       |

use std::io::Read;

use memchr::{memchr, memchr2};

use crate::error::{LexicalCause, ParseError};
use crate::span::Span;
use crate::token::Token;
use crate::value::{parse_number, Number};

/// Binary encoding tag bytes.
///
/// Public so a paired encoder (or a test) can build streams; the layout is
/// this implementation's own and is stable within it.
pub mod tags {
    pub const INTEGER: u8 = 0x80;
    pub const FLOAT: u8 = 0x81;
    pub const STRING: u8 = 0x82;
    pub const SYMBOL: u8 = 0x83;
    pub const ARRAY_OPEN: u8 = 0x84;
    pub const ARRAY_CLOSE: u8 = 0x85;
}

/// Decoding mode, fixed per source once sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Binary,
}

/// Refill granularity for the scan buffer.
const REFILL: usize = 8 * 1024;

/// Upper bound on a binary length prefix. Anything larger is treated as a
/// corrupt stream rather than an allocation request.
const MAX_PREFIXED_LEN: u32 = 1 << 20;

/// A lazily tokenizing reader over one input source.
///
/// Forward-only: consumed bytes are gone. The lexer never reports faults
/// itself; it returns them for the session to record.
pub struct Lexer {
    source: Box<dyn Read>,
    buf: Vec<u8>,
    /// Read position within `buf`.
    pos: usize,
    /// Absolute source offset of `buf[0]`.
    base: u64,
    /// Source has returned end-of-file.
    eof: bool,
    mode: Option<Mode>,
}

impl std::fmt::Debug for Lexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("offset", &self.offset())
            .field("mode", &self.mode)
            .field("eof", &self.eof)
            .finish()
    }
}

impl Lexer {
    /// Create a lexer over a byte source.
    pub fn new(source: Box<dyn Read>) -> Self {
        Self {
            source,
            buf: Vec::with_capacity(REFILL),
            pos: 0,
            base: 0,
            eof: false,
            mode: None,
        }
    }

    /// Create a lexer over an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Box::new(std::io::Cursor::new(bytes)))
    }

    /// Absolute offset of the next unconsumed byte.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// The sniffed mode, `None` before the first token is requested.
    #[inline]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Produce the next token.
    ///
    /// Exhaustion yields `Token::EndOfInput`; only malformed input is an
    /// error. After a recoverable error the lexer is positioned past the
    /// offending bytes and can keep scanning.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let mode = match self.mode {
            Some(m) => m,
            None => self.sniff()?,
        };
        match mode {
            Mode::Text => self.next_text(),
            Mode::Binary => self.next_binary(),
        }
    }

    /// Fix the decoding mode from the first buffered byte.
    fn sniff(&mut self) -> Result<Mode, ParseError> {
        let mode = match self.peek_at(0)? {
            Some(b) if b >= 0x80 => Mode::Binary,
            _ => Mode::Text,
        };
        self.mode = Some(mode);
        Ok(mode)
    }

    // ======================== buffering ========================

    /// Pull more bytes from the source. Returns false at end-of-file.
    fn refill(&mut self) -> Result<bool, ParseError> {
        if self.eof {
            return Ok(false);
        }
        if self.pos > 0 {
            self.base += self.pos as u64;
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        let old = self.buf.len();
        self.buf.resize(old + REFILL, 0);
        loop {
            match self.source.read(&mut self.buf[old..]) {
                Ok(0) => {
                    self.buf.truncate(old);
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.buf.truncate(old + n);
                    return Ok(true);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    self.buf.truncate(old);
                    self.eof = true;
                    return Err(self.lexical(LexicalCause::ReadFailed));
                }
            }
        }
    }

    /// Peek the byte `i` positions ahead without consuming.
    fn peek_at(&mut self, i: usize) -> Result<Option<u8>, ParseError> {
        while self.buf.len() - self.pos <= i {
            if !self.refill()? {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[self.pos + i]))
    }

    /// Make at least `n` bytes available. Returns false if the source ends
    /// first.
    fn ensure(&mut self, n: usize) -> Result<bool, ParseError> {
        while self.buf.len() - self.pos < n {
            if !self.refill()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    #[inline]
    fn available(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    #[inline]
    fn bump(&mut self, n: usize) {
        self.pos += n;
    }

    fn lexical(&self, cause: LexicalCause) -> ParseError {
        ParseError::Lexical { offset: self.offset(), cause }
    }

    // ======================== text mode ========================

    fn next_text(&mut self) -> Result<Token, ParseError> {
        self.skip_blank()?;

        let start = self.offset();
        let b = match self.peek_at(0)? {
            Some(b) => b,
            None => return Ok(Token::EndOfInput { span: Span::at(start) }),
        };

        match b {
            b'"' => self.scan_string(start),
            b'[' => {
                self.bump(1);
                Ok(Token::ArrayOpen { span: Span::new(start, start + 1) })
            }
            b']' => {
                self.bump(1);
                Ok(Token::ArrayClose { span: Span::new(start, start + 1) })
            }
            b'0'..=b'9' | b'-' | b'+' | b'.' => self.scan_number(start),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_symbol(start),
            other => {
                self.bump(1);
                Err(ParseError::Lexical {
                    offset: start,
                    cause: LexicalCause::UnexpectedByte(other),
                })
            }
        }
    }

    /// Skip whitespace and `#` comments.
    fn skip_blank(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_at(0)? {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => self.bump(1),
                Some(b'#') => {
                    // Comment runs to end of line; may span refills.
                    loop {
                        match memchr(b'\n', self.available()) {
                            Some(i) => {
                                self.bump(i + 1);
                                break;
                            }
                            None => {
                                let n = self.available().len();
                                self.bump(n);
                                if !self.refill()? {
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Scan a quoted string, unescaping into an owned buffer.
    fn scan_string(&mut self, start: u64) -> Result<Token, ParseError> {
        self.bump(1); // opening quote
        let mut out = Vec::new();
        loop {
            // Jump to the next interesting byte within the window.
            match memchr2(b'"', b'\\', self.available()) {
                Some(i) => {
                    out.extend_from_slice(&self.available()[..i]);
                    self.bump(i);
                    let b = self.available()[0];
                    if b == b'"' {
                        self.bump(1);
                        let end = self.offset();
                        return Ok(Token::Str {
                            value: String::from_utf8_lossy(&out).into_owned(),
                            span: Span::new(start, end),
                        });
                    }
                    self.bump(1); // backslash
                    self.scan_escape(&mut out)?;
                }
                None => {
                    let n = self.available().len();
                    out.extend_from_slice(self.available());
                    self.bump(n);
                    if !self.refill()? {
                        return Err(ParseError::Lexical {
                            offset: start,
                            cause: LexicalCause::UnterminatedString,
                        });
                    }
                }
            }
        }
    }

    fn scan_escape(&mut self, out: &mut Vec<u8>) -> Result<(), ParseError> {
        let b = match self.peek_at(0)? {
            Some(b) => b,
            None => {
                return Err(self.lexical(LexicalCause::UnterminatedString));
            }
        };
        match b {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'\'' => out.push(b'\''),
            b'0'..=b'7' => {
                // Up to three octal digits.
                let mut v: u32 = 0;
                let mut taken = 0;
                while taken < 3 {
                    match self.peek_at(taken)? {
                        Some(d @ b'0'..=b'7') => {
                            v = v * 8 + (d - b'0') as u32;
                            taken += 1;
                        }
                        _ => break,
                    }
                }
                self.bump(taken - 1); // first digit is bumped below
                out.push(v as u8);
            }
            other => {
                self.bump(1);
                return Err(ParseError::Lexical {
                    offset: self.offset() - 1,
                    cause: LexicalCause::BadEscape(other),
                });
            }
        }
        self.bump(1);
        Ok(())
    }

    fn scan_number(&mut self, start: u64) -> Result<Token, ParseError> {
        let mut raw = Vec::new();
        while let Some(b) = self.peek_at(0)? {
            match b {
                b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-' => {
                    raw.push(b);
                    self.bump(1);
                }
                _ => break,
            }
        }
        let end = self.offset();
        match parse_number(&raw) {
            Some(Number::Integer(value)) => Ok(Token::Integer { value, span: Span::new(start, end) }),
            Some(Number::Float(value)) => Ok(Token::Float { value, span: Span::new(start, end) }),
            None => Err(ParseError::Lexical {
                offset: start,
                cause: LexicalCause::MalformedNumber,
            }),
        }
    }

    fn scan_symbol(&mut self, start: u64) -> Result<Token, ParseError> {
        let mut raw = Vec::new();
        while let Some(b) = self.peek_at(0)? {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => {
                    raw.push(b);
                    self.bump(1);
                }
                _ => break,
            }
        }
        let end = self.offset();
        // SAFETY: raw holds only ASCII alphanumerics and underscores.
        let name = unsafe { String::from_utf8_unchecked(raw) };
        Ok(Token::Symbol { name, span: Span::new(start, end) })
    }

    // ======================== binary mode ========================

    fn next_binary(&mut self) -> Result<Token, ParseError> {
        let start = self.offset();
        let tag = match self.peek_at(0)? {
            Some(b) => b,
            None => return Ok(Token::EndOfInput { span: Span::at(start) }),
        };
        self.bump(1);

        match tag {
            tags::INTEGER => {
                let raw = self.take_fixed::<4>()?;
                let value = i32::from_be_bytes(raw);
                Ok(Token::Integer { value, span: Span::new(start, self.offset()) })
            }
            tags::FLOAT => {
                let raw = self.take_fixed::<8>()?;
                let value = f64::from_be_bytes(raw);
                Ok(Token::Float { value, span: Span::new(start, self.offset()) })
            }
            tags::STRING => {
                let bytes = self.take_prefixed()?;
                Ok(Token::Str {
                    value: String::from_utf8_lossy(&bytes).into_owned(),
                    span: Span::new(start, self.offset()),
                })
            }
            tags::SYMBOL => {
                let bytes = self.take_prefixed()?;
                Ok(Token::Symbol {
                    name: String::from_utf8_lossy(&bytes).into_owned(),
                    span: Span::new(start, self.offset()),
                })
            }
            tags::ARRAY_OPEN => Ok(Token::ArrayOpen { span: Span::new(start, start + 1) }),
            tags::ARRAY_CLOSE => Ok(Token::ArrayClose { span: Span::new(start, start + 1) }),
            other => Err(ParseError::Lexical {
                offset: start,
                cause: LexicalCause::UnknownTag(other),
            }),
        }
    }

    fn take_fixed<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        if !self.ensure(N)? {
            return Err(self.lexical(LexicalCause::TruncatedPayload));
        }
        let mut raw = [0u8; N];
        raw.copy_from_slice(&self.available()[..N]);
        self.bump(N);
        Ok(raw)
    }

    fn take_prefixed(&mut self) -> Result<Vec<u8>, ParseError> {
        let len = u32::from_be_bytes(self.take_fixed::<4>()?);
        if len > MAX_PREFIXED_LEN {
            return Err(self.lexical(LexicalCause::OversizedLength(len)));
        }
        let len = len as usize;
        if !self.ensure(len)? {
            return Err(self.lexical(LexicalCause::TruncatedPayload));
        }
        let bytes = self.available()[..len].to_vec();
        self.bump(len);
        Ok(bytes)
    }
}

/// Forward-only token access with one token of lookahead.
///
/// The dispatcher and the parameter validator both pull through this, so
/// the token the validator stops on (the next request's symbol) stays
/// pending for the dispatcher to consume.
pub trait TokenStream {
    fn next_token(&mut self) -> Result<Token, ParseError>;
    fn peek_token(&mut self) -> Result<&Token, ParseError>;
}

/// A `TokenStream` over a lexer plus an externally owned lookahead slot.
pub struct PeekableTokens<'a> {
    lexer: &'a mut Lexer,
    pending: &'a mut Option<Token>,
}

impl<'a> PeekableTokens<'a> {
    pub fn new(lexer: &'a mut Lexer, pending: &'a mut Option<Token>) -> Self {
        Self { lexer, pending }
    }
}

impl TokenStream for PeekableTokens<'_> {
    fn next_token(&mut self) -> Result<Token, ParseError> {
        match self.pending.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn peek_token(&mut self) -> Result<&Token, ParseError> {
        if self.pending.is_none() {
            *self.pending = Some(self.lexer.next_token()?);
        }
        Ok(self.pending.as_ref().expect("pending token just filled"))
    }
}
