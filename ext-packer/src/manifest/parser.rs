//! Static parser for `ext_emconf.php` descriptors.
//!
//! The descriptor is read as data, never executed. Only literal
//! assignments to `$EM_CONF[...]` are evaluated; any other top-level
//! statement (access guards, `declare(...)`, stray assignments) is skipped
//! by balanced-token scanning. Expressions are limited to literals and
//! array literals, so a descriptor that computes values is rejected.

use super::value::{Array, Key, ManifestValue};

/// Name of the variable descriptors assign to.
const EM_CONF: &str = "EM_CONF";

/// Variable bound to the extension key being packed.
const EXTKEY_VAR: &str = "_EXTKEY";

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

type ParseResult<T> = std::result::Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Variable(String),
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Arrow,
    Assign,
    Semicolon,
    Minus,
    Plus,
    Other(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Variable(name) => format!("variable ${name}"),
            Token::Ident(name) => format!("`{name}`"),
            Token::Str(_) => "string literal".to_string(),
            Token::Int(_) | Token::Float(_) => "number".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBrace => "`{`".to_string(),
            Token::RBrace => "`}`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Arrow => "`=>`".to_string(),
            Token::Assign => "`=`".to_string(),
            Token::Semicolon => "`;`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Other(c) => format!("`{c}`"),
        }
    }
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: usize,
    in_code: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            in_code: false,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn rest(&mut self) -> &'a str {
        match self.chars.peek() {
            Some(&(i, _)) => &self.src[i..],
            None => "",
        }
    }

    fn skip_chars(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn tokenize(mut self) -> ParseResult<Vec<(Token, usize)>> {
        let mut tokens = Vec::new();
        loop {
            if !self.in_code {
                if !self.skip_to_open_tag() {
                    return Ok(tokens);
                }
                continue;
            }
            self.skip_trivia();
            let line = self.line;
            if self.rest().starts_with("?>") {
                self.skip_chars(2);
                self.in_code = false;
                continue;
            }
            let Some(c) = self.peek() else {
                return Ok(tokens);
            };
            let token = match c {
                '$' => {
                    self.bump();
                    let name = self.identifier();
                    if name.is_empty() {
                        return Err(SyntaxError::new(line, "expected variable name after `$`"));
                    }
                    Token::Variable(name)
                }
                '\'' => {
                    self.bump();
                    Token::Str(self.single_quoted(line)?)
                }
                '"' => {
                    self.bump();
                    Token::Str(self.double_quoted(line)?)
                }
                '0'..='9' => self.number(line)?,
                '.' if self.rest()[1..].starts_with(|d: char| d.is_ascii_digit()) => {
                    self.number(line)?
                }
                c if c == '_' || c.is_alphabetic() => Token::Ident(self.identifier()),
                '=' => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        Token::Arrow
                    } else {
                        Token::Assign
                    }
                }
                _ => {
                    self.bump();
                    match c {
                        '[' => Token::LBracket,
                        ']' => Token::RBracket,
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '{' => Token::LBrace,
                        '}' => Token::RBrace,
                        ',' => Token::Comma,
                        ';' => Token::Semicolon,
                        '-' => Token::Minus,
                        '+' => Token::Plus,
                        other => Token::Other(other),
                    }
                }
            };
            tokens.push((token, line));
        }
    }

    /// Skip inline text up to and including the next open tag.
    fn skip_to_open_tag(&mut self) -> bool {
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return false;
            }
            if rest.starts_with("<?") {
                let tag_len = if rest.get(2..5).is_some_and(|t| t.eq_ignore_ascii_case("php")) {
                    5
                } else {
                    2
                };
                self.skip_chars(tag_len);
                self.in_code = true;
                return true;
            }
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") || (rest.starts_with('#') && !rest.starts_with("#[")) {
                while let Some(c) = self.peek() {
                    if c == '\n' || self.rest().starts_with("?>") {
                        break;
                    }
                    self.bump();
                }
            } else if rest.starts_with("/*") {
                self.skip_chars(2);
                while !self.rest().is_empty() && !self.rest().starts_with("*/") {
                    self.bump();
                }
                self.skip_chars(2);
            } else if rest.starts_with(|c: char| c.is_whitespace()) {
                self.bump();
            } else {
                return;
            }
        }
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() || c == '\\' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn single_quoted(&mut self, line: usize) -> ParseResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(line, "unterminated string literal")),
                Some('\'') => return Ok(out),
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        self.bump();
                        out.push(c);
                    }
                    _ => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Double-quoted literal. Escapes are decoded to bytes first, so `\x`
    /// and octal escapes must combine into valid UTF-8.
    fn double_quoted(&mut self, line: usize) -> ParseResult<String> {
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(line, "unterminated string literal")),
                Some('"') => {
                    return String::from_utf8(out).map_err(|_| {
                        SyntaxError::new(line, "string escapes do not form valid UTF-8")
                    });
                }
                Some('\\') => self.escape_sequence(&mut out)?,
                Some('$') if self.peek().is_some_and(|c| c == '_' || c == '{' || c.is_alphabetic()) => {
                    return Err(SyntaxError::new(
                        self.line,
                        "variable interpolation in strings is not supported",
                    ));
                }
                Some(c) => push_char(&mut out, c),
            }
        }
    }

    /// Decode the escape following a backslash. Unknown escapes keep the
    /// backslash.
    fn escape_sequence(&mut self, out: &mut Vec<u8>) -> ParseResult<()> {
        let simple = match self.peek() {
            Some('n') => Some(b'\n'),
            Some('t') => Some(b'\t'),
            Some('r') => Some(b'\r'),
            Some('v') => Some(0x0b),
            Some('e') => Some(0x1b),
            Some('f') => Some(0x0c),
            Some('\\') => Some(b'\\'),
            Some('$') => Some(b'$'),
            Some('"') => Some(b'"'),
            _ => None,
        };
        if let Some(byte) = simple {
            self.bump();
            out.push(byte);
            return Ok(());
        }

        let rest = self.rest();
        if let Some(hex) = rest.strip_prefix('x') {
            let digits = leading(hex, |c| c.is_ascii_hexdigit(), 2);
            if !digits.is_empty() {
                self.skip_chars(1 + digits.len());
                out.push(u8::from_str_radix(digits, 16).unwrap_or_default());
                return Ok(());
            }
        } else if rest.starts_with(|c: char| ('0'..='7').contains(&c)) {
            let digits = leading(rest, |c| ('0'..='7').contains(&c), 3);
            self.skip_chars(digits.len());
            // `\400` and above wrap to one byte.
            out.push((u16::from_str_radix(digits, 8).unwrap_or_default() & 0xff) as u8);
            return Ok(());
        } else if let Some(body) = rest.strip_prefix("u{") {
            let line = self.line;
            let digits = leading(body, |c| c.is_ascii_hexdigit(), body.len());
            let c = body[digits.len()..]
                .starts_with('}')
                .then(|| u32::from_str_radix(digits, 16).ok())
                .flatten()
                .and_then(char::from_u32)
                .ok_or_else(|| SyntaxError::new(line, "invalid `\\u{...}` escape"))?;
            self.skip_chars(3 + digits.len());
            push_char(out, c);
            return Ok(());
        }

        out.push(b'\\');
        Ok(())
    }

    fn number(&mut self, line: usize) -> ParseResult<Token> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                text.push(c);
                self.bump();
            } else if (c == '-' || c == '+') && text.ends_with(['e', 'E']) && !text.starts_with("0x") {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let clean = text.replace('_', "");
        let invalid = || SyntaxError::new(line, format!("invalid number literal `{text}`"));

        let lower = clean.to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix("0x") {
            return i64::from_str_radix(hex, 16).map(Token::Int).map_err(|_| invalid());
        }
        if let Some(bin) = lower.strip_prefix("0b") {
            return i64::from_str_radix(bin, 2).map(Token::Int).map_err(|_| invalid());
        }
        if let Some(oct) = lower.strip_prefix("0o") {
            return i64::from_str_radix(oct, 8).map(Token::Int).map_err(|_| invalid());
        }
        if lower.contains(['.', 'e']) {
            return lower.parse::<f64>().map(Token::Float).map_err(|_| invalid());
        }
        if lower.len() > 1 && lower.starts_with('0') {
            return i64::from_str_radix(&lower[1..], 8).map(Token::Int).map_err(|_| invalid());
        }
        match lower.parse::<i64>() {
            Ok(n) => Ok(Token::Int(n)),
            // Integer overflow degrades to float, as the format always has.
            Err(_) => lower.parse::<f64>().map(Token::Float).map_err(|_| invalid()),
        }
    }
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Longest ASCII prefix of `text` (at most `max` chars) matching `accept`.
fn leading(text: &str, accept: impl Fn(char) -> bool, max: usize) -> &str {
    let len = text
        .char_indices()
        .take(max)
        .find(|&(_, c)| !accept(c))
        .map_or_else(|| text.chars().take(max).map(char::len_utf8).sum(), |(i, _)| i);
    &text[..len]
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    extension_key: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(SyntaxError::new(
                line,
                format!("expected {}, found {}", expected.describe(), t.describe()),
            )),
            None => Err(SyntaxError::new(
                line,
                format!("expected {}, found end of file", expected.describe()),
            )),
        }
    }

    fn parse_file(&mut self) -> ParseResult<Array> {
        let mut em_conf = Array::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Variable(name) if name == EM_CONF => self.parse_assignment(&mut em_conf)?,
                Token::Semicolon => {
                    self.pos += 1;
                }
                _ => self.skip_statement(),
            }
        }
        Ok(em_conf)
    }

    /// Skip one statement without interpreting it.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.next() {
            match token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
                Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                Token::Semicolon if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn parse_assignment(&mut self, em_conf: &mut Array) -> ParseResult<()> {
        self.next();
        let mut path = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.next();
            path.push(self.parse_index()?);
            self.expect(Token::RBracket)?;
        }
        self.expect(Token::Assign)?;
        let line = self.line();
        let value = self.parse_expr()?;
        self.expect(Token::Semicolon)?;

        match path.split_first() {
            None => match value {
                ManifestValue::Array(array) => *em_conf = array,
                _ => return Err(SyntaxError::new(line, "$EM_CONF must be assigned an array")),
            },
            Some((first, rest)) => assign_path(em_conf, first.clone(), rest, value),
        }
        Ok(())
    }

    fn parse_index(&mut self) -> ParseResult<Key> {
        let line = self.line();
        match self.next() {
            Some(Token::Variable(name)) if name == EXTKEY_VAR => Ok(Key::from_text(self.extension_key)),
            Some(Token::Variable(name)) => Err(SyntaxError::new(
                line,
                format!("unsupported variable ${name} in $EM_CONF index"),
            )),
            Some(Token::Str(s)) => Ok(Key::from_text(&s)),
            Some(Token::Int(n)) => Ok(Key::Int(n)),
            Some(t) => Err(SyntaxError::new(
                line,
                format!("unsupported $EM_CONF index {}", t.describe()),
            )),
            None => Err(SyntaxError::new(line, "unexpected end of file in $EM_CONF index")),
        }
    }

    fn parse_expr(&mut self) -> ParseResult<ManifestValue> {
        let line = self.line();
        match self.next() {
            Some(Token::Str(s)) => Ok(ManifestValue::String(s)),
            Some(Token::Int(n)) => Ok(ManifestValue::Int(n)),
            Some(Token::Float(f)) => Ok(ManifestValue::Float(f)),
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(n)) => Ok(ManifestValue::Int(-n)),
                Some(Token::Float(f)) => Ok(ManifestValue::Float(-f)),
                _ => Err(SyntaxError::new(line, "expected number after `-`")),
            },
            Some(Token::Plus) => match self.next() {
                Some(Token::Int(n)) => Ok(ManifestValue::Int(n)),
                Some(Token::Float(f)) => Ok(ManifestValue::Float(f)),
                _ => Err(SyntaxError::new(line, "expected number after `+`")),
            },
            Some(Token::LBracket) => self.parse_array_body(Token::RBracket),
            Some(Token::Ident(name)) => match name.to_ascii_lowercase().as_str() {
                "true" => Ok(ManifestValue::Bool(true)),
                "false" => Ok(ManifestValue::Bool(false)),
                "null" => Ok(ManifestValue::Null),
                "array" => {
                    self.expect(Token::LParen)?;
                    self.parse_array_body(Token::RParen)
                }
                _ => Err(SyntaxError::new(
                    line,
                    format!("unsupported expression `{name}`: only literal values are allowed"),
                )),
            },
            Some(t) => Err(SyntaxError::new(
                line,
                format!("unsupported expression {}: only literal values are allowed", t.describe()),
            )),
            None => Err(SyntaxError::new(line, "unexpected end of file in expression")),
        }
    }

    fn parse_array_body(&mut self, close: Token) -> ParseResult<ManifestValue> {
        let mut array = Array::new();
        loop {
            if self.peek() == Some(&close) {
                self.next();
                break;
            }
            let line = self.line();
            let first = self.parse_expr()?;
            if self.peek() == Some(&Token::Arrow) {
                self.next();
                let key = array_key(first).ok_or_else(|| SyntaxError::new(line, "illegal array key"))?;
                let value = self.parse_expr()?;
                array.insert(key, value);
            } else {
                array.push(first);
            }
            match self.next() {
                Some(Token::Comma) => continue,
                Some(ref t) if *t == close => break,
                Some(t) => {
                    return Err(SyntaxError::new(
                        self.line(),
                        format!("expected `,` or {}, found {}", close.describe(), t.describe()),
                    ))
                }
                None => return Err(SyntaxError::new(line, "unterminated array literal")),
            }
        }
        Ok(ManifestValue::Array(array))
    }
}

fn array_key(value: ManifestValue) -> Option<Key> {
    match value {
        ManifestValue::String(s) => Some(Key::from_text(&s)),
        ManifestValue::Int(n) => Some(Key::Int(n)),
        ManifestValue::Bool(b) => Some(Key::Int(i64::from(b))),
        ManifestValue::Float(f) => Some(Key::Int(f.trunc() as i64)),
        ManifestValue::Null => Some(Key::Str(String::new())),
        ManifestValue::Array(_) => None,
    }
}

fn assign_path(target: &mut Array, key: Key, rest: &[Key], value: ManifestValue) {
    let Some((next, tail)) = rest.split_first() else {
        target.insert(key, value);
        return;
    };
    let mut child = match target.iter().find(|(k, _)| **k == key) {
        Some((_, ManifestValue::Array(existing))) => existing.clone(),
        _ => Array::new(),
    };
    assign_path(&mut child, next.clone(), tail, value);
    target.insert(key, ManifestValue::Array(child));
}

/// Parse a descriptor and return the full `$EM_CONF` array, with
/// `$_EXTKEY` bound to `extension_key`.
pub fn parse_descriptor(source: &str, extension_key: &str) -> ParseResult<Array> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        extension_key,
    };
    parser.parse_file()
}
