use std::error;
use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::utils::get_line_col;
use crate::value::{Array, Object, Value};

#[derive(Debug, PartialEq)]
pub struct ParsingError {
    pub message: String,
    pub index: usize, // byte offset
    pub lineno: usize,
    pub colno: usize,
}

impl Display for ParsingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParsingError: {}: line {} column {} (byte {})", self.message, self.lineno, self.colno, self.index)
    }
}

impl error::Error for ParsingError {}

/// Error from [from_file]: either the file could not be read, or its
/// contents failed to parse.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(ParsingError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "LoadError: {}", e),
            LoadError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> LoadError {
        LoadError::Io(e)
    }
}

impl From<ParsingError> for LoadError {
    fn from(e: ParsingError) -> LoadError {
        LoadError::Parse(e)
    }
}

/// Recursive-descent parser: a byte cursor over an immutable, already
/// UTF-8-validated input buffer. One method per grammar production.
struct Parser<'input> {
    source: &'input str,
    pos: usize,
}

impl<'input> Parser<'input> {
    fn new(source: &'input str) -> Self {
        Parser { source, pos: 0 }
    }

    fn bytes(&self) -> &'input [u8] {
        self.source.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn make_error(&self, message: String, index: usize) -> ParsingError {
        let (lineno, colno) = get_line_col(self.source, index);
        ParsingError { message, index, lineno, colno }
    }

    /// Advance past insignificant whitespace and return the next
    /// significant byte without consuming it. Tab counts as whitespace
    /// (strict JSON), along with space, CR and LF.
    fn skip_space(&mut self) -> Option<u8> {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => return Some(byte),
            }
        }
        None
    }

    fn parse_value(&mut self) -> Result<Value, ParsingError> {
        match self.skip_space() {
            None => Err(self.make_error("Unexpected end of input, was expecting value".to_string(), self.pos)),
            Some(b'"') => Ok(Value::String(self.parse_string()?)),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(b't') => self.parse_literal("true", Value::Bool(true)),
            Some(b'f') => self.parse_literal("false", Value::Bool(false)),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(byte) => Err(self.make_error(format!("Unexpected character {:?}, was expecting value", byte as char), self.pos)),
        }
    }

    /// The cursor sits on the opening quote. Raw bytes are copied through
    /// until the unescaped closing quote; escapes are decoded as they are
    /// encountered. Since the input is valid UTF-8 and splitting only
    /// happens at ASCII bytes, every copied chunk is valid UTF-8 too.
    fn parse_string(&mut self) -> Result<String, ParsingError> {
        let start_idx = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chunk_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(self.make_error("Unterminated string starting at".to_string(), start_idx))
                }
                Some(b'"') => {
                    value.push_str(&self.source[chunk_start..self.pos]);
                    self.pos += 1;
                    return Ok(value);
                }
                Some(b'\\') => {
                    value.push_str(&self.source[chunk_start..self.pos]);
                    self.parse_escape(&mut value)?;
                    chunk_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// The cursor sits on the backslash.
    fn parse_escape(&mut self, value: &mut String) -> Result<(), ParsingError> {
        let escape_idx = self.pos;
        self.pos += 1;
        match self.peek() {
            None => Err(self.make_error("Unterminated escape sequence".to_string(), escape_idx)),
            Some(byte) => {
                self.pos += 1;
                match byte {
                    b'"' => value.push('"'),
                    b'\\' => value.push('\\'),
                    b'/' => value.push('/'),
                    b'b' => value.push('\u{0008}'),
                    b'f' => value.push('\u{000c}'),
                    b'n' => value.push('\n'),
                    b'r' => value.push('\r'),
                    b't' => value.push('\t'),
                    b'u' => {
                        let decoded = self.parse_unicode_escape(escape_idx)?;
                        value.push(decoded);
                    }
                    _ => {
                        return Err(self.make_error(format!("Invalid escape character {:?}", byte as char), escape_idx))
                    }
                }
                Ok(())
            }
        }
    }

    /// The cursor sits just past `\u`. Decodes 4 hex digits, combining a
    /// D800-DBFF high surrogate with a following `\u`-escaped DC00-DFFF
    /// low surrogate into a single code point.
    fn parse_unicode_escape(&mut self, escape_idx: usize) -> Result<char, ParsingError> {
        let first = self.read_hex4(escape_idx)?;
        let code_point = match first {
            0xD800..=0xDBFF => {
                if self.peek() != Some(b'\\') {
                    return Err(self.make_error("Unpaired surrogate in unicode escape".to_string(), escape_idx));
                }
                self.pos += 1;
                if self.peek() != Some(b'u') {
                    return Err(self.make_error("Unpaired surrogate in unicode escape".to_string(), escape_idx));
                }
                self.pos += 1;
                let second = self.read_hex4(escape_idx)?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.make_error("Invalid low surrogate in unicode escape".to_string(), escape_idx));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.make_error("Unpaired surrogate in unicode escape".to_string(), escape_idx))
            }
            cp => cp,
        };
        char::from_u32(code_point)
            .ok_or_else(|| self.make_error("Invalid code point in unicode escape".to_string(), escape_idx))
    }

    fn read_hex4(&mut self, escape_idx: usize) -> Result<u32, ParsingError> {
        let mut result: u32 = 0;
        for _ in 0..4 {
            let digit = match self.peek() {
                Some(byte @ b'0'..=b'9') => byte - b'0',
                Some(byte @ b'a'..=b'f') => byte - b'a' + 10,
                Some(byte @ b'A'..=b'F') => byte - b'A' + 10,
                _ => {
                    return Err(self.make_error("Expected 4 hex digits in unicode escape".to_string(), escape_idx))
                }
            };
            result = (result << 4) | digit as u32;
            self.pos += 1;
        }
        Ok(result)
    }

    /// The cursor sits on the opening bracket.
    fn parse_array(&mut self) -> Result<Value, ParsingError> {
        self.pos += 1;
        let mut array = Array::new();

        if self.skip_space() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(array));
        }

        loop {
            let item = self.parse_value()?;
            array.push(item);
            match self.skip_space() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(byte) => {
                    return Err(self.make_error(format!("Expecting ',' or ']' in array, got {:?}", byte as char), self.pos))
                }
                None => {
                    return Err(self.make_error("Unexpected end of input, was expecting ',' or ']'".to_string(), self.pos))
                }
            }
        }
        Ok(Value::Array(array))
    }

    /// The cursor sits on the opening brace. Keys go through
    /// [Object::insert], so a duplicate key keeps its first position and
    /// takes its last value.
    fn parse_object(&mut self) -> Result<Value, ParsingError> {
        self.pos += 1;
        let mut object = Object::new();

        if self.skip_space() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(object));
        }

        loop {
            match self.skip_space() {
                Some(b'"') => {}
                Some(byte) => {
                    return Err(self.make_error(format!("Expecting '\"' to begin object key, got {:?}", byte as char), self.pos))
                }
                None => {
                    return Err(self.make_error("Unexpected end of input, was expecting object key".to_string(), self.pos))
                }
            }
            let key = self.parse_string()?;
            match self.skip_space() {
                Some(b':') => {
                    self.pos += 1;
                }
                _ => return Err(self.make_error("Expecting ':' delimiter".to_string(), self.pos)),
            }
            let value = self.parse_value()?;
            object.insert(key, value);
            match self.skip_space() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(byte) => {
                    return Err(self.make_error(format!("Expecting ',' or '}}' in object, got {:?}", byte as char), self.pos))
                }
                None => {
                    return Err(self.make_error("Unexpected end of input, was expecting ',' or '}'".to_string(), self.pos))
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn parse_literal(&mut self, keyword: &str, value: Value) -> Result<Value, ParsingError> {
        let end = self.pos + keyword.len();
        if self.bytes().get(self.pos..end) == Some(keyword.as_bytes()) {
            self.pos = end;
            Ok(value)
        } else {
            Err(self.make_error(format!("Invalid literal, was expecting '{}'", keyword), self.pos))
        }
    }

    /// Scans the strict JSON number grammar (optional minus, integer part
    /// without leading zeros, optional fraction, optional exponent), then
    /// converts the lexeme. Leading '+' is not part of the grammar and is
    /// never dispatched here.
    fn parse_number(&mut self) -> Result<Value, ParsingError> {
        let start_idx = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
            }
            _ => return Err(self.make_error("Invalid number literal (missing integer part)".to_string(), start_idx)),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.make_error("Invalid number literal (missing digit after decimal point)".to_string(), start_idx));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.make_error("Invalid number literal (missing digit in exponent)".to_string(), start_idx));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let lexeme = &self.source[start_idx..self.pos];
        match lexeme.parse::<f64>() {
            Ok(number) => Ok(Value::Number(number)),
            Err(_) => Err(self.make_error(format!("Invalid number literal {:?}", lexeme), start_idx)),
        }
    }

    /// Top level: skip a UTF-8 BOM if present, require an object or array
    /// root (bare scalars are rejected), and require only whitespace after
    /// the root.
    fn parse_text(&mut self) -> Result<Value, ParsingError> {
        if self.source[self.pos..].starts_with('\u{feff}') {
            self.pos += '\u{feff}'.len_utf8();
        }
        let root = match self.skip_space() {
            Some(b'{') => self.parse_object()?,
            Some(b'[') => self.parse_array()?,
            Some(byte) => {
                return Err(self.make_error(format!("Expecting '{{' or '[' at top level, got {:?}", byte as char), self.pos))
            }
            None => return Err(self.make_error("Unexpected end of input, was expecting document".to_string(), self.pos)),
        };
        match self.skip_space() {
            None => Ok(root),
            Some(_) => Err(self.make_error("Unexpected character after end of document".to_string(), self.pos)),
        }
    }
}

/// Parse a JSON document into a [Value] tree. The root must be an object
/// or an array.
pub fn from_str(source: &str) -> Result<Value, ParsingError> {
    Parser::new(source).parse_text()
}

/// Parse a JSON document from a byte buffer. The buffer must be valid
/// UTF-8; the error position points at where validity ends.
pub fn from_bytes(bytes: &[u8]) -> Result<Value, ParsingError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => from_str(text),
        Err(e) => {
            let valid_point = e.valid_up_to();
            let valid_text = std::str::from_utf8(&bytes[..valid_point]).expect("validated prefix");
            let (lineno, colno) = get_line_col(valid_text, valid_point);
            Err(ParsingError { message: "Invalid UTF8 at".to_string(), index: valid_point, lineno, colno })
        }
    }
}

/// Read an entire file into memory, then parse it.
pub fn from_file(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let bytes = std::fs::read(path)?;
    Ok(from_bytes(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object() {
        let res = from_str("{}").unwrap();
        assert_eq!(res, Value::Object(Object::new()));
    }

    #[test]
    fn test_empty_array() {
        let res = from_str("[]").unwrap();
        assert_eq!(res, Value::Array(Array::new()));
        assert_eq!(res.dump(), "[]");
    }

    #[test]
    fn test_object() {
        let res = from_str("{\"foo\": \"bar\"}").unwrap();
        let mut expected = Object::new();
        expected.insert("foo", "bar");
        assert_eq!(res, Value::Object(expected));
    }

    #[test]
    fn test_array_of_numbers() {
        let res = from_str("[1, 2.5, -3, 2e2, 1e-2]").unwrap();
        let mut expected = Array::new();
        expected.push(1).push(2.5).push(-3).push(200.0).push(0.01);
        assert_eq!(res, Value::Array(expected));
    }

    #[test]
    fn test_nested_document() {
        let res = from_str("{\"a\":1,\"b\":[true,false,null]}").unwrap();
        let object = res.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("a").unwrap().as_f64(), Some(1.0));
        let items = object.get("b").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items.get(0).unwrap().as_bool(), Some(true));
        assert_eq!(items.get(1).unwrap().as_bool(), Some(false));
        assert!(items.get(2).unwrap().is_null());
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let res = from_str("{\"a\":1,\"a\":2}").unwrap();
        let object = res.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object.get("a").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn test_missing_value_fails() {
        from_str("{\"a\":}").unwrap_err();
    }

    #[test]
    fn test_whitespace_including_tab() {
        let res = from_str(" {\t\"a\" :\r\n 1 } ").unwrap();
        assert_eq!(res.dump(), "{\"a\":1}");
    }

    #[test]
    fn test_bom_is_skipped() {
        let res = from_str("\u{feff}[1]").unwrap();
        assert_eq!(res.dump(), "[1]");
    }

    #[test]
    fn test_top_level_scalar_rejected() {
        from_str("1").unwrap_err();
        from_str("\"hi\"").unwrap_err();
        from_str("true").unwrap_err();
        from_str("null").unwrap_err();
    }

    #[test]
    fn test_trailing_garbage_fails() {
        from_str("[] []").unwrap_err();
        from_str("{}x").unwrap_err();
    }

    #[test]
    fn test_trailing_whitespace_ok() {
        from_str("[]  \r\n\t").unwrap();
    }

    #[test]
    fn test_empty_input_fails() {
        from_str("").unwrap_err();
        from_str("   ").unwrap_err();
    }

    #[test]
    fn test_trailing_comma_fails() {
        from_str("[1,]").unwrap_err();
        from_str("{\"a\":1,}").unwrap_err();
    }

    #[test]
    fn test_string_escapes() {
        let res = from_str(r#"["a\"b\\c\/d\b\f\n\r\t"]"#).unwrap();
        let items = res.as_array().unwrap();
        assert_eq!(items.get(0).unwrap().as_str(), Some("a\"b\\c/d\u{8}\u{c}\n\r\t"));
    }

    #[test]
    fn test_unicode_escape() {
        let res = from_str(r#"["\u00e9"]"#).unwrap();
        assert_eq!(res.as_array().unwrap().get(0).unwrap().as_str(), Some("é"));
    }

    #[test]
    fn test_unicode_escape_mixed_case_hex() {
        let res = from_str(r#"["\u00E9A"]"#).unwrap();
        assert_eq!(res.as_array().unwrap().get(0).unwrap().as_str(), Some("éA"));
    }

    #[test]
    fn test_raw_multibyte_passthrough() {
        let res = from_str(r#"["é😀"]"#).unwrap();
        assert_eq!(res.as_array().unwrap().get(0).unwrap().as_str(), Some("é😀"));
    }

    #[test]
    fn test_surrogate_pair() {
        let res = from_str(r#"["\ud83d\ude00"]"#).unwrap();
        let text = res.as_array().unwrap().get(0).unwrap().as_str().unwrap().to_string();
        assert_eq!(text, "😀");
        assert_eq!(text.len(), 4);
    }

    #[test]
    fn test_lone_surrogate_fails() {
        from_str(r#"["\ud83d"]"#).unwrap_err();
        from_str(r#"["\ud83d "]"#).unwrap_err();
        from_str(r#"["\udc00"]"#).unwrap_err();
    }

    #[test]
    fn test_bad_escapes_fail() {
        from_str(r#"["\x"]"#).unwrap_err();
        from_str(r#"["\u12"]"#).unwrap_err();
        from_str(r#"["\uzzzz"]"#).unwrap_err();
    }

    #[test]
    fn test_unterminated_string_fails() {
        from_str("[\"abc").unwrap_err();
        // backslash as the very last byte must not advance past the end
        from_str("[\"abc\\").unwrap_err();
        from_str("[\"abc\\\"").unwrap_err();
    }

    #[test]
    fn test_string_at_end_of_buffer() {
        let res = from_str("[\"x\"]").unwrap();
        assert_eq!(res.as_array().unwrap().get(0).unwrap().as_str(), Some("x"));
    }

    #[test]
    fn test_bad_literals_fail() {
        from_str("[tru]").unwrap_err();
        from_str("[falsy]").unwrap_err();
        from_str("[nul]").unwrap_err();
        from_str("[t").unwrap_err();
    }

    #[test]
    fn test_bad_numbers_fail() {
        from_str("[+1]").unwrap_err();
        from_str("[.5]").unwrap_err();
        from_str("[1.]").unwrap_err();
        from_str("[1e]").unwrap_err();
        from_str("[01]").unwrap_err();
        from_str("[-]").unwrap_err();
    }

    #[test]
    fn test_missing_delimiters_fail() {
        from_str("[1 2]").unwrap_err();
        from_str("{\"a\" 1}").unwrap_err();
        from_str("{\"a\":1 \"b\":2}").unwrap_err();
        from_str("{a:1}").unwrap_err();
        from_str("[1").unwrap_err();
        from_str("{\"a\":1").unwrap_err();
    }

    #[test]
    fn test_error_position() {
        let err = from_str("{\n  \"a\": }").unwrap_err();
        assert_eq!(err.lineno, 2);
        assert!(err.index > 0);
    }

    #[test]
    fn test_from_bytes() {
        let res = from_bytes(b"{\"a\": [1]}").unwrap();
        assert_eq!(res.dump(), "{\"a\":[1]}");
    }

    #[test]
    fn test_from_bytes_invalid_utf8() {
        let err = from_bytes(b"[\"a\xff\"]").unwrap_err();
        assert_eq!(err.index, 3);
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("json_tree_parser_test.json");
        std::fs::write(&path, "{\"a\": [true, null]}").unwrap();
        let res = from_file(&path).unwrap();
        assert_eq!(res.dump(), "{\"a\":[true,null]}");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file("/definitely/not/a/real/path.json").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_roundtrip() {
        let mut inner = Array::new();
        inner.push(1).push(-2.5).push("text\n").push(Value::null());
        let mut object = Object::new();
        object.insert("first", 1).insert("second", Value::Array(inner)).insert("third", true);
        let tree = Value::Object(object);

        let reparsed = from_str(&tree.dump()).unwrap();
        assert_eq!(reparsed, tree);
        assert_eq!(reparsed.dump(), tree.dump());
    }

    #[test]
    fn test_roundtrip_numbers() {
        for n in [0.0, -0.0, 1.0, -1.5, 0.1, 1e300, 5e-324, 123456789.123456] {
            let text = Value::Array(Array::from_iter([Value::number(n)])).dump();
            let reparsed = from_str(&text).unwrap();
            assert_eq!(reparsed.as_array().unwrap().get(0).unwrap().as_f64(), Some(n), "{}", text);
        }
    }
}
