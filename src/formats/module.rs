//! Module configs: source files made of top-level literal assignments.
//!
//! ```text
//! # comment
//! TIMEOUT = 30
//! HOSTS = ["alpha", "beta"]
//! _BASE = "/srv"
//! PATHS = {"data": _BASE, "enabled": True, "ratio": 0.5}
//! ```
//!
//! Right-hand sides are literals (integers, floats, strings, `True`, `False`,
//! `None`, lists, tuples, dicts) or references to names bound earlier in the file.
//! Nothing is executed: imports, calls, definitions and every other statement
//! are rejected. Names starting with `_` can be referenced but are not exported.

use serde_json::{Map, Number, Value};


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleParseError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ModuleParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ModuleParseError {}

fn error_at<T>(line: usize, message: impl Into<String>) -> Result<T, ModuleParseError> {
    Err(ModuleParseError {
        line,
        message: message.into(),
    })
}


#[derive(Clone, Debug, PartialEq)]
enum Token {
    Name(String),
    Integer(i128),
    Float(f64),
    Str(String),
    Punct(char),
    Newline,
}

#[derive(Clone, Debug)]
struct Spanned {
    token: Token,
    line: usize,
}


struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    depth: usize,
    tokens: Vec<Spanned>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(Spanned {
            token,
            line: self.line,
        });
    }

    fn run(mut self) -> Result<Vec<Spanned>, ModuleParseError> {
        while let Some(&character) = self.chars.peek() {
            match character {
                '\n' => {
                    self.chars.next();
                    // Newlines inside brackets do not end a statement.
                    if self.depth == 0 {
                        self.push(Token::Newline);
                    }
                    self.line += 1;
                }
                '#' => {
                    while let Some(&next) = self.chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                '\\' => {
                    self.chars.next();
                    match self.chars.next() {
                        Some('\n') => self.line += 1,
                        Some('\r') if self.chars.peek() == Some(&'\n') => {
                            self.chars.next();
                            self.line += 1;
                        }
                        _ => return error_at(self.line, "unexpected `\\` outside of a string"),
                    }
                }
                character if character.is_whitespace() => {
                    self.chars.next();
                }
                '"' | '\'' => {
                    let string = self.string()?;
                    self.push(Token::Str(string));
                }
                character if character.is_ascii_digit() || character == '.' => {
                    let number = self.number()?;
                    self.push(number);
                }
                character if character.is_alphabetic() || character == '_' => {
                    let mut name = String::new();
                    while let Some(&next) = self.chars.peek() {
                        if !(next.is_alphanumeric() || next == '_') {
                            break;
                        }
                        name.push(next);
                        self.chars.next();
                    }
                    self.push(Token::Name(name));
                }
                '[' | '(' | '{' => {
                    self.chars.next();
                    self.depth += 1;
                    self.push(Token::Punct(character));
                }
                ']' | ')' | '}' => {
                    self.chars.next();
                    if self.depth == 0 {
                        return error_at(self.line, format!("unmatched `{character}`"));
                    }
                    self.depth -= 1;
                    self.push(Token::Punct(character));
                }
                '=' | ',' | ':' | '-' | '+' => {
                    self.chars.next();
                    self.push(Token::Punct(character));
                }
                other => {
                    return error_at(self.line, format!("unexpected character {other:?}"));
                }
            }
        }

        if self.depth != 0 {
            return error_at(self.line, "unclosed bracket at end of file");
        }

        self.push(Token::Newline);
        Ok(self.tokens)
    }

    fn string(&mut self) -> Result<String, ModuleParseError> {
        let Some(quote) = self.chars.next() else {
            return error_at(self.line, "expected a string");
        };

        let mut string = String::new();
        let start_line = self.line;

        loop {
            match self.chars.next() {
                None | Some('\n') => {
                    return error_at(start_line, "unterminated string literal");
                }
                Some(character) if character == quote => break,
                Some('\\') => {
                    let escaped = match self.chars.next() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some('\n') => {
                            self.line += 1;
                            continue;
                        }
                        Some(other) => {
                            // Unknown escapes keep their backslash.
                            string.push('\\');
                            other
                        }
                        None => return error_at(start_line, "unterminated string literal"),
                    };
                    string.push(escaped);
                }
                Some(character) => string.push(character),
            }
        }

        // Triple-quoted strings are not supported; `""` followed by a quote would be one.
        if string.is_empty() && self.chars.peek() == Some(&quote) {
            return error_at(start_line, "triple-quoted strings are not supported");
        }

        Ok(string)
    }

    fn number(&mut self) -> Result<Token, ModuleParseError> {
        let mut literal = String::new();

        while let Some(&next) = self.chars.peek() {
            let continues_exponent = matches!(next, '+' | '-')
                && matches!(literal.chars().last(), Some('e' | 'E'));

            if next.is_ascii_alphanumeric() || next == '.' || next == '_' || continues_exponent {
                literal.push(next);
                self.chars.next();
            } else {
                break;
            }
        }

        let cleaned = literal.replace('_', "");

        if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
            return i128::from_str_radix(hex, 16)
                .map(Token::Integer)
                .or_else(|_| error_at(self.line, format!("invalid number {literal:?}")));
        }

        if cleaned.bytes().all(|byte| byte.is_ascii_digit()) {
            return cleaned
                .parse::<i128>()
                .map(Token::Integer)
                .or_else(|_| error_at(self.line, format!("integer {literal:?} is out of range")));
        }

        match cleaned.parse::<f64>() {
            Ok(float) if float.is_finite() => Ok(Token::Float(float)),
            _ => error_at(self.line, format!("invalid number {literal:?}")),
        }
    }
}


struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    bindings: Map<String, Value>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|spanned| &spanned.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|spanned| spanned.line)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).map(|spanned| spanned.token.clone());
        self.position += 1;
        token
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: char) -> Result<(), ModuleParseError> {
        if self.eat(punct) {
            Ok(())
        } else {
            error_at(self.line(), format!("expected `{punct}`"))
        }
    }

    fn statements(&mut self) -> Result<(), ModuleParseError> {
        while let Some(token) = self.peek().cloned() {
            match token {
                Token::Newline => {
                    self.position += 1;
                }
                Token::Name(name) => {
                    let line = self.line();
                    self.position += 1;

                    if !self.eat('=') {
                        return error_at(
                            line,
                            format!("unsupported statement starting with `{name}`; only `NAME = value` is allowed"),
                        );
                    }

                    let value = self.expression()?;

                    if self.next() != Some(Token::Newline) {
                        return error_at(line, "expected end of line after assignment");
                    }

                    self.bindings.insert(name, value);
                }
                _ => return error_at(self.line(), "expected an assignment"),
            }
        }

        Ok(())
    }

    fn expression(&mut self) -> Result<Value, ModuleParseError> {
        let line = self.line();

        match self.next() {
            Some(Token::Str(string)) => Ok(Value::String(string)),
            Some(Token::Integer(integer)) => integer_value(integer, line),
            Some(Token::Float(float)) => Ok(float_value(float, line)?),
            Some(Token::Punct('-')) => match self.next() {
                Some(Token::Integer(integer)) => integer_value(-integer, line),
                Some(Token::Float(float)) => Ok(float_value(-float, line)?),
                _ => error_at(line, "expected a number after `-`"),
            },
            Some(Token::Punct('+')) => match self.next() {
                Some(Token::Integer(integer)) => integer_value(integer, line),
                Some(Token::Float(float)) => Ok(float_value(float, line)?),
                _ => error_at(line, "expected a number after `+`"),
            },
            Some(Token::Name(name)) => match name.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::Null),
                _ => {
                    if self.peek() == Some(&Token::Punct('(')) {
                        return error_at(line, format!("calls are not allowed (`{name}(...)`)"));
                    }
                    match self.bindings.get(&name) {
                        Some(value) => Ok(value.clone()),
                        None => error_at(line, format!("name `{name}` is not defined")),
                    }
                }
            },
            Some(Token::Punct('[')) => Ok(Value::Array(self.sequence(']')?)),
            Some(Token::Punct('(')) => {
                if self.eat(')') {
                    return Ok(Value::Array(Vec::new()));
                }

                let first = self.expression()?;
                if self.eat(')') {
                    // Parenthesized expression, not a tuple.
                    return Ok(first);
                }

                self.expect(',')?;
                let mut items = vec![first];
                items.extend(self.sequence(')')?);
                Ok(Value::Array(items))
            }
            Some(Token::Punct('{')) => self.mapping(),
            Some(Token::Newline) | None => error_at(line, "expected a value"),
            Some(other) => error_at(line, format!("unexpected token {other:?}")),
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>, ModuleParseError> {
        let mut items = Vec::new();

        loop {
            if self.eat(close) {
                return Ok(items);
            }

            items.push(self.expression()?);

            if !self.eat(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn mapping(&mut self) -> Result<Value, ModuleParseError> {
        let mut map = Map::new();

        loop {
            if self.eat('}') {
                return Ok(Value::Object(map));
            }

            let line = self.line();
            let key = match self.expression()? {
                Value::String(string) => string,
                Value::Number(number) => number.to_string(),
                Value::Bool(boolean) => (if boolean { "True" } else { "False" }).to_string(),
                _ => return error_at(line, "dict keys must be strings, numbers or booleans"),
            };

            self.expect(':')?;
            let value = self.expression()?;
            map.insert(key, value);

            if !self.eat(',') {
                self.expect('}')?;
                return Ok(Value::Object(map));
            }
        }
    }
}

/// Integers are kept exact: `i64` when they fit, else `u64`, else an error.
fn integer_value(integer: i128, line: usize) -> Result<Value, ModuleParseError> {
    if let Ok(signed) = i64::try_from(integer) {
        return Ok(Value::from(signed));
    }

    match u64::try_from(integer) {
        Ok(unsigned) => Ok(Value::from(unsigned)),
        Err(_) => error_at(line, format!("integer {integer} does not fit in 64 bits")),
    }
}

fn float_value(float: f64, line: usize) -> Result<Value, ModuleParseError> {
    match Number::from_f64(float) {
        Some(number) => Ok(Value::Number(number)),
        None => error_at(line, "non-finite floats are not supported"),
    }
}


/// Evaluates a module config and returns its public bindings in definition order.
pub fn evaluate(source: &str) -> Result<Map<String, Value>, ModuleParseError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let tokens = Lexer::new(source).run()?;

    let mut parser = Parser {
        tokens,
        position: 0,
        bindings: Map::new(),
    };
    parser.statements()?;

    Ok(parser
        .bindings
        .into_iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .collect())
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn evaluates_scalars_and_skips_private_names() {
        let bindings = evaluate("\nFOO = 123\nBAR = \"baz\"\n_PRIVATE = 'hidden'\n").unwrap();

        assert_eq!(Value::Object(bindings), json!({ "FOO": 123, "BAR": "baz" }));
    }

    #[test]
    fn evaluates_nested_literals_across_lines() {
        let source = r#"
_ROOT = "/srv"  # private, but usable below
PATHS = {
    "data": _ROOT,
    "ratio": -0.5,
    1: None,
}
HOSTS = ["alpha", 'beta',]
PAIR = (1, 2)
SINGLE = (3,)
GROUPED = (4)
FLAGS = {'debug': True, "trace": False}
BIG = 1_000
"#;
        let bindings = evaluate(source).unwrap();

        assert_eq!(
            Value::Object(bindings),
            json!({
                "PATHS": { "data": "/srv", "ratio": -0.5, "1": null },
                "HOSTS": ["alpha", "beta"],
                "PAIR": [1, 2],
                "SINGLE": [3],
                "GROUPED": 4,
                "FLAGS": { "debug": true, "trace": false },
                "BIG": 1000,
            })
        );
    }

    #[test]
    fn later_assignments_overwrite_earlier_ones() {
        let bindings = evaluate("A = 1\nA = 2\n").unwrap();

        assert_eq!(bindings["A"], json!(2));
    }

    #[test]
    fn string_escapes() {
        let bindings = evaluate(r#"S = "a\tb\"c\\d" "#).unwrap();

        assert_eq!(bindings["S"], json!("a\tb\"c\\d"));
    }

    #[test]
    fn rejects_code() {
        assert!(evaluate("import os\n").is_err());
        assert!(evaluate("X = open('f')\n").is_err());
        assert!(evaluate("def f():\n    pass\n").is_err());
        assert!(evaluate("X = 1 + 2\n").is_err());
        assert!(evaluate("X = UNDEFINED\n").is_err());
        assert!(evaluate("X = [1, 2\n").is_err());
        assert!(evaluate("X = \"\"\"doc\"\"\"\n").is_err());
    }

    #[test]
    fn large_integers_stay_exact() {
        let bindings = evaluate("BIG = 12345678901234567890\nLOW = -9223372036854775808\n").unwrap();

        assert_eq!(bindings["BIG"].as_u64(), Some(12_345_678_901_234_567_890));
        assert_eq!(bindings["LOW"].as_i64(), Some(i64::MIN));

        assert!(evaluate("HUGE = 123456789012345678901234567890\n").is_err());
        assert!(evaluate("HUGE = -12345678901234567890\n").is_err());
    }

    #[test]
    fn reports_the_failing_line() {
        let error = evaluate("A = 1\n\nB = nope\n").unwrap_err();

        assert_eq!(error.line, 3);
    }
}
