use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use serde_json::{Map, Value};
use crate::models::hook::{Comparison, Expr, HookError, Statement, Term};

const CONTEXT_ROOTS: [&str; 2] = ["request", "response"];
const RESERVED: [&str; 6] = ["print", "assert", "let", "json", "request", "response"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Dot,
    LParen,
    RParen,
    Plus,
    Assign,
    EqEq,
    NotEq,
    Separator,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "`{}`", name),
            Token::Str(_) => write!(f, "string literal"),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Dot => write!(f, "`.`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::Plus => write!(f, "`+`"),
            Token::Assign => write!(f, "`=`"),
            Token::EqEq => write!(f, "`==`"),
            Token::NotEq => write!(f, "`!=`"),
            Token::Separator => write!(f, "end of statement"),
        }
    }
}

fn syntax(line: usize, message: impl Into<String>) -> HookError {
    HookError::Syntax {
        line,
        message: message.into(),
    }
}

/// Compile hook source into statements. The program is checked but not run.
pub(crate) fn compile(source: &str) -> Result<Vec<Statement>, HookError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).program()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, HookError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.chars.next() {
            let line = self.line;
            let token = match c {
                '\n' => {
                    self.line += 1;
                    Token::Separator
                }
                ';' => Token::Separator,
                c if c.is_whitespace() => continue,
                '#' => {
                    while self.chars.next_if(|c| *c != '\n').is_some() {}
                    continue;
                }
                '.' => Token::Dot,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '+' => Token::Plus,
                '=' if self.chars.next_if_eq(&'=').is_some() => Token::EqEq,
                '=' => Token::Assign,
                '!' if self.chars.next_if_eq(&'=').is_some() => Token::NotEq,
                '\'' | '"' => Token::Str(self.string(c)?),
                c if c.is_ascii_digit() => {
                    let mut number = c.to_string();
                    while let Some(d) = self.chars.next_if(|d| d.is_ascii_digit()) {
                        number.push(d);
                    }
                    Token::Number(number)
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut ident = c.to_string();
                    while let Some(d) = self
                        .chars
                        .next_if(|d| d.is_ascii_alphanumeric() || *d == '_' || *d == '-')
                    {
                        ident.push(d);
                    }
                    Token::Ident(ident)
                }
                other => return Err(syntax(line, format!("unexpected character `{}`", other))),
            };
            tokens.push((token, line));
        }
        Ok(tokens)
    }

    fn string(&mut self, quote: char) -> Result<String, HookError> {
        let start = self.line;
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => text.push(c),
                    Some(c) => return Err(syntax(self.line, format!("unknown escape `\\{}`", c))),
                    None => break,
                },
                Some('\n') => {
                    self.line += 1;
                    text.push('\n');
                }
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(syntax(start, "unterminated string literal"))
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    locals: HashSet<String>,
}

impl Parser {
    fn new(tokens: Vec<(Token, usize)>) -> Self {
        Parser {
            tokens,
            pos: 0,
            locals: HashSet::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, line)| *line)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Result<Token, HookError> {
        let line = self.line();
        let token = self
            .tokens
            .get(self.pos)
            .map(|(token, _)| token.clone())
            .ok_or_else(|| syntax(line, "unexpected end of input"))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), HookError> {
        let line = self.line();
        match self.next()? {
            token if token == expected => Ok(()),
            token => Err(syntax(line, format!("expected {}, found {}", expected, token))),
        }
    }

    fn program(mut self) -> Result<Vec<Statement>, HookError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&Token::Separator) {}
            if self.peek().is_none() {
                return Ok(statements);
            }
            statements.push(self.statement()?);
            if self.peek().is_some() && !self.eat(&Token::Separator) {
                let line = self.line();
                let token = self.next()?;
                return Err(syntax(line, format!("expected end of statement, found {}", token)));
            }
        }
    }

    fn statement(&mut self) -> Result<Statement, HookError> {
        let line = self.line();
        let keyword = match self.next()? {
            Token::Ident(keyword) => keyword,
            token => return Err(syntax(line, format!("expected a statement, found {}", token))),
        };
        match keyword.as_str() {
            "print" => Ok(Statement::Print(self.expr()?)),
            "assert" => {
                let left = self.expr()?;
                let line = self.line();
                let op = match self.next()? {
                    Token::EqEq => Comparison::Eq,
                    Token::NotEq => Comparison::NotEq,
                    token => return Err(syntax(line, format!("expected `==` or `!=`, found {}", token))),
                };
                let right = self.expr()?;
                Ok(Statement::Assert { left, op, right })
            }
            "let" => {
                let line = self.line();
                let name = match self.next()? {
                    Token::Ident(name) if !RESERVED.contains(&name.as_str()) => name,
                    token => return Err(syntax(line, format!("expected a variable name, found {}", token))),
                };
                self.expect(Token::Assign)?;
                let value = self.expr()?;
                self.locals.insert(name.clone());
                Ok(Statement::Let { name, value })
            }
            other => Err(syntax(line, format!("unknown statement `{}`", other))),
        }
    }

    fn expr(&mut self) -> Result<Expr, HookError> {
        let mut terms = vec![self.term()?];
        while self.eat(&Token::Plus) {
            terms.push(self.term()?);
        }
        Ok(Expr { terms })
    }

    fn term(&mut self) -> Result<Term, HookError> {
        let line = self.line();
        match self.next()? {
            Token::Str(text) | Token::Number(text) => Ok(Term::Literal(text)),
            Token::Ident(name) if name == "json" && self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let path = match self.next()? {
                    Token::Str(path) => path,
                    token => return Err(syntax(line, format!("json() takes a string literal, found {}", token))),
                };
                self.expect(Token::RParen)?;
                // selecting against an empty document only fails on bad syntax
                jsonpath_lib::select(&Value::Object(Map::new()), &path)
                    .map_err(|e| syntax(line, format!("invalid json path `{}`: {:?}", path, e)))?;
                Ok(Term::JsonPath(path))
            }
            Token::Ident(root) => self.path(line, root),
            token => Err(syntax(line, format!("expected a value, found {}", token))),
        }
    }

    fn path(&mut self, line: usize, root: String) -> Result<Term, HookError> {
        let mut segments = vec![root.clone()];
        while self.eat(&Token::Dot) {
            match self.next()? {
                Token::Ident(field) | Token::Number(field) => segments.push(field),
                token => return Err(syntax(line, format!("expected a field name after `.`, found {}", token))),
            }
        }
        if CONTEXT_ROOTS.contains(&root.as_str()) {
            if segments.len() == 1 {
                return Err(syntax(line, format!("`{}` needs a field, e.g. `{}.url`", root, root)));
            }
            // Header names are case-insensitive; the context stores them lowercased.
            if segments[1] == "headers" {
                for segment in &mut segments[2..] {
                    *segment = segment.to_lowercase();
                }
            }
            Ok(Term::Variable(segments.join(".")))
        } else if self.locals.contains(&root) {
            if segments.len() > 1 {
                return Err(syntax(line, format!("local `{}` has no fields", root)));
            }
            Ok(Term::Local(root))
        } else {
            Err(syntax(line, format!("unknown variable `{}`", root)))
        }
    }
}
