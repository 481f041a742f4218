//! Reads grammar text (the compiler's serialized output) back into a
//! [`Grammar`] value.
//!
//! ```text
//! %grammar Name
//! %start lhs
//! %%
//! lhs : sym sym* | sym ;
//! ```

use crate::error::BackendError;
use hashgram_core::grammar::{Alternative, Grammar, Rule, Symbol, Terminal};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Directive(String),
    Separator,
    Ident(String),
    Str(String),
    Bracket(char),
    Colon,
    Pipe,
    Semi,
    Star,
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone)]
struct Spanned {
    tok: Tok,
    line: u32,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

fn lex(src: &str) -> Result<Vec<Spanned>, BackendError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];

        if c == '\n' {
            line += 1;
            pos += 1;
            continue;
        }
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // Block comment
        if c == '/' && chars.get(pos + 1) == Some(&'*') {
            let start_line = line;
            pos += 2;
            loop {
                match chars.get(pos) {
                    None => return Err(BackendError::grammar(start_line, "unterminated comment")),
                    Some('*') if chars.get(pos + 1) == Some(&'/') => {
                        pos += 2;
                        break;
                    }
                    Some('\n') => line += 1,
                    Some(_) => {}
                }
                pos += 1;
            }
            continue;
        }

        let tok_line = line;
        let tok = match c {
            '%' if chars.get(pos + 1) == Some(&'%') => {
                pos += 2;
                Tok::Separator
            }
            '%' => {
                pos += 1;
                let start = pos;
                while pos < chars.len() && chars[pos].is_ascii_alphabetic() {
                    pos += 1;
                }
                Tok::Directive(chars[start..pos].iter().collect())
            }
            '"' => {
                pos += 1;
                let mut s = String::new();
                loop {
                    match chars.get(pos) {
                        None | Some('\n') => {
                            return Err(BackendError::grammar(tok_line, "unterminated string"))
                        }
                        Some('"') => {
                            pos += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = match chars.get(pos + 1) {
                                Some('"') => '"',
                                Some('\\') => '\\',
                                Some('n') => '\n',
                                Some('t') => '\t',
                                other => {
                                    return Err(BackendError::grammar(
                                        tok_line,
                                        format!("invalid escape {:?}", other),
                                    ))
                                }
                            };
                            s.push(escaped);
                            pos += 2;
                        }
                        Some(&other) => {
                            s.push(other);
                            pos += 1;
                        }
                    }
                }
                Tok::Str(s)
            }
            '\'' => {
                let inner = chars.get(pos + 1).copied();
                if chars.get(pos + 2) != Some(&'\'') {
                    return Err(BackendError::grammar(tok_line, "unterminated character literal"));
                }
                pos += 3;
                match inner {
                    Some(b @ ('[' | ']' | '{' | '}')) => Tok::Bracket(b),
                    other => {
                        return Err(BackendError::grammar(
                            tok_line,
                            format!("unknown character terminal {:?}", other),
                        ))
                    }
                }
            }
            ':' => {
                pos += 1;
                Tok::Colon
            }
            '|' => {
                pos += 1;
                Tok::Pipe
            }
            ';' => {
                pos += 1;
                Tok::Semi
            }
            '*' => {
                pos += 1;
                Tok::Star
            }
            '(' => {
                pos += 1;
                Tok::LParen
            }
            ')' => {
                pos += 1;
                Tok::RParen
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && is_ident_char(chars[pos]) {
                    pos += 1;
                }
                Tok::Ident(chars[start..pos].iter().collect())
            }
            other => {
                return Err(BackendError::grammar(
                    tok_line,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        tokens.push(Spanned {
            tok,
            line: tok_line,
        });
    }

    tokens.push(Spanned {
        tok: Tok::Eof,
        line,
    });
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Tok {
        let t = self.tokens[self.pos].tok.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> BackendError {
        BackendError::grammar(self.line(), msg)
    }

    fn expect(&mut self, expected: Tok, what: &str) -> Result<(), BackendError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {}, got {:?}", what, self.peek())))
        }
    }

    fn take_ident(&mut self) -> Result<String, BackendError> {
        match self.advance() {
            Tok::Ident(name) => Ok(name),
            other => Err(self.err(format!("expected identifier, got {:?}", other))),
        }
    }

    fn parse_grammar(&mut self) -> Result<Grammar, BackendError> {
        let mut name = None;
        let mut start = None;

        loop {
            match self.advance() {
                Tok::Directive(d) if d == "grammar" => name = Some(self.take_ident()?),
                Tok::Directive(d) if d == "start" => start = Some(self.take_ident()?),
                Tok::Directive(d) => return Err(self.err(format!("unknown directive %{}", d))),
                Tok::Separator => break,
                other => return Err(self.err(format!("expected directive or %%, got {:?}", other))),
            }
        }

        let start = start.ok_or_else(|| BackendError::UndefinedStart(String::new()))?;

        let mut rules = Vec::new();
        while *self.peek() != Tok::Eof {
            rules.push(self.parse_rule()?);
        }

        Ok(Grammar {
            name: name.unwrap_or_default(),
            start,
            rules,
        })
    }

    fn parse_rule(&mut self) -> Result<Rule, BackendError> {
        let lhs = self.take_ident()?;
        self.expect(Tok::Colon, "':'")?;
        let mut alternatives = vec![self.parse_alternative()?];
        while *self.peek() == Tok::Pipe {
            self.advance();
            alternatives.push(self.parse_alternative()?);
        }
        self.expect(Tok::Semi, "';'")?;
        Ok(Rule { lhs, alternatives })
    }

    fn parse_alternative(&mut self) -> Result<Alternative, BackendError> {
        let mut symbols = Vec::new();
        while !matches!(self.peek(), Tok::Pipe | Tok::Semi | Tok::Eof) {
            let mut sym = self.parse_primary()?;
            if *self.peek() == Tok::Star {
                self.advance();
                sym = Symbol::repeat(sym);
            }
            symbols.push(sym);
        }
        if symbols.is_empty() {
            return Err(self.err("empty alternative"));
        }
        Ok(symbols)
    }

    fn parse_primary(&mut self) -> Result<Symbol, BackendError> {
        let sym = match self.advance() {
            Tok::Ident(id) if id == "SCALAR" => Symbol::Terminal(Terminal::Scalar),
            Tok::Ident(id) if id == "KEY" => {
                if *self.peek() == Tok::LParen {
                    self.advance();
                    let key = match self.advance() {
                        Tok::Str(s) => s,
                        other => {
                            return Err(self.err(format!("expected key string, got {:?}", other)))
                        }
                    };
                    self.expect(Tok::RParen, "')'")?;
                    Symbol::Terminal(Terminal::Key(Some(key)))
                } else {
                    Symbol::Terminal(Terminal::Key(None))
                }
            }
            Tok::Ident(id) => Symbol::NonTerminal(id),
            Tok::Str(s) => Symbol::Terminal(Terminal::Literal(s)),
            Tok::Bracket('[') => Symbol::Terminal(Terminal::SeqBegin),
            Tok::Bracket(']') => Symbol::Terminal(Terminal::SeqEnd),
            Tok::Bracket('{') => Symbol::Terminal(Terminal::MapBegin),
            Tok::Bracket(_) => Symbol::Terminal(Terminal::MapEnd),
            other => return Err(self.err(format!("expected symbol, got {:?}", other))),
        };
        Ok(sym)
    }
}

/// Parse grammar text. Only syntax is checked here; rule references are
/// checked when a validator is built.
pub fn read_grammar(src: &str) -> Result<Grammar, BackendError> {
    let mut parser = Parser {
        tokens: lex(src)?,
        pos: 0,
    };
    parser.parse_grammar()
}

/// The `%grammar` name, found without parsing the whole text.
pub fn grammar_name(src: &str) -> Option<&str> {
    src.lines()
        .find_map(|l| l.trim().strip_prefix("%grammar"))
        .map(str::trim)
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashgram_core::{compile_grammar, serialize, CompileOptions};

    #[test]
    fn reads_back_what_the_compiler_writes() {
        let src = "%record: $city $(zip)postcode @tags %geo\n$city: 'Beijing 'Sh\"anghai\n";
        let grammar = compile_grammar(src, "t", &CompileOptions::default()).unwrap();
        let text = serialize(&grammar);
        assert_eq!(read_grammar(&text).unwrap(), grammar);
    }

    #[test]
    fn handwritten_grammar_with_comments() {
        let text = "/* list of colors */\n%start colors\n%%\ncolors : '[' color* ']' ;\ncolor : \"red\" | \"blue\" ; /* done */\n";
        let g = read_grammar(text).unwrap();
        assert_eq!(g.start, "colors");
        assert_eq!(g.name, "");
        assert_eq!(g.rules.len(), 2);
        assert_eq!(g.rules[1].alternatives.len(), 2);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = read_grammar("%start a\n%%\na : SCALAR\nb : SCALAR ;\n").unwrap_err();
        match err {
            BackendError::Grammar { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected {:?}", other),
        }
        assert!(read_grammar("%start a\n%%\na : ;").is_err());
        assert!(read_grammar("%start a\n%%\na : '<' ;").is_err());
        assert!(read_grammar("%start a\n%%\na : \"open ;").is_err());
        assert!(matches!(
            read_grammar("%%\na : SCALAR ;"),
            Err(BackendError::UndefinedStart(_))
        ));
    }

    #[test]
    fn finds_grammar_name() {
        assert_eq!(grammar_name("/* x */\n%grammar Postal\n%start a"), Some("Postal"));
        assert_eq!(grammar_name("%start a"), None);
    }
}
