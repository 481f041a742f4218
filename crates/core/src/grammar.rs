//! Production-rule grammar over the linearized tree token stream.
//!
//! A tree is read as a flat stream of terminals: scalars, mapping keys, and
//! the open/close markers of sequences and mappings. Rules are plain BNF
//! alternatives plus a postfix repetition on single symbols.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// Any scalar value.
    Scalar,
    /// A scalar equal to this string.
    Literal(String),
    /// A mapping key; `None` matches any key.
    Key(Option<String>),
    SeqBegin,
    SeqEnd,
    MapBegin,
    MapEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(String),
    /// Zero or more occurrences of the inner symbol.
    Repeat(Box<Symbol>),
}

impl Symbol {
    pub fn nt(name: impl Into<String>) -> Symbol {
        Symbol::NonTerminal(name.into())
    }

    pub fn repeat(inner: Symbol) -> Symbol {
        Symbol::Repeat(Box::new(inner))
    }
}

pub type Alternative = Vec<Symbol>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: String,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub name: String,
    pub start: String,
    pub rules: Vec<Rule>,
}

impl Grammar {
    pub fn rule(&self, lhs: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.lhs == lhs)
    }
}

/// Quote `s` as a grammar string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Scalar => f.write_str("SCALAR"),
            Terminal::Literal(v) => f.write_str(&quote(v)),
            Terminal::Key(None) => f.write_str("KEY"),
            Terminal::Key(Some(k)) => write!(f, "KEY({})", quote(k)),
            Terminal::SeqBegin => f.write_str("'['"),
            Terminal::SeqEnd => f.write_str("']'"),
            Terminal::MapBegin => f.write_str("'{'"),
            Terminal::MapEnd => f.write_str("'}'"),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => t.fmt(f),
            Symbol::NonTerminal(n) => f.write_str(n),
            Symbol::Repeat(inner) => write!(f, "{}*", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminals_render_in_grammar_syntax() {
        assert_eq!(Terminal::Key(Some("a\"b".into())).to_string(), r#"KEY("a\"b")"#);
        assert_eq!(Terminal::Literal("x\\y".into()).to_string(), r#""x\\y""#);
        assert_eq!(
            Symbol::repeat(Symbol::nt("array.foo.item")).to_string(),
            "array.foo.item*"
        );
        assert_eq!(Symbol::repeat(Symbol::Terminal(Terminal::Scalar)).to_string(), "SCALAR*");
    }
}
