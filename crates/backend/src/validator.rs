//! Predictive structural validator built from a [`Grammar`].
//!
//! Alternatives are chosen by one token of lookahead against precomputed
//! FIRST sets. Repetitions are the recovery points: an element that fails
//! to parse is recorded as one [`Violation`], skipped as a whole (a scalar,
//! a complete container, or a key with its value), and validation goes on
//! with the next element. A repetition runs until the enclosing container
//! closes.

use crate::error::BackendError;
use crate::tree::{Located, Node, TreeToken};
use hashgram_core::grammar::{Grammar, Symbol, Terminal};
use std::collections::HashMap;
use std::fmt;

/// One rejected element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Document path of the rejected element (`/` is the root).
    pub path: String,
    /// What was found there.
    pub found: String,
    /// Terminals that would have been accepted.
    pub expected: Vec<String>,
    /// Rule being matched when the element was rejected.
    pub rule: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: unexpected {} in {}, expected {}",
            self.path,
            self.found,
            self.rule,
            self.expected.join(" | ")
        )
    }
}

#[derive(Debug, Clone)]
enum Sym {
    T(Terminal),
    N(usize),
    Repeat(Box<Sym>),
}

#[derive(Debug, Clone)]
struct Alt {
    symbols: Vec<Sym>,
    first: Vec<Terminal>,
    nullable: bool,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    lhs: String,
    alternatives: Vec<Alt>,
}

/// Marker for a failed parse; the caller decides how to report it.
struct Mismatch;

struct Run<'t> {
    tokens: &'t [Located],
    pos: usize,
    errors: Vec<Violation>,
}

impl<'t> Run<'t> {
    fn peek(&self) -> Option<&'t Located> {
        self.tokens.get(self.pos)
    }

    /// Skip one whole element starting at the current token.
    fn skip_element(&mut self) {
        let Some(first) = self.peek() else {
            return;
        };
        self.pos += 1;
        match first.token {
            TreeToken::Key(_) => self.skip_element(),
            TreeToken::SeqBegin | TreeToken::MapBegin => {
                let mut depth = 1usize;
                while let Some(t) = self.peek() {
                    self.pos += 1;
                    match t.token {
                        TreeToken::SeqBegin | TreeToken::MapBegin => depth += 1,
                        TreeToken::SeqEnd | TreeToken::MapEnd => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            TreeToken::Scalar(_) | TreeToken::SeqEnd | TreeToken::MapEnd => {}
        }
    }
}

/// A compiled validator. Holds the violations of the most recent
/// [`Validator::validate`] call.
#[derive(Debug, Clone)]
pub struct Validator {
    name: String,
    start: usize,
    rules: Vec<CompiledRule>,
    errors: Vec<Violation>,
}

impl Validator {
    pub fn new(grammar: &Grammar) -> Result<Validator, BackendError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, rule) in grammar.rules.iter().enumerate() {
            if index.insert(rule.lhs.as_str(), i).is_some() {
                return Err(BackendError::grammar(
                    0,
                    format!("rule '{}' is defined more than once", rule.lhs),
                ));
            }
        }

        let start = *index
            .get(grammar.start.as_str())
            .ok_or_else(|| BackendError::UndefinedStart(grammar.start.clone()))?;

        let mut rules = Vec::with_capacity(grammar.rules.len());
        for rule in &grammar.rules {
            let mut alternatives = Vec::with_capacity(rule.alternatives.len());
            for alt in &rule.alternatives {
                let symbols = alt
                    .iter()
                    .map(|s| link(s, &index, &rule.lhs))
                    .collect::<Result<Vec<_>, _>>()?;
                alternatives.push(Alt {
                    symbols,
                    first: Vec::new(),
                    nullable: false,
                });
            }
            rules.push(CompiledRule {
                lhs: rule.lhs.clone(),
                alternatives,
            });
        }

        let mut validator = Validator {
            name: grammar.name.clone(),
            start,
            rules,
            errors: Vec::new(),
        };
        validator.compute_first_sets();
        tracing::debug!(
            grammar = %validator.name,
            rules = validator.rules.len(),
            "validator built"
        );
        Ok(validator)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate `data`, replacing the violations of any earlier call.
    pub fn validate(&mut self, data: &Node) -> &[Violation] {
        let tokens = data.tokens();
        let mut run = Run {
            tokens: &tokens,
            pos: 0,
            errors: Vec::new(),
        };

        let parsed = self.parse_rule(self.start, &mut run).is_ok();
        if !parsed || run.pos < tokens.len() {
            run.errors.clear();
            run.pos = 0;
            let expected = self.rule_first(self.start);
            self.reject(&mut run, &expected, self.start);
        }

        tracing::debug!(errors = run.errors.len(), "document validated");
        self.errors = run.errors;
        &self.errors
    }

    /// Number of elements rejected by the most recent `validate` call.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    // -- FIRST sets ---------------------------------------------

    fn compute_first_sets(&mut self) {
        let mut first: Vec<Vec<Terminal>> = vec![Vec::new(); self.rules.len()];
        let mut nullable = vec![false; self.rules.len()];

        let mut changed = true;
        while changed {
            changed = false;
            for (i, rule) in self.rules.iter().enumerate() {
                for alt in &rule.alternatives {
                    let (f, n) = seq_first(&alt.symbols, &first, &nullable);
                    for t in f {
                        if !first[i].contains(&t) {
                            first[i].push(t);
                            changed = true;
                        }
                    }
                    if n && !nullable[i] {
                        nullable[i] = true;
                        changed = true;
                    }
                }
            }
        }

        for rule in &mut self.rules {
            for alt in &mut rule.alternatives {
                let (f, n) = seq_first(&alt.symbols, &first, &nullable);
                alt.first = f;
                alt.nullable = n;
            }
        }
    }

    fn rule_first(&self, rule: usize) -> Vec<Terminal> {
        let mut out: Vec<Terminal> = Vec::new();
        for alt in &self.rules[rule].alternatives {
            for t in &alt.first {
                if !out.contains(t) {
                    out.push(t.clone());
                }
            }
        }
        out
    }

    fn sym_first(&self, sym: &Sym) -> Vec<Terminal> {
        match sym {
            Sym::T(t) => vec![t.clone()],
            Sym::N(r) => self.rule_first(*r),
            Sym::Repeat(inner) => self.sym_first(inner),
        }
    }

    // -- Parsing ------------------------------------------------

    fn parse_rule(&self, rule: usize, run: &mut Run<'_>) -> Result<(), Mismatch> {
        let alts = &self.rules[rule].alternatives;
        let mut candidates: Vec<&Alt> = match run.peek() {
            Some(tok) => alts
                .iter()
                .filter(|a| a.first.iter().any(|t| matches(t, &tok.token)))
                .collect(),
            None => Vec::new(),
        };
        if candidates.is_empty() {
            candidates.extend(alts.iter().find(|a| a.nullable));
        }

        match candidates.as_slice() {
            [] => Err(Mismatch),
            [only] => self.parse_alt(only, rule, run),
            _ => self.parse_ambiguous(&candidates, rule, run),
        }
    }

    fn parse_alt(&self, alt: &Alt, rule: usize, run: &mut Run<'_>) -> Result<(), Mismatch> {
        for sym in &alt.symbols {
            self.parse_sym(sym, rule, run)?;
        }
        Ok(())
    }

    /// Several alternatives start with the current token. Each is tried from
    /// the same position; the first clean parse wins, otherwise the one that
    /// recorded the fewest violations (earliest on a tie).
    fn parse_ambiguous(
        &self,
        candidates: &[&Alt],
        rule: usize,
        run: &mut Run<'_>,
    ) -> Result<(), Mismatch> {
        let start = run.pos;
        let mark = run.errors.len();
        let mut best: Option<(usize, Vec<Violation>)> = None;

        for alt in candidates {
            run.pos = start;
            run.errors.truncate(mark);
            if self.parse_alt(alt, rule, run).is_err() {
                continue;
            }
            if run.errors.len() == mark {
                return Ok(());
            }
            let fewer = best
                .as_ref()
                .map_or(true, |(_, errors)| run.errors.len() - mark < errors.len());
            if fewer {
                best = Some((run.pos, run.errors.split_off(mark)));
            }
        }

        run.errors.truncate(mark);
        match best {
            Some((end, errors)) => {
                run.pos = end;
                run.errors.extend(errors);
                Ok(())
            }
            None => {
                run.pos = start;
                Err(Mismatch)
            }
        }
    }

    fn parse_sym(&self, sym: &Sym, rule: usize, run: &mut Run<'_>) -> Result<(), Mismatch> {
        match sym {
            Sym::T(t) => match run.peek() {
                Some(tok) if matches(t, &tok.token) => {
                    run.pos += 1;
                    Ok(())
                }
                _ => Err(Mismatch),
            },
            Sym::N(r) => self.parse_rule(*r, run),
            Sym::Repeat(inner) => {
                let expected = self.sym_first(inner);
                while let Some(tok) = run.peek() {
                    if tok.token.is_close() {
                        break;
                    }
                    let start = run.pos;
                    let mark = run.errors.len();
                    let starts = expected.iter().any(|t| matches(t, &tok.token));
                    if starts && self.parse_sym(inner, rule, run).is_ok() {
                        if run.pos == start {
                            break;
                        }
                        continue;
                    }
                    run.pos = start;
                    run.errors.truncate(mark);
                    self.reject(run, &expected, rule);
                }
                Ok(())
            }
        }
    }

    /// Record the element at the cursor as rejected and skip past it.
    fn reject(&self, run: &mut Run<'_>, expected: &[Terminal], rule: usize) {
        let (path, found) = match run.peek() {
            Some(tok) => (tok.path.clone(), tok.token.to_string()),
            None => ("/".to_owned(), "end of document".to_owned()),
        };
        run.errors.push(Violation {
            path,
            found,
            expected: expected.iter().map(|t| t.to_string()).collect(),
            rule: self.rules[rule].lhs.clone(),
        });
        run.skip_element();
    }
}

fn link(sym: &Symbol, index: &HashMap<&str, usize>, lhs: &str) -> Result<Sym, BackendError> {
    Ok(match sym {
        Symbol::Terminal(t) => Sym::T(t.clone()),
        Symbol::NonTerminal(name) => {
            Sym::N(*index
                .get(name.as_str())
                .ok_or_else(|| BackendError::UndefinedNonterminal {
                    name: name.clone(),
                    referenced_by: lhs.to_owned(),
                })?)
        }
        Symbol::Repeat(inner) => Sym::Repeat(Box::new(link(inner, index, lhs)?)),
    })
}

fn sym_first_with(sym: &Sym, first: &[Vec<Terminal>], nullable: &[bool]) -> (Vec<Terminal>, bool) {
    match sym {
        Sym::T(t) => (vec![t.clone()], false),
        Sym::N(r) => (first[*r].clone(), nullable[*r]),
        Sym::Repeat(inner) => (sym_first_with(inner, first, nullable).0, true),
    }
}

fn seq_first(symbols: &[Sym], first: &[Vec<Terminal>], nullable: &[bool]) -> (Vec<Terminal>, bool) {
    let mut out: Vec<Terminal> = Vec::new();
    for sym in symbols {
        let (f, n) = sym_first_with(sym, first, nullable);
        for t in f {
            if !out.contains(&t) {
                out.push(t);
            }
        }
        if !n {
            return (out, false);
        }
    }
    (out, true)
}

fn matches(terminal: &Terminal, token: &TreeToken) -> bool {
    match (terminal, token) {
        (Terminal::Scalar, TreeToken::Scalar(_)) => true,
        (Terminal::Literal(want), TreeToken::Scalar(got)) => want == got,
        (Terminal::Key(None), TreeToken::Key(_)) => true,
        (Terminal::Key(Some(want)), TreeToken::Key(got)) => want == got,
        (Terminal::SeqBegin, TreeToken::SeqBegin)
        | (Terminal::SeqEnd, TreeToken::SeqEnd)
        | (Terminal::MapBegin, TreeToken::MapBegin)
        | (Terminal::MapEnd, TreeToken::MapEnd) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_grammar;

    fn validator(text: &str) -> Validator {
        Validator::new(&read_grammar(text).unwrap()).unwrap()
    }

    fn json(src: &str) -> Node {
        Node::from_json_str(src).unwrap()
    }

    #[test]
    fn undefined_references_are_rejected() {
        let g = read_grammar("%start a\n%%\na : '[' b* ']' ;\n").unwrap();
        assert!(matches!(
            Validator::new(&g),
            Err(BackendError::UndefinedNonterminal { ref name, .. }) if name == "b"
        ));
        let g = read_grammar("%start z\n%%\na : SCALAR ;\n").unwrap();
        assert!(matches!(Validator::new(&g), Err(BackendError::UndefinedStart(_))));
        let g = read_grammar("%start a\n%%\na : SCALAR ;\na : KEY ;\n").unwrap();
        assert!(Validator::new(&g).is_err());
    }

    #[test]
    fn errors_accumulate_per_rejected_element() {
        let mut v = validator("%start l\n%%\nl : '[' SCALAR* ']' ;\n");
        let errors = v.validate(&json(r#"["a", [1, [2]], "b", {"k": "v"}, "c"]"#));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "/1");
        assert_eq!(errors[0].found, "sequence");
        assert_eq!(errors[0].expected, ["SCALAR"]);
        assert_eq!(errors[1].path, "/3");
        assert_eq!(v.error_count(), 2);
    }

    #[test]
    fn error_count_reflects_latest_call() {
        let mut v = validator("%start l\n%%\nl : '[' SCALAR* ']' ;\n");
        v.validate(&json(r#"[[1]]"#));
        assert_eq!(v.error_count(), 1);
        v.validate(&json(r#"["ok"]"#));
        assert_eq!(v.error_count(), 0);
        assert!(v.errors().is_empty());
    }

    #[test]
    fn root_mismatch_is_one_error() {
        let mut v = validator("%start m\n%%\nm : '{' e* '}' ;\ne : KEY SCALAR ;\n");
        let errors = v.validate(&json(r#"[{"a": [1, 2, 3]}]"#)).to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/");
        assert_eq!(errors[0].rule, "m");
        assert_eq!(errors[0].expected, ["'{'"]);
    }

    #[test]
    fn failed_entry_discards_nested_errors() {
        let text = "%start m\n%%\nm : '{' e* '}' ;\ne : KEY(\"list\") l ;\nl : '[' SCALAR* ']' \"end\" ;\n";
        let mut v = validator(text);
        // the nested mapping is recorded inside the list, then the entry fails
        // on its trailing literal; only the entry is reported
        let errors = v.validate(&json(r#"{"list": [{"x": 1}]}"#)).to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/list");
        assert_eq!(errors[0].found, "key \"list\"");
    }

    #[test]
    fn alternatives_sharing_a_first_token_are_all_tried() {
        let text = "%start l\n%%\nl : '[' i* ']' ;\ni : a | b ;\na : '[' \"one\"* ']' ;\nb : '[' \"two\"* ']' ;\n";
        let mut v = validator(text);
        assert!(v.validate(&json(r#"[["two", "two"], ["one"], []]"#)).is_empty());

        // nothing fits: the closest alternative reports, first one on a tie
        let errors = v.validate(&json(r#"[["one", "three"]]"#)).to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/0/1");
        assert_eq!(errors[0].rule, "a");
        let errors = v.validate(&json(r#"[["three"]]"#)).to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected, ["\"one\""]);
    }

    #[test]
    fn display_names_path_and_expectation() {
        let mut v = validator("%start c\n%%\nc : \"red\" | \"blue\" ;\n");
        v.validate(&Node::scalar("green"));
        assert_eq!(
            v.errors()[0].to_string(),
            "/: unexpected scalar \"green\" in c, expected \"red\" | \"blue\""
        );
    }
}
