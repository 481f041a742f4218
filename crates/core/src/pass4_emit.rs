//! Pass 4: Grammar emission -- one nonterminal per entity, container
//! membership expressed as a repeated helper rule whose alternatives are
//! the declared members.
//!
//! Membership is closed (anything that matches no alternative is rejected)
//! and every member is optional: the helper rule is repeated zero or more
//! times, so any subset of the alternatives may appear. Mapping keys are
//! never mandatory.

use crate::ast::*;
use crate::grammar::{Alternative, Grammar, Rule, Symbol, Terminal};
use crate::pass3_resolve::ResolvedSchema;

/// Nonterminal for an entity. `.` cannot occur in schema names, so these
/// never collide with each other or with the helper rules.
pub fn nonterminal(entity: &Entity) -> String {
    format!("{}.{}", entity.kind.as_str(), entity.name)
}

pub fn emit(schema: &ResolvedSchema, grammar_name: &str) -> Grammar {
    let mut rules = Vec::new();

    for (id, entity) in schema.table.iter() {
        let lhs = nonterminal(entity);
        match &entity.shape {
            Shape::Scalar(ScalarShape::Unconstrained) => {
                rules.push(Rule {
                    lhs,
                    alternatives: vec![vec![Symbol::Terminal(Terminal::Scalar)]],
                });
            }
            Shape::Scalar(ScalarShape::Literals(values)) => {
                rules.push(Rule {
                    lhs,
                    alternatives: values
                        .iter()
                        .map(|v| vec![Symbol::Terminal(Terminal::Literal(v.clone()))])
                        .collect(),
                });
            }
            Shape::Array(_) => {
                let members = schema.members(id);
                if members.is_empty() {
                    rules.push(container(
                        lhs,
                        Terminal::SeqBegin,
                        Symbol::Terminal(Terminal::Scalar),
                        Terminal::SeqEnd,
                    ));
                    continue;
                }
                let item = format!("{}.item", lhs);
                let alternatives = members
                    .iter()
                    .map(|m| vec![Symbol::nt(nonterminal(schema.table.get(m.target)))])
                    .collect();
                rules.push(container(
                    lhs,
                    Terminal::SeqBegin,
                    Symbol::nt(item.clone()),
                    Terminal::SeqEnd,
                ));
                rules.push(Rule {
                    lhs: item,
                    alternatives,
                });
            }
            Shape::Mapping(_) => {
                let entry = format!("{}.entry", lhs);
                let members = schema.members(id);
                let alternatives: Vec<Alternative> = if members.is_empty() {
                    vec![vec![
                        Symbol::Terminal(Terminal::Key(None)),
                        Symbol::Terminal(Terminal::Scalar),
                    ]]
                } else {
                    members
                        .iter()
                        .map(|m| {
                            vec![
                                Symbol::Terminal(Terminal::Key(m.key.clone())),
                                Symbol::nt(nonterminal(schema.table.get(m.target))),
                            ]
                        })
                        .collect()
                };
                rules.push(container(
                    lhs,
                    Terminal::MapBegin,
                    Symbol::nt(entry.clone()),
                    Terminal::MapEnd,
                ));
                rules.push(Rule {
                    lhs: entry,
                    alternatives,
                });
            }
        }
    }

    let grammar = Grammar {
        name: grammar_name.to_owned(),
        start: nonterminal(schema.table.get(schema.root)),
        rules,
    };
    tracing::debug!(rules = grammar.rules.len(), start = %grammar.start, "grammar emitted");
    grammar
}

/// `lhs : open element* close`
fn container(lhs: String, open: Terminal, element: Symbol, close: Terminal) -> Rule {
    Rule {
        lhs,
        alternatives: vec![vec![
            Symbol::Terminal(open),
            Symbol::repeat(element),
            Symbol::Terminal(close),
        ]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::pass1_assemble::assemble;
    use crate::pass2_index::build_index;
    use crate::pass3_resolve::resolve;

    fn grammar(src: &str) -> Grammar {
        let decls = lex(src, "t").unwrap();
        let table = build_index(assemble(&decls, "t").unwrap(), "t").unwrap();
        emit(&resolve(table, None, "t").unwrap(), "Test")
    }

    fn alts(g: &Grammar, lhs: &str) -> Vec<String> {
        g.rule(lhs)
            .unwrap_or_else(|| panic!("no rule {}", lhs))
            .alternatives
            .iter()
            .map(|a| a.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" "))
            .collect()
    }

    #[test]
    fn literal_scalar_is_one_alternative_per_value() {
        let g = grammar("$foo: 'bar1 'bar2");
        assert_eq!(g.start, "scalar.foo");
        assert_eq!(alts(&g, "scalar.foo"), [r#""bar1""#, r#""bar2""#]);
    }

    #[test]
    fn anonymous_array_repeats_scalars() {
        let g = grammar("%root: @bar");
        assert_eq!(alts(&g, "array.bar"), ["'[' SCALAR* ']'"]);
        assert!(g.rule("array.bar.item").is_none());
    }

    #[test]
    fn array_members_are_alternatives() {
        let g = grammar("@foo: @bar1 %bar2");
        assert_eq!(alts(&g, "array.foo"), ["'[' array.foo.item* ']'"]);
        assert_eq!(alts(&g, "array.foo.item"), ["array.bar1", "mapping.bar2"]);
        assert_eq!(alts(&g, "mapping.bar2.entry"), ["KEY SCALAR"]);
    }

    #[test]
    fn mapping_entries_pair_key_with_value_rule() {
        let g = grammar("%record: $city $(zip)postcode");
        assert_eq!(alts(&g, "mapping.record"), ["'{' mapping.record.entry* '}'"]);
        assert_eq!(
            alts(&g, "mapping.record.entry"),
            [r#"KEY("city") scalar.city"#, r#"KEY("zip") scalar.postcode"#]
        );
        assert_eq!(alts(&g, "scalar.postcode"), ["SCALAR"]);
    }

    #[test]
    fn recursion_reuses_the_nonterminal() {
        let g = grammar("%tree: $value @children\n@children: %tree");
        assert_eq!(alts(&g, "array.children.item"), ["mapping.tree"]);
        assert_eq!(
            g.rules.iter().filter(|r| r.lhs == "mapping.tree").count(),
            1
        );
    }

    #[test]
    fn rule_order_follows_entity_order() {
        let g = grammar("%b: $a @x\n$a: 'y");
        let order: Vec<&str> = g.rules.iter().map(|r| r.lhs.as_str()).collect();
        assert_eq!(
            order,
            ["mapping.b", "mapping.b.entry", "scalar.a", "array.x"]
        );
    }
}
