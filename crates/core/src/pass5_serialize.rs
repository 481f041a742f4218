//! Pass 5: Grammar serialization -- render rules in the backend's
//! production-rule syntax. Output depends on nothing but the grammar.

use crate::grammar::Grammar;

pub const GRAMMAR_BANNER: &str = "/* Generated by hashgram. Do not edit. */";

pub fn serialize(grammar: &Grammar) -> String {
    let mut out = String::new();
    out.push_str(GRAMMAR_BANNER);
    out.push('\n');
    out.push_str(&format!("%grammar {}\n", grammar.name));
    out.push_str(&format!("%start {}\n", grammar.start));
    out.push_str("\n%%\n");

    for rule in &grammar.rules {
        out.push('\n');
        out.push_str(&rule.lhs);
        out.push('\n');
        for (i, alt) in rule.alternatives.iter().enumerate() {
            out.push_str(if i == 0 { "    :" } else { "    |" });
            for sym in alt {
                out.push(' ');
                out.push_str(&sym.to_string());
            }
            out.push('\n');
        }
        out.push_str("    ;\n");
    }
    out
}
