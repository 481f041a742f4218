//! Pass 0: split schema text into one [`Declaration`] per logical line.

use crate::ast::{Declaration, ItemToken, Kind};
use crate::error::CompileError;

/// The unconstrained-text marker item.
pub const TEXT_MARKER: &str = "TEXT";

pub fn lex(src: &str, filename: &str) -> Result<Vec<Declaration>, CompileError> {
    let mut decls = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let line = (idx + 1) as u32;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let (header, rest) = text.split_once(':').ok_or_else(|| {
            CompileError::syntax(
                filename,
                line,
                format!("declaration '{}' is missing the ':' separator", text),
            )
        })?;

        let header = header.trim();
        let mut chars = header.chars();
        let sigil = chars.next().unwrap_or(' ');
        let kind = Kind::from_sigil(sigil).ok_or_else(|| {
            CompileError::syntax(
                filename,
                line,
                format!("unrecognized declaration sigil '{}'", sigil),
            )
        })?;
        let name = check_name(chars.as_str(), filename, line)?;

        let items = rest
            .split_whitespace()
            .map(|word| lex_item(word, filename, line))
            .collect::<Result<Vec<_>, _>>()?;

        decls.push(Declaration {
            kind,
            name,
            items,
            line,
        });
    }

    Ok(decls)
}

fn lex_item(word: &str, filename: &str, line: u32) -> Result<ItemToken, CompileError> {
    if word == TEXT_MARKER {
        return Ok(ItemToken::Text);
    }

    let mut chars = word.chars();
    let c = chars.next().unwrap_or(' ');
    let rest = chars.as_str();

    if c == '\'' {
        if rest.is_empty() {
            return Err(CompileError::syntax(filename, line, "empty literal '''"));
        }
        return Ok(ItemToken::Literal(rest.to_owned()));
    }

    let kind = Kind::from_sigil(c).ok_or_else(|| {
        CompileError::syntax(
            filename,
            line,
            format!("unrecognized item sigil '{}' in '{}'", c, word),
        )
    })?;

    if let Some(aliased) = rest.strip_prefix('(') {
        let (key, target) = aliased.split_once(')').ok_or_else(|| {
            CompileError::syntax(
                filename,
                line,
                format!("malformed alias in '{}': missing ')'", word),
            )
        })?;
        if key.is_empty() {
            return Err(CompileError::syntax(
                filename,
                line,
                format!("malformed alias in '{}': empty key", word),
            ));
        }
        let key = check_name(key, filename, line)?;
        let target = check_name(target, filename, line)?;
        return Ok(ItemToken::AliasedKey { kind, key, target });
    }

    Ok(ItemToken::reference(kind, check_name(rest, filename, line)?))
}

fn check_name(name: &str, filename: &str, line: u32) -> Result<String, CompileError> {
    if name.is_empty() {
        return Err(CompileError::syntax(filename, line, "missing entity name"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(CompileError::syntax(
            filename,
            line,
            format!("invalid character '{}' in name '{}'", bad, name),
        ));
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_line(err: CompileError) -> u32 {
        match err {
            CompileError::SpecSyntax { line, .. } => line,
            other => panic!("expected SpecSyntax, got {:?}", other),
        }
    }

    #[test]
    fn lexes_every_item_form() {
        let decls = lex("%rec: $city @tags %(zip)code 'x TEXT", "t.schema").unwrap();
        assert_eq!(decls.len(), 1);
        let d = &decls[0];
        assert_eq!(d.kind, Kind::Mapping);
        assert_eq!(d.name, "rec");
        assert_eq!(
            d.items,
            vec![
                ItemToken::Scalar("city".into()),
                ItemToken::Array("tags".into()),
                ItemToken::AliasedKey {
                    kind: Kind::Mapping,
                    key: "zip".into(),
                    target: "code".into(),
                },
                ItemToken::Literal("x".into()),
                ItemToken::Text,
            ]
        );
    }

    #[test]
    fn skips_blank_and_comment_lines_but_counts_them() {
        let src = "\n# a comment\n   \n$foo: 'a\n  # indented comment\n@bar: $foo\n";
        let decls = lex(src, "t.schema").unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].line, 4);
        assert_eq!(decls[1].line, 6);
    }

    #[test]
    fn header_without_items_is_allowed() {
        let decls = lex("@list:", "t.schema").unwrap();
        assert!(decls[0].items.is_empty());
    }

    #[test]
    fn rejects_bad_header_sigil() {
        let err = lex("$a: 'x\n&foo: 'x", "t.schema").unwrap_err();
        assert_eq!(syntax_line(err), 2);
    }

    #[test]
    fn rejects_missing_separator() {
        let err = lex("$foo 'x", "t.schema").unwrap_err();
        assert_eq!(syntax_line(err.clone()), 1);
        assert!(err.to_string().contains("':' separator"));
    }

    #[test]
    fn rejects_bad_item_sigil() {
        let err = lex("\n\n@foo: $a !b", "t.schema").unwrap_err();
        assert_eq!(syntax_line(err.clone()), 3);
        assert!(err.to_string().contains("'!'"));
    }

    #[test]
    fn rejects_malformed_aliases() {
        assert!(lex("%m: $(zip", "t").is_err());
        assert!(lex("%m: $()zip", "t").is_err());
        assert!(lex("%m: $(zip)", "t").is_err());
    }

    #[test]
    fn rejects_empty_literal_and_bad_names() {
        assert!(lex("$s: '", "t").is_err());
        assert!(lex("$: 'a", "t").is_err());
        assert!(lex("$a.b: 'a", "t").is_err());
        assert!(lex("@a: $b.c", "t").is_err());
    }
}
