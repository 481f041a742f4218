//! Pass 1: Entity assembly -- turn each declaration into a typed [`Entity`].

use crate::ast::*;
use crate::error::CompileError;

pub fn assemble(decls: &[Declaration], filename: &str) -> Result<Vec<Entity>, CompileError> {
    decls
        .iter()
        .map(|d| assemble_one(d, filename))
        .collect()
}

fn assemble_one(decl: &Declaration, filename: &str) -> Result<Entity, CompileError> {
    let shape = match decl.kind {
        Kind::Scalar => Shape::Scalar(scalar_shape(decl, filename)?),
        Kind::Array => Shape::Array(array_members(decl, filename)?),
        Kind::Mapping => Shape::Mapping(mapping_members(decl, filename)?),
    };
    Ok(Entity {
        kind: decl.kind,
        name: decl.name.clone(),
        shape,
        origin: Origin::Declared { line: decl.line },
    })
}

fn scalar_shape(decl: &Declaration, filename: &str) -> Result<ScalarShape, CompileError> {
    let mut unconstrained = decl.items.is_empty();
    let mut literals: Vec<String> = Vec::new();

    for item in &decl.items {
        match item {
            ItemToken::Text => unconstrained = true,
            ItemToken::Literal(v) => {
                if !literals.contains(v) {
                    literals.push(v.clone());
                }
            }
            ItemToken::Scalar(_)
            | ItemToken::Array(_)
            | ItemToken::Mapping(_)
            | ItemToken::AliasedKey { .. } => {
                return Err(CompileError::syntax(
                    filename,
                    decl.line,
                    format!(
                        "scalar '{}' may only list literal values or {}",
                        decl.name,
                        crate::lexer::TEXT_MARKER
                    ),
                ));
            }
        }
    }

    if unconstrained {
        if !literals.is_empty() {
            tracing::warn!(
                file = filename,
                line = decl.line,
                scalar = %decl.name,
                "literal values ignored: scalar is unconstrained"
            );
        }
        return Ok(ScalarShape::Unconstrained);
    }
    Ok(ScalarShape::Literals(literals))
}

fn array_members(decl: &Declaration, filename: &str) -> Result<Vec<MemberSpec>, CompileError> {
    let mut members: Vec<MemberSpec> = Vec::new();
    for item in &decl.items {
        let member = match item {
            ItemToken::Scalar(n) => reference(Kind::Scalar, n, None),
            ItemToken::Array(n) => reference(Kind::Array, n, None),
            ItemToken::Mapping(n) => reference(Kind::Mapping, n, None),
            ItemToken::AliasedKey { .. } => {
                return Err(CompileError::syntax(
                    filename,
                    decl.line,
                    format!("array '{}' cannot use keyed members", decl.name),
                ));
            }
            ItemToken::Literal(_) | ItemToken::Text => {
                return Err(not_a_reference(decl, filename));
            }
        };
        if members.contains(&member) {
            tracing::warn!(
                file = filename,
                line = decl.line,
                array = %decl.name,
                member = %member.name,
                "duplicate array member collapsed"
            );
            continue;
        }
        members.push(member);
    }
    Ok(members)
}

fn mapping_members(decl: &Declaration, filename: &str) -> Result<Vec<MemberSpec>, CompileError> {
    let mut members: Vec<MemberSpec> = Vec::new();
    for item in &decl.items {
        let member = match item {
            ItemToken::Scalar(n) => reference(Kind::Scalar, n, Some(n)),
            ItemToken::Array(n) => reference(Kind::Array, n, Some(n)),
            ItemToken::Mapping(n) => reference(Kind::Mapping, n, Some(n)),
            ItemToken::AliasedKey { kind, key, target } => reference(*kind, target, Some(key)),
            ItemToken::Literal(_) | ItemToken::Text => {
                return Err(not_a_reference(decl, filename));
            }
        };
        if members.iter().any(|m| m.key == member.key) {
            return Err(CompileError::syntax(
                filename,
                decl.line,
                format!(
                    "mapping '{}' declares key '{}' more than once",
                    decl.name,
                    member.key.as_deref().unwrap_or_default()
                ),
            ));
        }
        members.push(member);
    }
    Ok(members)
}

fn reference(kind: Kind, name: &str, key: Option<&String>) -> MemberSpec {
    MemberSpec {
        kind,
        name: name.to_owned(),
        key: key.cloned(),
    }
}

fn not_a_reference(decl: &Declaration, filename: &str) -> CompileError {
    CompileError::syntax(
        filename,
        decl.line,
        format!(
            "{} '{}' may only list $scalar, @array or %mapping references",
            decl.kind, decl.name
        ),
    )
}
