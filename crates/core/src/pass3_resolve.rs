//! Pass 3: Reference resolution -- close the symbol table over every member
//! reference and fix the root entity.
//!
//! Undeclared references get an anonymous entity of the referenced kind.
//! The synthesized entity is memoized in the table, so later references to
//! the same name share it. Cycles are left alone: a recursive schema becomes
//! a recursive grammar.

use crate::ast::*;
use crate::error::CompileError;
use crate::pass2_index::SymbolTable;

/// A resolved array or mapping member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub target: EntityId,
    /// Present for mapping members.
    pub key: Option<String>,
}

/// The closed symbol table: every member reference points at an entity.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub table: SymbolTable,
    /// Resolved members, indexed by `EntityId`. Empty for scalars.
    pub members: Vec<Vec<Member>>,
    pub root: EntityId,
    /// Number of entities synthesized for undeclared references.
    pub anonymous: usize,
}

impl ResolvedSchema {
    pub fn members(&self, id: EntityId) -> &[Member] {
        &self.members[id.0]
    }
}

/// `root` is `<sigil><name>`; `None` selects the first declaration.
pub fn resolve(
    mut table: SymbolTable,
    root: Option<&str>,
    filename: &str,
) -> Result<ResolvedSchema, CompileError> {
    if table.is_empty() {
        return Err(CompileError::EmptySchema(filename.to_owned()));
    }

    let root = match root {
        Some(wanted) => find_root(&table, wanted)?,
        None => EntityId(0),
    };

    let declared = table.len();
    let mut members: Vec<Vec<Member>> = Vec::with_capacity(declared);

    for i in 0..declared {
        let specs = match &table.get(EntityId(i)).shape {
            Shape::Array(specs) | Shape::Mapping(specs) => specs.clone(),
            Shape::Scalar(_) => Vec::new(),
        };
        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            let target = match table.lookup(spec.kind, &spec.name) {
                Some(id) => id,
                None => {
                    tracing::debug!(
                        kind = %spec.kind,
                        name = %spec.name,
                        "synthesizing anonymous entity"
                    );
                    table.insert(Entity::anonymous(spec.kind, &spec.name))
                }
            };
            resolved.push(Member {
                target,
                key: spec.key,
            });
        }
        members.push(resolved);
    }

    // Anonymous entities have no members of their own.
    let anonymous = table.len() - declared;
    members.resize(table.len(), Vec::new());

    tracing::debug!(
        declared,
        anonymous,
        root = %table.get(root).display_name(),
        "references resolved"
    );
    Ok(ResolvedSchema {
        table,
        members,
        root,
        anonymous,
    })
}

fn find_root(table: &SymbolTable, wanted: &str) -> Result<EntityId, CompileError> {
    let mut chars = wanted.chars();
    chars
        .next()
        .and_then(Kind::from_sigil)
        .and_then(|kind| table.lookup(kind, chars.as_str()))
        .filter(|id| table.get(*id).origin != Origin::Anonymous)
        .ok_or_else(|| CompileError::UnknownRoot(wanted.to_owned()))
}
