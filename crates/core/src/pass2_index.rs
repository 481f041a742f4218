//! Pass 2: Entity indexing -- build the symbol table by (kind, name)
//! and detect duplicate declarations.

use crate::ast::*;
use crate::error::CompileError;
use std::collections::HashMap;

/// Arena of entities plus a (kind, name) lookup index.
///
/// Entities are never removed; an [`EntityId`] stays valid for the life of
/// the table. Iteration order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entities: Vec<Entity>,
    by_name: HashMap<(Kind, String), EntityId>,
}

impl SymbolTable {
    pub fn lookup(&self, kind: Kind, name: &str) -> Option<EntityId> {
        self.by_name.get(&(kind, name.to_owned())).copied()
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i), e))
    }

    /// Append `entity`; the caller guarantees (kind, name) is new.
    pub(crate) fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        self.by_name
            .insert((entity.kind, entity.name.clone()), id);
        self.entities.push(entity);
        id
    }
}

pub fn build_index(entities: Vec<Entity>, filename: &str) -> Result<SymbolTable, CompileError> {
    let mut table = SymbolTable::default();

    for entity in entities {
        if let Some(first) = table.lookup(entity.kind, &entity.name) {
            return Err(CompileError::DuplicateEntity {
                file: filename.to_owned(),
                line: entity.line().unwrap_or(0),
                kind: entity.kind,
                name: entity.name,
                first_line: table.get(first).line().unwrap_or(0),
            });
        }
        table.insert(entity);
    }

    tracing::debug!(entities = table.len(), "symbol table built");
    Ok(table)
}
