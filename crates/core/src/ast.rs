//! Shared schema types for the hashgram compiler.
//!
//! Tokens and declarations are produced by the lexer; entities are produced
//! by Pass 1 and consumed by every later pass. They live here so that pass
//! modules can import them without depending on each other.

use std::fmt;

// ──────────────────────────────────────────────
// Kinds
// ──────────────────────────────────────────────

/// The structural kind of an entity, selected by its sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Scalar,
    Array,
    Mapping,
}

impl Kind {
    pub fn from_sigil(c: char) -> Option<Kind> {
        match c {
            '$' => Some(Kind::Scalar),
            '@' => Some(Kind::Array),
            '%' => Some(Kind::Mapping),
            _ => None,
        }
    }

    pub fn sigil(self) -> char {
        match self {
            Kind::Scalar => '$',
            Kind::Array => '@',
            Kind::Mapping => '%',
        }
    }

    /// Lower-case kind name, used in messages and as the nonterminal prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Scalar => "scalar",
            Kind::Array => "array",
            Kind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Tokens (lexer output)
// ──────────────────────────────────────────────

/// One whitespace-separated item on the right of a declaration header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemToken {
    /// `$name`
    Scalar(String),
    /// `@name`
    Array(String),
    /// `%name`
    Mapping(String),
    /// `'value`
    Literal(String),
    /// `<sigil>(key)name` -- mapping key `key` whose value is entity `name`
    AliasedKey {
        kind: Kind,
        key: String,
        target: String,
    },
    /// `TEXT`
    Text,
}

impl ItemToken {
    /// Build a plain typed reference for `kind`.
    pub fn reference(kind: Kind, name: String) -> ItemToken {
        match kind {
            Kind::Scalar => ItemToken::Scalar(name),
            Kind::Array => ItemToken::Array(name),
            Kind::Mapping => ItemToken::Mapping(name),
        }
    }
}

/// One schema line: `<sigil><name>: <item> <item> ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: Kind,
    pub name: String,
    pub items: Vec<ItemToken>,
    pub line: u32,
}

// ──────────────────────────────────────────────
// Entities (Pass 1 output)
// ──────────────────────────────────────────────

/// Index of an entity in the symbol table arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

/// Where an entity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Declared { line: u32 },
    /// Synthesized for a name that was referenced but never declared.
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarShape {
    /// Any scalar value.
    Unconstrained,
    /// Exactly one of these values; never empty, order preserved.
    Literals(Vec<String>),
}

/// A member of an array or mapping declaration, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    pub kind: Kind,
    pub name: String,
    /// Externally visible key (mappings only).
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Scalar(ScalarShape),
    Array(Vec<MemberSpec>),
    Mapping(Vec<MemberSpec>),
}

/// A named structural definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: Kind,
    pub name: String,
    pub shape: Shape,
    pub origin: Origin,
}

impl Entity {
    /// The maximally permissive entity of `kind`, used for undeclared references.
    pub fn anonymous(kind: Kind, name: &str) -> Entity {
        let shape = match kind {
            Kind::Scalar => Shape::Scalar(ScalarShape::Unconstrained),
            Kind::Array => Shape::Array(Vec::new()),
            Kind::Mapping => Shape::Mapping(Vec::new()),
        };
        Entity {
            kind,
            name: name.to_owned(),
            shape,
            origin: Origin::Anonymous,
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self.origin {
            Origin::Declared { line } => Some(line),
            Origin::Anonymous => None,
        }
    }

    /// `<sigil><name>`, as written in the schema.
    pub fn display_name(&self) -> String {
        format!("{}{}", self.kind.sigil(), self.name)
    }
}
