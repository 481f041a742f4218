//! In-memory tree model and its linearization into a token stream.
//!
//! The validator never looks at a [`Node`] directly: it parses the flat
//! stream produced by [`Node::tokens`], which is what the grammar's
//! terminals describe.

use crate::error::BackendError;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar, an ordered sequence, or an unordered string-keyed mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(String),
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Node>),
}

impl Node {
    pub fn scalar(value: impl Into<String>) -> Node {
        Node::Scalar(value.into())
    }

    pub fn from_json_str(src: &str) -> Result<Node, BackendError> {
        let value: serde_json::Value =
            serde_json::from_str(src).map_err(|e| BackendError::Document(e.to_string()))?;
        Ok(Node::from(value))
    }

    pub fn from_yaml_str(src: &str) -> Result<Node, BackendError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(src).map_err(|e| BackendError::Document(e.to_string()))?;
        Node::try_from(value)
    }

    /// Linearize into terminals. Mapping entries come out in key order.
    pub fn tokens(&self) -> Vec<Located> {
        let mut out = Vec::new();
        self.push_tokens("/", &mut out);
        out
    }

    fn push_tokens(&self, path: &str, out: &mut Vec<Located>) {
        match self {
            Node::Scalar(v) => out.push(Located::new(TreeToken::Scalar(v.clone()), path)),
            Node::Sequence(items) => {
                out.push(Located::new(TreeToken::SeqBegin, path));
                for (i, item) in items.iter().enumerate() {
                    item.push_tokens(&child_path(path, &i.to_string()), out);
                }
                out.push(Located::new(TreeToken::SeqEnd, path));
            }
            Node::Mapping(entries) => {
                out.push(Located::new(TreeToken::MapBegin, path));
                for (key, value) in entries {
                    let child = child_path(path, key);
                    out.push(Located::new(TreeToken::Key(key.clone()), &child));
                    value.push_tokens(&child, out);
                }
                out.push(Located::new(TreeToken::MapEnd, path));
            }
        }
    }
}

/// JSON-pointer style path; the root is `/`.
fn child_path(parent: &str, segment: &str) -> String {
    let segment = segment.replace('~', "~0").replace('/', "~1");
    if parent == "/" {
        format!("/{}", segment)
    } else {
        format!("{}/{}", parent, segment)
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Node::scalar(""),
            Value::Bool(b) => Node::scalar(b.to_string()),
            Value::Number(n) => Node::scalar(n.to_string()),
            Value::String(s) => Node::Scalar(s),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl TryFrom<serde_yaml::Value> for Node {
    type Error = BackendError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value;
        Ok(match value {
            Value::Null => Node::scalar(""),
            Value::Bool(b) => Node::scalar(b.to_string()),
            Value::Number(n) => Node::scalar(n.to_string()),
            Value::String(s) => Node::Scalar(s),
            Value::Sequence(items) => Node::Sequence(
                items
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(map) => {
                let mut entries = BTreeMap::new();
                for (k, v) in map {
                    let key = match Node::try_from(k)? {
                        Node::Scalar(s) => s,
                        _ => {
                            return Err(BackendError::Document(
                                "mapping keys must be scalars".to_owned(),
                            ))
                        }
                    };
                    entries.insert(key, Node::try_from(v)?);
                }
                Node::Mapping(entries)
            }
            Value::Tagged(tagged) => Node::try_from(tagged.value)?,
        })
    }
}

/// One terminal of the linearized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeToken {
    Scalar(String),
    Key(String),
    SeqBegin,
    SeqEnd,
    MapBegin,
    MapEnd,
}

impl TreeToken {
    pub fn is_close(&self) -> bool {
        matches!(self, TreeToken::SeqEnd | TreeToken::MapEnd)
    }
}

impl fmt::Display for TreeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeToken::Scalar(v) => write!(f, "scalar {:?}", v),
            TreeToken::Key(k) => write!(f, "key {:?}", k),
            TreeToken::SeqBegin => f.write_str("sequence"),
            TreeToken::SeqEnd => f.write_str("end of sequence"),
            TreeToken::MapBegin => f.write_str("mapping"),
            TreeToken::MapEnd => f.write_str("end of mapping"),
        }
    }
}

/// A token plus the document path of the element it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub token: TreeToken,
    pub path: String,
}

impl Located {
    fn new(token: TreeToken, path: &str) -> Self {
        Located {
            token,
            path: path.to_owned(),
        }
    }
}
