use std::fmt;

use serde::Serialize;

/// Namespaced identity of a database object, stable across a session.
/// Example: `mssql://SQL01\PROD/Sales/dbo/Orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    pub fn object(server: &ServerIdentity, database: &str, schema: &str, name: &str) -> Self {
        Urn(format!("mssql://{}/{database}/{schema}/{name}", server.sql_instance))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object types the walker understands. Catalog rows with any other type
/// code are skipped during graph assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    Table,
    View,
    StoredProcedure,
    UserDefinedFunction,
    Trigger,
    Synonym,
    Sequence,
}

impl ObjectKind {
    /// Map a sys.objects type code. Codes arrive space-padded (char(2)).
    pub fn from_type_code(code: &str) -> Option<Self> {
        match code.trim() {
            "U" => Some(ObjectKind::Table),
            "V" => Some(ObjectKind::View),
            "P" => Some(ObjectKind::StoredProcedure),
            "FN" | "IF" | "TF" | "AF" => Some(ObjectKind::UserDefinedFunction),
            "TR" => Some(ObjectKind::Trigger),
            "SN" => Some(ObjectKind::Synonym),
            "SO" => Some(ObjectKind::Sequence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "Table",
            ObjectKind::View => "View",
            ObjectKind::StoredProcedure => "StoredProcedure",
            ObjectKind::UserDefinedFunction => "UserDefinedFunction",
            ObjectKind::Trigger => "Trigger",
            ObjectKind::Synonym => "Synonym",
            ObjectKind::Sequence => "Sequence",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog handle for one object. Node payload of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub object_id: i64,
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    pub is_system: bool,
}

impl ObjectRef {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Identity of the connected instance, mirrored into every output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub computer_name: String,
    pub instance_name: String,
    pub sql_instance: String,
}

/// Extra per-object metadata fetched for surviving entries only.
#[derive(Debug, Clone, Default)]
pub struct ObjectDetails {
    pub owner: Option<String>,
    pub is_schema_bound: bool,
}

pub type NodeId = usize;

/// Dependency graph for one root: arena of nodes plus a child adjacency
/// list per node. Children are held in (schema, name) order so traversal
/// is deterministic. Edges point in traversal direction, so in parents
/// mode a "child" is an object the parent node depends on.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub database: String,
    pub nodes: Vec<ObjectRef>,
    pub children: Vec<Vec<NodeId>>,
    pub root: NodeId,
}

impl DependencyGraph {
    pub fn node(&self, id: NodeId) -> &ObjectRef {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// How the graph is discovered and walked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// Walk what the root depends on instead of what depends on the root.
    pub parents: bool,
    pub include_system: bool,
}

/// One traversal record. Produced per path, so the same node can appear
/// more than once before deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenedEntry {
    pub node: NodeId,
    pub tier: i32,
    pub parent: Option<NodeId>,
    pub sequence: usize,
}

/// Final output record for one surviving dependency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDependency {
    pub computer_name: String,
    pub instance_name: String,
    pub sql_instance: String,
    pub database: String,
    pub schema: String,
    pub dependent: String,
    pub kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub is_schema_bound: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_kind: Option<ObjectKind>,
    pub tier: i32,
    pub urn: Urn,
    pub original_resource: Urn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_error: Option<String>,
}

/// Split user input like `dbo.Orders` or `[dbo].[Orders]` into schema and
/// object name. A single unqualified segment yields no schema.
pub fn parse_object_name(input: &str) -> (Option<String>, String) {
    let trimmed = input.trim();
    match split_qualified(trimmed) {
        Some((schema, name)) => (Some(unbracket(schema)), unbracket(name)),
        None => (None, unbracket(trimmed)),
    }
}

/// Find the separating dot, honoring bracket quoting.
fn split_qualified(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0u32;
    for (idx, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => return Some((&input[..idx], &input[idx + 1..])),
            _ => {}
        }
    }
    None
}

fn unbracket(part: &str) -> String {
    let part = part.trim();
    part.strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .map(|p| p.replace("]]", "]"))
        .unwrap_or_else(|| part.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_type_codes() {
        assert_eq!(ObjectKind::from_type_code("U "), Some(ObjectKind::Table));
        assert_eq!(ObjectKind::from_type_code("TF"), Some(ObjectKind::UserDefinedFunction));
        assert_eq!(ObjectKind::from_type_code("SO"), Some(ObjectKind::Sequence));
        assert_eq!(ObjectKind::from_type_code("X "), None);
    }

    #[test]
    fn parses_qualified_names() {
        assert_eq!(
            parse_object_name("dbo.Orders"),
            (Some("dbo".to_string()), "Orders".to_string())
        );
        assert_eq!(parse_object_name("Orders"), (None, "Orders".to_string()));
        assert_eq!(
            parse_object_name("[dbo].[Order.Lines]"),
            (Some("dbo".to_string()), "Order.Lines".to_string())
        );
        assert_eq!(
            parse_object_name("[weird]]name]"),
            (None, "weird]name".to_string())
        );
    }

    #[test]
    fn urn_includes_instance_and_path() {
        let server = ServerIdentity {
            computer_name: "SQL01".to_string(),
            instance_name: "MSSQLSERVER".to_string(),
            sql_instance: "SQL01".to_string(),
        };
        let urn = Urn::object(&server, "Sales", "dbo", "Orders");
        assert_eq!(urn.as_str(), "mssql://SQL01/Sales/dbo/Orders");
    }
}
