use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use tiberius::Query;
use tracing::debug;

use crate::db::client::SqlClient;
use crate::db::executor;
use crate::db::queries;
use crate::db::types::{ResultSet, cell_bool, cell_i64, cell_text};
use crate::deps::script;
use crate::deps::types::{
    DependencyGraph, DiscoveryOptions, NodeId, ObjectDetails, ObjectKind, ObjectRef,
    ServerIdentity,
};
use crate::error::{AppError, ErrorKind};

/// Metadata and scripting source for the dependency walker. The production
/// implementation talks to the server catalog; tests substitute fixtures.
#[allow(async_fn_in_trait)]
pub trait DependencyProvider {
    async fn server_identity(&mut self) -> Result<ServerIdentity>;

    /// Resolve a user-supplied name to exactly one catalog object.
    async fn resolve_root(&mut self, name: &str, schema: Option<&str>) -> Result<ObjectRef>;

    /// Fetch the dependency graph reachable from the root. Direction and
    /// system-object handling come from the options.
    async fn discover(
        &mut self,
        root: &ObjectRef,
        options: DiscoveryOptions,
    ) -> Result<DependencyGraph>;

    async fn object_info(&mut self, target: &ObjectRef) -> Result<ObjectDetails>;

    async fn script(&mut self, target: &ObjectRef) -> Result<String>;
}

/// One dependency edge: `from` references (depends on) `to`.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub from: ObjectRef,
    pub to: ObjectRef,
}

/// Catalog-view backed provider over a single connection and database.
pub struct CatalogProvider<'a> {
    client: &'a mut SqlClient,
    database: String,
    default_schemas: Vec<String>,
}

impl<'a> CatalogProvider<'a> {
    pub fn new(
        client: &'a mut SqlClient,
        database: impl Into<String>,
        default_schemas: Vec<String>,
    ) -> Self {
        Self {
            client,
            database: database.into(),
            default_schemas,
        }
    }

    async fn first_result(&mut self, query: Query<'_>) -> Result<ResultSet> {
        let result_sets = executor::run_query(query, self.client).await?;
        Ok(result_sets.into_iter().next().unwrap_or_default())
    }
}

impl DependencyProvider for CatalogProvider<'_> {
    async fn server_identity(&mut self) -> Result<ServerIdentity> {
        let result = self.first_result(Query::new(queries::SERVER_IDENTITY)).await?;
        let row = result.rows.first().ok_or_else(|| {
            AppError::new(
                ErrorKind::InvalidInput,
                "server identity could not be established",
            )
        })?;
        Ok(ServerIdentity {
            computer_name: cell_text(row, 0),
            instance_name: cell_text(row, 1),
            sql_instance: cell_text(row, 2),
        })
    }

    async fn resolve_root(&mut self, name: &str, schema: Option<&str>) -> Result<ObjectRef> {
        let mut query = Query::new(queries::RESOLVE_OBJECT);
        query.bind(name);
        query.bind(schema);
        let result = self.first_result(query).await?;

        let candidates: Vec<(ObjectRef, String)> = result
            .rows
            .iter()
            .map(|row| {
                let type_code = cell_text(row, 3);
                let object = ObjectRef {
                    object_id: cell_i64(row, 0).unwrap_or_default(),
                    schema: cell_text(row, 1),
                    name: cell_text(row, 2),
                    // Unknown kinds are reported below, not silently built.
                    kind: ObjectKind::from_type_code(&type_code).unwrap_or(ObjectKind::Table),
                    is_system: cell_bool(row, 4),
                };
                (object, type_code)
            })
            .collect();

        let display = match schema {
            Some(schema) => format!("{schema}.{name}"),
            None => name.to_string(),
        };

        if candidates.is_empty() {
            return Err(AppError::new(
                ErrorKind::InvalidInput,
                format!("could not resolve object '{display}'"),
            )
            .into());
        }

        let chosen = if candidates.len() == 1 {
            &candidates[0]
        } else {
            match self.default_schemas.iter().find_map(|preferred| {
                candidates
                    .iter()
                    .find(|(object, _)| object.schema.eq_ignore_ascii_case(preferred))
            }) {
                Some(candidate) => candidate,
                None => {
                    let names: Vec<String> = candidates
                        .iter()
                        .map(|(object, _)| object.qualified_name())
                        .collect();
                    return Err(AppError::new(
                        ErrorKind::InvalidInput,
                        format!(
                            "object name '{display}' is ambiguous ({}); qualify it with --schema",
                            names.join(", ")
                        ),
                    )
                    .into());
                }
            }
        };

        if ObjectKind::from_type_code(&chosen.1).is_none() {
            return Err(AppError::new(
                ErrorKind::InvalidInput,
                format!(
                    "object '{}' has unsupported type code '{}'",
                    chosen.0.qualified_name(),
                    chosen.1.trim()
                ),
            )
            .into());
        }

        Ok(chosen.0.clone())
    }

    async fn discover(
        &mut self,
        root: &ObjectRef,
        options: DiscoveryOptions,
    ) -> Result<DependencyGraph> {
        let result = self.first_result(Query::new(queries::DEPENDENCY_EDGES)).await?;
        let edges = edges_from_rows(&result);
        debug!(
            edges = edges.len(),
            root = %root.qualified_name(),
            parents = options.parents,
            "assembling dependency graph"
        );
        Ok(build_graph(&self.database, root, &edges, options))
    }

    async fn object_info(&mut self, target: &ObjectRef) -> Result<ObjectDetails> {
        let mut query = Query::new(queries::OBJECT_DETAILS);
        query.bind(target.object_id as i32);
        let result = self.first_result(query).await?;
        let Some(row) = result.rows.first() else {
            debug!(object = %target.qualified_name(), "object vanished during enrichment");
            return Ok(ObjectDetails::default());
        };
        let owner = cell_text(row, 3);
        Ok(ObjectDetails {
            owner: (!owner.is_empty()).then_some(owner),
            is_schema_bound: cell_bool(row, 4),
        })
    }

    async fn script(&mut self, target: &ObjectRef) -> Result<String> {
        match target.kind {
            ObjectKind::Table => {
                let mut query = Query::new(queries::TABLE_DDL_COLUMNS);
                query.bind(target.object_id as i32);
                let result = self.first_result(query).await?;
                if result.rows.is_empty() {
                    return Err(script_error(target, "no columns found"));
                }
                let columns = script::column_specs_from_rows(&result);
                Ok(script::build_table_script(&target.schema, &target.name, &columns))
            }
            ObjectKind::Synonym => {
                let mut query = Query::new(queries::SYNONYM_BASE);
                query.bind(target.object_id as i32);
                let result = self.first_result(query).await?;
                let base = result
                    .rows
                    .first()
                    .map(|row| cell_text(row, 0))
                    .filter(|base| !base.is_empty())
                    .ok_or_else(|| script_error(target, "no base object recorded"))?;
                Ok(script::build_synonym_script(&target.schema, &target.name, &base))
            }
            ObjectKind::Sequence => {
                let mut query = Query::new(queries::SEQUENCE_DEFINITION);
                query.bind(target.object_id as i32);
                let result = self.first_result(query).await?;
                let row = result
                    .rows
                    .first()
                    .ok_or_else(|| script_error(target, "no sequence definition found"))?;
                Ok(script::build_sequence_script(
                    &target.schema,
                    &target.name,
                    &cell_text(row, 0),
                    cell_i64(row, 1).unwrap_or(1),
                    cell_i64(row, 2).unwrap_or(1),
                ))
            }
            ObjectKind::View
            | ObjectKind::StoredProcedure
            | ObjectKind::UserDefinedFunction
            | ObjectKind::Trigger => {
                let mut query = Query::new(queries::OBJECT_DEFINITION);
                query.bind(target.object_id as i32);
                let result = self.first_result(query).await?;
                let definition = result
                    .rows
                    .first()
                    .map(|row| cell_text(row, 0))
                    .filter(|definition| !definition.is_empty())
                    .ok_or_else(|| {
                        script_error(target, "definition unavailable (encrypted or missing)")
                    })?;
                Ok(script::strip_engine_preamble(&definition))
            }
        }
    }
}

fn script_error(target: &ObjectRef, reason: &str) -> anyhow::Error {
    AppError::new(
        ErrorKind::Script,
        format!("cannot script {}: {reason}", target.qualified_name()),
    )
    .into()
}

/// Decode DEPENDENCY_EDGES rows. Edges touching an object type the walker
/// does not understand are dropped here.
pub(crate) fn edges_from_rows(result: &ResultSet) -> Vec<DependencyEdge> {
    result
        .rows
        .iter()
        .filter_map(|row| {
            let from_kind = ObjectKind::from_type_code(&cell_text(row, 3))?;
            let to_kind = ObjectKind::from_type_code(&cell_text(row, 8))?;
            Some(DependencyEdge {
                from: ObjectRef {
                    object_id: cell_i64(row, 0)?,
                    schema: cell_text(row, 1),
                    name: cell_text(row, 2),
                    kind: from_kind,
                    is_system: cell_bool(row, 4),
                },
                to: ObjectRef {
                    object_id: cell_i64(row, 5)?,
                    schema: cell_text(row, 6),
                    name: cell_text(row, 7),
                    kind: to_kind,
                    is_system: cell_bool(row, 9),
                },
            })
        })
        .collect()
}

/// Assemble the reachable graph for one root from the full edge list.
///
/// Forward mode follows referencing objects (who depends on the root);
/// parents mode follows referenced objects (what the root depends on).
/// Children are attached in (schema, name) order, shared nodes are reused,
/// and system objects are dropped unless requested. The root is always
/// kept.
pub(crate) fn build_graph(
    database: &str,
    root: &ObjectRef,
    edges: &[DependencyEdge],
    options: DiscoveryOptions,
) -> DependencyGraph {
    let mut adjacent: HashMap<i64, Vec<&ObjectRef>> = HashMap::new();
    for edge in edges {
        let (key, child) = if options.parents {
            (edge.from.object_id, &edge.to)
        } else {
            (edge.to.object_id, &edge.from)
        };
        adjacent.entry(key).or_default().push(child);
    }
    for children in adjacent.values_mut() {
        children.sort_by(|a, b| {
            (a.schema.as_str(), a.name.as_str()).cmp(&(b.schema.as_str(), b.name.as_str()))
        });
        children.dedup_by_key(|child| child.object_id);
    }

    let mut graph = DependencyGraph {
        database: database.to_string(),
        nodes: Vec::new(),
        children: Vec::new(),
        root: 0,
    };
    let mut ids: HashMap<i64, NodeId> = HashMap::new();

    let root_id = add_node(&mut graph, &mut ids, root);
    graph.root = root_id;

    let mut queue = VecDeque::from([root_id]);
    while let Some(node_id) = queue.pop_front() {
        let object_id = graph.nodes[node_id].object_id;
        let Some(children) = adjacent.get(&object_id) else {
            continue;
        };
        for child in children {
            if child.is_system && !options.include_system {
                continue;
            }
            let child_id = match ids.get(&child.object_id) {
                Some(&existing) => existing,
                None => {
                    let new_id = add_node(&mut graph, &mut ids, child);
                    queue.push_back(new_id);
                    new_id
                }
            };
            graph.children[node_id].push(child_id);
        }
    }

    graph
}

fn add_node(
    graph: &mut DependencyGraph,
    ids: &mut HashMap<i64, NodeId>,
    object: &ObjectRef,
) -> NodeId {
    let id = graph.nodes.len();
    graph.nodes.push(object.clone());
    graph.children.push(Vec::new());
    ids.insert(object.object_id, id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: i64, schema: &str, name: &str, kind: ObjectKind) -> ObjectRef {
        ObjectRef {
            object_id: id,
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            is_system: false,
        }
    }

    fn edge(from: &ObjectRef, to: &ObjectRef) -> DependencyEdge {
        DependencyEdge {
            from: from.clone(),
            to: to.clone(),
        }
    }

    #[test]
    fn forward_graph_follows_referencing_objects() {
        let table = object(1, "dbo", "Orders", ObjectKind::Table);
        let view = object(2, "dbo", "OrdersView", ObjectKind::View);
        let proc_obj = object(3, "dbo", "GetOrders", ObjectKind::StoredProcedure);
        // view references table, procedure references view
        let edges = vec![edge(&view, &table), edge(&proc_obj, &view)];

        let graph = build_graph("Sales", &table, &edges, DiscoveryOptions::default());
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node(graph.root).name, "Orders");
        let level1: Vec<&str> = graph.children[graph.root]
            .iter()
            .map(|&id| graph.node(id).name.as_str())
            .collect();
        assert_eq!(level1, vec!["OrdersView"]);
    }

    #[test]
    fn parents_graph_follows_referenced_objects() {
        let table = object(1, "dbo", "Orders", ObjectKind::Table);
        let view = object(2, "dbo", "OrdersView", ObjectKind::View);
        let edges = vec![edge(&view, &table)];

        let options = DiscoveryOptions {
            parents: true,
            ..DiscoveryOptions::default()
        };
        let graph = build_graph("Sales", &view, &edges, options);
        assert_eq!(graph.len(), 2);
        let level1: Vec<&str> = graph.children[graph.root]
            .iter()
            .map(|&id| graph.node(id).name.as_str())
            .collect();
        assert_eq!(level1, vec!["Orders"]);
    }

    #[test]
    fn children_are_sorted_by_schema_and_name() {
        let table = object(1, "dbo", "Orders", ObjectKind::Table);
        let view_b = object(2, "sales", "Beta", ObjectKind::View);
        let view_a = object(3, "dbo", "Zeta", ObjectKind::View);
        let view_c = object(4, "dbo", "Alpha", ObjectKind::View);
        let edges = vec![
            edge(&view_b, &table),
            edge(&view_a, &table),
            edge(&view_c, &table),
        ];

        let graph = build_graph("Sales", &table, &edges, DiscoveryOptions::default());
        let names: Vec<String> = graph.children[graph.root]
            .iter()
            .map(|&id| graph.node(id).qualified_name())
            .collect();
        assert_eq!(names, vec!["dbo.Alpha", "dbo.Zeta", "sales.Beta"]);
    }

    #[test]
    fn system_objects_are_dropped_unless_requested() {
        let table = object(1, "dbo", "Orders", ObjectKind::Table);
        let mut sys_view = object(2, "sys", "SysView", ObjectKind::View);
        sys_view.is_system = true;
        let edges = vec![edge(&sys_view, &table)];

        let hidden = build_graph("Sales", &table, &edges, DiscoveryOptions::default());
        assert_eq!(hidden.len(), 1);

        let options = DiscoveryOptions {
            include_system: true,
            ..DiscoveryOptions::default()
        };
        let shown = build_graph("Sales", &table, &edges, options);
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn diamond_shares_a_single_node() {
        let a = object(1, "dbo", "A", ObjectKind::Table);
        let b = object(2, "dbo", "B", ObjectKind::View);
        let c = object(3, "dbo", "C", ObjectKind::View);
        let d = object(4, "dbo", "D", ObjectKind::StoredProcedure);
        // b and c reference a; d references both b and c
        let edges = vec![
            edge(&b, &a),
            edge(&c, &a),
            edge(&d, &b),
            edge(&d, &c),
        ];

        let graph = build_graph("Sales", &a, &edges, DiscoveryOptions::default());
        assert_eq!(graph.len(), 4);
        let d_nodes = graph.nodes.iter().filter(|n| n.name == "D").count();
        assert_eq!(d_nodes, 1);
    }

    #[test]
    fn unreachable_edges_stay_out_of_the_graph() {
        let a = object(1, "dbo", "A", ObjectKind::Table);
        let b = object(2, "dbo", "B", ObjectKind::View);
        let x = object(8, "dbo", "X", ObjectKind::Table);
        let y = object(9, "dbo", "Y", ObjectKind::View);
        let edges = vec![edge(&b, &a), edge(&y, &x)];

        let graph = build_graph("Sales", &a, &edges, DiscoveryOptions::default());
        assert_eq!(graph.len(), 2);
    }
}
