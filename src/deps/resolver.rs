use anyhow::Result;
use tracing::debug;

use crate::deps::flatten::flatten;
use crate::deps::precedence;
use crate::deps::provider::DependencyProvider;
use crate::deps::types::{
    DiscoveryOptions, ObjectRef, ResolvedDependency, ServerIdentity, Urn, parse_object_name,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub discovery: DiscoveryOptions,
    /// Keep the root object itself in the output.
    pub include_self: bool,
    /// Attach creation scripts to every surviving entry.
    pub with_script: bool,
}

/// Ordered dependencies for one root object.
#[derive(Debug)]
pub struct Resolution {
    pub root: ObjectRef,
    pub root_urn: Urn,
    pub dependencies: Vec<ResolvedDependency>,
    pub warnings: Vec<String>,
}

impl Resolution {
    /// The "no dependencies found" notice applies when nothing beyond the
    /// root itself survived.
    pub fn is_trivial(&self) -> bool {
        let minimum = if self.dependencies.iter().any(|d| d.tier == 0) { 2 } else { 1 };
        self.dependencies.len() < minimum
    }
}

/// Resolve one root object end to end: identify it, discover its graph,
/// flatten, deduplicate, then enrich the survivors with metadata and
/// scripts. Script failures are recorded on the affected entry and do not
/// abort the resolution.
pub async fn resolve_dependencies<P: DependencyProvider>(
    provider: &mut P,
    server: &ServerIdentity,
    input: &str,
    schema_flag: Option<&str>,
    options: ResolveOptions,
) -> Result<Resolution> {
    let (parsed_schema, name) = parse_object_name(input);
    // A schema inside the object name wins over the --schema flag.
    let schema = parsed_schema.as_deref().or(schema_flag);

    let root = provider.resolve_root(&name, schema).await?;
    let graph = provider.discover(&root, options.discovery).await?;
    let flat = flatten(&graph, options.discovery.parents);
    debug!(
        root = %root.qualified_name(),
        nodes = graph.len(),
        visits = flat.entries.len(),
        cycles = flat.warnings.len(),
        "flattened dependency graph"
    );
    let ordered = precedence::order(flat.entries);

    let root_urn = Urn::object(server, &graph.database, &root.schema, &root.name);
    let mut dependencies = Vec::new();

    for entry in ordered {
        if entry.tier == 0 && !options.include_self {
            continue;
        }
        let node = graph.node(entry.node);
        let details = provider.object_info(node).await?;

        let (script, script_error) = if options.with_script {
            match provider.script(node).await {
                Ok(text) => (Some(text), None),
                Err(err) => (None, Some(err.to_string())),
            }
        } else {
            (None, None)
        };

        let parent = entry.parent.map(|id| graph.node(id));
        dependencies.push(ResolvedDependency {
            computer_name: server.computer_name.clone(),
            instance_name: server.instance_name.clone(),
            sql_instance: server.sql_instance.clone(),
            database: graph.database.clone(),
            schema: node.schema.clone(),
            dependent: node.name.clone(),
            kind: node.kind,
            owner: details.owner,
            is_schema_bound: details.is_schema_bound,
            parent: parent.map(|p| p.name.clone()),
            parent_kind: parent.map(|p| p.kind),
            tier: entry.tier,
            urn: Urn::object(server, &graph.database, &node.schema, &node.name),
            original_resource: root_urn.clone(),
            script,
            script_error,
        });
    }

    Ok(Resolution {
        root,
        root_urn,
        dependencies,
        warnings: flat.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::deps::types::{DependencyGraph, ObjectDetails, ObjectKind};

    struct FakeProvider {
        graph: DependencyGraph,
        script_failures: HashMap<i64, String>,
    }

    impl FakeProvider {
        fn new(graph: DependencyGraph) -> Self {
            Self {
                graph,
                script_failures: HashMap::new(),
            }
        }
    }

    impl DependencyProvider for FakeProvider {
        async fn server_identity(&mut self) -> Result<ServerIdentity> {
            Ok(server())
        }

        async fn resolve_root(&mut self, name: &str, schema: Option<&str>) -> Result<ObjectRef> {
            self.graph
                .nodes
                .iter()
                .find(|node| {
                    node.name == name && schema.is_none_or(|schema| node.schema == schema)
                })
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("could not resolve object '{name}'"))
        }

        async fn discover(
            &mut self,
            _root: &ObjectRef,
            _options: DiscoveryOptions,
        ) -> Result<DependencyGraph> {
            Ok(self.graph.clone())
        }

        async fn object_info(&mut self, _target: &ObjectRef) -> Result<ObjectDetails> {
            Ok(ObjectDetails {
                owner: Some("dbo".to_string()),
                is_schema_bound: false,
            })
        }

        async fn script(&mut self, target: &ObjectRef) -> Result<String> {
            if let Some(reason) = self.script_failures.get(&target.object_id) {
                anyhow::bail!("cannot script {}: {reason}", target.qualified_name());
            }
            Ok(format!("CREATE OBJECT {};", target.qualified_name()))
        }
    }

    fn server() -> ServerIdentity {
        ServerIdentity {
            computer_name: "SQL01".to_string(),
            instance_name: "MSSQLSERVER".to_string(),
            sql_instance: "SQL01".to_string(),
        }
    }

    fn graph(names: &[&str], edges: &[(usize, usize)]) -> DependencyGraph {
        let nodes = names
            .iter()
            .enumerate()
            .map(|(idx, name)| ObjectRef {
                object_id: idx as i64 + 1,
                schema: "dbo".to_string(),
                name: (*name).to_string(),
                kind: ObjectKind::Table,
                is_system: false,
            })
            .collect::<Vec<_>>();
        let mut children = vec![Vec::new(); nodes.len()];
        for &(from, to) in edges {
            children[from].push(to);
        }
        DependencyGraph {
            database: "Sales".to_string(),
            nodes,
            children,
            root: 0,
        }
    }

    fn run<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Runtime::new().expect("runtime").block_on(future)
    }

    #[test]
    fn diamond_resolves_to_single_ordered_copies() {
        let mut provider = FakeProvider::new(graph(
            &["A", "B", "C", "D"],
            &[(0, 1), (0, 2), (1, 3), (2, 3)],
        ));
        let options = ResolveOptions {
            include_self: true,
            with_script: true,
            ..ResolveOptions::default()
        };
        let resolution = run(resolve_dependencies(&mut provider, &server(), "A", None, options))
            .expect("resolve");

        let names: Vec<&str> = resolution
            .dependencies
            .iter()
            .map(|d| d.dependent.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        let d = resolution.dependencies.last().unwrap();
        assert_eq!(d.tier, 2);
        assert_eq!(d.original_resource, resolution.root_urn);
        assert!(d.script.as_deref().unwrap().contains("dbo.D"));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn root_is_dropped_without_include_self() {
        let mut provider = FakeProvider::new(graph(&["A", "B"], &[(0, 1)]));
        let resolution = run(resolve_dependencies(
            &mut provider,
            &server(),
            "A",
            None,
            ResolveOptions::default(),
        ))
        .expect("resolve");

        assert_eq!(resolution.dependencies.len(), 1);
        assert_eq!(resolution.dependencies[0].dependent, "B");
        assert_eq!(resolution.dependencies[0].parent.as_deref(), Some("A"));
        assert!(!resolution.is_trivial());
    }

    #[test]
    fn leaf_object_is_trivial() {
        let mut provider = FakeProvider::new(graph(&["A"], &[]));
        let resolution = run(resolve_dependencies(
            &mut provider,
            &server(),
            "A",
            None,
            ResolveOptions::default(),
        ))
        .expect("resolve");
        assert!(resolution.dependencies.is_empty());
        assert!(resolution.is_trivial());

        let options = ResolveOptions {
            include_self: true,
            ..ResolveOptions::default()
        };
        let mut provider = FakeProvider::new(graph(&["A"], &[]));
        let with_self = run(resolve_dependencies(&mut provider, &server(), "A", None, options))
            .expect("resolve");
        assert_eq!(with_self.dependencies.len(), 1);
        assert!(with_self.is_trivial());
    }

    #[test]
    fn script_failure_lands_on_the_affected_entry() {
        let mut provider = FakeProvider::new(graph(&["A", "B", "C"], &[(0, 1), (0, 2)]));
        provider
            .script_failures
            .insert(2, "definition unavailable".to_string());
        let options = ResolveOptions {
            with_script: true,
            ..ResolveOptions::default()
        };
        let resolution = run(resolve_dependencies(&mut provider, &server(), "A", None, options))
            .expect("resolve");

        let b = resolution.dependencies.iter().find(|d| d.dependent == "B").unwrap();
        assert!(b.script.is_none());
        assert!(b.script_error.as_deref().unwrap().contains("definition unavailable"));
        let c = resolution.dependencies.iter().find(|d| d.dependent == "C").unwrap();
        assert!(c.script.is_some());
        assert!(c.script_error.is_none());
    }

    #[test]
    fn cycle_warning_reaches_the_resolution() {
        let mut provider = FakeProvider::new(graph(&["A", "B"], &[(0, 1), (1, 0)]));
        let resolution = run(resolve_dependencies(
            &mut provider,
            &server(),
            "A",
            None,
            ResolveOptions::default(),
        ))
        .expect("resolve");
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].contains("circular"));
    }

    #[test]
    fn parents_mode_orders_prerequisites_first() {
        // graph already oriented: A's children are what A depends on
        let mut provider = FakeProvider::new(graph(&["A", "B", "C"], &[(0, 1), (1, 2)]));
        let options = ResolveOptions {
            discovery: DiscoveryOptions {
                parents: true,
                include_system: false,
            },
            include_self: true,
            ..ResolveOptions::default()
        };
        let resolution = run(resolve_dependencies(&mut provider, &server(), "A", None, options))
            .expect("resolve");

        let tiers: Vec<(&str, i32)> = resolution
            .dependencies
            .iter()
            .map(|d| (d.dependent.as_str(), d.tier))
            .collect();
        assert_eq!(tiers, vec![("C", -2), ("B", -1), ("A", 0)]);
    }

    #[test]
    fn qualified_input_overrides_schema_flag() {
        let mut graph_fixture = graph(&["A", "B"], &[(0, 1)]);
        graph_fixture.nodes[0].schema = "sales".to_string();
        let mut provider = FakeProvider::new(graph_fixture);
        let resolution = run(resolve_dependencies(
            &mut provider,
            &server(),
            "sales.A",
            Some("dbo"),
            ResolveOptions::default(),
        ))
        .expect("resolve");
        assert_eq!(resolution.root.schema, "sales");
    }
}
