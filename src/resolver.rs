use graph::Graph;
use intern::{FindStr, GetStr, Idents, InternStr};

util::typed_id!(
    /// Compact id of an interned package identifier.
    PackageId,
    u32
);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Package '{identifier}' depends on unknown packages: {}", .missing.join(", "))]
    MissingDependency {
        identifier: String,
        missing: Vec<String>,
    },
    #[error("Dependency of '{dependent}' on '{dependency}' would create a cycle")]
    DependencyCycle {
        dependent: String,
        dependency: String,
    },
    #[error("Package identifier '{0}' is already registered")]
    DuplicateIdentifier(String),
    #[error("Package '{0}' is not registered")]
    UnknownPackage(String),
    #[error("Package '{identifier}' is required by: {}", .dependents.join(", "))]
    HasReverseDependents {
        identifier: String,
        dependents: Vec<String>,
    },
}

/// Tracks which registered packages depend on which.
///
/// An edge `a -> b` in the underlying graph means "a depends on b".
/// Every edge target is a registered package at the time the edge is added,
/// and the graph never contains a cycle: edges that would close one are
/// rejected when they are linked.
#[derive(Debug, Default)]
pub struct DependencyResolver {
    graph: Graph<PackageId>,
    idents: Idents<PackageId>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.id(identifier).is_some()
    }

    /// Registered identifiers, in ascending id order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.graph.vertices().map(|id| self.idents.get(id)).collect()
    }

    /// Register `identifier` with edges to each of `dependencies`.
    ///
    /// Fails without changing anything if `identifier` is already registered,
    /// if any dependency is unknown, or if a dependency would close a cycle
    /// (which includes depending on itself).
    pub fn register<S: AsRef<str>>(
        &mut self,
        identifier: &str,
        dependencies: &[S],
    ) -> Result<PackageId, Error> {
        let id = self.insert(identifier)?;
        if let Err(e) = self.link(identifier, dependencies) {
            self.retract(identifier);
            return Err(e);
        }
        Ok(id)
    }

    /// Register `identifier` with no edges.
    pub fn insert(&mut self, identifier: &str) -> Result<PackageId, Error> {
        if self.has(identifier) {
            return Err(Error::DuplicateIdentifier(identifier.to_owned()));
        }
        let id = self.idents.intern(identifier);
        self.graph.add_vertex(id);
        log::debug!("registered {identifier} as {id}");
        Ok(id)
    }

    /// Add an edge from registered package `identifier` to each of `dependencies`.
    /// Edges that already exist are left alone. Either every edge is added or none is.
    pub fn link<S: AsRef<str>>(
        &mut self,
        identifier: &str,
        dependencies: &[S],
    ) -> Result<(), Error> {
        let id = self.known(identifier)?;

        let mut dep_ids = Vec::with_capacity(dependencies.len());
        let mut missing = Vec::with_capacity(0);
        for dep in dependencies {
            let dep = dep.as_ref();
            match self.id(dep) {
                Some(dep_id) => dep_ids.push((dep_id, dep)),
                None => missing.push(dep.to_owned()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingDependency {
                identifier: identifier.to_owned(),
                missing,
            });
        }

        // new edges all leave `id`, so none of them can create a path into `id`
        // for another; checking each against the current graph is enough.
        for &(dep_id, dep) in &dep_ids {
            if self.graph.reaches(dep_id, id) {
                return Err(Error::DependencyCycle {
                    dependent: identifier.to_owned(),
                    dependency: dep.to_owned(),
                });
            }
        }

        for (dep_id, dep) in dep_ids {
            let is_new = self
                .graph
                .add_edge(id, dep_id)
                .map_err(|_| Error::UnknownPackage(dep.to_owned()))?;
            if is_new {
                log::debug!("{identifier} depends on {dep}");
            }
        }
        Ok(())
    }

    /// Identifiers in an order where every package comes after all of its dependencies.
    pub fn resolve_order(&self) -> Result<Vec<&str>, Error> {
        // sorting the inverse puts dependencies before dependents;
        // a back edge `from -> to` there is the edge `to -> from` here.
        match self.graph.inverse().topological_sort() {
            Ok(order) => Ok(order.into_iter().map(|id| self.idents.get(id)).collect()),
            Err(graph::Error::ContainsCycle { from, to }) => Err(Error::DependencyCycle {
                dependent: self.idents.get(to).to_owned(),
                dependency: self.idents.get(from).to_owned(),
            }),
            Err(graph::Error::MissingVertex(id)) => {
                Err(Error::UnknownPackage(self.idents.get(id).to_owned()))
            }
        }
    }

    /// Unregister `identifier`. Fails if any registered package depends on it.
    pub fn remove(&mut self, identifier: &str) -> Result<(), Error> {
        let id = self.known(identifier)?;
        let dependents = self.graph.edges_to(id);
        if !dependents.is_empty() {
            return Err(Error::HasReverseDependents {
                identifier: identifier.to_owned(),
                dependents: dependents.iter().map(|&d| self.idents.get(d).to_owned()).collect(),
            });
        }
        self.retract(identifier);
        Ok(())
    }

    /// Unregister `identifier` and delete all of its edges, even those from dependents.
    /// Returns false if it was not registered.
    pub fn retract(&mut self, identifier: &str) -> bool {
        match self.id(identifier) {
            Some(id) => {
                log::debug!("unregistering {identifier}");
                self.graph.delete_vertex(id)
            }
            None => false,
        }
    }

    /// Packages that directly depend on `identifier`.
    pub fn reverse_dependents(&self, identifier: &str) -> Result<Vec<&str>, Error> {
        let id = self.known(identifier)?;
        Ok(self.names(self.graph.edges_to(id)))
    }

    /// Packages `identifier` directly depends on.
    pub fn dependencies(&self, identifier: &str) -> Result<Vec<&str>, Error> {
        let id = self.known(identifier)?;
        Ok(self.names(self.graph.edges_from(id)))
    }

    /// Every package that depends on `identifier`, directly or not; nearest first.
    pub fn transitive_dependents(&self, identifier: &str) -> Result<Vec<&str>, Error> {
        let id = self.known(identifier)?;
        Ok(self.names(&self.graph.ancestors(id)))
    }

    /// True if `identifier` is registered and nothing depends on it.
    pub fn can_be_removed(&self, identifier: &str) -> bool {
        self.id(identifier)
            .map_or(false, |id| self.graph.in_degree(id) == 0)
    }

    fn id(&self, identifier: &str) -> Option<PackageId> {
        self.idents
            .find(identifier)
            .filter(|&id| self.graph.has_vertex(id))
    }

    fn known(&self, identifier: &str) -> Result<PackageId, Error> {
        self.id(identifier)
            .ok_or_else(|| Error::UnknownPackage(identifier.to_owned()))
    }

    fn names(&self, ids: &[PackageId]) -> Vec<&str> {
        ids.iter().map(|&id| self.idents.get(id)).collect()
    }
}
