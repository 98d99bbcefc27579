use colored::Colorize;

use crate::manager::{self, Failure, InitReport};
use crate::resolver;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{count} package(s) disabled while {label}")]
    PackagesDisabled { label: String, count: usize },
}

/// Why a package ended up disabled. Recaps are grouped by this, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cause {
    /// Metadata couldn't be found or read.
    NotLoaded,
    DuplicateIdentifier,
    MissingDependency,
    DependencyCycle,
    MissingRequirement,
    InitializationFailed,
    /// Something it depends on was disabled.
    DependencyFailed,
    Other,
}

impl Cause {
    fn of(e: &anyhow::Error) -> Self {
        if let Some(e) = e.downcast_ref::<resolver::Error>() {
            return match e {
                resolver::Error::MissingDependency { .. } => Self::MissingDependency,
                resolver::Error::DependencyCycle { .. } => Self::DependencyCycle,
                resolver::Error::DuplicateIdentifier(_) => Self::DuplicateIdentifier,
                _ => Self::Other,
            };
        }
        if let Some(manager::Error::DependencyFailed(..)) = e.downcast_ref::<manager::Error>() {
            return Self::DependencyFailed;
        }
        match e.downcast_ref::<registry::Error>() {
            Some(registry::Error::MissingRequirement(..)) => Self::MissingRequirement,
            Some(registry::Error::InitializationFailed(..)) => Self::InitializationFailed,
            Some(_) => Self::NotLoaded,
            None => Self::Other,
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Self::NotLoaded => "could not be loaded",
            Self::DuplicateIdentifier => "duplicate identifier",
            Self::MissingDependency => "missing dependencies",
            Self::DependencyCycle => "dependency cycle",
            Self::MissingRequirement => "missing requirements",
            Self::InitializationFailed => "failed to initialize",
            Self::DependencyFailed => "a dependency was disabled",
            Self::Other => "other errors",
        }
    }
}

#[derive(Debug)]
struct Disabled {
    codepath: String,
    /// Unknown when the package's metadata never loaded.
    identifier: Option<String>,
    cause: Cause,
    error: anyhow::Error,
}

/// Packages disabled during startup, so the command can carry on past them
/// and report them all at the end.
#[derive(Debug, Default)]
pub struct Errors {
    disabled: Vec<Disabled>,
}

impl Errors {
    /// A package that couldn't be added at all.
    pub fn skipped(&mut self, codepath: &str, error: anyhow::Error) {
        log::trace!("skipped package {codepath}: {error:?}");
        self.disabled.push(Disabled {
            codepath: codepath.to_owned(),
            identifier: None,
            cause: Cause::of(&error),
            error,
        });
    }

    /// Take over every failure in `report`.
    pub fn take_failures(&mut self, report: &mut InitReport) {
        for Failure { codepath, identifier, error } in report.failed.drain(..) {
            self.disabled.push(Disabled {
                codepath,
                identifier: Some(identifier),
                cause: Cause::of(&error),
                error,
            });
        }
    }

    /// Codepaths grouped by cause, causes in recap order.
    fn grouped(&self) -> Vec<(Cause, Vec<&Disabled>)> {
        let mut groups: Vec<(Cause, Vec<&Disabled>)> = Vec::with_capacity(0);
        for d in &self.disabled {
            match groups.iter_mut().find(|(cause, _)| *cause == d.cause) {
                Some((_, group)) => group.push(d),
                None => groups.push((d.cause, vec![d])),
            }
        }
        groups.sort_by_key(|(cause, _)| *cause);
        groups
    }

    /// Print every disabled package to stderr, grouped by cause,
    /// and fail if there were any.
    pub fn print_recap(&self, label: &str) -> Result<(), Error> {
        if self.disabled.is_empty() {
            return Ok(());
        }
        eprintln!("\nPackages disabled while {label}:");
        for (cause, group) in self.grouped() {
            eprintln!("\n{} {}:", "DISABLED".red(), cause.heading());
            for d in group {
                let codepath = d.codepath.bold();
                match &d.identifier {
                    Some(identifier) => eprintln!("  {codepath} ({identifier}): {:#}", d.error),
                    None => eprintln!("  {codepath}: {:#}", d.error),
                }
            }
        }
        eprintln!();
        Err(Error::PackagesDisabled {
            label: label.to_owned(),
            count: self.disabled.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(codepath: &str, error: anyhow::Error) -> Failure {
        Failure {
            codepath: codepath.to_owned(),
            identifier: format!("org.vistrails.{codepath}"),
            error,
        }
    }

    fn codepaths(group: &[&Disabled]) -> Vec<String> {
        group.iter().map(|d| d.codepath.clone()).collect()
    }

    #[test]
    fn test_recap_groups_by_cause() {
        let mut errors = Errors::default();
        assert!(errors.print_recap("initializing packages").is_ok());

        let mut report = InitReport::default();
        report.failed.push(failure(
            "vtk",
            registry::Error::InitializationFailed("vtk".to_owned(), "exit status: 1".to_owned())
                .into(),
        ));
        report.failed.push(failure(
            "vtk_extras",
            manager::Error::DependencyFailed(
                "vtk_extras".to_owned(),
                "org.vistrails.vtk".to_owned(),
            )
            .into(),
        ));
        report.failed.push(failure(
            "a",
            resolver::Error::DependencyCycle {
                dependent: "org.vistrails.a".to_owned(),
                dependency: "org.vistrails.b".to_owned(),
            }
            .into(),
        ));
        report.failed.push(failure(
            "b",
            manager::Error::DependencyFailed("b".to_owned(), "org.vistrails.a".to_owned()).into(),
        ));
        errors.take_failures(&mut report);
        assert!(report.failed.is_empty());

        let missing = anyhow::Error::from(registry::Error::NotFound("nothing".to_owned()))
            .context("while loading package 'nothing'");
        errors.skipped("nothing", missing);

        let grouped: Vec<(Cause, Vec<String>)> = errors
            .grouped()
            .into_iter()
            .map(|(cause, group)| (cause, codepaths(&group)))
            .collect();
        assert_eq!(
            grouped,
            vec![
                (Cause::NotLoaded, vec!["nothing".to_owned()]),
                (Cause::DependencyCycle, vec!["a".to_owned()]),
                (Cause::InitializationFailed, vec!["vtk".to_owned()]),
                (Cause::DependencyFailed, vec!["vtk_extras".to_owned(), "b".to_owned()]),
            ]
        );

        let e = errors.print_recap("initializing packages").unwrap_err();
        assert_eq!(e.to_string(), "5 package(s) disabled while initializing packages");
    }

    #[test]
    fn test_unrecognized_error() {
        let mut errors = Errors::default();
        errors.skipped("odd", anyhow::anyhow!("something else"));
        assert_eq!(errors.grouped()[0].0, Cause::Other);
    }
}
