use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::{tempdir, TempDir};
use vistrails_packages::{manager, App, Args, Command, Settings};

const STARTUP: &str = "startup.vtpkg";

fn write(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

/// Manifest whose hooks append `codepath` to `out/init.log` and `out/finalize.log`.
fn manifest(out: &Path, identifier: &str, codepath: &str, deps: &[&str]) -> String {
    let out = out.display();
    let mut text = format!("package {identifier} {{\n");
    if !deps.is_empty() {
        text.push_str(&format!("  dependencies = [{}]\n", deps.join(", ")));
    }
    text.push_str(&format!(
        "  init = \"echo {codepath} >> {out}/init.log\"\n  \
         finalize = \"echo {codepath} >> {out}/finalize.log\"\n}}\n"
    ));
    text
}

/// A package directory with `basic`, `spreadsheet` and `vtk` (which needs spreadsheet),
/// using both package layouts, plus a startup file enabling all three.
fn package_tree() -> Result<TempDir> {
    let root = tempdir()?;
    let out = root.path().join("out");
    fs::create_dir(&out)?;
    let pkgs = root.path().join("packages");

    write(
        &pkgs.join("basic.vtpkg"),
        &manifest(&out, "org.vistrails.basic", "basic", &[]),
    )?;
    write(
        &pkgs.join("spreadsheet/package.vtpkg"),
        &manifest(&out, "org.vistrails.spreadsheet", "spreadsheet", &[]),
    )?;
    write(
        &pkgs.join("vtk/package.vtpkg"),
        &manifest(&out, "org.vistrails.vtk", "vtk", &["org.vistrails.spreadsheet"]),
    )?;
    write(
        &root.path().join(STARTUP),
        "package_dir = packages\nenabled = [basic, spreadsheet, vtk]\n",
    )?;
    Ok(root)
}

fn args(root: &TempDir, command: Command) -> Args {
    Args {
        config: Some(root.path().join(STARTUP).display().to_string()),
        package_dir: None,
        user_package_dir: None,
        yes: true,
        verbose: 1,
        command,
    }
}

fn run(root: &TempDir, command: Command) -> Result<()> {
    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    let settings = args(root, command).try_into()?;
    let app = App::new(settings);
    app.run()
}

fn log_lines(root: &TempDir, name: &str) -> Result<Vec<String>> {
    let path: PathBuf = root.path().join("out").join(name);
    if !path.exists() {
        return Ok(Vec::with_capacity(0));
    }
    Ok(fs::read_to_string(path)?.lines().map(str::to_owned).collect())
}

fn startup_text(root: &TempDir) -> Result<String> {
    Ok(fs::read_to_string(root.path().join(STARTUP))?)
}

#[test]
fn test_init() -> Result<()> {
    let root = package_tree()?;
    run(&root, Command::Init)?;

    assert_eq!(log_lines(&root, "init.log")?, vec!["basic", "spreadsheet", "vtk"]);
    assert_eq!(log_lines(&root, "finalize.log")?, vec!["vtk", "spreadsheet", "basic"]);
    Ok(())
}

#[test]
fn test_init_failure_disables_dependents() -> Result<()> {
    let root = package_tree()?;
    write(
        &root.path().join("packages/broken.vtpkg"),
        "package org.example.broken {\n  init = \"exit 1\"\n}\n",
    )?;
    let out = root.path().join("out");
    write(
        &root.path().join("packages/needs_broken.vtpkg"),
        &manifest(&out, "org.example.needs_broken", "needs_broken", &["org.example.broken"]),
    )?;
    write(
        &root.path().join(STARTUP),
        "package_dir = packages\nenabled = [basic, broken, needs_broken, spreadsheet, vtk]\n",
    )?;

    assert!(run(&root, Command::Init).is_err());

    let mut initialized = log_lines(&root, "init.log")?;
    initialized.sort();
    assert_eq!(initialized, vec!["basic", "spreadsheet", "vtk"]);
    Ok(())
}

#[test]
fn test_unknown_package_is_skipped() -> Result<()> {
    let root = package_tree()?;
    write(
        &root.path().join(STARTUP),
        "package_dir = packages\nenabled = [basic, nothing]\n",
    )?;
    assert!(run(&root, Command::Init).is_err());
    assert_eq!(log_lines(&root, "init.log")?, vec!["basic"]);
    Ok(())
}

#[test]
fn test_disable_then_enable() -> Result<()> {
    let root = package_tree()?;

    // spreadsheet is needed by vtk:
    assert!(run(&root, Command::Disable { codepath: "spreadsheet".to_owned() }).is_err());
    assert!(startup_text(&root)?.contains("enabled = [basic, spreadsheet, vtk]"));

    run(&root, Command::Disable { codepath: "vtk".to_owned() })?;
    assert!(startup_text(&root)?.contains("enabled = [basic, spreadsheet]\n"));
    assert!(startup_text(&root)?.contains("package_dir = packages\n"));

    run(&root, Command::Enable { codepath: "vtk".to_owned() })?;
    assert!(startup_text(&root)?.contains("enabled = [basic, spreadsheet, vtk]"));

    let e = run(&root, Command::Enable { codepath: "vtk".to_owned() }).unwrap_err();
    assert!(matches!(
        e.downcast_ref::<manager::Error>(),
        Some(manager::Error::AlreadyEnabled(_))
    ));

    write(&root.path().join(STARTUP), "package_dir = packages\nenabled = [basic]\n")?;
    let e = run(&root, Command::Disable { codepath: "vtk".to_owned() }).unwrap_err();
    assert!(matches!(
        e.downcast_ref::<manager::Error>(),
        Some(manager::Error::NotEnabled(_))
    ));
    Ok(())
}

#[test]
fn test_enable_finalizes_when_save_fails() -> Result<()> {
    let root = package_tree()?;
    write(
        &root.path().join(STARTUP),
        "package_dir = packages\nenabled = [basic, spreadsheet]\n",
    )?;
    let command = Command::Enable { codepath: "vtk".to_owned() };
    let settings: Settings = args(&root, command).try_into()?;

    // the startup file can't be rewritten once it's a directory:
    fs::remove_file(root.path().join(STARTUP))?;
    fs::create_dir(root.path().join(STARTUP))?;

    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    assert!(App::new(settings).run().is_err());

    assert_eq!(log_lines(&root, "init.log")?, vec!["basic", "spreadsheet", "vtk"]);
    assert_eq!(log_lines(&root, "finalize.log")?, vec!["vtk", "spreadsheet", "basic"]);
    Ok(())
}

#[test]
fn test_queries_do_not_initialize() -> Result<()> {
    let root = package_tree()?;
    run(&root, Command::List)?;
    run(&root, Command::Order)?;
    run(&root, Command::Deps { identifier: "org.vistrails.spreadsheet".to_owned() })?;
    assert!(run(&root, Command::Deps { identifier: "org.example.none".to_owned() }).is_err());
    assert!(log_lines(&root, "init.log")?.is_empty());
    Ok(())
}

#[test]
fn test_missing_config() {
    let root = tempdir().unwrap();
    let settings: Result<Settings> = args(&root, Command::List).try_into();
    assert!(settings.is_err());
}
