//! Package-manager subprocess execution and pip JSON parsing.
//!
//! The [`Runner`] is the only place that spawns the manager binary. It is a
//! pure function of (binary, args, environment): callers hand it argument
//! vectors from [`PackageManager`] and receive captured output. It is always
//! invoked off the event loop (see `app`), so blocking here is fine.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::detect::{EnvKind, ManagerKind, PackageManager, Virtualenv};
use crate::state::{Package, Severity};

/// Maximum accepted package name length.
const MAX_NAME_LEN: usize = 214;

/// Captured output of one package-manager invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Raw standard output.
    pub stdout: String,
    /// Raw standard error.
    pub stderr: String,
    /// Failure description when the command could not run or exited
    /// non-zero; `None` on success.
    pub error: Option<String>,
}

/// Executes package-manager commands scoped to a specific environment.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Which manager binary to invoke.
    pub manager: PackageManager,
    /// Environment the commands run against.
    pub venv: Virtualenv,
}

impl Runner {
    /// Create a runner for the given manager and environment.
    #[must_use]
    pub const fn new(manager: PackageManager, venv: Virtualenv) -> Self {
        Self { manager, venv }
    }

    /// Execute the manager binary with `args` and the resolved environment,
    /// capturing stdout/stderr. Never panics; failures land in
    /// [`RunOutput::error`].
    #[must_use]
    pub fn run(&self, args: &[String]) -> RunOutput {
        if self.manager.kind == ManagerKind::None {
            return RunOutput {
                error: Some("no package manager available (install pip or uv)".to_string()),
                ..RunOutput::default()
            };
        }
        let bin = &self.manager.bin_path;
        tracing::info!(bin = %bin.display(), args = %args.join(" "), "executing package manager command");

        let mut cmd = std::process::Command::new(bin);
        cmd.args(args);
        if self.venv.kind == EnvKind::Virtualenv && !self.venv.is_broken {
            cmd.env("VIRTUAL_ENV", &self.venv.path);
            let venv_bin = self.venv.path.join("bin");
            let path = std::env::var("PATH").unwrap_or_default();
            cmd.env("PATH", format!("{}:{path}", venv_bin.display()));
        }

        match cmd.output() {
            Err(e) => {
                tracing::warn!(bin = %bin.display(), error = %e, "failed to spawn package manager");
                RunOutput {
                    error: Some(format!("{}: {e}", bin.display())),
                    ..RunOutput::default()
                }
            }
            Ok(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
                let error = if out.status.success() {
                    None
                } else {
                    let code = out
                        .status
                        .code()
                        .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit status {c}"));
                    let detail = stderr.lines().rev().find(|l| !l.trim().is_empty());
                    Some(detail.map_or_else(|| code.clone(), |d| format!("{code}: {}", d.trim())))
                };
                if let Some(e) = &error {
                    tracing::warn!(bin = %bin.display(), error = %e, "package manager command failed");
                } else {
                    tracing::info!(bin = %bin.display(), "package manager command succeeded");
                }
                RunOutput { stdout, stderr, error }
            }
        }
    }

    /// Install a package specifier.
    #[must_use]
    pub fn install(&self, spec: &str) -> RunOutput {
        self.run(&self.manager.install_args(spec))
    }

    /// Uninstall a package.
    #[must_use]
    pub fn uninstall(&self, name: &str) -> RunOutput {
        self.run(&self.manager.uninstall_args(name))
    }

    /// Upgrade a package to its latest version.
    #[must_use]
    pub fn upgrade(&self, name: &str) -> RunOutput {
        self.run(&self.manager.upgrade_args(name))
    }

    /// List installed packages (JSON on stdout).
    #[must_use]
    pub fn list(&self) -> RunOutput {
        self.run(&self.manager.list_args())
    }

    /// List outdated packages (JSON on stdout).
    #[must_use]
    pub fn outdated(&self) -> RunOutput {
        self.run(&self.manager.outdated_args())
    }
}

/// Sequentially upgrade every package in `snapshot`, accumulating per-package
/// outcomes. Individual failures do not abort the remaining upgrades.
///
/// Returns the success count and the names of the packages whose upgrade
/// failed, in order.
#[must_use]
pub fn upgrade_all(runner: &Runner, snapshot: &[Package]) -> (usize, Vec<String>) {
    let mut succeeded = 0usize;
    let mut failed: Vec<String> = Vec::new();
    for package in snapshot {
        let out = runner.upgrade(&package.name);
        if out.error.is_some() {
            failed.push(package.name.clone());
        } else {
            succeeded += 1;
        }
    }
    (succeeded, failed)
}

/// One entry of `pip list --format json`.
#[derive(Debug, Deserialize)]
struct ListEntry {
    /// Package name.
    name: String,
    /// Installed version.
    version: String,
}

/// One entry of `pip list --outdated --format json`.
#[derive(Debug, Deserialize)]
struct OutdatedEntry {
    /// Package name.
    name: String,
    /// Installed version.
    version: String,
    /// Newest version on the index.
    latest_version: String,
}

/// Parse the JSON output of `pip list --format json`.
///
/// # Errors
/// Returns the underlying serde error when the payload is not the expected
/// array shape.
pub fn parse_package_list(json: &str) -> Result<Vec<Package>, serde_json::Error> {
    let entries: Vec<ListEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .map(|e| Package {
            name: e.name,
            installed_version: e.version,
            latest_version: None,
            severity: None,
            outdated: false,
        })
        .collect())
}

/// Parse the JSON output of `pip list --outdated --format json`, classifying
/// each entry's update severity.
///
/// # Errors
/// Returns the underlying serde error when the payload is not the expected
/// array shape.
pub fn parse_outdated_list(json: &str) -> Result<Vec<Package>, serde_json::Error> {
    let entries: Vec<OutdatedEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .map(|e| {
            let severity = classify_severity(&e.version, &e.latest_version);
            Package {
                name: e.name,
                installed_version: e.version,
                latest_version: Some(e.latest_version),
                severity: Some(severity),
                outdated: true,
            }
        })
        .collect())
}

/// Classify the triplet difference between two version strings.
///
/// Pre-release suffixes are stripped (`1.2.3rc1` compares as `1.2.3`); both
/// versions must yield at least three numeric components, otherwise the
/// difference is [`Severity::Unknown`].
#[must_use]
pub fn classify_severity(current: &str, latest: &str) -> Severity {
    let (Some(cur), Some(lat)) = (numeric_parts(current), numeric_parts(latest)) else {
        return Severity::Unknown;
    };
    if cur.len() < 3 || lat.len() < 3 {
        return Severity::Unknown;
    }
    if cur[0] != lat[0] {
        return Severity::Major;
    }
    if cur[1] != lat[1] {
        return Severity::Minor;
    }
    if cur[2] != lat[2] {
        return Severity::Patch;
    }
    Severity::UpToDate
}

/// Split a version into numeric components, truncating at the first
/// character that is neither a digit nor a dot. `None` when any remaining
/// component fails to parse.
fn numeric_parts(v: &str) -> Option<Vec<u64>> {
    let cut = v
        .find(|c: char| c != '.' && !c.is_ascii_digit())
        .map_or(v, |i| &v[..i]);
    cut.split('.').map(|p| p.parse().ok()).collect()
}

/// PEP 508-shaped package name: alphanumeric ends, dots/hyphens/underscores
/// inside.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("static name pattern")
});

/// Characters that must never reach a subprocess argument.
static SHELL_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;&|$`<>]").expect("static shell metacharacter pattern"));

/// Validate a bare package name.
///
/// # Errors
/// Returns a human-readable reason when the name is empty, overlong,
/// contains shell metacharacters, or does not match the PEP 508 shape.
pub fn validate_package_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("package name cannot be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("package name too long (max {MAX_NAME_LEN} characters)"));
    }
    if SHELL_META.is_match(name) {
        return Err(format!("package name contains invalid characters: {name}"));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(format!("invalid package name: {name}"));
    }
    if name.contains("..") || name.starts_with(['-', '_', '.']) {
        return Err(format!("invalid package name: {name}"));
    }
    Ok(())
}

/// Valid version comparison operators, longest first so prefix matching is
/// unambiguous.
const OPERATORS: [&str; 7] = ["==", "!=", "<=", ">=", "~=", "<", ">"];

/// Validate a version constraint such as `==1.2.0`. The empty string is
/// valid (any version).
///
/// # Errors
/// Returns a reason when the constraint does not start with a known
/// operator.
pub fn validate_version_spec(spec: &str) -> Result<(), String> {
    if spec.is_empty() {
        return Ok(());
    }
    if OPERATORS.iter().any(|op| spec.starts_with(op)) {
        return Ok(());
    }
    Err(format!("invalid version specifier: {spec}"))
}

/// Validate a complete specifier such as `flask` or `flask==3.0.0`.
///
/// # Errors
/// Returns a reason when either the name or the constraint part is invalid.
pub fn validate_spec(spec: &str) -> Result<(), String> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err("package spec cannot be empty".to_string());
    }
    let (name, constraint) = split_spec(spec);
    validate_package_name(name)?;
    if let Some(c) = constraint {
        validate_version_spec(c)?;
    }
    Ok(())
}

/// Split a specifier at the first operator (or `@`), when present.
fn split_spec(spec: &str) -> (&str, Option<&str>) {
    let mut cut: Option<usize> = None;
    for op in OPERATORS.iter().copied().chain(["@"]) {
        if let Some(i) = spec.find(op)
            && i > 0
            && cut.is_none_or(|c| i < c)
        {
            cut = Some(i);
        }
    }
    match cut {
        Some(i) => (&spec[..i], Some(&spec[i..])),
        None => (spec, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What: `pip list` JSON parses into plain installed records.
    #[test]
    fn parse_package_list_basic() {
        let json = r#"[
            {"name": "flask", "version": "3.0.0"},
            {"name": "requests", "version": "2.31.0"}
        ]"#;
        let pkgs = parse_package_list(json).expect("valid json");
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[0].name, "flask");
        assert_eq!(pkgs[0].installed_version, "3.0.0");
        assert!(pkgs[0].latest_version.is_none());
        assert!(!pkgs[0].outdated);
    }

    /// What: Outdated JSON yields latest versions and severity badges.
    #[test]
    fn parse_outdated_list_classifies() {
        let json = r#"[
            {"name": "flask", "version": "2.3.0", "latest_version": "3.0.0", "latest_filetype": "wheel"},
            {"name": "requests", "version": "2.31.0", "latest_version": "2.31.1", "latest_filetype": "wheel"}
        ]"#;
        let pkgs = parse_outdated_list(json).expect("valid json");
        assert_eq!(pkgs[0].severity, Some(Severity::Major));
        assert_eq!(pkgs[0].latest_version.as_deref(), Some("3.0.0"));
        assert!(pkgs[0].outdated);
        assert_eq!(pkgs[1].severity, Some(Severity::Patch));
    }

    /// What: Malformed listings surface a parse error instead of panicking.
    #[test]
    fn parse_package_list_malformed() {
        assert!(parse_package_list("{not json").is_err());
        assert!(parse_outdated_list(r#"{"name": "x"}"#).is_err());
    }

    /// What: Severity classification walks the triplet left to right and
    /// degrades to Unknown on short or non-numeric versions.
    #[test]
    fn classify_severity_cases() {
        assert_eq!(classify_severity("1.0.0", "2.0.0"), Severity::Major);
        assert_eq!(classify_severity("1.0.0", "1.1.0"), Severity::Minor);
        assert_eq!(classify_severity("1.0.0", "1.0.1"), Severity::Patch);
        assert_eq!(classify_severity("1.0.0", "1.0.0"), Severity::UpToDate);
        assert_eq!(classify_severity("1.0", "1.1"), Severity::Unknown);
        assert_eq!(classify_severity("abc", "1.0.0"), Severity::Unknown);
        // Pre-release suffix is stripped before comparing.
        assert_eq!(classify_severity("1.0.0rc1", "1.0.1"), Severity::Patch);
    }

    /// What: Name validation accepts PEP 508 shapes and rejects injection
    /// attempts.
    #[test]
    fn validate_package_name_cases() {
        assert!(validate_package_name("flask").is_ok());
        assert!(validate_package_name("python-dateutil").is_ok());
        assert!(validate_package_name("zope.interface").is_ok());
        assert!(validate_package_name("a").is_ok());

        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("-flask").is_err());
        assert!(validate_package_name(".hidden").is_err());
        assert!(validate_package_name("flask; rm -rf /").is_err());
        assert!(validate_package_name("flask|cat").is_err());
        assert!(validate_package_name(&"x".repeat(300)).is_err());
    }

    /// What: Specifier validation splits on the first operator.
    #[test]
    fn validate_spec_cases() {
        assert!(validate_spec("flask").is_ok());
        assert!(validate_spec("flask==3.0.0").is_ok());
        assert!(validate_spec("requests>=2.31.0").is_ok());
        assert!(validate_spec("numpy~=1.26").is_ok());

        assert!(validate_spec("").is_err());
        assert!(validate_spec("flask=3.0.0").is_err());
        assert!(validate_spec("flask && true").is_err());
    }

    /// What: A runner without a manager reports a usable error rather than
    /// spawning.
    #[test]
    fn runner_without_manager_errors() {
        let runner = Runner::new(PackageManager::default(), Virtualenv::default());
        let out = runner.list();
        assert!(out.error.is_some());
        assert!(out.stdout.is_empty());
    }
}
