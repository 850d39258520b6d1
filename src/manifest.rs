//! Dependency-file creation and rewriting.
//!
//! The writer performs a full rewrite of the dependency list from the
//! currently installed packages: requirements files are regenerated
//! wholesale, pyproject files have only their `[project]` dependencies array
//! spliced so every other section survives byte-for-byte. Writes go through
//! a sibling temp file plus rename so a crash never leaves a half-written
//! manifest.

use std::fs;
use std::path::Path;

use crate::detect::{ManifestKind, ManifestRef};
use crate::pip::{self, Runner};
use crate::state::Package;

/// Result alias for manifest operations.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Create a new dependency file of `kind` in `dir`.
///
/// The pyproject template records `name` and `version`; the requirements
/// template is a bare header. The file is written plainly (it does not exist
/// yet, so atomicity buys nothing).
///
/// # Errors
/// Propagates filesystem errors from the write.
pub fn create_manifest(
    dir: &Path,
    kind: ManifestKind,
    name: &str,
    version: &str,
) -> Result<ManifestRef> {
    let path = dir.join(kind.file_name());
    let content = match kind {
        ManifestKind::Pyproject => format!(
            "[project]\nname = \"{name}\"\nversion = \"{version}\"\nrequires-python = \">=3.8\"\ndependencies = [\n    # Managed by pipsea\n]\n"
        ),
        ManifestKind::Requirements => "# Managed by pipsea - do not edit manually\n".to_string(),
    };
    fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "created dependency file");
    Ok(ManifestRef { path, kind })
}

/// Rewrite the dependency file from `packages`, alphabetized by name.
///
/// # Errors
/// Propagates filesystem errors from the read (pyproject) and the atomic
/// write.
pub fn write_dependency_file(manifest: &ManifestRef, packages: &[Package]) -> Result<()> {
    let mut deps: Vec<(String, String)> = packages
        .iter()
        .map(|p| (p.name.clone(), p.installed_version.clone()))
        .collect();
    deps.sort_by(|a, b| a.0.cmp(&b.0));

    let content = match manifest.kind {
        ManifestKind::Requirements => format_requirements(&deps),
        ManifestKind::Pyproject => {
            let existing = fs::read_to_string(&manifest.path)?;
            splice_pyproject_dependencies(&existing, &deps)
        }
    };
    atomic_write(&manifest.path, content.as_bytes())
}

/// Run the full sync cycle after a package operation: query the installed
/// list and rewrite the dependency file from scratch.
///
/// # Errors
/// Surfaces listing, parsing, and write failures.
pub fn sync_dependency_file(manifest: &ManifestRef, runner: &Runner) -> Result<()> {
    let out = runner.list();
    if let Some(e) = out.error {
        return Err(e.into());
    }
    let packages = pip::parse_package_list(&out.stdout)?;
    write_dependency_file(manifest, &packages)
}

/// Render a requirements file: header plus one exact pin per line.
fn format_requirements(deps: &[(String, String)]) -> String {
    let mut out = String::from("# Managed by pipsea - do not edit manually\n");
    for (name, version) in deps {
        out.push_str(name);
        out.push_str("==");
        out.push_str(version);
        out.push('\n');
    }
    out
}

/// Replace the `dependencies = [...]` array inside `[project]`, leaving the
/// rest of the document untouched. When the array (or the whole section) is
/// missing it is appended in place.
fn splice_pyproject_dependencies(existing: &str, deps: &[(String, String)]) -> String {
    let dep_block = render_dep_block(deps);

    let mut out: Vec<String> = Vec::new();
    let mut section = String::new();
    let mut skipping = false;
    let mut replaced = false;

    for line in existing.lines() {
        let trimmed = line.trim();
        if skipping {
            if trimmed.ends_with(']') {
                skipping = false;
            }
            continue;
        }
        if trimmed.starts_with('[') {
            section = trimmed.to_string();
        }
        if section == "[project]" && !replaced && trimmed.starts_with("dependencies") {
            out.push(dep_block.clone());
            replaced = true;
            // Single-line form: `dependencies = [...]` needs no skip state.
            if !trimmed.ends_with(']') {
                skipping = true;
            }
            continue;
        }
        out.push(line.to_string());
    }

    if !replaced {
        if let Some(pos) = out.iter().position(|l| l.trim() == "[project]") {
            out.insert(pos + 1, dep_block);
        } else {
            out.push("[project]".to_string());
            out.push(dep_block);
        }
    }

    let mut content = out.join("\n");
    content.push('\n');
    content
}

/// Render the dependencies array with one quoted exact pin per line.
fn render_dep_block(deps: &[(String, String)]) -> String {
    let mut block = String::from("dependencies = [");
    for (name, version) in deps {
        block.push_str(&format!("\n    \"{name}=={version}\","));
    }
    if deps.is_empty() {
        block.push(']');
    } else {
        block.push_str("\n]");
    }
    block
}

/// Write `content` to a sibling temp file, then rename over `target`,
/// preserving the original permissions when the target exists.
fn atomic_write(target: &Path, content: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(".pipsea-{}.tmp", std::process::id()));
    fs::write(&tmp, content)?;
    if let Ok(meta) = fs::metadata(target) {
        let _ = fs::set_permissions(&tmp, meta.permissions());
    }
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
