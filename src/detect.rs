//! Project, environment, and package-manager discovery.
//!
//! These are deterministic filesystem probes run once at startup: which
//! dependency file the project uses, which Python environment is active, and
//! which manager binary to invoke. All results are plain descriptors; nothing
//! here touches the network or mutates state.

use std::path::{Path, PathBuf};

/// Kind of dependency file a project is managed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// `pyproject.toml` with a `[project]` dependencies array.
    Pyproject,
    /// Flat `requirements.txt` pin list.
    Requirements,
}

impl ManifestKind {
    /// Canonical file name for this manifest kind.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Pyproject => "pyproject.toml",
            Self::Requirements => "requirements.txt",
        }
    }
}

/// A detected dependency file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRef {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Which format the file uses.
    pub kind: ManifestKind,
}

/// A detected (or undetected) Python project.
#[derive(Debug, Clone, Default)]
pub struct Project {
    /// The dependency file, when one was found.
    pub manifest: Option<ManifestRef>,
    /// Project root directory.
    pub dir: PathBuf,
}

impl Project {
    /// Whether a dependency file was found.
    #[must_use]
    pub const fn detected(&self) -> bool {
        self.manifest.is_some()
    }
}

/// Scan `dir` for Python dependency files.
///
/// Detection priority: `pyproject.toml`, then `requirements.txt`, then the
/// first `requirements/*.txt` (alphabetically).
#[must_use]
pub fn detect_project(dir: &Path) -> Project {
    let abs = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());

    let pyproject = abs.join("pyproject.toml");
    if pyproject.is_file() {
        return Project {
            manifest: Some(ManifestRef {
                path: pyproject,
                kind: ManifestKind::Pyproject,
            }),
            dir: abs,
        };
    }

    let reqtxt = abs.join("requirements.txt");
    if reqtxt.is_file() {
        return Project {
            manifest: Some(ManifestRef {
                path: reqtxt,
                kind: ManifestKind::Requirements,
            }),
            dir: abs,
        };
    }

    let req_dir = abs.join("requirements");
    if req_dir.is_dir()
        && let Ok(entries) = std::fs::read_dir(&req_dir)
    {
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == "txt"))
            .collect();
        candidates.sort();
        if let Some(path) = candidates.into_iter().next() {
            return Project {
                manifest: Some(ManifestRef {
                    path,
                    kind: ManifestKind::Requirements,
                }),
                dir: abs,
            };
        }
    }

    Project { manifest: None, dir: abs }
}

/// Kind of Python environment resolved for the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvKind {
    /// No usable interpreter found.
    #[default]
    NotFound,
    /// A virtualenv directory.
    Virtualenv,
    /// The system interpreter.
    System,
}

/// The Python environment package operations run against.
#[derive(Debug, Clone, Default)]
pub struct Virtualenv {
    /// What kind of environment this is.
    pub kind: EnvKind,
    /// Path to the virtualenv (or the system interpreter's directory).
    pub path: PathBuf,
    /// Path to the python binary inside the environment.
    pub python_bin: PathBuf,
    /// True when taken from `$VIRTUAL_ENV`.
    pub is_active: bool,
    /// True when the environment directory exists but its interpreter is
    /// missing.
    pub is_broken: bool,
}

impl Virtualenv {
    /// Short display name for the status bar.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.kind {
            EnvKind::Virtualenv => self
                .path
                .file_name()
                .map_or_else(|| "venv".to_string(), |n| n.to_string_lossy().into_owned()),
            EnvKind::System => "system".to_string(),
            EnvKind::NotFound => "none".to_string(),
        }
    }
}

/// Resolve the active Python environment for `dir`.
///
/// Priority: `$VIRTUAL_ENV`, then `.venv/`, then `venv/`, then the system
/// interpreter (`python3` or `python` on `PATH`).
#[must_use]
pub fn detect_virtualenv(dir: &Path) -> Virtualenv {
    let abs = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());

    if let Ok(venv_path) = std::env::var("VIRTUAL_ENV")
        && !venv_path.is_empty()
    {
        let path = PathBuf::from(venv_path);
        let python_bin = path.join("bin").join("python");
        if file_executable(&python_bin) {
            return Virtualenv {
                kind: EnvKind::Virtualenv,
                path,
                python_bin,
                is_active: true,
                is_broken: false,
            };
        }
        // $VIRTUAL_ENV is set but its interpreter is gone.
        return Virtualenv {
            kind: EnvKind::Virtualenv,
            path,
            python_bin: PathBuf::new(),
            is_active: true,
            is_broken: true,
        };
    }

    for name in [".venv", "venv"] {
        if let Some(v) = check_local_venv(&abs.join(name)) {
            return v;
        }
    }

    detect_system_python()
}

/// Probe a candidate virtualenv directory. `None` when it does not exist.
fn check_local_venv(path: &Path) -> Option<Virtualenv> {
    if !path.is_dir() {
        return None;
    }
    let python_bin = path.join("bin").join("python");
    if file_executable(&python_bin) {
        return Some(Virtualenv {
            kind: EnvKind::Virtualenv,
            path: path.to_path_buf(),
            python_bin,
            is_active: false,
            is_broken: false,
        });
    }
    Some(Virtualenv {
        kind: EnvKind::Virtualenv,
        path: path.to_path_buf(),
        python_bin: PathBuf::new(),
        is_active: false,
        is_broken: true,
    })
}

/// Fall back to a system interpreter on `PATH`.
fn detect_system_python() -> Virtualenv {
    for name in ["python3", "python"] {
        if let Ok(path) = which::which(name) {
            return Virtualenv {
                kind: EnvKind::System,
                path: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                python_bin: path,
                is_active: false,
                is_broken: false,
            };
        }
    }
    Virtualenv::default()
}

/// Whether `path` exists and carries an executable bit.
fn file_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Which package manager binary to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerKind {
    /// No manager available.
    #[default]
    None,
    /// The `uv` frontend (invoked as `uv pip ...`).
    Uv,
    /// Plain `pip` (or `pip3`).
    Pip,
}

/// A resolved package manager binary.
#[derive(Debug, Clone, Default)]
pub struct PackageManager {
    /// Which manager family the binary belongs to.
    pub kind: ManagerKind,
    /// Absolute path to the binary.
    pub bin_path: PathBuf,
}

impl PackageManager {
    /// Display name for the status bar.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self.kind {
            ManagerKind::Uv => "uv",
            ManagerKind::Pip => "pip",
            ManagerKind::None => "none",
        }
    }

    /// Argument vector to install `spec` (a name or `name==version`).
    #[must_use]
    pub fn install_args(&self, spec: &str) -> Vec<String> {
        match self.kind {
            ManagerKind::Uv => vec!["pip".into(), "install".into(), spec.into()],
            _ => vec!["install".into(), spec.into()],
        }
    }

    /// Argument vector to uninstall a package.
    #[must_use]
    pub fn uninstall_args(&self, name: &str) -> Vec<String> {
        match self.kind {
            ManagerKind::Uv => vec!["pip".into(), "uninstall".into(), name.into()],
            _ => vec!["uninstall".into(), name.into(), "-y".into()],
        }
    }

    /// Argument vector to upgrade a package to its latest version.
    #[must_use]
    pub fn upgrade_args(&self, name: &str) -> Vec<String> {
        match self.kind {
            ManagerKind::Uv => vec!["pip".into(), "install".into(), "--upgrade".into(), name.into()],
            _ => vec!["install".into(), "--upgrade".into(), name.into()],
        }
    }

    /// Argument vector listing installed packages as JSON.
    #[must_use]
    pub fn list_args(&self) -> Vec<String> {
        match self.kind {
            ManagerKind::Uv => vec!["pip".into(), "list".into(), "--format".into(), "json".into()],
            _ => vec!["list".into(), "--format".into(), "json".into()],
        }
    }

    /// Argument vector listing outdated packages as JSON.
    #[must_use]
    pub fn outdated_args(&self) -> Vec<String> {
        match self.kind {
            ManagerKind::Uv => vec![
                "pip".into(),
                "list".into(),
                "--outdated".into(),
                "--format".into(),
                "json".into(),
            ],
            _ => vec!["list".into(), "--outdated".into(), "--format".into(), "json".into()],
        }
    }
}

/// Find an available package manager.
///
/// A non-empty `preferred` binary wins when it resolves on `PATH`; otherwise
/// `uv` is preferred, then `pip`, then `pip3`.
#[must_use]
pub fn detect_package_manager(preferred: &str) -> PackageManager {
    if !preferred.is_empty()
        && let Ok(path) = which::which(preferred)
    {
        let kind = if preferred == "uv" { ManagerKind::Uv } else { ManagerKind::Pip };
        return PackageManager { kind, bin_path: path };
    }

    if let Ok(path) = which::which("uv") {
        return PackageManager { kind: ManagerKind::Uv, bin_path: path };
    }
    for name in ["pip", "pip3"] {
        if let Ok(path) = which::which(name) {
            return PackageManager { kind: ManagerKind::Pip, bin_path: path };
        }
    }
    PackageManager::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What: `pyproject.toml` wins over `requirements.txt` when both exist.
    #[test]
    fn detect_project_prefers_pyproject() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\n").expect("write");
        std::fs::write(dir.path().join("requirements.txt"), "").expect("write");

        let project = detect_project(dir.path());
        let manifest = project.manifest.expect("manifest detected");
        assert_eq!(manifest.kind, ManifestKind::Pyproject);
        assert!(manifest.path.ends_with("pyproject.toml"));
    }

    /// What: A `requirements/` directory is scanned when no top-level file
    /// exists, taking the alphabetically first `.txt`.
    #[test]
    fn detect_project_scans_requirements_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let req = dir.path().join("requirements");
        std::fs::create_dir(&req).expect("mkdir");
        std::fs::write(req.join("dev.txt"), "").expect("write");
        std::fs::write(req.join("base.txt"), "").expect("write");
        std::fs::write(req.join("notes.md"), "").expect("write");

        let project = detect_project(dir.path());
        let manifest = project.manifest.expect("manifest detected");
        assert_eq!(manifest.kind, ManifestKind::Requirements);
        assert!(manifest.path.ends_with("requirements/base.txt"));
    }

    /// What: Nothing on disk means no manifest, but the directory is kept.
    #[test]
    fn detect_project_empty_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = detect_project(dir.path());
        assert!(!project.detected());
        assert!(project.dir.is_absolute());
    }

    /// What: A venv directory without an interpreter is reported as broken.
    #[cfg(unix)]
    #[test]
    fn check_local_venv_flags_broken() {
        let dir = tempfile::tempdir().expect("tempdir");
        let venv = dir.path().join(".venv");
        std::fs::create_dir_all(venv.join("bin")).expect("mkdir");

        let v = check_local_venv(&venv).expect("venv dir exists");
        assert!(v.is_broken);
        assert_eq!(v.kind, EnvKind::Virtualenv);
    }

    /// What: A venv with an executable interpreter resolves cleanly.
    #[cfg(unix)]
    #[test]
    fn check_local_venv_finds_interpreter() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let venv = dir.path().join(".venv");
        let bin = venv.join("bin");
        std::fs::create_dir_all(&bin).expect("mkdir");
        let python = bin.join("python");
        std::fs::write(&python, "#!/bin/sh\n").expect("write");
        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let v = check_local_venv(&venv).expect("venv dir exists");
        assert!(!v.is_broken);
        assert_eq!(v.python_bin, python);
        assert_eq!(v.display_name(), ".venv");
    }

    /// What: Manager argument vectors match the pip and uv calling
    /// conventions.
    #[test]
    fn manager_argument_vectors() {
        let pip = PackageManager { kind: ManagerKind::Pip, bin_path: "/usr/bin/pip".into() };
        assert_eq!(pip.install_args("flask==3.0.0"), ["install", "flask==3.0.0"]);
        assert_eq!(pip.uninstall_args("flask"), ["uninstall", "flask", "-y"]);
        assert_eq!(pip.list_args(), ["list", "--format", "json"]);

        let uv = PackageManager { kind: ManagerKind::Uv, bin_path: "/usr/bin/uv".into() };
        assert_eq!(uv.install_args("flask"), ["pip", "install", "flask"]);
        assert_eq!(uv.upgrade_args("flask"), ["pip", "install", "--upgrade", "flask"]);
        assert_eq!(
            uv.outdated_args(),
            ["pip", "list", "--outdated", "--format", "json"]
        );
    }
}
