//! Locating the agent runtime binary

use std::path::{Path, PathBuf};

/// Bare command used when nothing better is found
pub const FALLBACK_COMMAND: &str = "copilot";

/// Writable copy made when the bundled binary lost its executable bit
const TMP_BINARY: &str = "/tmp/copilot-cli";

/// Resolve the runtime binary
///
/// Order: explicit path, bundled platform package under `app_root`, first
/// `copilot` on `PATH`, bare `copilot`.
pub fn resolve_cli_path(explicit: Option<&str>, app_root: &Path) -> String {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        tracing::info!(cli_path = %path, "Using explicit runtime binary");
        return path.to_string();
    }

    if let Some(bundled) = bundled_binary(app_root) {
        if let Some(usable) = make_executable(&bundled) {
            tracing::info!(cli_path = %usable.display(), "Using bundled runtime binary");
            return usable.display().to_string();
        }
    }

    if let Some(found) = find_on_path(FALLBACK_COMMAND) {
        tracing::info!(cli_path = %found.display(), "Using runtime binary from PATH");
        return found.display().to_string();
    }

    tracing::warn!("No runtime binary found, falling back to '{}'", FALLBACK_COMMAND);
    FALLBACK_COMMAND.to_string()
}

/// npm platform package name for the current target
fn platform_package() -> Option<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => Some("copilot-darwin-arm64"),
        ("macos", "x86_64") => Some("copilot-darwin-x64"),
        ("linux", "x86_64") => Some("copilot-linux-x64"),
        ("linux", "aarch64") => Some("copilot-linux-arm64"),
        ("windows", "x86_64") => Some("copilot-win32-x64"),
        _ => None,
    }
}

fn bundled_binary(app_root: &Path) -> Option<PathBuf> {
    let package = platform_package()?;
    let file = if cfg!(windows) { "copilot.exe" } else { "copilot" };
    let path = app_root
        .join("node_modules")
        .join("@github")
        .join(package)
        .join(file);

    if path.is_file() {
        Some(path)
    } else {
        tracing::debug!(path = %path.display(), "Bundled runtime binary not present");
        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Return `path` if it can be executed, else a 0755 copy under /tmp
fn make_executable(path: &Path) -> Option<PathBuf> {
    if is_executable(path) {
        return Some(path.to_path_buf());
    }

    let target = PathBuf::from(TMP_BINARY);
    if !target.exists() {
        if let Err(e) = copy_executable(path, &target) {
            tracing::warn!(source = %path.display(), error = %e, "Cannot make bundled runtime binary executable");
            return None;
        }
    }

    is_executable(&target).then_some(target)
}

fn copy_executable(source: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::copy(source, target)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(target, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

fn find_on_path(command: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}
