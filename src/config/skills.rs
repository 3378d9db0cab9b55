//! Skills directory discovery

use std::path::{Path, PathBuf};

use super::expand_tilde;

const CANDIDATE_ROOTS: [&str; 5] = [".", ".codex", ".claudeCode", ".github", ".vscode"];
const SKILL_DIR_NAMES: [&str; 2] = ["skills", "Skills"];

/// Root directory the runtime should scan for skills
///
/// An explicit directory is used when it exists. Otherwise the first
/// candidate root under `cwd` holding a `skills/` or `Skills/` directory.
pub fn resolve_session_directory(explicit: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if let Some(dir) = explicit.filter(|d| !d.trim().is_empty()) {
        let resolved = expand_tilde(dir);
        if resolved.is_dir() {
            tracing::info!(session_directory = %resolved.display(), "Using explicit skills directory");
            return Some(resolved);
        }
        tracing::warn!(session_directory = %resolved.display(), "Configured skills directory does not exist");
    }

    let found = CANDIDATE_ROOTS
        .iter()
        .map(|rel| if *rel == "." { cwd.to_path_buf() } else { cwd.join(rel) })
        .filter(|root| root.is_dir())
        .find(|root| SKILL_DIR_NAMES.iter().any(|name| root.join(name).is_dir()));

    if let Some(root) = &found {
        tracing::info!(session_directory = %root.display(), "Discovered skills directory");
    }
    found
}
