use std::path::{Component, Path, Prefix};

/// Prefix standing in for the tracked root in portable stamp paths
pub const ROOT_MARKER: &str = "$ROOT";

/// Turn a path under `root` into the string that gets fingerprinted.
///
/// Both `root` and `path` must be absolute and already free of `.`/`..`
/// segments. Portable paths are written relative to the root so a store can
/// be moved to another checkout. Returns `None` when a component is not valid
/// UTF-8, since a lossy rendering could collide with another file.
pub fn normalize_path(root: &Path, path: &Path, portable: bool) -> Option<String> {
    if portable {
        if let Ok(relative) = path.strip_prefix(root) {
            let relative = join_components(relative)?;
            if relative.is_empty() {
                return Some(ROOT_MARKER.to_string());
            }
            return Some(format!("{}/{}", ROOT_MARKER, relative));
        }
    }
    join_components(path)
}

/// Join components with `/`. Separators only come from the path structure,
/// so a `\` inside a Unix file name stays part of that name.
fn join_components(path: &Path) -> Option<String> {
    let mut out = String::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => match prefix.kind() {
                Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => {
                    out.push(letter as char);
                    out.push(':');
                }
                _ => out.push_str(&prefix.as_os_str().to_str()?.replace('\\', "/")),
            },
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(other.as_os_str().to_str()?);
            }
        }
    }

    Some(out)
}
