//! Resolution of `.` and `..` segments in rooted paths.

use super::{has_drive, PathError, PathLike};

/// Collapse `.` and `..` segments of an absolute path.
///
/// `..` never pops the root: `/hello/../../../temp` collapses to `/temp`.
/// Relative paths are rejected since there is nothing to anchor them to.
pub fn collapse<P: PathLike>(path: &P) -> Result<String, PathError> {
    if path.is_relative() {
        return Err(PathError::CollapseRelative(path.full_path().to_string()));
    }

    let full = path.full_path();
    let (root, rest) = if full.starts_with('/') {
        ("/".to_string(), &full[1..])
    } else if has_drive(full) {
        (format!("{}/", &full[..2]), full[2..].trim_start_matches('/'))
    } else {
        return Err(PathError::CollapseRelative(full.to_string()));
    };

    let mut stack: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    Ok(format!("{}{}", root, stack.join("/")))
}
