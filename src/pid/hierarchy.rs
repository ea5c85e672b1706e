//! Hierarchy helpers built on the codec: prefix comparison, ancestry,
//! depth, truncation and collision suffix handling.
//!
//! None of these look anything up; they work on the positional path.

use super::codec::{collision_suffix, split_collision, validate, PID_SEPARATOR};
use super::error::PidError;

/// Number of leading hierarchy levels two PIDs share.
///
/// Collision suffixes are ignored and the comparison is
/// case-insensitive. PIDs that only share the country return 1,
/// different countries return 0.
pub fn compare_hierarchy(a: &str, b: &str) -> usize {
    let a = a.to_ascii_uppercase();
    let b = b.to_ascii_uppercase();
    let (path_a, _) = split_collision(&a);
    let (path_b, _) = split_collision(&b);

    path_a
        .split(PID_SEPARATOR)
        .zip(path_b.split(PID_SEPARATOR))
        .take_while(|(x, y)| !x.is_empty() && x == y)
        .count()
}

/// Whether `parent` is `child` or one of its ancestors.
///
/// Returns `false` when either PID is structurally invalid.
pub fn is_parent(parent: &str, child: &str) -> bool {
    let (Ok(parent_path), Ok(child_path)) = (extract_path(parent, None), extract_path(child, None))
    else {
        return false;
    };

    child_path == parent_path
        || child_path
            .strip_prefix(parent_path.as_str())
            .is_some_and(|rest| rest.starts_with(PID_SEPARATOR))
}

/// Number of hierarchy levels in a PID, collision suffix excluded
pub fn depth(pid: &str) -> Result<usize, PidError> {
    Ok(validate(pid).into_result()?.depth())
}

/// Canonical (uppercase) path truncated to `depth` levels.
///
/// The collision suffix is always dropped. `None` or a depth at or past
/// the end returns the full path.
pub fn extract_path(pid: &str, depth: Option<usize>) -> Result<String, PidError> {
    let components = validate(pid).into_result()?;
    let take = depth.unwrap_or(usize::MAX);

    Ok(components
        .levels()
        .take(take)
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join("-"))
}

/// Append a `C<NN>` suffix, replacing any suffix already present
pub fn add_collision_counter(pid: &str, counter: i64) -> Result<String, PidError> {
    let suffix = collision_suffix(counter)?;
    let (path, _) = split_collision(pid);
    Ok(format!("{}{}{}", path, PID_SEPARATOR, suffix))
}

/// Strip a trailing `C<NN>` suffix if there is one
pub fn remove_collision_counter(pid: &str) -> String {
    split_collision(pid).0.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "JP-13-113-01-T07-B12-BN02-R342";

    #[test]
    fn test_compare_hierarchy() {
        assert_eq!(compare_hierarchy("JP-13-113-01", "JP-13-114-02"), 2);
        assert_eq!(compare_hierarchy("JP-13", "JP-14"), 1);
        assert_eq!(compare_hierarchy("JP-13", "US-13"), 0);
        assert_eq!(compare_hierarchy("jp-13-113-C01", "JP-13-113-C02"), 3);
        assert_eq!(compare_hierarchy("JP-13", "JP-13-113-01"), 2);
    }

    #[test]
    fn test_compare_with_self_equals_depth() {
        for pid in [FULL, "JP", "US-CA-90210", "JP-13-C01"] {
            let d = depth(pid).unwrap();
            let plain = remove_collision_counter(pid);
            assert_eq!(compare_hierarchy(&plain, &plain), d, "{}", pid);
        }
    }

    #[test]
    fn test_compare_stops_at_empty_token() {
        assert_eq!(compare_hierarchy("JP--13", "JP--13"), 1);
        assert_eq!(compare_hierarchy("", ""), 0);
    }

    #[test]
    fn test_is_parent() {
        assert!(is_parent("JP-13", "JP-13-113-01"));
        assert!(is_parent("JP", FULL));
        assert!(is_parent("jp-13-113", "JP-13-113-C04"));
        assert!(!is_parent("JP-13-113-01", "JP-13"));
        assert!(!is_parent("JP-1", "JP-13-113"));
        assert!(!is_parent("JP-13", "US-13"));
        assert!(!is_parent("INVALID", "JP-13"));
    }

    #[test]
    fn test_is_parent_reflexive() {
        for pid in [FULL, "JP", "JP-13-C01"] {
            assert!(is_parent(pid, pid));
        }
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth(FULL).unwrap(), 8);
        assert_eq!(depth("JP").unwrap(), 1);
        assert_eq!(depth("JP-13-113-C01").unwrap(), 3);
        assert!(matches!(depth("J-13"), Err(PidError::Invalid(_))));
    }

    #[test]
    fn test_extract_path() {
        assert_eq!(extract_path(FULL, None).unwrap(), FULL);
        assert_eq!(extract_path(FULL, Some(3)).unwrap(), "JP-13-113");
        assert_eq!(extract_path(FULL, Some(1)).unwrap(), "JP");
        assert_eq!(extract_path(FULL, Some(20)).unwrap(), FULL);
        assert_eq!(extract_path("jp-13-113-c01", None).unwrap(), "JP-13-113");
    }

    #[test]
    fn test_add_collision_counter() {
        assert_eq!(add_collision_counter("JP-13-113", 1).unwrap(), "JP-13-113-C01");
        assert_eq!(add_collision_counter("JP-13-113", 5).unwrap(), "JP-13-113-C05");
        assert_eq!(add_collision_counter("JP-13-113", 42).unwrap(), "JP-13-113-C42");
        assert_eq!(add_collision_counter("JP-13-113-C01", 2).unwrap(), "JP-13-113-C02");
        assert!(add_collision_counter("JP-13", 0).is_err());
        assert!(add_collision_counter("JP-13", 100).is_err());
    }

    #[test]
    fn test_remove_collision_counter() {
        assert_eq!(remove_collision_counter("JP-13-113-C01"), "JP-13-113");
        assert_eq!(remove_collision_counter("JP-13-113"), "JP-13-113");
    }
}
