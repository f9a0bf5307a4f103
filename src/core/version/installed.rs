use std::cmp::Ordering;
use std::path::Path;

use tracing::debug;

/// Directory names under `versions/`, in natural order. Unreadable or
/// missing directories yield an empty list.
pub fn list_installed_versions(versions_dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(versions_dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Cannot list {:?}: {}", versions_dir, err);
            return Vec::new();
        }
    };

    let mut versions: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    versions.sort_by(|a, b| natural_cmp(a, b));
    versions
}

/// Case-insensitive comparison that orders digit runs by numeric value,
/// so `1.9` sorts before `1.10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_num = l_run.trim_start_matches('0');
                let r_num = r_run.trim_start_matches('0');
                let ord = l_num
                    .len()
                    .cmp(&r_num.len())
                    .then_with(|| l_num.cmp(r_num));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(natural_cmp("1.9", "1.10"), Ordering::Less);
        assert_eq!(natural_cmp("1.20.1", "1.20"), Ordering::Greater);
        assert_eq!(natural_cmp("Fabric", "fabric"), Ordering::Equal);
        assert_eq!(natural_cmp("1.8.9", "1.8.09"), Ordering::Equal);
    }

    #[test]
    fn lists_only_directories_in_natural_order() {
        let root = std::env::temp_dir().join(format!("installed-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        for id in ["1.10.2", "1.9.4", "fabric-loader-1.20.1", "1.20.1"] {
            std::fs::create_dir_all(root.join(id)).unwrap();
        }
        std::fs::write(root.join("launcher_profiles.json"), b"{}").unwrap();

        assert_eq!(
            list_installed_versions(&root),
            vec!["1.9.4", "1.10.2", "1.20.1", "fabric-loader-1.20.1"]
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_directory_is_empty() {
        let missing = std::env::temp_dir().join("definitely-not-a-versions-dir-xyz");
        assert!(list_installed_versions(&missing).is_empty());
    }
}
