//! Path normalization and segment helpers shared by volume and handle code.

/// Canonicalize a `/`-separated path: collapse runs of separators and strip a
/// trailing separator unless the whole path is `/`.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_sep = false;
    for c in path.chars() {
        if c == '/' {
            if !last_was_sep {
                out.push(c);
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Directory portion of a normalized path, `None` when there is none to
/// create (bare name, or a single leading-slash segment).
pub fn parent(path: &str) -> Option<&str> {
    let cut = path.rfind('/')?;
    if cut == 0 { None } else { Some(&path[..cut]) }
}

/// Final segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(cut) => &path[cut + 1..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separator_runs() {
        assert_eq!(normalize("//data///logs/app.txt"), "/data/logs/app.txt");
        assert_eq!(normalize("data//logs"), "data/logs");
    }

    #[test]
    fn normalize_strips_trailing_separator() {
        assert_eq!(normalize("/data/logs/"), "/data/logs");
        assert_eq!(normalize("/data///"), "/data");
    }

    #[test]
    fn normalize_keeps_bare_root() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("///"), "/");
    }

    #[test]
    fn parent_and_file_name_split_segments() {
        assert_eq!(parent("/data/logs/app.txt"), Some("/data/logs"));
        assert_eq!(file_name("/data/logs/app.txt"), "app.txt");
        assert_eq!(parent("/app.txt"), None);
        assert_eq!(file_name("/app.txt"), "app.txt");
        assert_eq!(parent("app.txt"), None);
        assert_eq!(file_name("app.txt"), "app.txt");
    }
}
