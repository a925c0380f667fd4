use tracing::debug;

fn has_wildcard(arg: &str) -> bool {
    arg.contains(|c| matches!(c, '*' | '?' | '['))
}

fn expand_one(pattern: &str) -> Vec<String> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            debug!(pattern, error = %e, "invalid pattern");
            return vec![pattern.to_string()];
        }
    };

    let matches: Vec<String> = paths
        .filter_map(Result::ok)
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    if matches.is_empty() {
        vec![pattern.to_string()]
    } else {
        matches
    }
}

/// Expands wildcard arguments against the filesystem.
///
/// The program name is left alone, and a pattern that matches nothing is
/// passed through as written.
pub fn expand_arguments(argv: Vec<String>) -> Vec<String> {
    let mut args = argv.into_iter();
    let mut expanded: Vec<String> = args.next().into_iter().collect();
    for arg in args {
        if has_wildcard(&arg) {
            expanded.extend(expand_one(&arg));
        } else {
            expanded.push(arg);
        }
    }
    expanded
}
