//! `${VAR}` expansion in raw config text.
//!
//! `${VAR:-fallback}` expands to `fallback` when `VAR` is unset or empty.
//! A placeholder that cannot be resolved is kept verbatim so validation can
//! point at it.

pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: the remainder is literal text.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        match resolve(expr, &lookup) {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("${");
                out.push_str(expr);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn resolve(expr: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let (name, fallback) = match expr.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (expr, None),
    };
    if name.is_empty() {
        return None;
    }
    match (lookup(name).filter(|v| !v.is_empty()), fallback) {
        (Some(value), _) => Some(value),
        (None, Some(fallback)) => Some(fallback.to_string()),
        (None, None) => None,
    }
}
