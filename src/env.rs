// src/env.rs

//! `%NAME%` environment reference expansion.
//!
//! Job documents and the job source use Windows-style references so that the
//! same files work unchanged on every host. Unknown names are left in place,
//! percent signs included.

use std::borrow::Cow;

/// Expand `%NAME%` references against the process environment.
pub fn expand_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expand `%NAME%` references using `lookup` to resolve names.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some(len) = after.find('%') else {
            // Lone percent sign: copy the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..len];
        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => {
                out.push('%');
                out.push_str(name);
                out.push('%');
            }
        }
        rest = &after[len + 1..];
    }

    out.push_str(rest);
    out
}

/// Expand an optional value, treating a blank result as absent.
pub fn expand_opt(input: Option<&str>) -> Option<String> {
    let expanded = expand_vars(input?);
    if expanded.trim().is_empty() {
        None
    } else {
        Some(expanded)
    }
}

/// Join a fixed prefix and optional extra arguments with a single space.
pub fn join_args<'a>(base: &'a str, extra: Option<&str>) -> Cow<'a, str> {
    match extra {
        Some(extra) if !extra.is_empty() => Cow::Owned(format!("{base} {extra}")),
        _ => Cow::Borrowed(base),
    }
}
