//! Command line templates.
//!
//! Templates are whitespace-separated words with `$NAME` or `${NAME}`
//! variables. A word that is exactly one list variable expands to one
//! argument per element; anywhere else a list is joined with spaces. `$$` is
//! a literal dollar sign. Unknown variables expand to nothing and words that
//! end up empty are dropped.

use std::collections::BTreeMap;

/// Values available to a command template.
#[derive(Debug, Clone, Default)]
pub struct CommandVars {
    vars: BTreeMap<String, Vec<String>>,
}

impl CommandVars {
    pub fn new() -> Self {
        CommandVars::default()
    }

    /// Set a single-valued variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), vec![value.into()]);
        self
    }

    /// Set a list variable.
    pub fn set_list<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vars
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).map(Vec::as_slice)
    }
}

/// Expand a template into an argument vector (program first).
pub fn expand_command(template: &str, vars: &CommandVars) -> Vec<String> {
    let mut argv = Vec::new();

    for word in template.split_whitespace() {
        if let Some(name) = whole_variable(word) {
            match vars.get(name) {
                Some(values) => argv.extend(values.iter().filter(|v| !v.is_empty()).cloned()),
                None => tracing::debug!("command variable `{}` is not set", name),
            }
            continue;
        }

        let expanded = expand_word(word, vars);
        if !expanded.is_empty() {
            argv.push(expanded);
        }
    }

    argv
}

/// `$NAME` or `${NAME}` spanning the whole word.
fn whole_variable(word: &str) -> Option<&str> {
    let name = if let Some(inner) = word.strip_prefix("${") {
        inner.strip_suffix('}')?
    } else {
        word.strip_prefix('$')?
    };

    if !name.is_empty() && name.chars().all(is_var_char) {
        Some(name)
    } else {
        None
    }
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn expand_word(word: &str, vars: &CommandVars) -> String {
    let mut out = String::with_capacity(word.len());
    let mut rest = word;

    while let Some(i) = rest.find('$') {
        out.push_str(&rest[..i]);
        let after = &rest[i + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, tail) = if let Some(inner) = after.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], &inner[end + 1..]),
                None => ("", after),
            }
        } else {
            let len = after.find(|c: char| !is_var_char(c)).unwrap_or(after.len());
            (&after[..len], &after[len..])
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        match vars.get(name) {
            Some(values) => out.push_str(&values.join(" ")),
            None => tracing::debug!("command variable `{}` is not set", name),
        }
        rest = tail;
    }

    out.push_str(rest);
    out
}
