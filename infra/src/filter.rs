//! Storage neutral document predicates.
//!
//! Paths are dotted field names (`menu.name`). Wherever a path step meets an
//! array, the step applies to every element, so `critiques.name` addresses
//! the name of each embedded critique. A predicate on a path holds when any
//! of the addressed values satisfies it.
//!
//! The in-memory store evaluates predicates with [`Filter::matches`]; the
//! Postgres store renders them to `jsonb_path_exists` calls via
//! [`Filter::to_sql`], using lax JSONPath so the array behaviour above falls
//! out of `[*]` accessors.
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    And(Vec<Filter>),
    /// Some value at `path` is exactly `value`.
    Equals { path: String, value: String },
    /// Some value at `path` is exactly one of `values`.
    OneOf { path: String, values: Vec<String> },
    /// Some value at `path` contains `needle`, ignoring case.
    Contains { path: String, needle: String },
    /// Every needle is contained, ignoring case, in some value at `path`.
    ContainsAll { path: String, needles: Vec<String> },
}

/// A rendered SQL boolean expression over a `body` jsonb column. Parameters
/// are all text and are numbered from the offset given to [`Filter::to_sql`].
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<String>,
}

impl Filter {
    pub fn equals(path: &str, value: &str) -> Self {
        Filter::Equals {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    pub fn one_of<S: AsRef<str>>(path: &str, values: &[S]) -> Self {
        Filter::OneOf {
            path: path.to_string(),
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    pub fn contains(path: &str, needle: &str) -> Self {
        Filter::Contains {
            path: path.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn contains_all<S: AsRef<str>>(path: &str, needles: &[S]) -> Self {
        Filter::ContainsAll {
            path: path.to_string(),
            needles: needles.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    /// Conjunction of the given fragments, collapsing the trivial cases.
    pub fn all_of(mut fragments: Vec<Filter>) -> Self {
        fragments.retain(|f| *f != Filter::All);
        match fragments.len() {
            0 => Filter::All,
            1 => fragments.remove(0),
            _ => Filter::And(fragments),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::And(fragments) => fragments.iter().all(|f| f.matches(doc)),
            Filter::Equals { path, value } => {
                strings_at(doc, path).any(|s| s == value.as_str())
            }
            Filter::OneOf { path, values } => {
                strings_at(doc, path).any(|s| values.iter().any(|v| v.as_str() == s))
            }
            Filter::Contains { path, needle } => {
                let needle = needle.to_lowercase();
                strings_at(doc, path).any(|s| s.to_lowercase().contains(&needle))
            }
            Filter::ContainsAll { path, needles } => needles.iter().all(|needle| {
                let needle = needle.to_lowercase();
                strings_at(doc, path).any(|s| s.to_lowercase().contains(&needle))
            }),
        }
    }

    /// Renders this filter as SQL, numbering placeholders from `$first_param`.
    pub fn to_sql(&self, first_param: usize) -> SqlFilter {
        let mut params = Vec::new();
        let clause = self.render(first_param, &mut params);
        SqlFilter { clause, params }
    }

    fn render(&self, first_param: usize, params: &mut Vec<String>) -> String {
        match self {
            Filter::All => "TRUE".to_string(),
            Filter::And(fragments) if fragments.is_empty() => "TRUE".to_string(),
            Filter::And(fragments) => fragments
                .iter()
                .map(|f| format!("({})", f.render(first_param, params)))
                .collect::<Vec<_>>()
                .join(" AND "),
            Filter::Equals { path, value } => {
                let vars = json!({ "v": value });
                path_exists(
                    first_param,
                    params,
                    format!("{} ? (@ == $v)", json_path(path)),
                    Some(vars),
                )
            }
            Filter::OneOf { values, .. } if values.is_empty() => "FALSE".to_string(),
            Filter::OneOf { path, values } => {
                let mut vars = Map::new();
                let mut alternatives = Vec::new();
                for (i, value) in values.iter().enumerate() {
                    let name = format!("v{}", i);
                    alternatives.push(format!("@ == ${}", name));
                    vars.insert(name, Value::String(value.clone()));
                }
                path_exists(
                    first_param,
                    params,
                    format!("{} ? ({})", json_path(path), alternatives.join(" || ")),
                    Some(Value::Object(vars)),
                )
            }
            Filter::Contains { path, needle } => path_exists(
                first_param,
                params,
                format!(
                    "{} ? (@ like_regex {} flag \"i\")",
                    json_path(path),
                    quoted(&escape_regex(needle))
                ),
                None,
            ),
            Filter::ContainsAll { path, needles } => Filter::And(
                needles
                    .iter()
                    .map(|needle| Filter::contains(path, needle))
                    .collect(),
            )
            .render(first_param, params),
        }
    }
}

fn path_exists(
    first_param: usize,
    params: &mut Vec<String>,
    json_path: String,
    vars: Option<Value>,
) -> String {
    params.push(json_path);
    let path_param = first_param + params.len() - 1;
    match vars {
        Some(vars) => {
            params.push(vars.to_string());
            let vars_param = first_param + params.len() - 1;
            format!(
                "jsonb_path_exists(body, ${}::text::jsonpath, ${}::text::jsonb)",
                path_param, vars_param
            )
        }
        None => format!("jsonb_path_exists(body, ${}::text::jsonpath)", path_param),
    }
}

fn json_path(path: &str) -> String {
    let mut out = String::from("$");
    for step in path.split('.') {
        out.push('.');
        out.push_str(&quoted(step));
        out.push_str("[*]");
    }
    out
}

fn quoted(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn values_at<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = flatten(vec![doc]);
    for step in path.split('.') {
        let next = current
            .into_iter()
            .filter_map(|v| v.get(step))
            .collect::<Vec<_>>();
        current = flatten(next);
    }
    current
}

fn flatten(values: Vec<&Value>) -> Vec<&Value> {
    values
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn strings_at<'a>(doc: &'a Value, path: &str) -> impl Iterator<Item = &'a str> {
    values_at(doc, path).into_iter().filter_map(Value::as_str)
}
