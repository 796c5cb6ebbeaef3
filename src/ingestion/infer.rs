//! Column naming and type inference shared by the text-based readers.

use std::collections::HashSet;

use crate::types::DataType;

/// Kind of a single non-null cell, as observed in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

impl CellKind {
    /// Classify a raw text cell. Returns `None` for empty (null) cells.
    pub(crate) fn of_text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.parse::<i64>().is_ok() {
            Some(Self::Int)
        } else if trimmed.parse::<f64>().is_ok() {
            Some(Self::Float)
        } else if parse_bool(trimmed).is_some() {
            Some(Self::Bool)
        } else {
            Some(Self::Text)
        }
    }

    /// Classify a JSON value. Returns `None` for `null`.
    pub(crate) fn of_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(_) => Some(Self::Bool),
            serde_json::Value::Number(n) if n.is_i64() => Some(Self::Int),
            serde_json::Value::Number(_) => Some(Self::Float),
            _ => Some(Self::Text),
        }
    }

    fn join(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Text,
        }
    }
}

/// Running type inference for one column.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ColumnInference {
    kind: Option<CellKind>,
}

impl ColumnInference {
    pub(crate) fn observe(&mut self, kind: Option<CellKind>) {
        if let Some(k) = kind {
            self.kind = Some(match self.kind {
                Some(cur) => cur.join(k),
                None => k,
            });
        }
    }

    /// Columns with no non-null cells default to text.
    pub(crate) fn resolve(self) -> DataType {
        match self.kind {
            Some(CellKind::Int) => DataType::Int64,
            Some(CellKind::Float) => DataType::Float64,
            Some(CellKind::Bool) => DataType::Bool,
            Some(CellKind::Text) | None => DataType::Utf8,
        }
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Normalize header cells into unique, non-empty column names.
///
/// Blank names become `Unnamed: <idx>`; repeats get `.1`, `.2`, ... suffixes. Repeats are
/// detected ASCII case-insensitively, matching SQL identifier rules.
pub(crate) fn normalize_column_names<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for (idx, raw) in headers.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            raw.to_owned()
        };

        let mut name = base.clone();
        let mut suffix = 1usize;
        while used.contains(&name.to_ascii_lowercase()) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        used.insert(name.to_ascii_lowercase());
        out.push(name);
    }

    out
}
