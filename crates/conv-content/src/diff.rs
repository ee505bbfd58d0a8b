//! Semantic diff between two states of a settings document

use serde_json::Value;

/// Maximum recursion depth for diff operations
const MAX_DIFF_DEPTH: usize = 128;

/// Result of comparing two states of a settings document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsDiff {
    pub changes: Vec<SettingsChange>,
}

impl SettingsDiff {
    /// Compute the changes between two normalized documents.
    ///
    /// Paths use dots for keys and `[i]` for array elements, e.g.
    /// `component.RunManager.configuration[0].type`.
    pub fn compute(old: &Value, new: &Value) -> Self {
        let mut changes = Vec::new();
        diff_values(old, new, String::new(), &mut changes, 0);
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A single change at a path
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    Added { path: String, value: Value },
    Removed { path: String, value: Value },
    Modified { path: String, old: Value, new: Value },
}

impl SettingsChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Modified { path, .. } => {
                path
            }
        }
    }
}

impl std::fmt::Display for SettingsChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added { path, value } => write!(f, "+ {path} = {value}"),
            Self::Removed { path, value } => write!(f, "- {path} = {value}"),
            Self::Modified { path, old, new } => write!(f, "~ {path}: {old} -> {new}"),
        }
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn diff_values(
    old: &Value,
    new: &Value,
    path: String,
    changes: &mut Vec<SettingsChange>,
    depth: usize,
) {
    // Past the depth limit a difference is reported as one modification
    if depth > MAX_DIFF_DEPTH {
        if old != new {
            changes.push(SettingsChange::Modified {
                path,
                old: old.clone(),
                new: new.clone(),
            });
        }
        return;
    }

    match (old, new) {
        (Value::Object(old_obj), Value::Object(new_obj)) => {
            for (key, old_value) in old_obj {
                let child = child_path(&path, key);
                match new_obj.get(key) {
                    Some(new_value) => diff_values(old_value, new_value, child, changes, depth + 1),
                    None => changes.push(SettingsChange::Removed {
                        path: child,
                        value: old_value.clone(),
                    }),
                }
            }
            for (key, new_value) in new_obj {
                if !old_obj.contains_key(key) {
                    changes.push(SettingsChange::Added {
                        path: child_path(&path, key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old_arr), Value::Array(new_arr)) => {
            let max_len = old_arr.len().max(new_arr.len());
            for i in 0..max_len {
                let child = format!("{path}[{i}]");
                match (old_arr.get(i), new_arr.get(i)) {
                    (Some(o), Some(n)) => diff_values(o, n, child, changes, depth + 1),
                    (Some(o), None) => changes.push(SettingsChange::Removed {
                        path: child,
                        value: o.clone(),
                    }),
                    (None, Some(n)) => changes.push(SettingsChange::Added {
                        path: child,
                        value: n.clone(),
                    }),
                    (None, None) => unreachable!(),
                }
            }
        }
        _ => {
            if old != new {
                changes.push(SettingsChange::Modified {
                    path,
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }
}
