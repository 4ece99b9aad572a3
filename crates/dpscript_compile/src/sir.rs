//! Statement IR — the compiled form the runtime executor consumes.
//!
//! SIR mirrors the statement syntax but carries resolved [`Expr`] trees in
//! place of expression syntax, and each label knows which source unit it
//! came from. The unit of execution entry is the [`SirLabel`]; a compiled
//! program is a [`LabelSet`] with a designated entrance.
//!
//! [`SirStmt::Pop`] is a scope-cleanup sentinel: the runtime inserts it when
//! it schedules a scoped transfer (`tour`, menu arms) so the executor knows
//! where a temporary scope ends. The compiler itself never emits it.

use indexmap::IndexMap;

use crate::expr::Expr;

/// Name of the synthesized entrance label; reserved, never user-defined.
pub const ENTRANCE_LABEL: &str = "@system/__main__";

#[derive(Debug, Clone, PartialEq)]
pub enum SirStmt {
    Dialogue {
        speaker: Option<String>,
        /// Always an [`Expr::FString`].
        text: Expr,
    },
    Menu {
        arms: Vec<MenuArm>,
    },
    Jump {
        target: String,
    },
    Tour {
        target: String,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Assign {
        /// Stored name: `$` stripped, `global.` prefix preserved.
        name: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then_branch: Vec<SirStmt>,
        else_branch: Option<Vec<SirStmt>>,
    },
    /// Scope-cleanup marker for the runtime executor.
    Pop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuArm {
    /// Always an [`Expr::FString`].
    pub text: Expr,
    pub body: Vec<SirStmt>,
}

/// A named, executable block of statement IR.
#[derive(Debug, Clone, PartialEq)]
pub struct SirLabel {
    pub name: String,
    /// Canonical URI of the source unit that defined this label.
    pub source_id: String,
    pub statements: Vec<SirStmt>,
}

/// The compiled artifact: labels by name plus the designated entrance.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    pub labels: IndexMap<String, SirLabel>,
    pub entrance: String,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelSet {
    pub fn new() -> Self {
        LabelSet {
            labels: IndexMap::new(),
            entrance: ENTRANCE_LABEL.to_string(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SirLabel> {
        self.labels.get(name)
    }

    /// Inserts a label; a label with the same name already present has its
    /// statement list appended to (same-file label merging).
    pub fn insert_or_merge(&mut self, label: SirLabel) {
        match self.labels.entry(label.name.clone()) {
            indexmap::map::Entry::Occupied(mut entry) => {
                entry.get_mut().statements.extend(label.statements);
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(label);
            }
        }
    }

    /// Merges `other` into `self` with first-wins semantics on name
    /// collision (duplicates across files are diagnosed separately).
    pub fn merge_first_wins(&mut self, other: &LabelSet) {
        for (name, label) in &other.labels {
            if !self.labels.contains_key(name) {
                self.labels.insert(name.clone(), label.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, source: &str, count: usize) -> SirLabel {
        SirLabel {
            name: name.to_string(),
            source_id: source.to_string(),
            statements: vec![SirStmt::Pop; count],
        }
    }

    #[test]
    fn entrance_is_the_reserved_name() {
        let set = LabelSet::new();
        assert_eq!(set.entrance, "@system/__main__");
        assert!(set.labels.is_empty());
    }

    #[test]
    fn insert_or_merge_appends_same_name() {
        let mut set = LabelSet::new();
        set.insert_or_merge(label("x", "file:///a.dp", 1));
        set.insert_or_merge(label("x", "file:///a.dp", 2));
        assert_eq!(set.labels.len(), 1);
        assert_eq!(set.get("x").map(|l| l.statements.len()), Some(3));
    }

    #[test]
    fn merge_first_wins_keeps_existing_labels() {
        let mut root = LabelSet::new();
        root.insert_or_merge(label("x", "file:///a.dp", 1));
        let mut imported = LabelSet::new();
        imported.insert_or_merge(label("x", "file:///b.dp", 5));
        imported.insert_or_merge(label("y", "file:///b.dp", 2));

        root.merge_first_wins(&imported);
        assert_eq!(root.get("x").map(|l| l.source_id.as_str()), Some("file:///a.dp"));
        assert_eq!(root.get("y").map(|l| l.source_id.as_str()), Some("file:///b.dp"));
    }

    #[test]
    fn label_order_is_insertion_order() {
        let mut set = LabelSet::new();
        set.insert_or_merge(label("b", "file:///a.dp", 0));
        set.insert_or_merge(label("a", "file:///a.dp", 0));
        let names: Vec<_> = set.labels.keys().cloned().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
