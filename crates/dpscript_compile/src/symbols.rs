//! Per-file symbol tables and cross-file lookups.
//!
//! Each compiled source unit gets a [`FileSymbolTable`]: five name-keyed
//! maps recording where labels and variables are defined and used, plus the
//! file's one-hop import edges (`references`). All maps preserve insertion
//! order — the IR builder walks the source top to bottom, and the semantic
//! check pass iterates these maps, so insertion order is what makes
//! diagnostics deterministic.
//!
//! The [`SymbolTableManager`] owns one table per URI. Definition lookups
//! union the root file's table with the tables of its direct references;
//! they deliberately do **not** recurse, so reference cycles between files
//! are harmless (imports are flat per file).

use indexmap::IndexMap;
use serde::Serialize;

use dpscript_base::Position;

/// Where a symbol was defined or used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolPosition {
    /// Canonical URI of the file containing the occurrence.
    pub source_id: String,
    /// Enclosing label at the occurrence, when there is one.
    pub label: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl SymbolPosition {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Symbol records for a single source unit.
#[derive(Debug, Clone, Default)]
pub struct FileSymbolTable {
    pub label_defs: IndexMap<String, Vec<SymbolPosition>>,
    pub variable_defs: IndexMap<String, Vec<SymbolPosition>>,
    pub label_usages: IndexMap<String, Vec<SymbolPosition>>,
    pub variable_usages: IndexMap<String, Vec<SymbolPosition>>,
    /// One entry per *imported URI*; multiple positions mean the same file
    /// was imported more than once (diagnosed as a warning).
    pub references: IndexMap<String, Vec<SymbolPosition>>,
}

impl FileSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_label_def(&mut self, name: impl Into<String>, at: SymbolPosition) {
        self.label_defs.entry(name.into()).or_default().push(at);
    }

    pub fn add_variable_def(&mut self, name: impl Into<String>, at: SymbolPosition) {
        self.variable_defs.entry(name.into()).or_default().push(at);
    }

    pub fn add_label_usage(&mut self, name: impl Into<String>, at: SymbolPosition) {
        self.label_usages.entry(name.into()).or_default().push(at);
    }

    pub fn add_variable_usage(&mut self, name: impl Into<String>, at: SymbolPosition) {
        self.variable_usages.entry(name.into()).or_default().push(at);
    }

    pub fn add_reference(&mut self, imported_uri: impl Into<String>, at: SymbolPosition) {
        self.references.entry(imported_uri.into()).or_default().push(at);
    }
}

/// Tables for every file seen by a compilation, keyed by canonical URI.
#[derive(Debug, Clone, Default)]
pub struct SymbolTableManager {
    tables: IndexMap<String, FileSymbolTable>,
}

impl SymbolTableManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, table: FileSymbolTable) {
        self.tables.insert(uri.into(), table);
    }

    pub fn get(&self, uri: &str) -> Option<&FileSymbolTable> {
        self.tables.get(uri)
    }

    /// Label definitions visible from `root_uri`: the root's own plus those
    /// of every directly referenced file. One hop only.
    pub fn find_label_definition(&self, root_uri: &str, name: &str) -> Vec<SymbolPosition> {
        self.find_in_scope(root_uri, |table| table.label_defs.get(name))
    }

    /// Variable definitions visible from `root_uri`. One hop only.
    pub fn find_variable_definition(&self, root_uri: &str, name: &str) -> Vec<SymbolPosition> {
        self.find_in_scope(root_uri, |table| table.variable_defs.get(name))
    }

    fn find_in_scope<'a, F>(&'a self, root_uri: &str, select: F) -> Vec<SymbolPosition>
    where
        F: Fn(&'a FileSymbolTable) -> Option<&'a Vec<SymbolPosition>>,
    {
        let mut found = Vec::new();
        let Some(root) = self.tables.get(root_uri) else {
            return found;
        };
        if let Some(positions) = select(root) {
            found.extend(positions.iter().cloned());
        }
        for referenced_uri in root.references.keys() {
            if referenced_uri == root_uri {
                continue; // a file importing itself adds nothing new
            }
            if let Some(table) = self.tables.get(referenced_uri) {
                if let Some(positions) = select(table) {
                    found.extend(positions.iter().cloned());
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(source: &str, line: u32, column: u32) -> SymbolPosition {
        SymbolPosition {
            source_id: source.to_string(),
            label: None,
            line,
            column,
        }
    }

    #[test]
    fn lookups_union_root_and_references() {
        let mut manager = SymbolTableManager::new();

        let mut root = FileSymbolTable::new();
        root.add_label_def("x", at("file:///a.dp", 2, 1));
        root.add_reference("file:///b.dp", at("file:///a.dp", 1, 8));
        manager.insert("file:///a.dp", root);

        let mut imported = FileSymbolTable::new();
        imported.add_label_def("x", at("file:///b.dp", 1, 1));
        imported.add_label_def("y", at("file:///b.dp", 4, 1));
        manager.insert("file:///b.dp", imported);

        let defs = manager.find_label_definition("file:///a.dp", "x");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].source_id, "file:///a.dp");
        assert_eq!(defs[1].source_id, "file:///b.dp");

        let y = manager.find_label_definition("file:///a.dp", "y");
        assert_eq!(y.len(), 1);
    }

    #[test]
    fn lookup_does_not_recurse_transitively() {
        let mut manager = SymbolTableManager::new();

        let mut a = FileSymbolTable::new();
        a.add_reference("file:///b.dp", at("file:///a.dp", 1, 8));
        manager.insert("file:///a.dp", a);

        let mut b = FileSymbolTable::new();
        b.add_reference("file:///c.dp", at("file:///b.dp", 1, 8));
        manager.insert("file:///b.dp", b);

        let mut c = FileSymbolTable::new();
        c.add_label_def("deep", at("file:///c.dp", 1, 1));
        manager.insert("file:///c.dp", c);

        // `deep` is two hops away from a: invisible.
        assert!(manager.find_label_definition("file:///a.dp", "deep").is_empty());
        // But visible one hop from b.
        assert_eq!(manager.find_label_definition("file:///b.dp", "deep").len(), 1);
    }

    #[test]
    fn lookup_tolerates_reference_cycles() {
        let mut manager = SymbolTableManager::new();

        let mut a = FileSymbolTable::new();
        a.add_label_def("start", at("file:///a.dp", 1, 1));
        a.add_reference("file:///b.dp", at("file:///a.dp", 1, 8));
        manager.insert("file:///a.dp", a);

        let mut b = FileSymbolTable::new();
        b.add_reference("file:///a.dp", at("file:///b.dp", 1, 8));
        manager.insert("file:///b.dp", b);

        let defs = manager.find_label_definition("file:///a.dp", "start");
        assert_eq!(defs.len(), 1);
        let defs = manager.find_label_definition("file:///b.dp", "start");
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn missing_root_yields_no_definitions() {
        let manager = SymbolTableManager::new();
        assert!(manager.find_label_definition("file:///nope.dp", "x").is_empty());
    }

    #[test]
    fn duplicate_imports_accumulate_positions() {
        let mut table = FileSymbolTable::new();
        table.add_reference("file:///b.dp", at("file:///a.dp", 1, 8));
        table.add_reference("file:///b.dp", at("file:///a.dp", 2, 8));
        assert_eq!(table.references.len(), 1);
        assert_eq!(table.references["file:///b.dp"].len(), 2);
    }

    #[test]
    fn variable_reassignment_keeps_every_definition() {
        let mut table = FileSymbolTable::new();
        table.add_variable_def("score", at("file:///a.dp", 1, 1));
        table.add_variable_def("score", at("file:///a.dp", 5, 1));
        assert_eq!(table.variable_defs["score"].len(), 2);
    }
}
