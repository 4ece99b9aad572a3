//! The compilation session: import traversal, semantic checks, caching.
//!
//! A [`Compiler`] owns a resolver, a per-URI result cache, and the symbol
//! tables of the last completed compile (serving editor queries). Each
//! [`Compiler::compile`] call works on a fresh `CompileRun`, so results are
//! idempotent and deterministic: compiling unchanged sources twice yields
//! identical diagnostics (order included) and identical label sets.
//!
//! # Per-file diagnostics
//!
//! The root file's diagnostics flow into the result. A transitively
//! imported file keeps its diagnostics to itself; only a roll-up warning
//! with its error count is reported at the import site.
//!
//! # Concurrency
//!
//! The session is single-threaded and cooperative: the only suspension
//! points are resolver calls, which is also where cancellation is observed.
//! Concurrent `compile` calls on one `Compiler` must be serialized by the
//! host; the final cache insert is the only mutation that outlives a call.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use async_recursion::async_recursion;
use indexmap::IndexMap;
use path_absolutize::Absolutize;
use url::Url;

use dpscript_base::{CancelToken, Diagnostic, DiagnosticBag};
use dpscript_language::{Lexer, Parser};

use crate::error::CompileError;
use crate::lower::Lowerer;
use crate::resolver::SourceResolver;
use crate::sir::{LabelSet, SirLabel, ENTRANCE_LABEL};
use crate::symbols::{SymbolPosition, SymbolTableManager};

/// The immutable outcome of one compile call.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// `true` iff no Error-severity diagnostic was reported.
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub labels: LabelSet,
    /// Canonical URI of the compiled root.
    pub source_id: String,
    pub timestamp: SystemTime,
}

pub struct Compiler {
    resolver: Arc<dyn SourceResolver>,
    cache: IndexMap<String, CompileResult>,
    symbols: SymbolTableManager,
}

impl Compiler {
    pub fn new(resolver: Arc<dyn SourceResolver>) -> Self {
        Compiler {
            resolver,
            cache: IndexMap::new(),
            symbols: SymbolTableManager::new(),
        }
    }

    /// Compiles `source_id` and everything it transitively imports.
    ///
    /// Returns `Err` only when no result can be produced: unusable source
    /// id, unresolvable root, or cancellation. Source-level problems are
    /// diagnostics inside the `Ok` result.
    pub async fn compile(
        &mut self,
        source_id: &str,
        cancel: &CancelToken,
    ) -> Result<CompileResult, CompileError> {
        let uri = canonicalize_source_id(source_id)?;
        log::debug!("compile {uri}");

        if cancel.is_cancelled() {
            return Err(CompileError::Cancelled);
        }
        let text = self
            .resolver
            .get_text(&uri)
            .await
            .map_err(|cause| CompileError::Root {
                uri: uri.clone(),
                cause,
            })?;

        let mut run = CompileRun::new(uri.clone());
        run.compile_file(&self.resolver, &uri, &text, cancel, true)
            .await?;
        run.semantic_check();
        let labels = run.collect_labels();

        let CompileRun {
            diagnostics,
            symbols,
            ..
        } = run;
        let result = CompileResult {
            success: diagnostics.error_count() == 0,
            diagnostics: diagnostics.into_vec(),
            labels,
            source_id: uri.clone(),
            timestamp: SystemTime::now(),
        };
        log::debug!(
            "compiled {uri}: success={} diagnostics={}",
            result.success,
            result.diagnostics.len()
        );

        // Committed only on completion: a cancelled or failed run leaves
        // the cache and query tables untouched.
        self.symbols = symbols;
        self.cache.insert(uri, result.clone());
        Ok(result)
    }

    /// The last result compiled for `source_id`, if any.
    pub fn cached_result(&self, source_id: &str) -> Option<&CompileResult> {
        let uri = canonicalize_source_id(source_id).ok()?;
        self.cache.get(&uri)
    }

    /// Label definitions visible from `source_id` (one import hop), from
    /// the last completed compile.
    pub fn find_label_definition(&self, source_id: &str, name: &str) -> Vec<SymbolPosition> {
        match canonicalize_source_id(source_id) {
            Ok(uri) => self.symbols.find_label_definition(&uri, name),
            Err(_) => Vec::new(),
        }
    }

    /// Variable definitions visible from `source_id` (one import hop).
    pub fn find_variable_definition(&self, source_id: &str, name: &str) -> Vec<SymbolPosition> {
        match canonicalize_source_id(source_id) {
            Ok(uri) => self.symbols.find_variable_definition(&uri, name),
            Err(_) => Vec::new(),
        }
    }
}

/// Working state of a single compile call.
struct CompileRun {
    root_uri: String,
    diagnostics: DiagnosticBag,
    symbols: SymbolTableManager,
    /// One entry per compiled unit, inserted on *entry* so import cycles
    /// terminate; the root is always first.
    label_sets: IndexMap<String, LabelSet>,
    /// Error counts of finished units, for import-site roll-up warnings.
    file_errors: IndexMap<String, usize>,
}

impl CompileRun {
    fn new(root_uri: String) -> Self {
        CompileRun {
            root_uri,
            diagnostics: DiagnosticBag::new(),
            symbols: SymbolTableManager::new(),
            label_sets: IndexMap::new(),
            file_errors: IndexMap::new(),
        }
    }

    #[async_recursion]
    async fn compile_file(
        &mut self,
        resolver: &Arc<dyn SourceResolver>,
        uri: &str,
        text: &str,
        cancel: &CancelToken,
        is_root: bool,
    ) -> Result<(), CompileError> {
        if self.label_sets.contains_key(uri) {
            return Ok(()); // cycle or diamond, already handled
        }
        self.label_sets.insert(uri.to_string(), LabelSet::new());
        log::debug!("compiling unit {uri}");

        let mut diagnostics = DiagnosticBag::new();
        let tokens = Lexer::new(text).tokenize(&mut diagnostics);
        let program = Parser::new(tokens).parse_program(&mut diagnostics);

        let mut lowerer = Lowerer::new(uri);

        for import in &program.imports {
            let token = &import.path;
            let Some(target) = resolve_import(uri, &token.lexeme) else {
                diagnostics.error(
                    format!("Cannot resolve import '{}'", token.lexeme),
                    token.position(),
                );
                continue;
            };
            if cancel.is_cancelled() {
                return Err(CompileError::Cancelled);
            }
            match resolver.get_text(&target).await {
                Ok(imported_text) => {
                    self.compile_file(resolver, &target, &imported_text, cancel, false)
                        .await?;
                    if let Some(&errors) = self.file_errors.get(&target) {
                        if errors > 0 {
                            diagnostics.warning(
                                format!(
                                    "Imported file '{}' has {errors} error(s)",
                                    token.lexeme
                                ),
                                token.position(),
                            );
                        }
                    }
                    lowerer.table_mut().add_reference(
                        target.clone(),
                        SymbolPosition {
                            source_id: uri.to_string(),
                            label: None,
                            line: token.line,
                            column: token.column,
                        },
                    );
                }
                Err(err) => {
                    diagnostics.error(
                        format!("Cannot import '{}': {err}", token.lexeme),
                        token.position(),
                    );
                }
            }
        }

        let mut set = LabelSet::new();
        if is_root && !program.top_stmts.is_empty() {
            let statements = lowerer.lower_top_level(&program.top_stmts);
            set.insert_or_merge(SirLabel {
                name: ENTRANCE_LABEL.to_string(),
                source_id: uri.to_string(),
                statements,
            });
        }
        for block in &program.labels {
            set.insert_or_merge(lowerer.lower_label(block));
        }

        let table = lowerer.finish();
        for (name, label) in &set.labels {
            if label.statements.is_empty() {
                let at = table
                    .label_defs
                    .get(name)
                    .and_then(|defs| defs.first())
                    .map(SymbolPosition::position)
                    .unwrap_or_default();
                diagnostics.warning(format!("Label '{name}' is empty"), at);
            }
        }

        self.symbols.insert(uri.to_string(), table);
        if let Some(slot) = self.label_sets.get_mut(uri) {
            *slot = set;
        }
        self.file_errors
            .insert(uri.to_string(), diagnostics.error_count());
        if is_root {
            self.diagnostics.absorb(diagnostics);
        } else if !diagnostics.is_empty() {
            // Not surfaced; the import site gets the roll-up warning.
            log::debug!("unit {uri}: {} diagnostic(s) withheld", diagnostics.len());
        }
        Ok(())
    }

    /// The fixed-order semantic pass over the root file's table:
    /// duplicate imports, then label usages, then variable usages, each in
    /// insertion (source) order.
    fn semantic_check(&mut self) {
        let Some(root) = self.symbols.get(&self.root_uri) else {
            return;
        };

        for (target, positions) in &root.references {
            if positions.len() > 1 {
                if let Some(first) = positions.first() {
                    self.diagnostics.report(Diagnostic::warning(
                        format!("Duplicate import of '{target}'"),
                        first.position(),
                    ));
                }
            }
        }

        for (name, usages) in &root.label_usages {
            let defs = self.symbols.find_label_definition(&self.root_uri, name);
            if defs.is_empty() {
                for usage in usages {
                    self.diagnostics.report(Diagnostic::error(
                        format!("Undefined label '{name}'"),
                        usage.position(),
                    ));
                }
            } else if defs.len() > 1 {
                for def in &defs {
                    // A duplicate living in the root anchors at its own
                    // position; one brought in by an import anchors at the
                    // import token.
                    let anchor = if def.source_id == self.root_uri {
                        def.position()
                    } else {
                        root.references
                            .get(&def.source_id)
                            .and_then(|positions| positions.first())
                            .map(SymbolPosition::position)
                            .unwrap_or_else(|| def.position())
                    };
                    self.diagnostics.report(Diagnostic::error(
                        format!("Duplicate label definition '{name}'"),
                        anchor,
                    ));
                }
            }
        }

        for (name, usages) in &root.variable_usages {
            if self
                .symbols
                .find_variable_definition(&self.root_uri, name)
                .is_empty()
            {
                for usage in usages {
                    self.diagnostics.report(Diagnostic::error(
                        format!("Undefined variable '{name}'"),
                        usage.position(),
                    ));
                }
            }
        }
    }

    /// Merges every compiled unit's labels, first wins; the root was
    /// inserted first, so its labels take precedence.
    fn collect_labels(&self) -> LabelSet {
        let mut result = LabelSet::new();
        for set in self.label_sets.values() {
            result.merge_first_wins(set);
        }
        result
    }
}

/// Canonicalizes a source id into an absolute URI. `file://`, `http://`,
/// and `https://` ids pass through; anything else is treated as a
/// filesystem path, absolutized against the working directory, and turned
/// into a `file://` URI.
pub fn canonicalize_source_id(source_id: &str) -> Result<String, CompileError> {
    if source_id.starts_with("file://")
        || source_id.starts_with("http://")
        || source_id.starts_with("https://")
    {
        return Ok(source_id.to_string());
    }
    let absolute = Path::new(source_id)
        .absolutize()
        .map_err(|_| CompileError::InvalidSourceId(source_id.to_string()))?;
    Url::from_file_path(absolute.as_ref())
        .map(|url| url.to_string())
        .map_err(|_| CompileError::InvalidSourceId(source_id.to_string()))
}

/// Resolves an import target against the importing file's URI. Absolute
/// targets (URIs or absolute paths) stand alone; relative paths join onto
/// the importer.
fn resolve_import(importer_uri: &str, target: &str) -> Option<String> {
    if target.starts_with("file://")
        || target.starts_with("http://")
        || target.starts_with("https://")
    {
        return Some(target.to_string());
    }
    let path = Path::new(target);
    if path.is_absolute() {
        return Url::from_file_path(path).ok().map(|url| url.to_string());
    }
    Url::parse(importer_uri)
        .ok()?
        .join(target)
        .ok()
        .map(|url| url.to_string())
}
