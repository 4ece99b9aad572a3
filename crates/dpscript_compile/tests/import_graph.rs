//! Cross-file compilation: import resolution, duplicate handling, cycles,
//! cancellation, and the per-file diagnostics policy.

use std::sync::Arc;

use dpscript_base::{CancelToken, Severity};
use dpscript_compile::{
    CompileError, Compiler, MemoryResolver, ResolveError, ResolveResult, SourceResolver,
};

const MAIN: &str = "file:///story/main.dp";

fn compiler_for(resolver: MemoryResolver) -> Compiler {
    Compiler::new(Arc::new(resolver))
}

#[tokio::test]
async fn imported_labels_are_visible_to_jumps() {
    let resolver = MemoryResolver::new()
        .with(MAIN, "import lib.dp\nlabel start:\n    jump shared\n")
        .with("file:///story/lib.dp", "label shared:\n    Bob \"hi\"\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.labels.get("shared").is_some());
    assert!(result.labels.get("start").is_some());
}

#[tokio::test]
async fn duplicate_label_across_import_anchors_both_sites() {
    let resolver = MemoryResolver::new()
        .with(
            MAIN,
            "import b.dp\nlabel x:\n    Alice \"hi\"\n    jump x\n",
        )
        .with("file:///story/b.dp", "label x:\n    Bob \"yo\"\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    assert!(!result.success);
    let duplicates: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.message == "Duplicate label definition 'x'")
        .collect();
    assert_eq!(duplicates.len(), 2);
    // Local definition anchors at `label x` (line 2); the imported one
    // anchors at the `import b.dp` path token (line 1).
    assert!(duplicates.iter().any(|d| d.position.line == 2));
    assert!(duplicates.iter().any(|d| d.position.line == 1));
}

#[tokio::test]
async fn duplicate_import_warns_at_first_occurrence() {
    let resolver = MemoryResolver::new()
        .with(MAIN, "import b.dp\nimport b.dp\nlabel a:\n    jump a\n")
        .with("file:///story/b.dp", "label b:\n    Bob \"yo\"\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    assert!(result.success, "{:?}", result.diagnostics);
    let warning = result
        .diagnostics
        .iter()
        .find(|d| d.message.starts_with("Duplicate import of"))
        .expect("duplicate-import warning");
    assert_eq!(warning.severity, Severity::Warning);
    assert!(warning.message.contains("file:///story/b.dp"));
    assert_eq!(warning.position.line, 1);
}

#[tokio::test]
async fn missing_import_is_an_error_at_the_path_token() {
    let resolver = MemoryResolver::new().with(MAIN, "import nowhere.dp\nlabel a:\n    jump a\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    assert!(!result.success);
    let error = &result.diagnostics[0];
    assert!(error.message.contains("nowhere.dp"), "{}", error.message);
    assert_eq!(error.position.line, 1);
    assert_eq!(error.position.column, 8);
    // The rest of the root still compiled.
    assert!(result.labels.get("a").is_some());
}

#[tokio::test]
async fn imported_file_errors_surface_only_as_rollup_warning() {
    let resolver = MemoryResolver::new()
        .with(MAIN, "import broken.dp\nlabel a:\n    jump a\n")
        .with("file:///story/broken.dp", "label b:\n    jump\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    // The import's parse error is withheld; only the roll-up warning shows.
    assert!(result.success, "{:?}", result.diagnostics);
    let warning = result
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Warning)
        .expect("roll-up warning");
    assert!(warning.message.contains("broken.dp"), "{}", warning.message);
    assert!(warning.message.contains("1 error"), "{}", warning.message);
    assert_eq!(warning.position.line, 1);
}

#[tokio::test]
async fn import_cycles_terminate() {
    let resolver = MemoryResolver::new()
        .with(MAIN, "import b.dp\nlabel a:\n    jump b\n")
        .with(
            "file:///story/b.dp",
            "import main.dp\nlabel b:\n    Bob \"hi\"\n",
        );
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.labels.get("a").is_some());
    assert!(result.labels.get("b").is_some());
}

#[tokio::test]
async fn self_import_terminates() {
    let resolver =
        MemoryResolver::new().with(MAIN, "import main.dp\nlabel a:\n    jump a\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();
    assert!(result.labels.get("a").is_some());
}

#[tokio::test]
async fn diamond_import_compiles_each_file_once() {
    // main imports left and right; both import base. The duplicate-label
    // check would fire if base were compiled twice into separate tables.
    let resolver = MemoryResolver::new()
        .with(
            MAIN,
            "import left.dp\nimport right.dp\nlabel a:\n    jump base\n",
        )
        .with("file:///story/left.dp", "import base.dp\nlabel l:\n    jump l\n")
        .with("file:///story/right.dp", "import base.dp\nlabel r:\n    jump r\n")
        .with("file:///story/base.dp", "label base:\n    Bob \"hi\"\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    // `base` is two hops from main, so the jump cannot see it...
    assert!(!result.success);
    let messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert!(messages.contains(&"Undefined label 'base'"), "{messages:?}");
    // ...but its labels still land in the collected set exactly once.
    assert!(result.labels.get("base").is_some());
}

#[tokio::test]
async fn labels_collect_first_wins_on_collision() {
    let resolver = MemoryResolver::new()
        .with(MAIN, "import b.dp\nlabel x:\n    Alice \"root\"\n    jump x\n")
        .with("file:///story/b.dp", "label x:\n    Bob \"imported\"\n");
    let mut compiler = compiler_for(resolver);
    let result = compiler.compile(MAIN, &CancelToken::new()).await.unwrap();

    // Diagnosed as duplicate, but the collected set keeps the root's copy.
    let label = result.labels.get("x").expect("label x");
    assert_eq!(label.source_id, MAIN);
}

#[tokio::test]
async fn unresolvable_root_aborts_without_result() {
    let resolver = MemoryResolver::new();
    let mut compiler = compiler_for(resolver);
    let err = compiler
        .compile(MAIN, &CancelToken::new())
        .await
        .expect_err("root is missing");
    assert!(matches!(err, CompileError::Root { .. }));
    assert!(compiler.cached_result(MAIN).is_none());
}

#[tokio::test]
async fn pre_cancelled_compile_aborts_immediately() {
    let resolver = MemoryResolver::new().with(MAIN, "label a:\n    jump a\n");
    let mut compiler = compiler_for(resolver);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = compiler.compile(MAIN, &cancel).await.expect_err("cancelled");
    assert!(matches!(err, CompileError::Cancelled));
    assert!(compiler.cached_result(MAIN).is_none());
}

/// Resolver that signals cancellation after serving the root, so the next
/// suspension point (the import fetch) observes it.
struct CancelAfterRoot {
    inner: MemoryResolver,
    cancel: CancelToken,
}

#[async_trait::async_trait]
impl SourceResolver for CancelAfterRoot {
    async fn exists(&self, source_id: &str) -> bool {
        self.inner.exists(source_id).await
    }

    async fn get_text(&self, source_id: &str) -> ResolveResult<String> {
        let text = self.inner.get_text(source_id).await;
        self.cancel.cancel();
        text
    }
}

#[tokio::test]
async fn cancellation_mid_compile_commits_nothing() {
    let cancel = CancelToken::new();
    let inner = MemoryResolver::new()
        .with(MAIN, "import b.dp\nlabel a:\n    jump a\n")
        .with("file:///story/b.dp", "label b:\n    jump b\n");
    let mut compiler = Compiler::new(Arc::new(CancelAfterRoot {
        inner,
        cancel: cancel.clone(),
    }));

    let err = compiler.compile(MAIN, &cancel).await.expect_err("cancelled");
    assert!(matches!(err, CompileError::Cancelled));
    assert!(compiler.cached_result(MAIN).is_none());
    assert!(compiler.find_label_definition(MAIN, "a").is_empty());
}

#[tokio::test]
async fn import_error_variants_render_usefully() {
    // Exercises the ResolveError Display paths the session folds into
    // diagnostics.
    assert!(ResolveError::NotFound("file:///x.dp".into())
        .to_string()
        .contains("not found"));
    assert!(ResolveError::InvalidUri("::bad::".into())
        .to_string()
        .contains("Invalid"));
}
