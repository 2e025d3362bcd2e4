use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use structscope_api::{AnalysisError, ElementKind, ErrorKind, Language, QueryKind};
use structscope_core::engine::instances;
use structscope_core::{
    AnalysisEngine, EngineConfig, EngineState, LanguageRegistry, Result, SyntaxParser, SyntaxTree,
    TreeSitterParser,
};
use tempfile::TempDir;

const THREE_CLASSES: &str = r#"package demo;

// First class
public class Alpha {
    /** Greets. */
    public void greet() {
        System.out.println("hi");
    }

    int count() { return 1; }
}

class Beta {
    private String name;

    Beta(String name) {
        this.name = name;
    }
}

class Gamma {
    static void run() {}
}
"#;

#[derive(Default)]
struct CountingParser {
    calls: AtomicUsize,
}

impl CountingParser {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SyntaxParser for CountingParser {
    fn parse(
        &self,
        language: &Language,
        grammar: &tree_sitter::Language,
        source: &[u8],
    ) -> Result<SyntaxTree> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(20));
        TreeSitterParser.parse(language, grammar, source)
    }
}

fn registry() -> Arc<LanguageRegistry> {
    Arc::new(
        LanguageRegistry::new()
            .with(structscope_java::registration())
            .with(structscope_python::registration()),
    )
}

/// A fresh project with `files` written under it. Every test gets its own
/// root since engines are shared per root across the process.
fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }
    dir
}

fn open(root: &Path) -> (Arc<AnalysisEngine>, Arc<CountingParser>) {
    let parser = Arc::new(CountingParser::default());
    let engine = AnalysisEngine::open_with(
        root,
        EngineConfig::default(),
        registry(),
        parser.clone(),
    )
    .unwrap();
    (engine, parser)
}

#[tokio::test]
async fn test_methods_across_three_classes() {
    let dir = project(&[("src/Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());

    let methods = engine
        .analyze("src/Demo.java", &QueryKind::METHODS)
        .await
        .unwrap();
    let got: Vec<_> = methods
        .iter()
        .map(|m| (m.qualified_name(), m.kind, m.span.start_line, m.span.end_line))
        .collect();
    assert_eq!(
        got,
        [
            ("Alpha.greet".to_string(), ElementKind::Method, 6, 8),
            ("Alpha.count".to_string(), ElementKind::Method, 10, 10),
            ("Beta.Beta".to_string(), ElementKind::Constructor, 16, 18),
            ("Gamma.run".to_string(), ElementKind::Method, 22, 22),
        ]
    );

    let lines: Vec<_> = THREE_CLASSES.lines().collect();
    for m in &methods {
        assert!(lines[m.span.start_line - 1].contains(m.name.as_str()));
        assert!(lines[m.span.end_line - 1].trim_end().ends_with('}'));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_parse_once() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, parser) = open(dir.path());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        let kind = if i % 2 == 0 {
            QueryKind::METHODS
        } else {
            QueryKind::FIELDS
        };
        tasks.push(tokio::spawn(async move {
            engine.analyze("Demo.java", &kind).await
        }));
    }
    for task in tasks {
        assert!(!task.await.unwrap().unwrap().is_empty());
    }

    assert_eq!(parser.calls(), 1);
    let stats = engine.cache_stats();
    assert_eq!(stats.results.entries, 2);
}

#[tokio::test]
async fn test_repeated_calls_hit_the_result_cache() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, parser) = open(dir.path());

    let first = engine.analyze("Demo.java", &QueryKind::CLASSES).await.unwrap();
    let second = engine.analyze("Demo.java", &QueryKind::CLASSES).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(parser.calls(), 1);
    assert!(engine.cache_stats().results.hits >= 1);
}

#[tokio::test]
async fn test_edit_is_never_served_stale() {
    let dir = project(&[("Demo.java", "class A { void before() {} }\n")]);
    let (engine, parser) = open(dir.path());

    let before = engine.analyze("Demo.java", &QueryKind::METHODS).await.unwrap();
    assert_eq!(before[0].name, "before");

    std::fs::write(
        dir.path().join("Demo.java"),
        "class A {\n    void after() {}\n    void other() {}\n}\n",
    )
    .unwrap();
    let after = engine.analyze("Demo.java", &QueryKind::METHODS).await.unwrap();
    let names: Vec<_> = after.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["after", "other"]);
    assert_eq!(after[0].span.start_line, 2);
    assert_eq!(parser.calls(), 2);
    assert_eq!(engine.cache_stats().parse.entries, 1);
}

#[tokio::test]
async fn test_path_outside_root_is_rejected_without_parsing() {
    let dir = project(&[("proj/Main.java", "class Main {}"), ("outside/Secret.java", "class Secret { void s() {} }")]);
    let (engine, parser) = open(&dir.path().join("proj"));

    let err = engine
        .analyze("../outside/Secret.java", &QueryKind::METHODS)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityViolation);
    assert_eq!(parser.calls(), 0);
    assert!(!engine.registry().is_loaded(&Language::JAVA));

    let absolute = dir.path().join("outside/Secret.java");
    let err = engine.analyze(&absolute, &QueryKind::METHODS).await.unwrap_err();
    assert!(matches!(err, AnalysisError::SecurityViolation { .. }));
}

#[tokio::test]
async fn test_unregistered_extension_is_unsupported() {
    let dir = project(&[("notes.txt", "hello"), ("Main.kt", "fun main() {}")]);
    let (engine, parser) = open(dir.path());

    for path in ["notes.txt", "Main.kt"] {
        let err = engine.analyze(path, &QueryKind::CLASSES).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedLanguage, "{path}");
    }
    assert_eq!(parser.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_query_kind() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, parser) = open(dir.path());

    let err = engine
        .analyze("Demo.java", &QueryKind::FUNCTIONS)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::UnsupportedQuery {
            language: Language::JAVA,
            query_kind: QueryKind::FUNCTIONS,
        }
    );
    assert_eq!(parser.calls(), 0);
}

#[test]
fn test_concurrent_open_yields_one_instance() {
    let dir = project(&[]);
    let root = dir.path().to_path_buf();

    let engines: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let root = root.clone();
                s.spawn(move || AnalysisEngine::open(root, EngineConfig::default(), registry()).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for engine in &engines[1..] {
        assert!(Arc::ptr_eq(&engines[0], engine));
    }
    // A non-canonical spelling of the same root maps to the same engine.
    let dotted = root.join("sub").join("..");
    std::fs::create_dir_all(root.join("sub")).unwrap();
    let again = AnalysisEngine::open(dotted, EngineConfig::default(), registry()).unwrap();
    assert!(Arc::ptr_eq(&engines[0], &again));
}

#[test]
fn test_blocking_call_from_plain_thread() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());
    let methods = engine.analyze_blocking("Demo.java", &QueryKind::METHODS).unwrap();
    assert_eq!(methods.len(), 4);
}

#[test]
fn test_blocking_variants_match_async_results() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());

    let all = engine.analyze_all_blocking("Demo.java").unwrap();
    let report = engine.structure_report_blocking("Demo.java", None).unwrap();
    assert_eq!(all, report.elements);

    let classes = engine
        .analyze_buffer_blocking("java", THREE_CLASSES, &QueryKind::CLASSES)
        .unwrap();
    assert_eq!(classes.len(), 3);

    let section = engine.extract_section_blocking("Demo.java", 4, 4).unwrap();
    assert_eq!(section.content, "public class Alpha {\n");

    engine.shutdown_blocking().unwrap();
    assert_eq!(engine.state(), EngineState::Closed);
}

#[tokio::test]
async fn test_blocking_call_inside_current_thread_runtime() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());
    let methods = engine.analyze_blocking("Demo.java", &QueryKind::METHODS).unwrap();
    assert_eq!(methods.len(), 4);

    // The async path still works on the same runtime afterwards.
    let again = engine.analyze("Demo.java", &QueryKind::METHODS).await.unwrap();
    assert_eq!(methods, again);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_call_inside_multi_thread_runtime() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());
    let report = engine.check_scale_blocking("Demo.java").unwrap();
    assert_eq!(report.total_lines, 23);
}

#[tokio::test]
async fn test_serialized_output_is_identical() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());

    let first = engine.structure_report("Demo.java", None).await.unwrap();
    let second = engine.structure_report("Demo.java", None).await.unwrap();
    let first = serde_json::to_string(&first).unwrap();
    let second = serde_json::to_string(&second).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_analyze_all_merges_in_source_order() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());

    let all = engine.analyze_all("Demo.java").await.unwrap();
    assert_eq!(all.len(), 1 + 3 + 4 + 1);
    assert_eq!(all[0].kind, ElementKind::Package);
    assert!(all.windows(2).all(|w| {
        (w[0].span.start_line, w[0].span.start_column) <= (w[1].span.start_line, w[1].span.start_column)
    }));
}

#[tokio::test]
async fn test_check_scale() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());

    let report = engine.check_scale("Demo.java").await.unwrap();
    assert_eq!(report.path, "Demo.java");
    assert_eq!(report.language, Language::JAVA);
    assert_eq!(report.bytes, THREE_CLASSES.len());
    assert_eq!(report.total_lines, 23);
    assert_eq!(report.blank_lines, 5);
    assert_eq!(report.comment_lines, 2);
    assert_eq!(report.code_lines, 16);
    assert_eq!(report.element_counts.get(&ElementKind::Class), Some(&3));
    assert_eq!(report.element_counts.get(&ElementKind::Method), Some(&3));
    assert_eq!(report.element_counts.get(&ElementKind::Constructor), Some(&1));
    assert_eq!(report.element_counts.get(&ElementKind::Field), Some(&1));
    assert_eq!(report.largest_callables.len(), 4);
    assert_eq!(report.largest_callables[0].name, "Alpha.greet");
    assert_eq!(report.largest_callables[0].lines, 3);
    assert!(!report.is_large);
}

#[tokio::test]
async fn test_large_file_guidance() {
    let body: String = (0..30).map(|i| format!("    int f{i};\n")).collect();
    let source = format!("class Big {{\n{body}}}\n");
    let dir = project(&[("Big.java", &source)]);
    let config = EngineConfig {
        large_file_lines: 10,
        ..EngineConfig::default()
    };
    let engine = AnalysisEngine::open(dir.path(), config, registry()).unwrap();

    let report = engine.check_scale("Big.java").await.unwrap();
    assert!(report.is_large);
    assert!(report.guidance.contains("extract_code_section"));
    assert_eq!(report.element_counts.get(&ElementKind::Field), Some(&30));
}

#[tokio::test]
async fn test_extract_section() {
    let dir = project(&[("Demo.java", THREE_CLASSES), ("README", "one\ntwo\nthree\n")]);
    let (engine, parser) = open(dir.path());

    let section = engine.extract_section("Demo.java", 13, 19).await.unwrap();
    assert!(section.content.starts_with("class Beta {"));
    assert!(section.content.ends_with("}\n"));
    assert_eq!((section.start_line, section.end_line), (13, 19));

    let clamped = engine.extract_section("README", 2, 100).await.unwrap();
    assert_eq!(clamped.content, "two\nthree\n");
    assert_eq!(clamped.end_line, 3);

    let err = engine.extract_section("README", 0, 2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = engine.extract_section("README", 5, 6).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = engine.extract_section("missing.txt", 1, 2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(parser.calls(), 0);
}

#[tokio::test]
async fn test_analyze_buffer() {
    let dir = project(&[]);
    let (engine, parser) = open(dir.path());

    let source = "def top():\n    pass\n\nclass K:\n    def m(self):\n        pass\n";
    let functions = engine
        .analyze_buffer("python", source, &QueryKind::FUNCTIONS)
        .await
        .unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name, "top");

    let methods = engine
        .analyze_buffer("py", source, &QueryKind::METHODS)
        .await
        .unwrap();
    assert_eq!(methods[0].qualified_name(), "K.m");
    assert_eq!(parser.calls(), 1);

    let err = engine
        .analyze_buffer("cobol", source, &QueryKind::CLASSES)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedLanguage);
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let config = EngineConfig {
        max_file_bytes: 64,
        ..EngineConfig::default()
    };
    let engine = AnalysisEngine::open(dir.path(), config, registry()).unwrap();

    let err = engine.analyze("Demo.java", &QueryKind::CLASSES).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_tracked_files_stay_within_result_capacity() {
    let files: Vec<(String, String)> = (0..6)
        .map(|i| (format!("C{i}.java"), format!("class C{i} {{}}\n")))
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let dir = project(&refs);
    let config = EngineConfig {
        result_cache_capacity: 2,
        ..EngineConfig::default()
    };
    let engine = AnalysisEngine::open(dir.path(), config, registry()).unwrap();

    for (path, _) in &files {
        engine.analyze(path, &QueryKind::CLASSES).await.unwrap();
    }
    assert!(engine.tracked_files() <= 2);

    // Edits are still picked up after older paths were forgotten.
    std::fs::write(dir.path().join("C5.java"), "class C5 { void m() {} }\n").unwrap();
    let methods = engine.analyze("C5.java", &QueryKind::METHODS).await.unwrap();
    assert_eq!(methods.len(), 1);
}

#[tokio::test]
async fn test_shutdown_closes_and_reopen_creates_new_instance() {
    let dir = project(&[("Demo.java", THREE_CLASSES)]);
    let (engine, _) = open(dir.path());
    engine.analyze("Demo.java", &QueryKind::CLASSES).await.unwrap();

    assert!(Arc::ptr_eq(&instances::lookup(engine.root()).unwrap(), &engine));

    engine.shutdown().await;
    assert_eq!(engine.state(), EngineState::Closed);
    assert!(instances::lookup(engine.root()).is_none());
    let err = engine.analyze("Demo.java", &QueryKind::CLASSES).await.unwrap_err();
    assert_eq!(err, AnalysisError::EngineShutdown);
    assert_eq!(engine.cache_stats().results.entries, 0);

    // Shutting down twice is a no-op.
    engine.shutdown().await;

    let (reopened, _) = open(dir.path());
    assert!(!Arc::ptr_eq(&engine, &reopened));
    assert_eq!(reopened.state(), EngineState::Ready);
    assert_eq!(
        reopened.analyze("Demo.java", &QueryKind::CLASSES).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_python_file_end_to_end() {
    let source = "import os\n\nLIMIT = 3\n\nclass Repo:\n    size: int = 0\n\n    async def load(self):\n        pass\n";
    let dir = project(&[("pkg/repo.py", source)]);
    let (engine, _) = open(dir.path());

    let report = engine.structure_report("pkg/repo.py", None).await.unwrap();
    assert_eq!(report.language, Language::PYTHON);
    let kinds: Vec<_> = report.elements.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            ElementKind::Import,
            ElementKind::Variable,
            ElementKind::Class,
            ElementKind::Field,
            ElementKind::Method,
        ]
    );
}
