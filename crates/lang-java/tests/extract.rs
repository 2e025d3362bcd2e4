use structscope_api::{CodeElement, ElementDetail, ElementKind, Language, QueryKind, Visibility};
use structscope_core::parser::{SyntaxParser, TreeSitterParser};
use structscope_core::query::QueryExecutionEngine;
use structscope_core::registry::LanguageRegistry;

const SOURCE: &str = r#"package com.example.app;

import java.util.List;
import static java.util.Collections.emptyList;
import java.io.*;

@Deprecated
public class Outer<T extends Comparable<T>> extends Base implements Runnable, java.io.Serializable {
    private static final int LIMIT = 10, MAX = 20;
    protected List<String> names;

    public Outer() {}

    @Override
    public void run() {}

    static <R> R convert(String input, int... rest) throws java.io.IOException, IllegalStateException {
        return null;
    }

    class Inner {
        void innerMethod() {}
    }
}

interface Shape extends Comparable<Shape> {
    double area();
    int SIDES = 0;
}

enum Color implements Shape {
    RED, GREEN("g");
    Color() {}
    Color(String s) {}
    public double area() { return 0; }
}

record Point(int x, int y) {}

@interface Marker {
    String value() default "x";
}
"#;

fn run(kind: QueryKind) -> Vec<CodeElement> {
    let registry = LanguageRegistry::new().with(structscope_java::registration());
    let plugin = registry.resolve("java").unwrap();
    let tree = TreeSitterParser
        .parse(&Language::JAVA, &plugin.grammar(), SOURCE.as_bytes())
        .unwrap();
    assert!(!tree.has_errors());
    QueryExecutionEngine::new()
        .run(&plugin, &tree, &kind, SOURCE, None)
        .unwrap()
}

fn find<'a>(elements: &'a [CodeElement], qualified: &str) -> &'a CodeElement {
    elements
        .iter()
        .find(|e| e.qualified_name() == qualified)
        .unwrap_or_else(|| panic!("{qualified} not found"))
}

#[test]
fn test_classes() {
    let classes = run(QueryKind::CLASSES);
    let names: Vec<_> = classes.iter().map(|c| c.qualified_name()).collect();
    assert_eq!(
        names,
        ["Outer", "Outer.Inner", "Shape", "Color", "Point", "Marker"]
    );

    let outer = find(&classes, "Outer");
    assert_eq!(outer.kind, ElementKind::Class);
    assert_eq!(outer.visibility, Visibility::Public);
    assert_eq!(outer.modifiers, ["@Deprecated"]);
    assert_eq!((outer.span.start_line, outer.span.start_column), (7, 1));
    assert_eq!(outer.span.end_line, 24);
    assert_eq!(
        outer.detail,
        ElementDetail::Type {
            superclass: Some("Base".into()),
            interfaces: vec!["Runnable".into(), "java.io.Serializable".into()],
            type_parameters: Some("<T extends Comparable<T>>".into()),
        }
    );

    let inner = find(&classes, "Outer.Inner");
    assert_eq!(inner.visibility, Visibility::Package);
    assert_eq!(inner.container.as_deref(), Some("Outer"));

    assert_eq!(find(&classes, "Shape").kind, ElementKind::Interface);
    match &find(&classes, "Shape").detail {
        ElementDetail::Type { interfaces, .. } => assert_eq!(interfaces, &["Comparable<Shape>"]),
        other => panic!("unexpected detail {other:?}"),
    }
    assert_eq!(find(&classes, "Color").kind, ElementKind::Enum);
    let point = find(&classes, "Point");
    assert_eq!(point.kind, ElementKind::Record);
    assert_eq!(point.attributes.get("components").map(String::as_str), Some("(int x, int y)"));
    assert_eq!(find(&classes, "Marker").kind, ElementKind::Annotation);
}

#[test]
fn test_methods() {
    let methods = run(QueryKind::METHODS);
    let names: Vec<_> = methods.iter().map(|m| m.qualified_name()).collect();
    assert_eq!(
        names,
        [
            "Outer.Outer",
            "Outer.run",
            "Outer.convert",
            "Outer.Inner.innerMethod",
            "Shape.area",
            "Color.Color",
            "Color.Color",
            "Color.area",
            "Marker.value",
        ]
    );

    let ctor = &methods[0];
    assert_eq!(ctor.kind, ElementKind::Constructor);
    assert_eq!(ctor.span.start_line, 12);

    let run = find(&methods, "Outer.run");
    assert_eq!(run.modifiers, ["@Override"]);
    assert_eq!((run.span.start_line, run.span.end_line), (14, 15));

    let convert = find(&methods, "Outer.convert");
    assert_eq!(convert.visibility, Visibility::Package);
    assert!(convert.has_modifier("static"));
    assert_eq!(convert.attributes.get("type_parameters").map(String::as_str), Some("<R>"));
    assert_eq!(
        convert.detail,
        ElementDetail::Callable {
            return_type: Some("R".into()),
            parameters: vec!["String input".into(), "int... rest".into()],
            throws: vec!["java.io.IOException".into(), "IllegalStateException".into()],
            is_async: false,
        }
    );
    assert_eq!((convert.span.start_line, convert.span.end_line), (17, 19));

    assert_eq!(find(&methods, "Shape.area").visibility, Visibility::Public);
    assert_eq!(methods[5].visibility, Visibility::Private);
    assert_eq!(find(&methods, "Marker.value").attributes.get("default").map(String::as_str), Some("\"x\""));
}

#[test]
fn test_fields_and_enum_constants() {
    let fields = run(QueryKind::FIELDS);
    let mut names: Vec<_> = fields.iter().map(|f| f.qualified_name()).collect();
    names.sort();
    assert_eq!(
        names,
        ["Color.GREEN", "Color.RED", "Outer.LIMIT", "Outer.MAX", "Outer.names", "Shape.SIDES"]
    );

    let limit = find(&fields, "Outer.LIMIT");
    assert_eq!(limit.visibility, Visibility::Private);
    assert_eq!(limit.modifiers, ["static", "final"]);
    assert_eq!(
        limit.detail,
        ElementDetail::Variable {
            type_name: Some("int".into()),
            value: Some("10".into()),
        }
    );
    match &find(&fields, "Outer.MAX").detail {
        ElementDetail::Variable { value, .. } => assert_eq!(value.as_deref(), Some("20")),
        other => panic!("unexpected detail {other:?}"),
    }
    assert_eq!(find(&fields, "Outer.names").visibility, Visibility::Protected);
    assert_eq!(find(&fields, "Shape.SIDES").visibility, Visibility::Public);

    let green = find(&fields, "Color.GREEN");
    assert_eq!(green.kind, ElementKind::EnumConstant);
    assert_eq!(
        green.detail,
        ElementDetail::Variable {
            type_name: Some("Color".into()),
            value: Some("(\"g\")".into()),
        }
    );
}

#[test]
fn test_imports_and_package() {
    let imports = run(QueryKind::IMPORTS);
    assert_eq!(imports.len(), 3);
    assert_eq!(
        imports[1].detail,
        ElementDetail::Import {
            path: "java.util.Collections.emptyList".into(),
            alias: None,
            is_static: true,
            is_wildcard: false,
        }
    );
    assert_eq!(imports[2].name, "java.io.*");
    assert_eq!(
        imports[2].detail,
        ElementDetail::Import {
            path: "java.io".into(),
            alias: None,
            is_static: false,
            is_wildcard: true,
        }
    );

    let package = run(QueryKind::PACKAGE);
    assert_eq!(package.len(), 1);
    assert_eq!(package[0].name, "com.example.app");
    assert_eq!(package[0].span.start_line, 1);
}

#[test]
fn test_every_declared_kind_compiles() {
    let registry = LanguageRegistry::new().with(structscope_java::registration());
    let plugin = registry.resolve("java").unwrap();
    for kind in &structscope_java::descriptor().query_kinds {
        assert!(plugin.supports(kind), "{kind}");
    }
    assert!(!plugin.supports(&QueryKind::FUNCTIONS));
}
