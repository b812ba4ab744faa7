//! Tests for page documents

use pagegen::application::{DocumentError, DocumentFormat, KindSpec, PageDocument};
use pagegen::domain::{Capabilities, DomainError, PageOptions};

const ORDER_FORM: &str = r##"
title = "Order"
lang = "fr"
classes = ["app"]

[[nodes]]
kind = "element"
tag = "form"
id = "order"
attributes = { method = "post" }

[[nodes.children]]
kind = "field"
name = "qty"
label = "Quantité"
value = "1"

[[nodes.children]]
kind = "checkbox"
name = "gift"
label = "Gift"
value = "on"

[[nodes.children]]
kind = "lookup"
name = "city"
label = "City"
required = true
max_length = 30

[[nodes]]
kind = "script_include"
src = "/js/app.js"
"##;

#[test]
fn given_toml_document_when_built_and_rendered_then_all_kinds_emitted() {
    let doc = PageDocument::parse(ORDER_FORM, DocumentFormat::Toml).unwrap();
    let page = doc.build(PageOptions::default()).unwrap();

    let html = page.render(&Capabilities::new()).unwrap();

    assert!(html.contains("<html lang=\"fr\">"));
    assert!(html.contains("<body class=\"app\">"));
    assert!(html.contains("<form id=\"order\" method=\"post\">"), "{html}");
    assert!(html.contains("<label for=\"n2\">Quantité</label>"), "{html}");
    assert!(html.contains("name=\"gift\" value=\"Y\" checked>"), "{html}");
    assert!(html.contains("count:\"1\","));
    assert!(html.contains("src=\"/js/app.js\""));
}

#[test]
fn given_json_document_when_parsed_then_same_shape_as_toml() {
    let json = r#"{
        "title": "Frames",
        "nodes": [
            { "kind": "frame_set", "cols": "30%,70%", "children": [
                { "kind": "frame", "src": "/nav.html", "name": "nav" },
                { "kind": "frame", "src": "/main.html" }
            ]}
        ]
    }"#;

    let doc = PageDocument::parse(json, DocumentFormat::Json).unwrap();

    assert_eq!(
        doc.nodes[0].kind,
        KindSpec::FrameSet {
            rows: None,
            cols: Some("30%,70%".into())
        }
    );
    assert_eq!(doc.nodes[0].children.len(), 2);
    let html = doc
        .build(PageOptions::default())
        .unwrap()
        .render(&Capabilities::new())
        .unwrap();
    assert!(html.contains("<frame src=\"/nav.html\" name=\"nav\">"));
}

#[test]
fn given_frame_at_top_level_when_built_then_structural_violation() {
    let doc = PageDocument::parse(
        "title = \"x\"\n[[nodes]]\nkind = \"frame\"\nsrc = \"/a\"\n",
        DocumentFormat::Toml,
    )
    .unwrap();

    let err = doc.build(PageOptions::default()).unwrap_err();

    assert!(matches!(err, DomainError::StructuralViolation(_)));
}

#[test]
fn given_children_under_text_when_built_then_structural_violation() {
    let doc = PageDocument::parse(
        r#"
title = "x"
[[nodes]]
kind = "text"
text = "leaf"
[[nodes.children]]
kind = "text"
text = "nope"
"#,
        DocumentFormat::Toml,
    )
    .unwrap();

    assert!(matches!(
        doc.build(PageOptions::default()),
        Err(DomainError::StructuralViolation(_))
    ));
}

#[test]
fn given_bad_checkbox_literal_when_built_then_illegal_argument() {
    let doc = PageDocument::parse(
        "title = \"x\"\n[[nodes]]\nkind = \"checkbox\"\nname = \"c\"\nvalue = \"sí\"\n",
        DocumentFormat::Toml,
    )
    .unwrap();

    let err = doc.build(PageOptions::default()).unwrap_err();

    assert_eq!(
        err,
        DomainError::IllegalArgument("unrecognized boolean literal \"s&#237;\"".to_string())
    );
}

#[test]
fn given_unknown_kind_when_parsed_then_error() {
    let result = PageDocument::parse(
        "title = \"x\"\n[[nodes]]\nkind = \"carousel\"\n",
        DocumentFormat::Toml,
    );

    assert!(matches!(result, Err(DocumentError::Toml(_))));
}

#[test]
fn given_truncated_json_when_parsed_then_json_error() {
    let err = PageDocument::parse(r#"{ "title": "x", "nodes": ["#, DocumentFormat::Json)
        .unwrap_err();

    assert!(matches!(err, DocumentError::Json(_)));
    assert!(err.to_string().starts_with("JSON: "), "{err}");
}
