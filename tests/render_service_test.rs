//! Tests for RenderService

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tempfile::TempDir;

use pagegen::application::services::{RenderMode, RenderService};
use pagegen::application::{ApplicationError, DocumentError};
use pagegen::config::Settings;
use pagegen::infrastructure::persist::DatedFileSink;
use pagegen::infrastructure::traits::{PageSink, RealFileSystem};

const HELLO: &str = r#"
title = "Hello World"

[[nodes]]
kind = "element"
tag = "p"

[[nodes.children]]
kind = "text"
text = "Hi there"

[[nodes]]
kind = "script"
body = "var hidden = 1;"
"#;

/// Sink that always fails.
struct BrokenSink;

impl PageSink for BrokenSink {
    fn persist(&self, _title: &str, _content: &str, _extension: &str) -> io::Result<PathBuf> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only archive"))
    }
}

/// Sink that remembers what it was given.
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<(String, String)>>,
}

impl PageSink for RecordingSink {
    fn persist(&self, title: &str, _content: &str, extension: &str) -> io::Result<PathBuf> {
        self.calls.lock().push((title.to_string(), extension.to_string()));
        Ok(PathBuf::from(format!("/virtual/{title}.{extension}")))
    }
}

fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write page document");
    path
}

fn dated_service(temp: &TempDir) -> RenderService {
    let settings = Settings {
        output_dir: temp.path().join("archive"),
        ..Settings::default()
    };
    let fs = Arc::new(RealFileSystem);
    let sink = DatedFileSink::new(settings.output_dir.clone(), fs.clone())
        .with_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    RenderService::new(Arc::new(settings), fs, Arc::new(sink))
}

fn service_with_sink(settings: Settings, sink: Arc<dyn PageSink>) -> RenderService {
    RenderService::new(Arc::new(settings), Arc::new(RealFileSystem), sink)
}

#[test]
fn given_document_when_rendered_then_markup_returned() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(&temp, "hello.toml", HELLO);
    let service = dated_service(&temp);

    let rendered = service.render_document(&doc, RenderMode::default()).unwrap();

    assert_eq!(rendered.title, "Hello World");
    assert!(rendered.content.contains("<p>Hi there</p>"));
    assert_eq!(rendered.location, None);
}

#[test]
fn given_text_mode_when_rendered_then_scripts_and_tags_stripped() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(&temp, "hello.toml", HELLO);
    let service = dated_service(&temp);

    let rendered = service
        .render_document(
            &doc,
            RenderMode {
                text: true,
                persist: false,
            },
        )
        .unwrap();

    assert_eq!(rendered.content, "Hello World\nHi there");
}

#[test]
fn given_same_title_persisted_twice_when_rendering_then_dated_and_deduplicated() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(&temp, "hello.toml", HELLO);
    let service = dated_service(&temp);
    let mode = RenderMode {
        text: false,
        persist: true,
    };

    let first = service.render_document(&doc, mode).unwrap();
    let second = service.render_document(&doc, mode).unwrap();

    let day = temp.path().join("archive/2024/01/31");
    assert_eq!(first.location, Some(day.join("hello-world.html")));
    assert_eq!(second.location, Some(day.join("hello-world-1.html")));
    assert_eq!(
        std::fs::read_to_string(day.join("hello-world.html")).unwrap(),
        first.content
    );
}

#[test]
fn given_failing_sink_when_persisting_then_render_still_succeeds() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(&temp, "hello.toml", HELLO);
    let service = service_with_sink(Settings::default(), Arc::new(BrokenSink));

    let rendered = service
        .render_document(
            &doc,
            RenderMode {
                text: false,
                persist: true,
            },
        )
        .unwrap();

    assert!(rendered.content.contains("Hi there"));
    assert_eq!(rendered.location, None);
}

#[test]
fn given_debug_copy_enabled_when_rendering_then_copy_handed_to_sink() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(&temp, "hello.toml", HELLO);
    let sink = Arc::new(RecordingSink::default());
    let settings = Settings {
        debug_copy: true,
        ..Settings::default()
    };
    let service = service_with_sink(settings, sink.clone());

    service.render_document(&doc, RenderMode::default()).unwrap();

    assert_eq!(
        *sink.calls.lock(),
        vec![("Hello World".to_string(), "html".to_string())]
    );
}

#[test]
fn given_debug_copy_with_failing_sink_when_rendering_then_no_error() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(&temp, "hello.toml", HELLO);
    let settings = Settings {
        debug_copy: true,
        ..Settings::default()
    };
    let service = service_with_sink(settings, Arc::new(BrokenSink));

    assert!(service.render_document(&doc, RenderMode::default()).is_ok());
}

#[test]
fn given_several_documents_when_rendered_in_parallel_then_results_in_input_order() {
    let temp = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for i in 0..8 {
        paths.push(write_doc(
            &temp,
            &format!("page{i}.toml"),
            &format!("title = \"Page {i}\"\n[[nodes]]\nkind = \"lookup\"\nname = \"l{i}\"\n"),
        ));
    }
    paths.insert(3, write_doc(&temp, "broken.toml", "title = "));
    let service = dated_service(&temp);

    let results = service.render_documents(&paths, RenderMode::default());

    assert_eq!(results.len(), 9);
    for (i, (path, result)) in results.iter().enumerate() {
        assert_eq!(path, &paths[i]);
        if i == 3 {
            assert!(matches!(
                result,
                Err(ApplicationError::Document {
                    source: DocumentError::Toml(_),
                    ..
                })
            ));
        } else {
            let rendered = result.as_ref().unwrap();
            // every page has its own allocator and dictionary
            assert!(rendered.content.contains("id_1:\"n1\""));
            assert!(rendered.content.contains("count:\"1\""));
        }
    }
}

#[test]
fn given_missing_document_when_loading_then_operation_failed_with_path() {
    let temp = TempDir::new().unwrap();
    let service = dated_service(&temp);
    let missing = temp.path().join("nope.toml");

    let err = service.load_document(Path::new(&missing)).unwrap_err();

    match err {
        ApplicationError::OperationFailed { context, .. } => {
            assert!(context.contains("nope.toml"), "{context}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn given_structurally_invalid_document_when_built_then_domain_error() {
    let temp = TempDir::new().unwrap();
    let doc = write_doc(
        &temp,
        "bad.json",
        r#"{ "title": "x", "nodes": [ { "kind": "frame", "src": "/a" } ] }"#,
    );
    let service = dated_service(&temp);

    assert!(matches!(
        service.build(&doc),
        Err(ApplicationError::Domain(_))
    ));
}
