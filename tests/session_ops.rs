//! End-to-end flows over the in-memory engine: interactive session edits
//! followed by batch operations on the saved result.

use std::path::{Path, PathBuf};

use pdfcraft::cli::Commands;
use pdfcraft::engine::{Document, Engine, SaveMode};
use pdfcraft::ops::{CancelToken, compress, document};
use pdfcraft::test_utils::{FakeDocument, FakeEngine, FakeImage};
use pdfcraft::viewer::Session;

#[test]
fn edit_session_then_split_the_saved_document() {
    let mut engine = FakeEngine::default();
    engine.insert(
        "book.pdf",
        FakeDocument::with_texts(&["cover", "intro", "chapter one", "chapter two", "index"]),
    );

    let mut session = Session::new(engine.open(Path::new("book.pdf")).unwrap());
    session.delete_page(1).unwrap();
    session.move_page(0, 3).unwrap();
    session.rotate_pages(&[0], 90).unwrap();
    assert_eq!(session.page_count(), 4);
    assert_eq!(session.current_page(), 3);

    let hit = session.find("chapter", 1, true).unwrap().unwrap();
    assert_eq!(hit.page, 0);
    assert_eq!(session.search_status(), Some((0, 2)));

    let dir = tempfile::tempdir().unwrap();
    let edited = dir.path().join("edited.pdf");
    session
        .into_document()
        .save(&edited, SaveMode::Compressed)
        .unwrap();

    // The engine serves its own saved output back for further batch work.
    let files = document::split(&engine, &edited, "1-2", dir.path()).unwrap();
    assert_eq!(files.len(), 2);
    let first = engine.last_saved(&files[0]).unwrap();
    assert_eq!(first.page_text(0).unwrap(), "chapter one");
    assert_eq!(first.page_rotation(0).unwrap(), 90);
}

#[test]
fn merge_then_compress_the_result() {
    let mut engine = FakeEngine::default();
    let mut scanned = FakeDocument::with_pages(2);
    scanned.pages[0].images.push(FakeImage::rgb(1, 600, 600.0));
    scanned.pages[1].images.push(FakeImage::rgb(2, 100, 96.0));
    engine.insert("scan.pdf", scanned);
    engine.insert("cover.pdf", FakeDocument::with_texts(&["cover"]));

    let dir = tempfile::tempdir().unwrap();
    let merged = dir.path().join("merged.pdf");
    document::merge(
        &engine,
        &[PathBuf::from("cover.pdf"), PathBuf::from("scan.pdf")],
        &merged,
    )
    .unwrap();

    let out = dir.path().join("small.pdf");
    let report =
        compress::compress_document(&engine, &merged, &out, 60, 200, &CancelToken::new()).unwrap();
    assert_eq!(report.replaced(), 2);

    let saved = engine.last_saved(&out).unwrap();
    assert_eq!(saved.page_count(), 3);
    assert_eq!(saved.page_text(0).unwrap(), "cover");
    assert!(saved.pages[1].images[0].replaced_with.is_some());
}

#[test]
fn command_dispatch_reaches_the_operations() {
    let mut engine = FakeEngine::default();
    engine.insert(
        "report.pdf",
        FakeDocument::with_texts(&["draft alpha", "draft beta"]),
    );

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("hl.pdf");
    pdfcraft::commands::run(
        &engine,
        Commands::Highlight {
            file: PathBuf::from("report.pdf"),
            text: "draft".into(),
            output: out.clone(),
        },
    )
    .unwrap();

    let saved = engine.last_saved(&out).unwrap();
    assert_eq!(saved.pages[0].annotations.len(), 1);
    assert_eq!(saved.pages[1].annotations.len(), 1);
}

#[test]
fn command_dispatch_surfaces_range_errors() {
    let mut engine = FakeEngine::default();
    engine.insert("in.pdf", FakeDocument::with_pages(3));

    let dir = tempfile::tempdir().unwrap();
    let err = pdfcraft::commands::run(
        &engine,
        Commands::Split {
            file: PathBuf::from("in.pdf"),
            pages: Some("2,bogus".into()),
            output_dir: dir.path().to_path_buf(),
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("bogus"));
    assert!(engine.saved_paths().is_empty());
    assert!(engine.open(Path::new("in.pdf")).is_ok());
}
