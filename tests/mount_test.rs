#![cfg(feature = "pdf")]

use std::path::Path;
use std::time::Duration;

use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use pdfmount::pdf::{self, ContainerSize, RenderPolicy};

fn name(s: &str) -> Object {
    Object::Name(s.as_bytes().to_vec())
}

fn text(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

/// Write a three-page 400x600 document whose outline points at pages 3
/// and 1 (the latter through a named destination)
fn write_sample_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..3 {
        let contents = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page = doc.add_object(Dictionary::from_iter(vec![
            ("Type", name("Page")),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(400),
                    Object::Integer(600),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(contents)),
        ]));
        kids.push(Object::Reference(page));
    }
    let first_page = kids[0].clone();
    let last_page = kids[2].clone();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", name("Pages")),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(3)),
        ])),
    );

    let outlines_id = doc.new_object_id();
    let appendix = doc.new_object_id();
    let preface = doc.add_object(Dictionary::from_iter(vec![
        ("Title", text("Preface")),
        ("Parent", Object::Reference(outlines_id)),
        ("Next", Object::Reference(appendix)),
        ("Dest", text("preface")),
    ]));
    doc.objects.insert(
        appendix,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Title", text("Appendix")),
            ("Parent", Object::Reference(outlines_id)),
            ("Prev", Object::Reference(preface)),
            ("Dest", Object::Array(vec![last_page, name("Fit")])),
        ])),
    );
    doc.objects.insert(
        outlines_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", name("Outlines")),
            ("First", Object::Reference(preface)),
            ("Last", Object::Reference(appendix)),
            ("Count", Object::Integer(2)),
        ])),
    );

    let catalog = doc.add_object(Dictionary::from_iter(vec![
        ("Type", name("Catalog")),
        ("Pages", Object::Reference(pages_id)),
        ("Outlines", Object::Reference(outlines_id)),
        (
            "Dests",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "preface",
                Object::Array(vec![first_page, name("Fit")]),
            )])),
        ),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog));

    doc.save(path).unwrap();
}

#[test]
fn test_mount_real_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.pdf");
    write_sample_pdf(&path);

    let mount = pdf::mount(ContainerSize::new(800, 1000), &path, RenderPolicy::Coalesce).unwrap();

    let toc: Vec<_> = mount
        .toc()
        .iter()
        .map(|l| (l.title.as_str(), l.href.as_deref()))
        .collect();
    assert_eq!(toc, vec![("Preface", Some("0")), ("Appendix", Some("2"))]);

    mount.request_page(3);
    assert_eq!(
        mount.completions().recv_timeout(Duration::from_secs(30)),
        Ok(3)
    );

    let surface = mount.surface();
    let surface = surface.lock().unwrap();
    assert_eq!((surface.width(), surface.height()), (800, 1200));

    let out = dir.path().join("page3.png");
    surface.write_png(&out).unwrap();
    assert!(out.exists());
}

#[test]
fn test_mount_missing_file_fails() {
    let result = pdf::mount(
        ContainerSize::new(800, 1000),
        Path::new("/nonexistent/book.pdf"),
        RenderPolicy::Coalesce,
    );
    assert!(result.is_err());
}

/// Point `startxref` past the end of the file. MuPDF rebuilds the
/// cross-reference table; lopdf gives up on it.
fn break_startxref(path: &Path) {
    let bytes = std::fs::read(path).unwrap();
    let marker = b"startxref";
    let at = bytes
        .windows(marker.len())
        .rposition(|w| w == marker)
        .unwrap();
    let digits_start = at
        + marker.len()
        + bytes[at + marker.len()..]
            .iter()
            .position(u8::is_ascii_digit)
            .unwrap();
    let digits_end = digits_start
        + bytes[digits_start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap();

    let mut broken = bytes[..digits_start].to_vec();
    broken.extend_from_slice(b"999999");
    broken.extend_from_slice(&bytes[digits_end..]);
    std::fs::write(path, broken).unwrap();
}

#[test]
fn test_mount_unreadable_structure_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken-xref.pdf");
    write_sample_pdf(&path);
    break_startxref(&path);
    assert!(pdfmount::pdf::LopdfOutline::open(&path).is_err());

    let mount = pdf::mount(ContainerSize::new(800, 1000), &path, RenderPolicy::Coalesce).unwrap();
    assert!(mount.toc().is_empty());

    mount.request_page(1);
    assert_eq!(
        mount.completions().recv_timeout(Duration::from_secs(30)),
        Ok(1)
    );
}
