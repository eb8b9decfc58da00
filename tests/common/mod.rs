//! Shared helpers for integration tests.
#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

/// Write a PDF with one page per entry of `pages`. An empty entry produces a
/// page with an empty content stream.
pub fn write_pdf(path: &Path, pages: &[&str], title: Option<&str>, author: Option<&str>) {
    build_pdf(pages, title, author).save(path).unwrap();
}

/// Write a PDF whose trailer references a standard security handler
/// dictionary, which marks the file as encrypted.
pub fn write_encrypted_pdf(path: &Path, pages: &[&str]) {
    let mut doc = build_pdf(pages, None, None);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.save(path).unwrap();
}

/// Write a PDF like [`write_pdf`] where page `unreadable` (1-based) selects
/// its font with a number instead of a name, so text extraction fails there.
pub fn write_pdf_with_unreadable_page(path: &Path, pages: &[&str], unreadable: usize) {
    let mut contents: Vec<_> = pages.iter().map(|text| text_operations(text)).collect();
    contents[unreadable - 1] = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![1.into(), 12.into()]),
        Operation::new("Tj", vec![Object::string_literal("lost")]),
        Operation::new("ET", vec![]),
    ];
    build_pdf_from_operations(contents, None, None).save(path).unwrap();
}

fn text_operations(text: &str) -> Vec<Operation> {
    if text.is_empty() {
        return Vec::new();
    }
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn build_pdf(pages: &[&str], title: Option<&str>, author: Option<&str>) -> Document {
    let contents = pages.iter().map(|text| text_operations(text)).collect();
    build_pdf_from_operations(contents, title, author)
}

fn build_pdf_from_operations(
    contents: Vec<Vec<Operation>>,
    title: Option<&str>,
    author: Option<&str>,
) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for operations in contents {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = lopdf::Dictionary::new();
    if let Some(title) = title {
        info.set("Title", Object::string_literal(title));
    }
    if let Some(author) = author {
        info.set("Author", Object::string_literal(author));
    }
    if title.is_some() || author.is_some() {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    doc
}
