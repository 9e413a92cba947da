//! In-memory PDF fixtures for tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a PDF with one page per entry; each string becomes one text line.
///
/// Fonts and the media box live on the page tree root so pages inherit them.
pub(crate) fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let y = 750 - (index as i64) * 20;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(50), Object::Integer(y)],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = document.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    document.save_to(&mut output).expect("serialize fixture PDF");
    output
}

/// A PDF whose pages carry no text at all, like a scanned document
pub(crate) fn blank_pdf(pages: usize) -> Vec<u8> {
    let no_lines: &[&str] = &[];
    pdf_with_pages(&vec![no_lines; pages])
}

/// Two-page invoice used by the end-to-end tests
pub(crate) fn sample_invoice_pdf() -> Vec<u8> {
    pdf_with_pages(&[
        &[
            "INVOICE",
            "Vendor: ACME Supplies Ltd",
            "Address: 1 Market Street, Springfield",
            "Invoice Number: INV-2024-001",
            "Invoice Date: 2024-03-15",
        ],
        &[
            "Widget x 2 @ 50.00 = 100.00",
            "Subtotal: 100.00",
            "Total: 110.00",
        ],
    ])
}
