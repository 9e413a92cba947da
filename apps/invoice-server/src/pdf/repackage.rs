//! PDF repackaging
//!
//! Rebuilds a document by copying its pages, in order, into a fresh page tree
//! and catalog. Some viewers choke on incremental updates, broken xref tables
//! or odd page trees; the rewritten file is a plain, compressed PDF.

use std::collections::BTreeSet;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use super::types::PdfError;

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains
const MAX_TREE_DEPTH: usize = 64;

/// Count the pages of a PDF
pub fn page_count(bytes: &[u8]) -> Result<usize, PdfError> {
    let document = Document::load_mem(bytes).map_err(|e| PdfError::UnreadablePdf(e.to_string()))?;
    Ok(document.get_pages().len())
}

/// Copy every page of `bytes` into a new document and serialize it
pub fn repackage(bytes: &[u8]) -> Result<Vec<u8>, PdfError> {
    let source = Document::load_mem(bytes).map_err(|e| PdfError::UnreadablePdf(e.to_string()))?;

    let pages = source.get_pages();
    if pages.is_empty() {
        return Err(PdfError::UnreadablePdf("document has no pages".to_string()));
    }

    let mut target = Document::with_version(source.version.clone());
    // Keep source object ids; new ids are allocated above them
    target.max_id = source.max_id;
    let pages_id = target.new_object_id();

    let page_ids: BTreeSet<ObjectId> = pages.values().copied().collect();

    for (id, object) in &source.objects {
        if page_ids.contains(id) {
            continue;
        }
        match type_name(object) {
            Some(b"Catalog") | Some(b"Pages") | Some(b"Outlines") | Some(b"Outline") => continue,
            _ => {
                target.objects.insert(*id, object.clone());
            }
        }
    }

    let mut kids = Vec::with_capacity(pages.len());
    for page_id in pages.values() {
        let mut page = source
            .get_dictionary(*page_id)
            .map_err(|e| PdfError::UnreadablePdf(format!("page {:?}: {}", page_id, e)))?
            .clone();

        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited(&source, &page, key) {
                    page.set(key, value);
                }
            }
        }
        page.set("Parent", pages_id);

        target.objects.insert(*page_id, Object::Dictionary(page));
        kids.push(Object::Reference(*page_id));
    }

    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", catalog_id);

    if let Ok(info) = source.trailer.get(b"Info") {
        if let Ok(info_id) = info.as_reference() {
            if target.objects.contains_key(&info_id) {
                target.trailer.set("Info", info_id);
            }
        }
    }

    target.compress();

    let mut output = Vec::new();
    target
        .save_to(&mut output)
        .map_err(|e| PdfError::Write(e.to_string()))?;

    tracing::debug!(
        pages = pages.len(),
        input_bytes = bytes.len(),
        output_bytes = output.len(),
        "Repackaged PDF"
    );

    Ok(output)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    match dict.get(b"Type") {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

fn inherited(document: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = document.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::pdf_with_pages;

    #[test]
    fn test_preserves_page_count_and_order() {
        let pdf = pdf_with_pages(&[&["PAGE-ONE"], &["PAGE-TWO"], &["PAGE-THREE"]]);
        let output = repackage(&pdf).unwrap();

        assert_eq!(page_count(&output).unwrap(), 3);

        let document = Document::load_mem(&output).unwrap();
        let expected = ["PAGE-ONE", "PAGE-TWO", "PAGE-THREE"];
        for (number, label) in (1u32..).zip(expected) {
            let text = document.extract_text(&[number]).unwrap();
            assert!(text.contains(label), "page {} text was {:?}", number, text);
        }
    }

    #[test]
    fn test_inherited_attributes_are_copied_to_pages() {
        let pdf = pdf_with_pages(&[&["only page"]]);
        let output = repackage(&pdf).unwrap();

        let document = Document::load_mem(&output).unwrap();
        let page_id = *document.get_pages().values().next().unwrap();
        let page = document.get_dictionary(page_id).unwrap();

        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            repackage(b"%PDF-nope"),
            Err(PdfError::UnreadablePdf(_))
        ));
        assert!(page_count(b"").is_err());
    }

    #[test]
    fn test_repackaged_output_is_repackageable() {
        let pdf = pdf_with_pages(&[&["first"], &["second"]]);
        let once = repackage(&pdf).unwrap();
        let twice = repackage(&once).unwrap();
        assert_eq!(page_count(&twice).unwrap(), 2);
    }
}
