//! Instruction template sent with every extraction request

use crate::pdf::truncate_chars;

/// Upper bound on the PDF text embedded in a prompt
pub const MAX_PROMPT_TEXT_CHARS: usize = 100_000;

const EXTRACTION_INSTRUCTIONS: &str = r#"
You extract structured data from the text of invoice PDFs. Read the document below and return a single JSON object with exactly this shape:

{
  "vendor": {
    "name": "company that issued the invoice",
    "address": "vendor address (optional)",
    "taxId": "tax ID or VAT number (optional)"
  },
  "invoice": {
    "number": "invoice number",
    "date": "invoice date in YYYY-MM-DD format",
    "currency": "ISO currency code (optional)",
    "subtotal": 0.00,
    "taxPercent": 0.00,
    "total": 0.00,
    "poNumber": "purchase order number (optional)",
    "poDate": "purchase order date in YYYY-MM-DD format (optional)",
    "lineItems": [
      {
        "description": "item description",
        "unitPrice": 0.00,
        "quantity": 1,
        "total": 0.00
      }
    ]
  }
}

Rules:
- Numeric values must be JSON numbers, not strings. Quantities are whole numbers.
- Dates use the YYYY-MM-DD format.
- Only include information that is clearly present in the document; omit optional fields you cannot find.

Output requirements:
- Return ONLY valid JSON (no prose, no markdown, no code fences).
- Do not wrap the JSON in triple backticks.
"#;

/// Build the full prompt for a piece of extracted PDF text
pub fn build_prompt(text: &str) -> String {
    let (excerpt, _) = truncate_chars(text.to_string(), MAX_PROMPT_TEXT_CHARS);
    format!(
        "{}\n\nPDF Content (first {} chars):\n{}",
        EXTRACTION_INSTRUCTIONS.trim(),
        excerpt.chars().count(),
        excerpt
    )
}
