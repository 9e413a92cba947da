//! Schema checks shared by model output and API requests

use serde_json::Value;

use super::types::{ExtractedInvoice, InvoiceData, InvoiceUpdate, LineItem, NewInvoice, Vendor};

/// A single field that does not satisfy the invoice schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct SchemaViolation {
    pub field: String,
    pub reason: String,
}

impl SchemaViolation {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

type Check = Result<(), SchemaViolation>;

fn required(field: &str, value: &str) -> Check {
    if value.trim().is_empty() {
        return Err(SchemaViolation::new(field, "is required"));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Check {
    if !value.is_finite() || value < 0.0 {
        return Err(SchemaViolation::new(field, format!("must be a non-negative number, got {}", value)));
    }
    Ok(())
}

pub fn validate_vendor(vendor: &Vendor) -> Check {
    required("vendor.name", &vendor.name)
}

pub fn validate_line_item(index: usize, item: &LineItem) -> Check {
    let field = |name: &str| format!("invoice.lineItems[{}].{}", index, name);

    non_negative(&field("unitPrice"), item.unit_price)?;
    non_negative(&field("total"), item.total)?;
    if item.quantity == 0 {
        return Err(SchemaViolation::new(field("quantity"), "must be a positive integer"));
    }
    Ok(())
}

pub fn validate_invoice_data(invoice: &InvoiceData) -> Check {
    required("invoice.number", &invoice.number)?;
    required("invoice.date", &invoice.date)?;

    for (field, value) in [
        ("invoice.subtotal", invoice.subtotal),
        ("invoice.taxPercent", invoice.tax_percent),
        ("invoice.total", invoice.total),
    ] {
        if let Some(value) = value {
            non_negative(field, value)?;
        }
    }

    for (index, item) in invoice.line_items.iter().enumerate() {
        validate_line_item(index, item)?;
        if !item.is_consistent() {
            tracing::warn!(
                invoice_number = %invoice.number,
                line = index,
                unit_price = item.unit_price,
                quantity = item.quantity,
                total = item.total,
                "Line item total does not equal unit price times quantity"
            );
        }
    }

    Ok(())
}

pub fn validate_extracted(extracted: &ExtractedInvoice) -> Check {
    validate_vendor(&extracted.vendor)?;
    validate_invoice_data(&extracted.invoice)
}

pub fn validate_new_invoice(new: &NewInvoice) -> Check {
    required("fileId", &new.file_id)?;
    required("fileName", &new.file_name)?;
    validate_vendor(&new.vendor)?;
    validate_invoice_data(&new.invoice)
}

pub fn validate_update(update: &InvoiceUpdate) -> Check {
    if update.is_empty() {
        return Err(SchemaViolation::new("body", "at least one of fileName, vendor, invoice is required"));
    }
    if let Some(file_name) = &update.file_name {
        required("fileName", file_name)?;
    }
    if let Some(vendor) = &update.vendor {
        validate_vendor(vendor)?;
    }
    if let Some(invoice) = &update.invoice {
        validate_invoice_data(invoice)?;
    }
    Ok(())
}

/// Turn an untrusted JSON value into a checked [`ExtractedInvoice`]
pub fn extracted_from_value(value: Value) -> Result<ExtractedInvoice, SchemaViolation> {
    if !value.is_object() {
        return Err(SchemaViolation::new("$", "expected a JSON object"));
    }
    for section in ["vendor", "invoice"] {
        if !value.get(section).map_or(false, Value::is_object) {
            return Err(SchemaViolation::new(section, "missing or not an object"));
        }
    }

    let extracted: ExtractedInvoice =
        serde_json::from_value(value).map_err(|e| SchemaViolation::new("$", e.to_string()))?;
    validate_extracted(&extracted)?;
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "vendor": { "name": "Sample Company Inc", "taxId": "TEST123456789" },
            "invoice": {
                "number": "INV-2024-001",
                "date": "2024-03-15",
                "currency": "USD",
                "subtotal": 1000.0,
                "taxPercent": 10.0,
                "total": 1100.0,
                "lineItems": [
                    { "description": "Sample Service", "unitPrice": 1000.0, "quantity": 1, "total": 1000.0 }
                ]
            }
        })
    }

    #[test]
    fn test_valid_extraction() {
        let extracted = extracted_from_value(sample()).unwrap();
        assert_eq!(extracted.vendor.name, "Sample Company Inc");
        assert_eq!(extracted.invoice.line_items.len(), 1);
    }

    #[test]
    fn test_missing_vendor_name() {
        let mut value = sample();
        value["vendor"]["name"] = json!("  ");
        let err = extracted_from_value(value).unwrap_err();
        assert_eq!(err.field, "vendor.name");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut value = sample();
        value["invoice"]["total"] = json!("1100.00");
        assert!(extracted_from_value(value).is_err());
    }

    #[test]
    fn test_negative_and_zero_values() {
        let mut value = sample();
        value["invoice"]["lineItems"][0]["unitPrice"] = json!(-5.0);
        let err = extracted_from_value(value).unwrap_err();
        assert_eq!(err.field, "invoice.lineItems[0].unitPrice");

        let mut value = sample();
        value["invoice"]["lineItems"][0]["quantity"] = json!(0);
        let err = extracted_from_value(value).unwrap_err();
        assert_eq!(err.field, "invoice.lineItems[0].quantity");
    }

    #[test]
    fn test_missing_section() {
        let err = extracted_from_value(json!({ "vendor": { "name": "Acme" } })).unwrap_err();
        assert_eq!(err.field, "invoice");

        let err = extracted_from_value(json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.field, "$");
    }

    #[test]
    fn test_inconsistent_total_is_accepted() {
        let mut value = sample();
        value["invoice"]["lineItems"][0]["total"] = json!(999.0);
        assert!(extracted_from_value(value).is_ok());
    }

    #[test]
    fn test_empty_update_rejected() {
        let err = validate_update(&InvoiceUpdate::default()).unwrap_err();
        assert_eq!(err.field, "body");

        let update = InvoiceUpdate {
            file_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(validate_update(&update).unwrap_err().field, "fileName");
    }
}
