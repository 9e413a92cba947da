//! Invoice data model
//!
//! Field names are camelCase on the wire to match the dashboard client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Vendor that issued the invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

/// Single invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub unit_price: f64,
    #[serde(deserialize_with = "whole_number")]
    pub quantity: u32,
    pub total: f64,
}

impl LineItem {
    /// Whether `total` matches `unit_price * quantity` to the cent
    pub fn is_consistent(&self) -> bool {
        (self.unit_price * self.quantity as f64 - self.total).abs() < 0.01
    }
}

/// Invoice header and lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub number: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub line_items: Vec<LineItem>,
}

/// Structured fields pulled out of a PDF, before a human confirms them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInvoice {
    pub vendor: Vendor,
    pub invoice: InvoiceData,
}

/// Persisted invoice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub file_id: String,
    pub file_name: String,
    pub vendor: Vendor,
    pub invoice: InvoiceData,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create invoice request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub file_id: String,
    pub file_name: String,
    pub vendor: Vendor,
    pub invoice: InvoiceData,
}

/// Update invoice request
///
/// Every field that is present replaces the stored value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub vendor: Option<Vendor>,
    #[serde(default)]
    pub invoice: Option<InvoiceData>,
}

impl InvoiceUpdate {
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none() && self.vendor.is_none() && self.invoice.is_none()
    }
}

/// Accept `2` and `2.0` as a quantity, reject `2.5` and negatives
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(D::Error::custom(format!(
            "quantity must be a whole number, got {}",
            value
        )));
    }
    Ok(value as u32)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LineItem>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_wire_format() {
        let vendor = Vendor {
            name: "Acme".to_string(),
            address: None,
            tax_id: Some("DE123".to_string()),
        };
        let value = serde_json::to_value(&vendor).unwrap();
        assert_eq!(value, json!({ "name": "Acme", "taxId": "DE123" }));
    }

    #[test]
    fn test_quantity_accepts_whole_floats() {
        let item: LineItem = serde_json::from_value(json!({
            "description": "Hosting",
            "unitPrice": 10.0,
            "quantity": 3.0,
            "total": 30.0
        }))
        .unwrap();
        assert_eq!(item.quantity, 3);
        assert!(item.is_consistent());

        let fractional = serde_json::from_value::<LineItem>(json!({
            "description": "Hosting",
            "unitPrice": 10.0,
            "quantity": 2.5,
            "total": 25.0
        }));
        assert!(fractional.is_err());
    }

    #[test]
    fn test_missing_line_items_default_to_empty() {
        let data: InvoiceData = serde_json::from_value(json!({
            "number": "INV-1",
            "date": "2024-03-15",
            "lineItems": null
        }))
        .unwrap();
        assert!(data.line_items.is_empty());

        let data: InvoiceData =
            serde_json::from_value(json!({ "number": "INV-1", "date": "2024-03-15" })).unwrap();
        assert!(data.line_items.is_empty());
    }
}
