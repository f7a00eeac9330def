//! Prebuilt invoice data and the event plan produced for an instruction.

use std::fmt;

use formfill_protocol::FieldId;
use serde_json::{Value, json};

/// One of the demo invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentId {
    A,
    B,
    C,
}

impl DocumentId {
    /// Pick the document an instruction refers to.
    ///
    /// Looks for the letters in the upper-cased text. Without any, `A` is
    /// used. When several appear, `A` beats `C` and `C` beats `B`.
    pub fn pick(instruction: &str) -> Self {
        let text = instruction.to_uppercase();
        if text.contains('A') {
            Self::A
        } else if text.contains('C') {
            Self::C
        } else if text.contains('B') {
            Self::B
        } else {
            Self::A
        }
    }

    pub fn document(&self) -> &'static InvoiceDocument {
        match self {
            Self::A => &DOCUMENT_A,
            Self::B => &DOCUMENT_B,
            Self::C => &DOCUMENT_C,
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        f.write_str(letter)
    }
}

/// Extracted and normalized values of one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub vendor_name: &'static str,
    pub invoice_no: &'static str,
    pub invoice_date: &'static str,
    pub due_date: &'static str,
    pub subtotal: u64,
    pub tax: u64,
    pub total: u64,
}

static DOCUMENT_A: InvoiceDocument = InvoiceDocument {
    vendor_name: "ABC商事",
    invoice_no: "INV-A-001",
    invoice_date: "2025-12-01",
    due_date: "2026-01-10",
    subtotal: 120_000,
    tax: 12_000,
    total: 132_000,
};

static DOCUMENT_B: InvoiceDocument = InvoiceDocument {
    vendor_name: "さくら部品株式会社",
    invoice_no: "2025/11/30-7788",
    invoice_date: "2025-11-30",
    due_date: "2026-01-05",
    subtotal: 98_000,
    tax: 9_800,
    total: 107_800,
};

static DOCUMENT_C: InvoiceDocument = InvoiceDocument {
    vendor_name: "TOYO INDUSTRIES",
    invoice_no: "C-INV-00042",
    invoice_date: "2025-10-15",
    due_date: "2025-11-30",
    subtotal: 250_000,
    tax: 25_000,
    total: 275_000,
};

impl InvoiceDocument {
    /// Value sent for `field`. Amounts go out as JSON numbers.
    pub fn value(&self, field: FieldId) -> Value {
        match field {
            FieldId::VendorName => json!(self.vendor_name),
            FieldId::InvoiceNo => json!(self.invoice_no),
            FieldId::InvoiceDate => json!(self.invoice_date),
            FieldId::DueDate => json!(self.due_date),
            FieldId::Subtotal => json!(self.subtotal),
            FieldId::Tax => json!(self.tax),
            FieldId::Total => json!(self.total),
        }
    }
}

fn log(message: impl Into<String>) -> Value {
    json!({ "type": "log", "message": message.into() })
}

/// Every event streamed back for `instruction`, in order.
///
/// Progress logs first, then one fill per field in display order, then a
/// closing log.
pub fn plan_events(instruction: &str) -> Vec<Value> {
    let id = DocumentId::pick(instruction);
    let document = id.document();

    let fills: Vec<Value> = FieldId::ALL
        .into_iter()
        .map(|field| json!({ "type": "fill", "field": field.as_str(), "value": document.value(field) }))
        .collect();

    let mut events = vec![
        log(format!("Selected document: {id}")),
        log(format!("Reading invoice {id} (pre-extracted demo data)")),
        log("Extracting field candidates"),
        log("Normalizing invoice number, dates and amounts"),
        log("Mapping to target form fields"),
        log(format!("Fill plan ready ({} fields)", fills.len())),
        log("Starting input into the target system"),
    ];
    events.extend(fills);
    events.push(log("Input finished"));
    events
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_pick_document() {
        assert_eq!(DocumentId::pick("資料Aを入力して"), DocumentId::A);
        assert_eq!(DocumentId::pick("資料bを入力して"), DocumentId::B);
        assert_eq!(DocumentId::pick("資料Cを入力して"), DocumentId::C);
        assert_eq!(DocumentId::pick("請求書を入力して"), DocumentId::A);
    }

    #[test]
    fn test_pick_document_precedence() {
        assert_eq!(DocumentId::pick("B, C"), DocumentId::C);
        assert_eq!(DocumentId::pick("B or A"), DocumentId::A);
        assert_eq!(DocumentId::pick("C, then A"), DocumentId::A);
    }

    #[test]
    fn test_plan_events_shape() {
        let events = plan_events("資料Bを入力して");

        let fills: Vec<(&str, &Value)> = events
            .iter()
            .filter(|e| e["type"] == "fill")
            .map(|e| (e["field"].as_str().unwrap(), &e["value"]))
            .collect();
        let order: Vec<&str> = fills.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            order,
            FieldId::ALL.iter().map(FieldId::as_str).collect::<Vec<_>>()
        );
        assert_eq!(fills[0].1, &json!("さくら部品株式会社"));
        assert_eq!(fills[6].1, &json!(107_800));

        assert_eq!(events.first().unwrap()["message"], "Selected document: B");
        assert_eq!(events.last().unwrap()["message"], "Input finished");
        assert!(events.iter().any(|e| e["message"] == "Fill plan ready (7 fields)"));
    }
}
