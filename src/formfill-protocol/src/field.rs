//! The closed set of form fields the client knows how to display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A field of the mocked target form.
///
/// The set is closed: a `fill` event naming anything else is rejected by the
/// router before it can touch session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    VendorName,
    InvoiceNo,
    InvoiceDate,
    DueDate,
    Subtotal,
    Tax,
    Total,
}

impl FieldId {
    /// All fields, in display order.
    pub const ALL: [FieldId; 7] = [
        FieldId::VendorName,
        FieldId::InvoiceNo,
        FieldId::InvoiceDate,
        FieldId::DueDate,
        FieldId::Subtotal,
        FieldId::Tax,
        FieldId::Total,
    ];

    /// Stable identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VendorName => "vendor_name",
            Self::InvoiceNo => "invoice_no",
            Self::InvoiceDate => "invoice_date",
            Self::DueDate => "due_date",
            Self::Subtotal => "subtotal",
            Self::Tax => "tax",
            Self::Total => "total",
        }
    }

    /// Human readable label for the form row.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VendorName => "Vendor",
            Self::InvoiceNo => "Invoice No.",
            Self::InvoiceDate => "Invoice date",
            Self::DueDate => "Due date",
            Self::Subtotal => "Subtotal",
            Self::Tax => "Tax",
            Self::Total => "Total",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a wire id does not name a known field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_ids_round_trip_through_from_str() {
        for field in FieldId::ALL {
            assert_eq!(field.as_str().parse::<FieldId>(), Ok(field));
        }
    }

    #[test]
    fn test_unknown_wire_id_is_rejected() {
        assert_eq!(
            "bogus".parse::<FieldId>(),
            Err(UnknownField("bogus".to_string()))
        );
        // ids are case sensitive
        assert!("Vendor_Name".parse::<FieldId>().is_err());
    }

    #[test]
    fn test_serde_matches_wire_id() {
        let json = serde_json::to_string(&FieldId::InvoiceDate).unwrap();
        assert_eq!(json, "\"invoice_date\"");
    }
}
