//! Formfill Protocol - Wire types shared by the event source and the client.
//!
//! The event source speaks a tiny event-stream dialect: every record is a
//! line starting with `data: ` followed by one JSON object carrying a `type`
//! discriminant. This crate owns:
//! - The closed set of form fields ([`FieldId`])
//! - The decoded event model ([`Event`])
//! - Record framing and payload decoding ([`wire`])

pub mod event;
pub mod field;
pub mod wire;

pub use event::{DecodeError, Event};
pub use field::{FieldId, UnknownField};
pub use wire::{DATA_PREFIX, decode, encode_record, split_message_data, split_records};
