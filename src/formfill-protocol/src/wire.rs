//! Record framing.
//!
//! A record is one line: `data: <json>`. The push transport hands over the
//! payload of each message directly; the bulk transport receives many records
//! in one body, separated by newlines (blank lines between records are
//! allowed). Both paths end in [`decode`], so events look the same no matter
//! how they travelled.

use serde::Serialize;

use crate::event::{DecodeError, Event};

/// Prefix every record starts with.
pub const DATA_PREFIX: &str = "data:";

/// Split a bulk body into record payloads, in order.
///
/// Lines without the record prefix (blank separators, comments, `event:`
/// lines) are skipped. Payloads that are empty after trimming are skipped.
pub fn split_records(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .filter_map(|line| line.trim_end_matches('\r').strip_prefix(DATA_PREFIX))
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
}

/// Split the data of one event-stream message into record payloads.
///
/// Consecutive `data:` lines without a blank line between them arrive as a
/// single message whose data joins the lines with `\n`. Each line is still
/// its own record, exactly as [`split_records`] sees it in a bulk body.
pub fn split_message_data(data: &str) -> impl Iterator<Item = &str> {
    data.lines()
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
}

/// Decode one record payload into an [`Event`].
pub fn decode(payload: &str) -> Result<Event, DecodeError> {
    Event::from_json(payload.trim())
}

/// Encode a payload as one framed record, terminated by a blank line.
pub fn encode_record<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{DATA_PREFIX} {}\n\n", serde_json::to_string(payload)?))
}
