//! Binary encoding of a [`ProvenanceRecord`] for a single extended attribute.
//!
//! # Layout
//!
//! ```text
//! +-------+---------+-----------------------------------------------+
//! | "XDS" | version | 4 x ( u16 BE length | UTF-8 bytes )            |
//! +-------+---------+-----------------------------------------------+
//! ```
//!
//! Fields appear in a fixed order: bundle identifier, application name,
//! document path, manifest URL. Nothing may follow the last field.
//!
//! Encoding is deterministic. Decoding is all-or-nothing: a payload that is
//! not exactly what [`AttributeCodec::encode`] would produce for some record
//! yields [`CorruptPayload`] and never a partially filled record.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{AttributeError, CorruptPayload, RecordError};
use crate::logging::targets;
use crate::record::ProvenanceRecord;

/// Format tag at the start of every payload.
pub const MAGIC: &[u8; 3] = b"XDS";

/// Current payload version.
pub const VERSION: u8 = 1;

/// Size of the fixed header (tag + version).
pub const HEADER_LEN: usize = MAGIC.len() + 1;

/// Default payload ceiling when the attribute backend does not report one.
pub const DEFAULT_MAX_PAYLOAD: usize = 4096;

/// Longest field a `u16` length prefix can describe.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

const FIELD_NAMES: [&'static str; 4] = [
    "bundle_identifier",
    "application_name",
    "document_path",
    "manifest_url",
];

/// Encodes and decodes `x-document-source` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeCodec {
    max_payload: usize,
}

impl Default for AttributeCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD)
    }
}

impl AttributeCodec {
    /// Create a codec that refuses payloads larger than `max_payload` bytes.
    pub fn new(max_payload: usize) -> Self {
        Self { max_payload }
    }

    /// The payload ceiling in bytes.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Serialize a record.
    ///
    /// Fails with [`AttributeError::FieldTooLong`] if a single field exceeds
    /// what its `u16` length prefix can describe, and with
    /// [`AttributeError::PayloadTooLarge`] if the payload would exceed the
    /// ceiling.
    pub fn encode(&self, record: &ProvenanceRecord) -> Result<Bytes, AttributeError> {
        let fields = [
            record.bundle_identifier(),
            record.application_name(),
            record.document_path(),
            record.manifest_url(),
        ];

        if let Some((field, value)) = FIELD_NAMES
            .into_iter()
            .zip(fields)
            .find(|(_, value)| value.len() > MAX_FIELD_LEN)
        {
            return Err(AttributeError::FieldTooLong {
                field,
                len: value.len(),
                limit: MAX_FIELD_LEN,
            });
        }

        let size = HEADER_LEN + fields.iter().map(|f| 2 + f.len()).sum::<usize>();
        if size > self.max_payload {
            return Err(AttributeError::PayloadTooLarge {
                size,
                limit: self.max_payload,
            });
        }

        let mut buf = BytesMut::with_capacity(size);
        buf.put_slice(MAGIC);
        buf.put_u8(VERSION);
        for field in fields {
            buf.put_u16(field.len() as u16);
            buf.put_slice(field.as_bytes());
        }

        tracing::trace!(target: targets::ATTRIBUTE, size, "encoded provenance payload");
        Ok(buf.freeze())
    }

    /// Parse a payload produced by [`AttributeCodec::encode`].
    pub fn decode(payload: &[u8]) -> Result<ProvenanceRecord, CorruptPayload> {
        if payload.len() < HEADER_LEN {
            return Err(CorruptPayload::TruncatedHeader { len: payload.len() });
        }
        let (header, mut body) = payload.split_at(HEADER_LEN);
        if &header[..MAGIC.len()] != MAGIC {
            return Err(CorruptPayload::BadMagic);
        }
        let version = header[MAGIC.len()];
        if version != VERSION {
            return Err(CorruptPayload::UnsupportedVersion(version));
        }

        let mut values: [&str; 4] = [""; 4];
        for (slot, field) in values.iter_mut().zip(FIELD_NAMES) {
            *slot = read_field(&mut body, field)?;
        }
        if body.has_remaining() {
            return Err(CorruptPayload::TrailingBytes(body.remaining()));
        }

        let [bundle_identifier, application_name, document_path, manifest_url] = values;
        ProvenanceRecord::new(bundle_identifier, application_name, document_path, manifest_url)
            .map_err(|reason| CorruptPayload::InvalidField {
                field: field_for(&reason),
                reason,
            })
    }
}

fn read_field<'a>(body: &mut &'a [u8], field: &'static str) -> Result<&'a str, CorruptPayload> {
    if body.remaining() < 2 {
        return Err(CorruptPayload::TruncatedField { field });
    }
    let len = body.get_u16() as usize;
    if body.remaining() < len {
        return Err(CorruptPayload::TruncatedField { field });
    }
    let remaining: &'a [u8] = *body;
    let (raw, rest) = remaining.split_at(len);
    *body = rest;
    std::str::from_utf8(raw).map_err(|_| CorruptPayload::InvalidUtf8 { field })
}

fn field_for(reason: &RecordError) -> &'static str {
    match reason {
        RecordError::MissingField("bundle identifier") => FIELD_NAMES[0],
        RecordError::MissingField("application name") => FIELD_NAMES[1],
        RecordError::MissingField("document path") => FIELD_NAMES[2],
        RecordError::MissingField(_) | RecordError::InvalidUrl(_) => FIELD_NAMES[3],
    }
}
