//! Binary model format
//!
//! All integers are little-endian. Records are fixed size so a decoder can
//! bound its allocation from the header before reading any node.
//!
//! # Header (20 bytes)
//!
//! ```text
//! ┌────────┬─────────┬───────┬──────────────┬─────────────┬────────────┬────────────┐
//! │ Magic  │ Version │ Flags │ num_features │ num_classes │ node_count │ root_index │
//! │ 4 bytes│ u16     │ u16   │ u16          │ u16         │ u32        │ u32        │
//! └────────┴─────────┴───────┴──────────────┴─────────────┴────────────┴────────────┘
//! ```
//!
//! # Node record (16 bytes)
//!
//! ```text
//! ┌──────┬──────────┬────────┬────────────┬───────┬───────┐
//! │ Kind │ Reserved │ Index  │ Threshold  │ Left  │ Right │
//! │ u8   │ u8 (0)   │ u16    │ f32 bits   │ u32   │ u32   │
//! └──────┴──────────┴────────┴────────────┴───────┴───────┘
//! ```
//!
//! `Index` is the feature index for a split and the class index for a leaf.
//! A leaf writes zero threshold, left and right.
//!
//! # Trailer
//!
//! Optional names (`u16` byte length + UTF-8 per entry): class names when flag
//! bit 0 is set, then feature names when flag bit 1 is set. The artifact ends
//! with a 32-byte BLAKE3 digest of every preceding byte.

use super::{CodecConfig, FORMAT_VERSION};
use crate::descriptor::ModelDescriptor;
use crate::errors::{Result, TreeError};
use crate::model::Model;
use crate::tree::{Node, NodeKind};
use crate::validation::ValidationLimits;
use tracing::{debug, warn};

/// Magic marker: "ATRM"
pub const MAGIC: [u8; 4] = *b"ATRM";

pub const HEADER_SIZE: usize = 20;
pub const RECORD_SIZE: usize = 16;
pub const DIGEST_SIZE: usize = 32;

/// Flag bit: class names follow the node records
pub const FLAG_CLASS_NAMES: u16 = 0x0001;
/// Flag bit: feature names follow the node records (after class names)
pub const FLAG_FEATURE_NAMES: u16 = 0x0002;
const KNOWN_FLAGS: u16 = FLAG_CLASS_NAMES | FLAG_FEATURE_NAMES;

/// Decoded header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u16,
    pub num_features: u16,
    pub num_classes: u16,
    pub node_count: u32,
    pub root_index: u32,
}

/// Encode a validated model.
///
/// Cannot fail: validation guarantees every count and index fits its field.
pub fn encode(model: &Model, config: &CodecConfig) -> Vec<u8> {
    let descriptor = model.descriptor();
    let table = model.table();

    let class_names = descriptor
        .class_names
        .as_ref()
        .filter(|_| config.include_names);
    let feature_names = descriptor
        .feature_names
        .as_ref()
        .filter(|_| config.include_names);

    let mut flags = 0u16;
    if class_names.is_some() {
        flags |= FLAG_CLASS_NAMES;
    }
    if feature_names.is_some() {
        flags |= FLAG_FEATURE_NAMES;
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + table.len() * RECORD_SIZE + DIGEST_SIZE);

    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());
    buf.extend_from_slice(&(descriptor.num_features as u16).to_le_bytes());
    buf.extend_from_slice(&(descriptor.num_classes as u16).to_le_bytes());
    buf.extend_from_slice(&(table.len() as u32).to_le_bytes());
    buf.extend_from_slice(&table.root_index().to_le_bytes());

    for node in table.nodes() {
        let (index, threshold, left, right) = match *node {
            Node::Split {
                feature_index,
                threshold,
                left,
                right,
            } => (feature_index, threshold.to_bits(), left, right),
            Node::Leaf { class_index } => (class_index, 0, 0, 0),
        };
        buf.push(node.kind() as u8);
        buf.push(0);
        buf.extend_from_slice(&index.to_le_bytes());
        buf.extend_from_slice(&threshold.to_le_bytes());
        buf.extend_from_slice(&left.to_le_bytes());
        buf.extend_from_slice(&right.to_le_bytes());
    }

    for names in [class_names, feature_names].into_iter().flatten() {
        for name in names {
            buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
            buf.extend_from_slice(name.as_bytes());
        }
    }

    let digest = blake3::hash(&buf);
    buf.extend_from_slice(digest.as_bytes());
    buf
}

/// Decode and fully validate a binary model.
///
/// Produces a new model or fails with `CorruptModel`; nothing partially
/// decoded escapes.
pub fn decode(bytes: &[u8], limits: &ValidationLimits) -> Result<Model> {
    match decode_model(bytes, limits) {
        Ok(model) => {
            debug!(
                bytes = bytes.len(),
                nodes = model.table().len(),
                depth = model.table().depth(),
                "Decoded binary model"
            );
            Ok(model)
        }
        Err(reason) => {
            warn!(bytes = bytes.len(), %reason, "Rejected binary model");
            Err(TreeError::CorruptModel(reason))
        }
    }
}

/// Read the header after checking magic, version, length and digest
pub fn read_header(bytes: &[u8]) -> Result<Header> {
    verified_body(bytes)
        .and_then(|body| parse_header(&mut Reader::new(body)))
        .map_err(TreeError::CorruptModel)
}

fn decode_model(bytes: &[u8], limits: &ValidationLimits) -> std::result::Result<Model, String> {
    let body = verified_body(bytes)?;
    let mut reader = Reader::new(body);
    let header = parse_header(&mut reader)?;

    let node_count = header.node_count as usize;
    if node_count > limits.max_nodes {
        return Err(format!(
            "node_count {node_count} exceeds limit {}",
            limits.max_nodes
        ));
    }
    let available = reader.remaining();
    node_count
        .checked_mul(RECORD_SIZE)
        .filter(|records_len| *records_len <= available)
        .ok_or_else(|| {
            format!("truncated: {node_count} records of {RECORD_SIZE} bytes, {available} available")
        })?;

    let mut nodes = Vec::with_capacity(node_count);
    for i in 0..node_count {
        nodes.push(read_record(&mut reader, i)?);
    }

    let class_names = if header.flags & FLAG_CLASS_NAMES != 0 {
        Some(read_names(&mut reader, header.num_classes as usize, "class name")?)
    } else {
        None
    };
    let feature_names = if header.flags & FLAG_FEATURE_NAMES != 0 {
        Some(read_names(&mut reader, header.num_features as usize, "feature name")?)
    } else {
        None
    };

    if reader.remaining() != 0 {
        return Err(format!("{} trailing bytes after payload", reader.remaining()));
    }

    let descriptor = ModelDescriptor {
        num_features: header.num_features as usize,
        num_classes: header.num_classes as usize,
        class_names,
        feature_names,
    };

    Model::assemble(descriptor, nodes, header.root_index, limits).map_err(|v| v.to_string())
}

/// Check framing and digest, returning everything before the digest
fn verified_body(bytes: &[u8]) -> std::result::Result<&[u8], String> {
    if bytes.len() < HEADER_SIZE + DIGEST_SIZE {
        return Err(format!("truncated: {} bytes", bytes.len()));
    }
    if bytes[0..4] != MAGIC {
        return Err(format!("bad magic {:02x?}", &bytes[0..4]));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        ));
    }

    let (body, digest) = bytes.split_at(bytes.len() - DIGEST_SIZE);
    if blake3::hash(body).as_bytes() != digest {
        return Err("digest mismatch".to_string());
    }
    Ok(body)
}

fn parse_header(reader: &mut Reader<'_>) -> std::result::Result<Header, String> {
    reader.take(MAGIC.len(), "magic")?;
    let version = reader.u16("version")?;
    let flags = reader.u16("flags")?;
    if flags & !KNOWN_FLAGS != 0 {
        return Err(format!("unknown flags {flags:#06x}"));
    }

    Ok(Header {
        version,
        flags,
        num_features: reader.u16("num_features")?,
        num_classes: reader.u16("num_classes")?,
        node_count: reader.u32("node_count")?,
        root_index: reader.u32("root_index")?,
    })
}

fn read_record(reader: &mut Reader<'_>, i: usize) -> std::result::Result<Node, String> {
    let kind = reader.u8("kind")?;
    let reserved = reader.u8("reserved")?;
    let index = reader.u16("index")?;
    let threshold = reader.u32("threshold")?;
    let left = reader.u32("left")?;
    let right = reader.u32("right")?;

    if reserved != 0 {
        return Err(format!("record {i} has non-zero reserved byte"));
    }

    match NodeKind::from_u8(kind) {
        Some(NodeKind::Split) => Ok(Node::Split {
            feature_index: index,
            threshold: f32::from_bits(threshold),
            left,
            right,
        }),
        Some(NodeKind::Leaf) => {
            if threshold != 0 || left != 0 || right != 0 {
                return Err(format!("leaf record {i} has non-zero split fields"));
            }
            Ok(Node::Leaf { class_index: index })
        }
        None => Err(format!("record {i} has unknown kind tag {kind}")),
    }
}

fn read_names(
    reader: &mut Reader<'_>,
    count: usize,
    what: &str,
) -> std::result::Result<Vec<String>, String> {
    let mut names = Vec::with_capacity(count.min(reader.remaining() / 2));
    for i in 0..count {
        let len = reader.u16(what)? as usize;
        let raw = reader.take(len, what)?;
        let name = std::str::from_utf8(raw).map_err(|_| format!("{what} {i} is not UTF-8"))?;
        names.push(name.to_owned());
    }
    Ok(names)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> std::result::Result<&'a [u8], String> {
        if self.remaining() < n {
            return Err(format!("truncated while reading {what} at offset {}", self.pos));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> std::result::Result<u8, String> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> std::result::Result<u16, String> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> std::result::Result<u32, String> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
