//! Snapshot Codec
//!
//! Byte-level compression applied after JSON serialization. Serialization and
//! compression are separate steps, so a snapshot is always valid JSON once
//! decompressed.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// First two bytes of every gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// == Snapshot Codec ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotCodec {
    /// Plain JSON
    #[default]
    Plain,
    /// Gzip-compressed JSON
    Gzip,
}

impl SnapshotCodec {
    /// File name of the snapshot written with this codec.
    pub fn file_name(self) -> &'static str {
        match self {
            SnapshotCodec::Plain => "cache.json",
            SnapshotCodec::Gzip => "cache.json.gz",
        }
    }

    /// Encodes serialized JSON for storage.
    pub fn encode(self, json: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            SnapshotCodec::Plain => Ok(json.to_vec()),
            SnapshotCodec::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(json)?;
                encoder.finish()
            }
        }
    }

    /// Decodes stored bytes back to JSON.
    ///
    /// The format is sniffed from the gzip magic bytes, so snapshots written
    /// with either codec can be read whatever the current setting.
    pub fn decode(bytes: &[u8]) -> io::Result<Vec<u8>> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut decoder = GzDecoder::new(bytes);
            let mut json = Vec::new();
            decoder.read_to_end(&mut json)?;
            Ok(json)
        } else {
            Ok(bytes.to_vec())
        }
    }
}

impl FromStr for SnapshotCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" | "json" => Ok(SnapshotCodec::Plain),
            "gzip" | "gz" => Ok(SnapshotCodec::Gzip),
            other => Err(format!("unknown snapshot compression '{}'", other)),
        }
    }
}

impl fmt::Display for SnapshotCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotCodec::Plain => write!(f, "none"),
            SnapshotCodec::Gzip => write!(f, "gzip"),
        }
    }
}
