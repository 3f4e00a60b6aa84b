//! Key-value list with message (KVLM)
//!
//! The header block shared by commit and tag objects:
//!
//! ```text
//! tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147
//! parent 206941306e8a8af65b66eaaaea388a7ae24d49a0
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  <continuation lines start with a single space>
//!
//! <message>
//! ```
//!
//! Keys may repeat (several `parent` lines); their values are kept in order under the
//! key, and keys keep the order in which they were first seen. Encoding is the exact
//! inverse of decoding.

use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::StoreError;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::BufRead;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    /// Keys in first-seen order
    keys: Vec<String>,
    values: HashMap<String, Vec<String>>,
    message: Bytes,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`, registering the key if it is new
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.values.get_mut(&key) {
            Some(values) => values.push(value.into()),
            None => {
                self.keys.push(key.clone());
                self.values.insert(key, vec![value.into()]);
            }
        }
    }

    /// Replace every value under `key`, keeping the key's original position
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, values);
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Headers in stored order, one item per key
    pub fn headers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.keys
            .iter()
            .filter_map(|key| self.values.get(key).map(|v| (key.as_str(), v.as_slice())))
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<Bytes>) {
        self.message = message.into();
    }

    /// Decode a KVLM block from a byte slice
    pub fn parse(raw: &[u8]) -> anyhow::Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut start = 0;

        loop {
            let newline = find(raw, start, b'\n').ok_or_else(|| {
                StoreError::malformed("kvlm block ended before the blank separator line")
            })?;
            let space = find(raw, start, b' ');

            // a line without a key/value separator can only be the blank separator line
            let space = match space {
                Some(space) if space < newline => space,
                _ => {
                    if newline != start {
                        return Err(StoreError::malformed(format!(
                            "kvlm header line without a value at byte {start}"
                        )));
                    }
                    kvlm.message = Bytes::copy_from_slice(&raw[start + 1..]);
                    return Ok(kvlm);
                }
            };

            if space == start {
                return Err(StoreError::malformed(format!(
                    "kvlm header line with an empty key at byte {start}"
                )));
            }

            // the value runs until a newline that is not followed by a continuation space
            let mut end = newline;
            while raw.get(end + 1) == Some(&b' ') {
                end = find(raw, end + 1, b'\n').ok_or_else(|| {
                    StoreError::malformed("kvlm continuation line is not terminated")
                })?;
            }

            let key = std::str::from_utf8(&raw[start..space])
                .map_err(|_| StoreError::malformed("kvlm key is not valid UTF-8"))?;
            let value = std::str::from_utf8(&raw[space + 1..end])
                .map_err(|_| StoreError::malformed(format!("kvlm value of {key} is not valid UTF-8")))?
                .replace("\n ", "\n");

            kvlm.push(key, value);
            start = end + 1;
        }
    }
}

fn find(raw: &[u8], from: usize, needle: u8) -> Option<usize> {
    raw.get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|offset| from + offset)
}

impl Packable for Kvlm {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::new();

        for (key, values) in self.headers() {
            for value in values {
                bytes.extend_from_slice(key.as_bytes());
                bytes.push(b' ');
                bytes.extend_from_slice(value.replace('\n', "\n ").as_bytes());
                bytes.push(b'\n');
            }
        }

        bytes.push(b'\n');
        bytes.extend_from_slice(&self.message);

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for Kvlm {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;

        Self::parse(&raw)
    }
}
