use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::StoreError;
use sha1::{Digest, Sha1};
use std::io::Write;

/// Writer that hashes everything passing through it and can append the digest
#[derive(Debug)]
pub struct Checksum<W: Write> {
    inner: W,
    digest: Sha1,
}

impl<W: Write> Checksum<W> {
    pub fn new(inner: W) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }

    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.inner.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the SHA-1 trailer and hand back the underlying writer
    pub fn write_checksum(mut self) -> anyhow::Result<W> {
        let checksum = self.digest.finalize();
        self.inner.write_all(checksum.as_slice())?;

        Ok(self.inner)
    }
}

/// Compare the trailing 20 bytes of `contents` to the SHA-1 of everything before them
pub fn verify(contents: &[u8]) -> anyhow::Result<()> {
    let split = contents
        .len()
        .checked_sub(CHECKSUM_SIZE)
        .ok_or_else(|| StoreError::malformed("index is too short to carry a checksum"))?;
    let (body, expected) = contents.split_at(split);

    if Sha1::digest(body).as_slice() != expected {
        return Err(StoreError::malformed(
            "index checksum does not match value stored on disk",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_trailer_verifies() {
        let mut writer = Checksum::new(Vec::new());
        writer.write(b"DIRC").unwrap();
        let bytes = writer.write_checksum().unwrap();

        assert_eq!(bytes.len(), 4 + CHECKSUM_SIZE);
        assert!(verify(&bytes).is_ok());
    }

    #[test]
    fn flipped_byte_fails_verification() {
        let mut writer = Checksum::new(Vec::new());
        writer.write(b"DIRC").unwrap();
        let mut bytes = writer.write_checksum().unwrap();
        bytes[0] = b'X';

        assert!(verify(&bytes).is_err());
    }
}
