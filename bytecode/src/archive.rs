use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Stream-level failures while loading. Saving never fails: the archive
/// writes into a growable buffer.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unexpected end of stream at byte {0}")]
    UnexpectedEnd(usize),

    #[error("string at byte {0} is not valid utf-8")]
    InvalidUtf8(usize),

    #[error("malformed record text: {0}")]
    MalformedRecord(String),
}

enum Mode<'a> {
    Save(&'a mut Vec<u8>),
    Load { bytes: &'a [u8], pos: usize },
}

/// A two-way persistent stream: the same `serialize` code path either
/// writes values out or reads them back, selected by the archive's mode.
///
/// All primitives are little-endian. The schema version travels with the
/// archive so nested serialize calls can branch on it.
pub struct Archive<'a> {
    mode: Mode<'a>,
    version: u32,
}

impl<'a> Archive<'a> {
    /// A saving archive targeting the given schema `version`.
    pub fn saving(out: &'a mut Vec<u8>, version: u32) -> Self {
        Self {
            mode: Mode::Save(out),
            version,
        }
    }

    /// A loading archive. The version is 0 until the stream's marker has
    /// been read and [`set_version`](Self::set_version) called.
    pub fn loading(bytes: &'a [u8]) -> Self {
        Self {
            mode: Mode::Load { bytes, pos: 0 },
            version: 0,
        }
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.mode, Mode::Save(_))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn write(&mut self, bytes: &[u8]) {
        match &mut self.mode {
            Mode::Save(out) => out.extend_from_slice(bytes),
            Mode::Load { .. } => unreachable!("write on a loading archive"),
        }
    }

    fn read(&mut self, len: usize) -> Result<&'a [u8]> {
        match &mut self.mode {
            Mode::Load { bytes, pos } => {
                let data: &'a [u8] = *bytes;
                // `len` comes straight from a stream's length prefix, so the
                // comparison must not add it to `pos`.
                if len > data.len() - *pos {
                    return Err(ArchiveError::UnexpectedEnd(*pos));
                }
                let slice = &data[*pos..*pos + len];
                *pos += len;
                Ok(slice)
            }
            Mode::Save(_) => unreachable!("read on a saving archive"),
        }
    }

    pub fn u8(&mut self, v: &mut u8) -> Result<()> {
        if self.is_saving() {
            self.write(&[*v]);
        } else {
            *v = self.read(1)?[0];
        }
        Ok(())
    }

    pub fn u16(&mut self, v: &mut u16) -> Result<()> {
        if self.is_saving() {
            self.write(&v.to_le_bytes());
        } else {
            let b = self.read(2)?;
            *v = u16::from_le_bytes([b[0], b[1]]);
        }
        Ok(())
    }

    pub fn u32(&mut self, v: &mut u32) -> Result<()> {
        if self.is_saving() {
            self.write(&v.to_le_bytes());
        } else {
            let b = self.read(4)?;
            *v = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        }
        Ok(())
    }

    pub fn i32(&mut self, v: &mut i32) -> Result<()> {
        if self.is_saving() {
            self.write(&v.to_le_bytes());
        } else {
            let b = self.read(4)?;
            *v = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        }
        Ok(())
    }

    pub fn u64(&mut self, v: &mut u64) -> Result<()> {
        if self.is_saving() {
            self.write(&v.to_le_bytes());
        } else {
            let b = self.read(8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            *v = u64::from_le_bytes(raw);
        }
        Ok(())
    }

    /// Length-prefixed (`u64`) opaque byte block.
    pub fn byte_block(&mut self, v: &mut Vec<u8>) -> Result<()> {
        let mut len = v.len() as u64;
        self.u64(&mut len)?;
        if self.is_saving() {
            self.write(v);
        } else {
            *v = self.read(len as usize)?.to_vec();
        }
        Ok(())
    }

    /// Length-prefixed (`u32`) utf-8 string.
    pub fn string(&mut self, v: &mut String) -> Result<()> {
        let mut len = v.len() as u32;
        self.u32(&mut len)?;
        if self.is_saving() {
            self.write(v.as_bytes());
        } else {
            let at = self.position();
            let bytes = self.read(len as usize)?;
            *v = std::str::from_utf8(bytes)
                .map_err(|_| ArchiveError::InvalidUtf8(at))?
                .to_string();
        }
        Ok(())
    }

    fn position(&self) -> usize {
        match &self.mode {
            Mode::Load { pos, .. } => *pos,
            Mode::Save(out) => out.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        let mut out = Vec::new();
        {
            let mut ar = Archive::saving(&mut out, 2);
            let mut byte = 0x7Fu8;
            ar.u8(&mut byte).unwrap();
            let mut a = 0xBEEFu16;
            let mut b = -12345i32;
            let mut c = u64::MAX - 1;
            let mut s = String::from("entry name");
            let mut blob = vec![1u8, 2, 3];
            ar.u16(&mut a).unwrap();
            ar.i32(&mut b).unwrap();
            ar.u64(&mut c).unwrap();
            ar.string(&mut s).unwrap();
            ar.byte_block(&mut blob).unwrap();
            // saving leaves the values untouched
            assert_eq!(s, "entry name");
            assert_eq!(blob, [1, 2, 3]);
        }

        let mut ar = Archive::loading(&out);
        assert!(!ar.is_saving());
        let mut byte = 0u8;
        let mut a = 0u16;
        let mut b = 0i32;
        let mut c = 0u64;
        let mut s = String::new();
        let mut blob = Vec::new();
        ar.u8(&mut byte).unwrap();
        ar.u16(&mut a).unwrap();
        ar.i32(&mut b).unwrap();
        ar.u64(&mut c).unwrap();
        ar.string(&mut s).unwrap();
        ar.byte_block(&mut blob).unwrap();
        assert_eq!(byte, 0x7F);
        assert_eq!(a, 0xBEEF);
        assert_eq!(b, -12345);
        assert_eq!(c, u64::MAX - 1);
        assert_eq!(s, "entry name");
        assert_eq!(blob, [1, 2, 3]);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut ar = Archive::loading(&[0x01, 0x02]);
        let mut v = 0u32;
        match ar.u32(&mut v) {
            Err(ArchiveError::UnexpectedEnd(0)) => {}
            other => panic!("expected UnexpectedEnd, got {other:?}"),
        }
    }

    #[test]
    fn oversized_length_prefix_is_an_error() {
        // u64::MAX as a block length must not overflow the bounds check
        let mut stream = u64::MAX.to_le_bytes().to_vec();
        stream.extend_from_slice(&[1, 2, 3]);
        let mut ar = Archive::loading(&stream);
        let mut blob = Vec::new();
        match ar.byte_block(&mut blob) {
            Err(ArchiveError::UnexpectedEnd(8)) => {}
            other => panic!("expected UnexpectedEnd, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        // length 2, then a lone continuation byte
        let stream = [2u8, 0, 0, 0, 0xFF, 0xFE];
        let mut ar = Archive::loading(&stream);
        let mut s = String::new();
        assert!(matches!(
            ar.string(&mut s),
            Err(ArchiveError::InvalidUtf8(4))
        ));
    }
}
