use std::io::{Read, Write};

use uuid::Uuid;

use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite};
use crate::types::{Long, ProtocolString};

/// UUID sent as two big-endian 64-bit words, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProtocolUuid(pub Uuid);

impl ProtocolUuid {
    pub fn from_words(most_significant: u64, least_significant: u64) -> Self {
        Self(Uuid::from_u64_pair(most_significant, least_significant))
    }

    pub fn words(&self) -> (u64, u64) {
        self.0.as_u64_pair()
    }

    /// Parses the textual form, with or without hyphens.
    pub fn parse(text: &str) -> Result<Self> {
        Uuid::try_parse(text)
            .map(Self)
            .map_err(|_| ProtocolError::invalid_value("uuid text", text.len() as i64))
    }

    /// Writes the UUID as a string, hyphenated or as 32 bare hex digits.
    pub fn write_text<W: Write>(&self, writer: &mut W, hyphenated: bool) -> Result<usize> {
        let text = if hyphenated {
            self.0.hyphenated().to_string()
        } else {
            self.0.simple().to_string()
        };
        ProtocolString(text).write_to(writer)
    }

    pub fn read_text<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (text, n) = ProtocolString::read_bounded(reader, 36)?;
        Ok((Self::parse(&text.0)?, n))
    }
}

impl ProtocolWrite for ProtocolUuid {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let (most, least) = self.words();
        let mut written = Long(most as i64).write_to(writer)?;
        written += Long(least as i64).write_to(writer)?;
        Ok(written)
    }
}

impl ProtocolRead for ProtocolUuid {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (Long(most), a) = Long::read_from(reader)?;
        let (Long(least), b) = Long::read_from(reader)?;
        Ok((Self::from_words(most as u64, least as u64), a + b))
    }
}

impl From<Uuid> for ProtocolUuid {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEXT: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";

    #[test]
    fn test_hyphenated_text_matches_words() {
        let uuid = ProtocolUuid::parse(TEXT).unwrap();
        assert_eq!(
            uuid.words(),
            (0x069a_79f4_44e9_4726, 0xa5be_fca9_0e38_aaf5)
        );
        assert_eq!(
            ProtocolUuid::parse("069a79f444e94726a5befca90e38aaf5").unwrap(),
            uuid
        );
    }

    #[test]
    fn test_binary_layout() {
        let uuid = ProtocolUuid::parse(TEXT).unwrap();
        let mut buffer = Vec::new();
        assert_eq!(uuid.write_to(&mut buffer).unwrap(), 16);
        assert_eq!(&buffer[..4], &[0x06, 0x9a, 0x79, 0xf4]);
        assert_eq!(buffer, uuid.0.as_bytes());

        let (decoded, n) = ProtocolUuid::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(decoded, uuid);
        assert_eq!(n, 16);
    }

    #[test]
    fn test_text_forms() {
        let uuid = ProtocolUuid::parse(TEXT).unwrap();

        let mut hyphenated = Vec::new();
        uuid.write_text(&mut hyphenated, true).unwrap();
        assert_eq!(hyphenated[0], 36);

        let mut simple = Vec::new();
        uuid.write_text(&mut simple, false).unwrap();
        assert_eq!(simple[0], 32);

        let (decoded, _) = ProtocolUuid::read_text(&mut Cursor::new(simple)).unwrap();
        assert_eq!(decoded, uuid);
    }
}
