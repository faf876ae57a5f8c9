//! String conversion for raw tag text.
//!
//! Parsers hand back either decoded strings or raw bytes (JPEG comments, EXIF
//! user comments). Everything leaves this module as clean UTF-8; bytes that are
//! not valid UTF-8 are decoded with the configured legacy charset.

use std::str::FromStr;

use crate::error::ConfigError;

/// Charset assumed for raw tag bytes that are not valid UTF-8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl FromStr for Charset {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        match key.as_str() {
            "UTF8" => Ok(Charset::Utf8),
            "ISO88591" | "LATIN1" => Ok(Charset::Latin1),
            "ASCII" | "USASCII" => Ok(Charset::Ascii),
            _ => Err(ConfigError::UnknownCharset(raw.to_string())),
        }
    }
}

/// Converts raw tag text into catalog text. Total: never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringConverter {
    fallback: Charset,
}

impl StringConverter {
    pub fn new(fallback: Charset) -> Self {
        Self { fallback }
    }

    /// Strip NULs and control characters left behind by tag parsers.
    pub fn convert(&self, raw: &str) -> String {
        raw.chars()
            .filter(|ch| !ch.is_control() || matches!(ch, '\t' | '\n'))
            .collect()
    }

    pub fn convert_bytes(&self, raw: &[u8]) -> String {
        match std::str::from_utf8(raw) {
            Ok(text) => self.convert(text),
            Err(_) => {
                let decoded: String = match self.fallback {
                    Charset::Utf8 => String::from_utf8_lossy(raw).into_owned(),
                    Charset::Latin1 => raw.iter().map(|&b| char::from(b)).collect(),
                    Charset::Ascii => raw
                        .iter()
                        .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{fffd}' })
                        .collect(),
                };
                self.convert(&decoded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_names_parse_loosely() {
        assert_eq!("utf-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("ISO-8859-1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!("latin1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!("US-ASCII".parse::<Charset>().unwrap(), Charset::Ascii);
        assert!("koi8-r".parse::<Charset>().is_err());
    }

    #[test]
    fn convert_drops_nuls_and_controls() {
        let conv = StringConverter::default();
        assert_eq!(conv.convert("Title\0\0"), "Title");
        assert_eq!(conv.convert("a\u{7}b\tc"), "ab\tc");
    }

    #[test]
    fn convert_bytes_uses_fallback_for_invalid_utf8() {
        let latin = StringConverter::new(Charset::Latin1);
        assert_eq!(latin.convert_bytes(b"Caf\xe9"), "Café");
        let utf8 = StringConverter::new(Charset::Utf8);
        assert_eq!(utf8.convert_bytes("Café".as_bytes()), "Café");
        assert_eq!(utf8.convert_bytes(b"Caf\xe9"), "Caf\u{fffd}");
        let ascii = StringConverter::new(Charset::Ascii);
        assert_eq!(ascii.convert_bytes(b"Caf\xe9"), "Caf\u{fffd}");
    }
}
