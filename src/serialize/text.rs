//! Byte-to-text codecs for the stringify/parse surface

use base64::{Engine as _, engine::general_purpose};

use super::ConversionError;

/// Text rendering of an encoded byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Base64,
    Hex,
}

/// Render bytes as text.
pub fn render(bytes: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Base64 => general_purpose::STANDARD.encode(bytes),
        TextEncoding::Hex => hex::encode(bytes),
    }
}

/// Decode text back to bytes.
pub fn decode(text: &str, encoding: TextEncoding) -> Result<Vec<u8>, ConversionError> {
    match encoding {
        TextEncoding::Base64 => general_purpose::STANDARD
            .decode(text)
            .map_err(|e| ConversionError::Text(e.to_string())),
        TextEncoding::Hex => hex::decode(text).map_err(|e| ConversionError::Text(e.to_string())),
    }
}
