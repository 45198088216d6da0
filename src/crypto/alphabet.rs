//! Bcrypt's base64 dialect.
//!
//! Bcrypt strings use the alphabet `./A-Za-z0-9` instead of the standard
//! `A-Za-z0-9+/`, never pad, and often end on a partial quantum. Encoding goes
//! through standard base64 and then swaps each symbol through a fixed table;
//! decoding swaps back and lets a padding-indifferent engine do the rest.

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::error::{Error, Result};

const STANDARD_SYMBOLS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const BCRYPT_SYMBOLS: &[u8; 64] =
    b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const UNMAPPED: u8 = 0xff;

const fn translation(from: &[u8; 64], to: &[u8; 64]) -> [u8; 256] {
    let mut table = [UNMAPPED; 256];
    let mut i = 0;
    while i < 64 {
        table[from[i] as usize] = to[i];
        i += 1;
    }
    table
}

static TO_BCRYPT: [u8; 256] = translation(STANDARD_SYMBOLS, BCRYPT_SYMBOLS);
static TO_STANDARD: [u8; 256] = translation(BCRYPT_SYMBOLS, STANDARD_SYMBOLS);

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes `bytes` into bcrypt's base64 dialect, without padding.
pub fn encode(bytes: &[u8]) -> String {
    ENGINE
        .encode(bytes)
        .bytes()
        .map(|symbol| TO_BCRYPT[symbol as usize] as char)
        .collect()
}

/// Decodes a bcrypt base64 string.
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] on a symbol outside the bcrypt alphabet
/// or a length no base64 string can have.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let standard = text
        .chars()
        .map(|c| {
            let mapped = if c.is_ascii() { TO_STANDARD[c as usize] } else { UNMAPPED };
            if mapped == UNMAPPED {
                Err(Error::InvalidEncoding(format!("unexpected symbol {c:?}")))
            } else {
                Ok(mapped)
            }
        })
        .collect::<Result<Vec<u8>>>()?;

    ENGINE
        .decode(standard)
        .map_err(|e| Error::InvalidEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL_BYTES: &str = "\
        ..CA.uOD/eaGAOmJB.yMBv.PCfKSDPWVE/iYEvubFf6eGQGhHASkHwenIgqqJQ2tKBCwKxOzLha2MRm5\
        NBy8Ny//OiLCPSXFQCjIQyvLRi7OSTHRTDTUTzfXUjraVT3dWEDgW0PjXkbmYUnpZEzsZ1/valLybVX1\
        cFj4c1v7dl8.eWIBfGUEf2gHgmsKhW4NiHEQi3QTjncWkXoZlH0cl4AfmoMinYYloIkoo4wrpo8uqZIx\
        rJU0r5g3sps6tZ49uKFAu6RDvqdGwapJxK1Mx7BPyrNSzbZV0LlY07xb1r9e2cJh3MVk38hn4stq5c5t\
        6NFw69Rz7td28dp59N189u";

    #[test]
    fn encodes_every_byte_value() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(encode(&bytes), ALL_BYTES);
    }

    #[test]
    fn decodes_every_byte_value() {
        let bytes = decode(ALL_BYTES).unwrap();
        assert_eq!(bytes, (0..=255).collect::<Vec<u8>>());
    }

    #[test]
    fn bcrypt_salt_and_hash_lengths() {
        assert_eq!(encode(&[0u8; 16]).len(), 22);
        assert_eq!(encode(&[0u8; 23]).len(), 31);
        assert_eq!(decode("DCq7YPn5Rq63x1Lad4cll.").unwrap().len(), 16);
        assert_eq!(decode("TV4S6ytwfsfvkgY8jIucDrjc8deX1s.").unwrap().len(), 23);
    }

    #[test]
    fn rejects_standard_only_symbols() {
        assert!(matches!(decode("ab+c"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode("abé"), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn empty_input() {
        assert_eq!(encode(&[]), "");
        assert!(decode("").unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
            prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }
    }
}
