//! Fixed-width encodings used in attestation envelopes and payment memos.
//!
//! Attestation types and source ids travel as 32-byte values: the ASCII bytes
//! of the name, right-padded with zero bytes, rendered as `0x`-prefixed hex.
//! The same layout is used for standard payment references carried in memos.

use alloy::hex;
use alloy::primitives::{keccak256, B256};

use crate::constants::IDENTIFIER_BYTES;
use crate::error::AttestationError;

/// Right-pad `value` to a 32-byte word, rejecting values that do not fit.
fn pad_to_word(value: &str) -> Result<B256, AttestationError> {
    let bytes = value.as_bytes();
    if bytes.len() > IDENTIFIER_BYTES {
        return Err(AttestationError::EncodingOverflow {
            value: value.to_string(),
            len: bytes.len(),
            max: IDENTIFIER_BYTES,
        });
    }
    Ok(B256::right_padding_from(bytes))
}

/// Encode an attestation type or source id for the wire.
///
/// `"Payment"` becomes `0x5061796d656e74` followed by 50 zero digits.
/// Always 66 characters long.
pub fn encode_identifier(value: &str) -> Result<String, AttestationError> {
    let word = pad_to_word(value)?;
    Ok(hex::encode_prefixed(word))
}

/// Recover the name from an encoded identifier, dropping the zero padding.
pub fn decode_identifier(encoded: &str) -> Result<String, AttestationError> {
    let digits = encoded.strip_prefix("0x").unwrap_or(encoded);
    let mut bytes = hex::decode(digits)
        .map_err(|e| AttestationError::Decode(format!("invalid identifier hex {encoded:?}: {e}")))?;

    while bytes.last() == Some(&0) {
        bytes.pop();
    }

    String::from_utf8(bytes)
        .map_err(|e| AttestationError::Decode(format!("identifier is not UTF-8: {e}")))
}

/// Build the 32-byte standard payment reference for a memo message.
pub fn payment_reference(message: &str) -> Result<B256, AttestationError> {
    pad_to_word(message)
}

/// Hash of an address string as the verifiers report it
/// (`keccak256` over the UTF-8 bytes of the address).
pub fn address_hash(address: &str) -> B256 {
    keccak256(address.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_payment() {
        let encoded = encode_identifier("Payment").unwrap();
        assert_eq!(encoded, format!("0x5061796d656e74{}", "0".repeat(50)));
        assert_eq!(encoded.len(), 66);
    }

    #[test]
    fn test_encode_source_ids() {
        let encoded = encode_identifier("testBTC").unwrap();
        assert!(encoded.starts_with("0x74657374425443"));
        assert_eq!(encoded.len(), 66);

        let empty = encode_identifier("").unwrap();
        assert_eq!(empty, format!("0x{}", "0".repeat(64)));
    }

    #[test]
    fn test_decode_recovers_names() {
        for name in [
            "Payment",
            "AddressValidity",
            "ConfirmedBlockHeightExists",
            "ReferencedPaymentNonexistence",
            "BalanceDecreasingTransaction",
            "EVMTransaction",
            "testXRP",
            "DOGE",
            "p",
        ] {
            let encoded = encode_identifier(name).unwrap();
            assert_eq!(encoded.len(), 66, "{name}");
            assert_eq!(decode_identifier(&encoded).unwrap(), name);
        }
    }

    #[test]
    fn test_decode_without_prefix() {
        let encoded = encode_identifier("testETH").unwrap();
        assert_eq!(decode_identifier(&encoded[2..]).unwrap(), "testETH");
    }

    #[test]
    fn test_exactly_32_bytes_fits() {
        let name = "a".repeat(32);
        let encoded = encode_identifier(&name).unwrap();
        assert_eq!(encoded.len(), 66);
        assert_eq!(decode_identifier(&encoded).unwrap(), name);
    }

    #[test]
    fn test_oversized_identifier_rejected() {
        let err = encode_identifier(&"x".repeat(33)).unwrap_err();
        match err {
            AttestationError::EncodingOverflow { len, max, .. } => {
                assert_eq!(len, 33);
                assert_eq!(max, 32);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        assert!(matches!(
            decode_identifier("0xzz"),
            Err(AttestationError::Decode(_))
        ));
    }

    #[test]
    fn test_payment_reference_layout() {
        let reference = payment_reference("Hello world!").unwrap();
        assert_eq!(&reference[..12], b"Hello world!");
        assert!(reference[12..].iter().all(|b| *b == 0));
        assert!(payment_reference(&"m".repeat(40)).is_err());
    }

    #[test]
    fn test_address_hash_is_keccak_of_string() {
        let hash = address_hash("r9RLXvWuRro3RX33pk4xsN58tefYZ8Tvbj");
        assert_eq!(hash, keccak256("r9RLXvWuRro3RX33pk4xsN58tefYZ8Tvbj"));
        assert_ne!(hash, address_hash("r9RLXvWuRro3RX33pk4xsN58tefYZ8Tvbk"));
    }
}
