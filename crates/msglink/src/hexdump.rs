use crate::exit::{CliError, CliResult, USAGE};

/// Lowercase hex, one space between bytes.
pub fn encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex bytes. Whitespace, `:` and `,` separators and `0x` prefixes are
/// accepted, e.g. `02 05 0x01,03`.
pub fn decode(input: &str) -> CliResult<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() / 2);
    for token in input.split(|c: char| c.is_whitespace() || c == ':' || c == ',') {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let bytes = hex::decode(digits)
            .map_err(|err| CliError::new(USAGE, format!("invalid hex {token:?}: {err}")))?;
        out.extend_from_slice(&bytes);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_spaced_lowercase() {
        assert_eq!(encode(&[0x02, 0xAB, 0x03]), "02 ab 03");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn decode_accepts_common_separators() {
        assert_eq!(decode("02 05 0x01,03").unwrap(), vec![0x02, 0x05, 0x01, 0x03]);
        assert_eq!(decode("0205:FF").unwrap(), vec![0x02, 0x05, 0xFF]);
        assert_eq!(decode("  ").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(decode("0").is_err());
        assert!(decode("zz").is_err());
        assert!(decode("02 0").is_err());
    }

    #[test]
    fn decode_rejects_signed_digits() {
        for input in ["+1", "-1", "+f", "02 +3"] {
            let err = decode(input).expect_err("sign is not a hex digit");
            assert_eq!(err.code, USAGE);
        }
    }
}
