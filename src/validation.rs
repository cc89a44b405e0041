use thiserror::Error;

/// Longest cursor accepted from a caller
pub const MAX_CURSOR_LEN: usize = 256;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unsupported chain id: {0}")]
    UnsupportedChain(u64),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub fn validate_chain_id(chain_id: u64, supported: &[u64]) -> Result<u64, ValidationError> {
    if supported.contains(&chain_id) {
        Ok(chain_id)
    } else {
        Err(ValidationError::UnsupportedChain(chain_id))
    }
}

/// Validate a 0x-prefixed 20-byte hex address and return it lowercased
pub fn validate_address(address: &str) -> Result<String, ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidAddress(address.to_string()))?;

    // Decode hex string, 20 bytes expected
    match hex::decode(hex_part) {
        Ok(bytes) if bytes.len() == 20 => Ok(format!("0x{}", hex_part.to_lowercase())),
        _ => Err(ValidationError::InvalidAddress(address.to_string())),
    }
}

/// Cursors are opaque to us but must stay short and printable
pub fn validate_cursor(cursor: Option<&str>) -> Result<Option<String>, ValidationError> {
    match cursor {
        None => Ok(None),
        Some(c) if c.len() > MAX_CURSOR_LEN => Err(ValidationError::InvalidCursor(format!(
            "cursor longer than {} bytes",
            MAX_CURSOR_LEN
        ))),
        Some(c) if !c.chars().all(|ch| ch.is_ascii_graphic()) => Err(
            ValidationError::InvalidCursor("cursor must be printable ASCII".to_string()),
        ),
        Some(c) => Ok(Some(c.to_string())),
    }
}

pub fn validate_limit(limit: Option<u32>, max: u32) -> Result<u32, ValidationError> {
    match limit {
        None => Ok(max.min(20)),
        Some(0) => Err(ValidationError::InvalidParameter("limit must be positive".to_string())),
        Some(l) if l > max => Err(ValidationError::InvalidParameter(format!(
            "limit must not exceed {}",
            max
        ))),
        Some(l) => Ok(l),
    }
}

/// Parse a decimal path or query value such as a chain or project id
pub fn parse_u64(name: &str, raw: &str) -> Result<u64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingParameter(name.to_string()));
    }
    raw.parse::<u64>().map_err(|_| {
        ValidationError::InvalidParameter(format!("{} must be an unsigned integer, got {:?}", name, raw))
    })
}

/// Parse an optional numeric query value, absent stays absent
pub fn parse_optional_u32(name: &str, raw: Option<&str>) -> Result<Option<u32>, ValidationError> {
    raw.map(|value| {
        let value = value.trim();
        value.parse::<u32>().map_err(|_| {
            ValidationError::InvalidParameter(format!("{} must be an unsigned integer, got {:?}", name, value))
        })
    })
    .transpose()
}

pub fn require<'a>(name: &str, raw: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingParameter(name.to_string())),
    }
}

/// Pages are 1-indexed
pub fn validate_page(page: Option<u32>) -> Result<u32, ValidationError> {
    match page {
        None => Ok(1),
        Some(0) => Err(ValidationError::InvalidParameter("page starts at 1".to_string())),
        Some(p) => Ok(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_lowercased() {
        let addr = validate_address("0xAbCdEf0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(addr, "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(matches!(validate_address(""), Err(ValidationError::MissingParameter(_))));
        assert!(validate_address("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(validate_address("0x1234").is_err());
        assert!(validate_address("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_chain_id() {
        assert_eq!(validate_chain_id(8453, &[8453]), Ok(8453));
        assert_eq!(validate_chain_id(1, &[8453]), Err(ValidationError::UnsupportedChain(1)));
    }

    #[test]
    fn test_cursor() {
        assert_eq!(validate_cursor(None), Ok(None));
        assert_eq!(validate_cursor(Some("")), Ok(Some(String::new())));
        assert!(validate_cursor(Some("has space")).is_err());
        assert!(validate_cursor(Some(&"a".repeat(MAX_CURSOR_LEN + 1))).is_err());
    }

    #[test]
    fn test_limit_and_page() {
        assert_eq!(validate_limit(None, 100), Ok(20));
        assert_eq!(validate_limit(Some(50), 100), Ok(50));
        assert!(validate_limit(Some(0), 100).is_err());
        assert!(validate_limit(Some(101), 100).is_err());
        assert_eq!(validate_page(None), Ok(1));
        assert!(validate_page(Some(0)).is_err());
    }

    #[test]
    fn test_numeric_params() {
        assert_eq!(parse_u64("chain", "8453"), Ok(8453));
        assert_eq!(parse_u64("id", " 42 "), Ok(42));
        assert!(matches!(parse_u64("chain", "abc"), Err(ValidationError::InvalidParameter(_))));
        assert!(matches!(parse_u64("id", "-1"), Err(ValidationError::InvalidParameter(_))));
        assert!(matches!(parse_u64("id", ""), Err(ValidationError::MissingParameter(_))));

        assert_eq!(parse_optional_u32("limit", None), Ok(None));
        assert_eq!(parse_optional_u32("limit", Some("25")), Ok(Some(25)));
        assert!(parse_optional_u32("limit", Some("lots")).is_err());
        assert!(parse_optional_u32("page", Some("4294967296")).is_err());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("metric", Some(" votes ")), Ok("votes"));
        assert!(matches!(require("metric", None), Err(ValidationError::MissingParameter(_))));
        assert!(matches!(require("metric", Some("")), Err(ValidationError::MissingParameter(_))));
    }
}
