//! Asset type models and code validation

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One virtual currency definition (GOLD, POINTS, ...)
#[derive(Debug, Clone)]
pub struct AssetType {
    pub asset_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub decimal_places: i16,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssetType {
    pub fn decimal_places(&self) -> u32 {
        self.decimal_places as u32
    }
}

/// Parameters for creating a new asset type (admin surface)
#[derive(Debug, Clone)]
pub struct NewAssetType {
    pub code: String,
    pub name: String,
    pub description: String,
    pub decimal_places: i16,
}

/// Normalizes an asset code for lookup and storage.
///
/// Codes are case-insensitive on the wire but stored uppercase; valid codes
/// match ^[A-Z0-9_]{1,16}$ after normalization.
pub fn normalize_code(code: &str) -> Result<String, String> {
    let normalized = code.trim().to_uppercase();

    if normalized.is_empty() || normalized.len() > 16 {
        return Err(format!(
            "asset code must be 1-16 characters, got {}",
            normalized.len()
        ));
    }

    if !normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(format!(
            "asset code may only contain A-Z, 0-9 and underscore: {}",
            normalized
        ));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code_uppercases() {
        assert_eq!(normalize_code("gold").unwrap(), "GOLD");
        assert_eq!(normalize_code("  Points ").unwrap(), "POINTS");
        assert_eq!(normalize_code("GEM_2").unwrap(), "GEM_2");
    }

    #[test]
    fn test_normalize_code_rejects_invalid() {
        assert!(normalize_code("").is_err());
        assert!(normalize_code("   ").is_err());
        assert!(normalize_code("GOLD-COIN").is_err());
        assert!(normalize_code("G O L D").is_err());
        assert!(normalize_code("THIS_CODE_IS_WAY_TOO_LONG").is_err());
    }
}
