use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because configuration selects it before any backend exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(StorageBackend::Supabase),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Supabase => write!(f, "supabase"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            "Supabase".parse::<StorageBackend>().unwrap(),
            StorageBackend::Supabase
        );
        assert_eq!(
            "LOCAL".parse::<StorageBackend>().unwrap(),
            StorageBackend::Local
        );
        assert!("s3".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn display_matches_from_str() {
        for backend in [StorageBackend::Supabase, StorageBackend::Local] {
            assert_eq!(
                backend.to_string().parse::<StorageBackend>().unwrap(),
                backend
            );
        }
    }
}
