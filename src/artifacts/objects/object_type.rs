use crate::errors::StoreError;
use std::str::FromStr;

/// Wire-format discriminator of a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "blob" => Some(ObjectType::Blob),
            "tree" => Some(ObjectType::Tree),
            "commit" => Some(ObjectType::Commit),
            "tag" => Some(ObjectType::Tag),
            _ => None,
        }
    }

    /// Decode the type token of an object frame; unknown tokens are corrupt data
    pub fn parse_frame_token(token: &[u8]) -> anyhow::Result<Self> {
        std::str::from_utf8(token)
            .ok()
            .and_then(Self::from_token)
            .ok_or_else(|| {
                StoreError::malformed(format!(
                    "unknown object type {:?}",
                    String::from_utf8_lossy(token)
                ))
            })
    }
}

/// Parses a caller-supplied type name; unknown names are rejected as invalid input
impl FromStr for ObjectType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        Self::from_token(value).ok_or_else(|| {
            StoreError::invalid_input(format!(
                "unsupported object type {value}, expected one of [blob, commit, tag, tree]"
            ))
        })
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("blob", ObjectType::Blob)]
    #[case("tree", ObjectType::Tree)]
    #[case("commit", ObjectType::Commit)]
    #[case("tag", ObjectType::Tag)]
    fn known_type_names_parse(#[case] name: &str, #[case] expected: ObjectType) {
        assert_eq!(name.parse::<ObjectType>().unwrap(), expected);
        assert_eq!(expected.as_str(), name);
    }

    #[test]
    fn unknown_type_name_is_invalid_input() {
        let error = "branch".parse::<ObjectType>().unwrap_err();

        assert!(matches!(
            error.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_frame_token_is_malformed() {
        let error = ObjectType::parse_frame_token(b"blobby").unwrap_err();

        assert!(matches!(
            error.downcast_ref::<StoreError>(),
            Some(StoreError::MalformedData(_))
        ));
    }
}
