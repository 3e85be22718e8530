use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Identifier must not be empty")]
    Empty,
    #[error("Identifier must not contain whitespace or control characters. value: '{0}'")]
    InvalidCharacters(String),
}

fn validate(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }

    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(IdError::InvalidCharacters(value.to_string()));
    }

    Ok(())
}

/// Identifiers are opaque strings.
///
/// New identifiers are random UUIDs, but any non-whitespace string is accepted so that data created elsewhere
/// can be loaded.  `From<&str>` does not validate, use `FromStr` for user input.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            serde::Serialize,
            serde::Deserialize,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new_random() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                validate(s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// Identifies a [`crate::project::CalendarProject`].
    ProjectId
);
identifier!(
    /// Identifies an [`crate::asset::ImageAsset`].
    AssetId
);
identifier!(
    /// Identifies an [`crate::group::ImageGroup`].
    GroupId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_unique() {
        assert_ne!(AssetId::new_random(), AssetId::new_random());
    }

    #[test]
    fn parse_rejects_whitespace() {
        assert_eq!(
            GroupId::from_str("two words"),
            Err(IdError::InvalidCharacters("two words".to_string()))
        );
        assert_eq!(GroupId::from_str(""), Err(IdError::Empty));
    }

    #[test]
    fn serializes_as_a_plain_string() {
        let id = ProjectId::from("p1");

        let json = serde_json::to_string(&id).unwrap();

        assert_eq!(json, "\"p1\"");
    }
}
