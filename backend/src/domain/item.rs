//! Items that users can give kudos to.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ItemId, Username};

/// Maximum item name length in characters.
pub const ITEM_NAME_MAX: usize = 100;
/// Maximum item description length in characters.
pub const ITEM_DESCRIPTION_MAX: usize = 1000;

/// Validation errors for item input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemValidationError {
    #[error("name cannot be blank")]
    EmptyName,
    #[error("name cannot be longer than {max} characters")]
    NameTooLong { max: usize },
    #[error("description cannot be blank")]
    EmptyDescription,
    #[error("description cannot be longer than {max} characters")]
    DescriptionTooLong { max: usize },
}

impl ItemValidationError {
    /// Name of the input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameTooLong { .. } => "name",
            Self::EmptyDescription | Self::DescriptionTooLong { .. } => "description",
        }
    }
}

/// Non-blank item name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Validate and construct an [`ItemName`].
    pub fn new(name: impl Into<String>) -> Result<Self, ItemValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if name.chars().count() > ITEM_NAME_MAX {
            return Err(ItemValidationError::NameTooLong { max: ITEM_NAME_MAX });
        }
        Ok(Self(name))
    }
}

/// Non-blank item description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemDescription(String);

impl ItemDescription {
    /// Validate and construct an [`ItemDescription`].
    pub fn new(description: impl Into<String>) -> Result<Self, ItemValidationError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ItemValidationError::EmptyDescription);
        }
        if description.chars().count() > ITEM_DESCRIPTION_MAX {
            return Err(ItemValidationError::DescriptionTooLong {
                max: ITEM_DESCRIPTION_MAX,
            });
        }
        Ok(Self(description))
    }
}

macro_rules! item_text_impls {
    ($($name:ident),*) => {
        $(
            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_ref())
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }

            impl TryFrom<String> for $name {
                type Error = ItemValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }
        )*
    };
}

item_text_impls!(ItemName, ItemDescription);

/// A thing people give kudos to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub creator_username: Username,
    pub name: ItemName,
    pub description: ItemDescription,
}

/// Input for creating an item. The id is minted by the service.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub creator_username: Username,
    pub name: ItemName,
    pub description: ItemDescription,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", ItemValidationError::EmptyName)]
    #[case("  \t", ItemValidationError::EmptyName)]
    fn blank_names_are_rejected(#[case] raw: &str, #[case] expected: ItemValidationError) {
        assert_eq!(ItemName::new(raw).expect_err("blank"), expected);
    }

    #[rstest]
    fn name_length_is_bounded() {
        assert!(ItemName::new("n".repeat(ITEM_NAME_MAX)).is_ok());
        let err = ItemName::new("n".repeat(ITEM_NAME_MAX + 1)).expect_err("too long");
        assert_eq!(err.field(), "name");
    }

    #[rstest]
    fn description_length_is_bounded() {
        assert!(ItemDescription::new("d".repeat(ITEM_DESCRIPTION_MAX)).is_ok());
        let err =
            ItemDescription::new("d".repeat(ITEM_DESCRIPTION_MAX + 1)).expect_err("too long");
        assert_eq!(
            err,
            ItemValidationError::DescriptionTooLong {
                max: ITEM_DESCRIPTION_MAX
            }
        );
        assert_eq!(err.field(), "description");
    }
}
