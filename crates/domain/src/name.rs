use derive_more::{AsRef, Display};

/// Display name of an exercise, variation, instruction or user.
#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    pub const MAX_LEN: usize = 128;

    pub fn new(name: &str) -> Result<Self, NameError> {
        let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            return Err(NameError::Empty);
        }

        let len = collapsed.chars().count();

        if len > Self::MAX_LEN {
            return Err(NameError::TooLong(len));
        }

        Ok(Name(collapsed))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NameError {
    #[error("Name must not be empty")]
    Empty,
    #[error("Name must be 128 characters or fewer ({0} > 128)")]
    TooLong(usize),
}
