use std::fmt::{Display, Formatter};

use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::References;

use crate::entity::AuthorId;

/// Kind of entity a tag may be attached to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Client,
    Menu,
    Meal,
    Recipe,
}

impl Display for TagType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagType::Client => write!(f, "client"),
            TagType::Menu => write!(f, "menu"),
            TagType::Meal => write!(f, "meal"),
            TagType::Recipe => write!(f, "recipe"),
        }
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, References, Destructure)]
pub struct Tag {
    key: String,
    value: String,
    author_id: AuthorId,
    tag_type: TagType,
}

impl Tag {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        author_id: AuthorId,
        tag_type: TagType,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            author_id,
            tag_type,
        }
    }

    pub fn is_owned_by(&self, author_id: &AuthorId, tag_type: TagType) -> bool {
        &self.author_id == author_id && self.tag_type == tag_type
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} ({}, author {})",
            self.key,
            self.value,
            self.tag_type,
            self.author_id.as_ref()
        )
    }
}
