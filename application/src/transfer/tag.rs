use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kernel::prelude::entity::{AuthorId, DestructTag, Tag, TagType};

use crate::transfer::{ApiSchema, ConversionDirection, ConversionError, FieldError};

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiTag {
    #[validate(length(min = 1, max = 100))]
    pub key: String,
    #[validate(length(min = 1, max = 255))]
    pub value: String,
    pub author_id: Uuid,
    #[serde(rename = "type")]
    pub tag_type: TagType,
}

impl ApiSchema for ApiTag {
    const SCHEMA: &'static str = "ApiTag";
}

impl ApiTag {
    pub fn from_domain(tag: &Tag) -> error_stack::Result<Self, ConversionError> {
        let DestructTag {
            key,
            value,
            author_id,
            tag_type,
        } = tag.clone().into_destruct();
        let api = Self {
            key,
            value,
            author_id: author_id.into(),
            tag_type,
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Tag, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(Tag::new(
            self.key.clone(),
            self.value.clone(),
            AuthorId::new(self.author_id),
            self.tag_type,
        ))
    }
}

pub(crate) fn tags_from_domain(
    tags: &BTreeSet<Tag>,
) -> error_stack::Result<BTreeSet<ApiTag>, ConversionError> {
    tags.iter().map(ApiTag::from_domain).collect()
}

pub(crate) fn tags_to_domain(
    tags: &BTreeSet<ApiTag>,
) -> error_stack::Result<BTreeSet<Tag>, ConversionError> {
    tags.iter().map(ApiTag::to_domain).collect()
}

/// Second-phase check of a tag set: every tag must be well formed, written
/// by `author_id` and of the owner's `tag_type`.
pub(crate) fn check_tags(
    field: &str,
    tags: &BTreeSet<ApiTag>,
    author_id: &Uuid,
    tag_type: TagType,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for tag in tags {
        if let Err(invalid) = tag.validate() {
            errors.extend(
                FieldError::flatten(&invalid)
                    .into_iter()
                    .map(|error| error.nested_in(field)),
            );
        }
        if &tag.author_id != author_id {
            errors.push(FieldError::new(
                field,
                "tag_author",
                format!("tag {}:{} belongs to author {}", tag.key, tag.value, tag.author_id),
            ));
        }
        if tag.tag_type != tag_type {
            errors.push(FieldError::new(
                field,
                "tag_type",
                format!("tag {}:{} is a {} tag, expected {}", tag.key, tag.value, tag.tag_type, tag_type),
            ));
        }
    }
    errors
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use kernel::prelude::entity::{AuthorId, Tag, TagType};

    use super::{check_tags, ApiTag};
    use crate::transfer::ApiSchema;

    #[test]
    fn serializes_type_field() {
        let author = Uuid::new_v4();
        let tag = ApiTag::from_domain(&Tag::new("diet", "vegan", AuthorId::new(author), TagType::Menu))
            .unwrap();
        let json = tag.to_json().unwrap();
        assert!(json.contains(r#""type":"menu""#));
        assert_eq!(ApiTag::from_json(&json).unwrap(), tag);
    }

    #[test]
    fn rejects_unknown_type_and_empty_key() {
        let author = Uuid::new_v4();
        let bad_type = format!(r#"{{"key":"k","value":"v","author_id":"{author}","type":"house"}}"#);
        assert!(ApiTag::from_json(&bad_type).is_err());

        let empty_key = format!(r#"{{"key":"","value":"v","author_id":"{author}","type":"meal"}}"#);
        let report = ApiTag::from_json(&empty_key).unwrap_err();
        assert!(report.current_context().has_error_on("key"));
    }

    #[test]
    fn tag_set_checks_owner_and_type() {
        let author = Uuid::new_v4();
        let tags = BTreeSet::from([
            ApiTag {
                key: String::from("k"),
                value: String::from("v"),
                author_id: Uuid::new_v4(),
                tag_type: TagType::Client,
            },
            ApiTag {
                key: String::from("k"),
                value: String::from("w"),
                author_id: author,
                tag_type: TagType::Meal,
            },
        ]);
        let errors = check_tags("tags", &tags, &author, TagType::Client);
        let codes = errors.iter().map(|error| error.code.as_str()).collect::<Vec<_>>();
        assert_eq!(errors.len(), 2);
        assert!(codes.contains(&"tag_author"));
        assert!(codes.contains(&"tag_type"));
        assert!(errors.iter().all(|error| error.field == "tags"));
    }
}
