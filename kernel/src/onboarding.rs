use std::collections::BTreeSet;

use crate::entity::{Address, AuthorId, ContactInfo, Profile, Tag, TagType};
use crate::KernelError;

/// Fetches raw onboarding form responses from the form service.
#[async_trait::async_trait]
pub trait ClientOnboardingProvider: 'static + Sync + Send {
    async fn get_form_response(
        &self,
        form_response_id: &str,
    ) -> error_stack::Result<serde_json::Value, KernelError>;
}

pub trait DependOnClientOnboardingProvider: 'static + Sync + Send {
    type ClientOnboardingProvider: ClientOnboardingProvider;
    fn client_onboarding_provider(&self) -> &Self::ClientOnboardingProvider;
}

/// Extracts client fields from a raw form response.
pub trait FormResponseMapper: 'static + Sync + Send {
    fn map(
        &self,
        form_response: &serde_json::Value,
    ) -> error_stack::Result<FormResponseCandidates, KernelError>;
}

pub trait DependOnFormResponseMapper: 'static + Sync + Send {
    type FormResponseMapper: FormResponseMapper;
    fn form_response_mapper(&self) -> &Self::FormResponseMapper;
}

/// Whatever the mapper could read from a form response. Tags are plain
/// key/value pairs since the form knows nothing about authors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormResponseCandidates {
    pub profile: Option<Profile>,
    pub contact_info: Option<ContactInfo>,
    pub address: Option<Address>,
    pub tags: Vec<(String, String)>,
    pub notes: Option<String>,
}

impl FormResponseCandidates {
    pub fn client_tags(&self, author_id: AuthorId) -> BTreeSet<Tag> {
        self.tags
            .iter()
            .map(|(key, value)| Tag::new(key.clone(), value.clone(), author_id, TagType::Client))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use super::FormResponseCandidates;
    use crate::entity::{AuthorId, TagType};

    #[test]
    fn candidate_tags_become_client_tags() {
        let author = AuthorId::new(Uuid::new_v4());
        let candidates = FormResponseCandidates {
            tags: vec![
                (String::from("goal"), String::from("weight loss")),
                (String::from("goal"), String::from("weight loss")),
                (String::from("diet"), String::from("vegan")),
            ],
            ..Default::default()
        };
        let tags = candidates.client_tags(author);
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|tag| tag.is_owned_by(&author, TagType::Client)));
    }
}
