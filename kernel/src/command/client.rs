use std::collections::BTreeSet;

use crate::entity::{
    Address, AuthorId, ClientId, ClientUpdates, ContactInfo, MenuId, MenuUpdates, Profile, Tag,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateClient {
    pub author_id: AuthorId,
    pub profile: Profile,
    pub contact_info: Option<ContactInfo>,
    pub address: Option<Address>,
    pub tags: BTreeSet<Tag>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateClient {
    pub client_id: ClientId,
    pub updates: ClientUpdates,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeleteClient {
    pub client_id: ClientId,
}

/// Creates a client from an onboarding form response.
///
/// Every field set here overrides what the form response carries.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateClientFromFormResponse {
    pub form_response_id: String,
    pub author_id: AuthorId,
    pub profile: Option<Profile>,
    pub contact_info: Option<ContactInfo>,
    pub address: Option<Address>,
    pub tags: Option<BTreeSet<Tag>>,
    pub notes: Option<String>,
}

impl CreateClientFromFormResponse {
    pub fn new(form_response_id: impl Into<String>, author_id: AuthorId) -> Self {
        Self {
            form_response_id: form_response_id.into(),
            author_id,
            profile: None,
            contact_info: None,
            address: None,
            tags: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMenu {
    pub client_id: ClientId,
    pub description: Option<String>,
    pub tags: BTreeSet<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMenu {
    pub client_id: ClientId,
    pub menu_id: MenuId,
    pub updates: MenuUpdates,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeleteMenu {
    pub client_id: ClientId,
    pub menu_id: MenuId,
}
