mod address;
mod contact_info;
mod id;
mod profile;

use std::collections::BTreeSet;

use destructure::Destructure;
use error_stack::Report;
use uuid::Uuid;

pub use self::{address::*, contact_info::*, id::*, profile::*};
use crate::entity::common::replace_if_changed;
use crate::entity::{
    AuthorId, CreatedAt, Lifecycle, Menu, MenuId, MenuUpdates, Tag, TagType, UpdatedAt, Version,
};
use crate::rule::{check_rule, TagsOwnedBy};
use crate::KernelError;

/// Aggregate root of a nutritionist's client and the menus planned for them.
///
/// # Invariants
/// - Every tag belongs to `author_id` and is a [`TagType::Client`] tag.
/// - `menus` only holds live menus. Deleting a menu discards it and removes it
///   from the list in the same step.
/// - Any effective mutation, including one made to an owned menu, bumps the
///   client's version exactly once.
#[derive(Debug, Clone, Eq, PartialEq, Destructure)]
pub struct Client {
    id: ClientId,
    author_id: AuthorId,
    profile: Profile,
    contact_info: Option<ContactInfo>,
    address: Option<Address>,
    tags: BTreeSet<Tag>,
    menus: Vec<Menu>,
    notes: Option<String>,
    onboarding_data: Option<serde_json::Value>,
    lifecycle: Lifecycle<Client>,
}

/// Fields of a client to change at once. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientUpdates {
    pub profile: Option<Profile>,
    pub contact_info: Option<Option<ContactInfo>>,
    pub address: Option<Option<Address>>,
    pub tags: Option<BTreeSet<Tag>>,
    pub notes: Option<Option<String>>,
}

impl Client {
    pub fn create_client(
        author_id: AuthorId,
        profile: Profile,
        contact_info: Option<ContactInfo>,
        address: Option<Address>,
        tags: BTreeSet<Tag>,
        notes: Option<String>,
        onboarding_data: Option<serde_json::Value>,
    ) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(&tags, &author_id, TagType::Client))?;
        Ok(Self {
            id: ClientId::new(Uuid::new_v4()),
            author_id,
            profile,
            contact_info,
            address,
            tags,
            menus: Vec::new(),
            notes,
            onboarding_data,
            lifecycle: Lifecycle::new(),
        })
    }

    /// Rebuilds a persisted client, re-checking its tag ownership and that
    /// every menu belongs to this client and its author.
    pub fn restore(client: DestructClient) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(
            &client.tags,
            &client.author_id,
            TagType::Client,
        ))?;
        for menu in &client.menus {
            if menu.client_id() != &client.id {
                return Err(Report::new(KernelError::Validation).attach_printable(format!(
                    "menu {:?} belongs to client {:?}",
                    menu.id(),
                    menu.client_id()
                )));
            }
            if menu.author_id() != &client.author_id {
                return Err(Report::new(KernelError::Validation).attach_printable(format!(
                    "menu {:?} was written by author {:?}",
                    menu.id(),
                    menu.author_id()
                )));
            }
        }
        Ok(client.freeze())
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    pub fn version(&self) -> &Version<Client> {
        self.lifecycle.version()
    }

    /// Version this client was loaded at, `None` when it was never persisted.
    pub fn persisted_version(&self) -> Option<&Version<Client>> {
        self.lifecycle.persisted_version()
    }

    pub fn is_discarded(&self) -> bool {
        self.lifecycle.is_discarded()
    }

    pub fn created_at(&self) -> &CreatedAt<Client> {
        self.lifecycle.created_at()
    }

    pub fn updated_at(&self) -> &UpdatedAt<Client> {
        self.lifecycle.updated_at()
    }

    pub fn profile(&self) -> error_stack::Result<&Profile, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.profile)
    }

    pub fn contact_info(&self) -> error_stack::Result<Option<&ContactInfo>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.contact_info.as_ref())
    }

    pub fn address(&self) -> error_stack::Result<Option<&Address>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.address.as_ref())
    }

    pub fn tags(&self) -> error_stack::Result<&BTreeSet<Tag>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.tags)
    }

    pub fn notes(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.notes.as_ref())
    }

    pub fn onboarding_data(&self) -> error_stack::Result<Option<&serde_json::Value>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.onboarding_data.as_ref())
    }

    pub fn menus(&self) -> error_stack::Result<&[Menu], KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.menus)
    }

    /// Discarded menus still held by the client. Since `delete_menu` removes
    /// the menu it discards, this is empty unless the client was deleted.
    pub fn discarded_menus(&self) -> error_stack::Result<Vec<&Menu>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.menus.iter().filter(|menu| menu.is_discarded()).collect())
    }

    pub fn find_menu(&self, menu_id: &MenuId) -> error_stack::Result<Option<&Menu>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.menus.iter().find(|menu| menu.id() == menu_id))
    }

    pub fn set_profile(&mut self, profile: Profile) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.profile, profile) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_contact_info(
        &mut self,
        contact_info: Option<ContactInfo>,
    ) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.contact_info, contact_info) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_address(&mut self, address: Option<Address>) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.address, address) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_tags(&mut self, tags: BTreeSet<Tag>) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        check_rule(TagsOwnedBy::of(&tags, &self.author_id, TagType::Client))?;
        if replace_if_changed(&mut self.tags, tags) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.notes, notes) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_onboarding_data(
        &mut self,
        onboarding_data: Option<serde_json::Value>,
    ) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.onboarding_data, onboarding_data) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn update_properties(
        &mut self,
        updates: ClientUpdates,
    ) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let ClientUpdates {
            profile,
            contact_info,
            address,
            tags,
            notes,
        } = updates;
        if let Some(tags) = &tags {
            check_rule(TagsOwnedBy::of(tags, &self.author_id, TagType::Client))?;
        }
        let mut changed = false;
        if let Some(profile) = profile {
            changed |= replace_if_changed(&mut self.profile, profile);
        }
        if let Some(contact_info) = contact_info {
            changed |= replace_if_changed(&mut self.contact_info, contact_info);
        }
        if let Some(address) = address {
            changed |= replace_if_changed(&mut self.address, address);
        }
        if let Some(tags) = tags {
            changed |= replace_if_changed(&mut self.tags, tags);
        }
        if let Some(notes) = notes {
            changed |= replace_if_changed(&mut self.notes, notes);
        }
        if changed {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn create_menu(
        &mut self,
        description: Option<String>,
        tags: BTreeSet<Tag>,
    ) -> error_stack::Result<MenuId, KernelError> {
        self.lifecycle.check_not_discarded()?;
        let menu = Menu::create_menu(self.id, self.author_id, description, tags)?;
        let id = *menu.id();
        self.menus.push(menu);
        self.lifecycle.increment_version();
        Ok(id)
    }

    pub fn update_menu(
        &mut self,
        menu_id: &MenuId,
        updates: MenuUpdates,
    ) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let menu = self
            .menus
            .iter_mut()
            .find(|menu| menu.id() == menu_id)
            .ok_or_else(|| {
                Report::new(KernelError::NotFound)
                    .attach_printable(format!("menu {menu_id:?} is not part of this client"))
            })?;
        let before = menu.version().clone();
        menu.update_properties(updates)?;
        if menu.version() != &before {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    /// Discards the menu and drops it from the live list, handing it back.
    ///
    /// Returns `None` without touching the version when the menu is not
    /// (or no longer) part of this client.
    pub fn delete_menu(&mut self, menu_id: &MenuId) -> error_stack::Result<Option<Menu>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        let Some(position) = self
            .menus
            .iter()
            .position(|menu| menu.id() == menu_id && !menu.is_discarded())
        else {
            return Ok(None);
        };
        let mut menu = self.menus.remove(position);
        menu.discard();
        self.lifecycle.increment_version();
        Ok(Some(menu))
    }

    /// Discards the client together with every menu it still owns. Deleting an
    /// already discarded client does nothing.
    pub fn delete(&mut self) {
        if self.lifecycle.is_discarded() {
            return;
        }
        for menu in &mut self.menus {
            menu.discard();
        }
        self.lifecycle.discard();
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::{Client, ClientUpdates, ContactInfo, Profile};
    use crate::entity::{Address, AuthorId, Menu, MenuUpdates, Tag, TagType};
    use crate::rule::BrokenRule;
    use crate::KernelError;

    fn profile(name: &str) -> Profile {
        Profile::new(name, Some(String::from("female")), None)
    }

    fn contact() -> ContactInfo {
        ContactInfo::new(
            Some(String::from("+55 11 99999-0000")),
            Some(String::from("ana@example.com")),
            BTreeSet::from([String::from("+55 11 99999-0000")]),
            BTreeSet::from([String::from("ana@example.com")]),
        )
    }

    fn client() -> Client {
        Client::create_client(
            AuthorId::new(Uuid::new_v4()),
            profile("Ana"),
            Some(contact()),
            None,
            BTreeSet::new(),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn create_client_starts_fresh() {
        let client = client();
        assert_eq!(client.version().as_ref(), &1);
        assert!(!client.is_discarded());
        assert!(client.menus().unwrap().is_empty());
        assert!(client.tags().unwrap().is_empty());
        assert_eq!(client.contact_info().unwrap(), Some(&contact()));
    }

    #[test]
    fn create_client_rejects_foreign_tags() {
        let author = AuthorId::new(Uuid::new_v4());
        let stranger = AuthorId::new(Uuid::new_v4());
        let report = Client::create_client(
            author,
            profile("Ana"),
            None,
            None,
            BTreeSet::from([Tag::new("k", "v", stranger, TagType::Client)]),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::BusinessRule);
    }

    #[test]
    fn same_value_keeps_version() {
        let mut client = client();
        client.set_profile(profile("Ana")).unwrap();
        client.set_contact_info(Some(contact())).unwrap();
        client.set_address(None).unwrap();
        client.set_notes(None).unwrap();
        client.set_tags(BTreeSet::new()).unwrap();
        assert_eq!(client.version().as_ref(), &1);
    }

    #[test]
    fn different_value_bumps_version_by_one() {
        let mut client = client();
        client.set_profile(profile("Bia")).unwrap();
        assert_eq!(client.version().as_ref(), &2);
        client
            .set_address(Some(Address {
                city: Some(String::from("Recife")),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(client.version().as_ref(), &3);
        client.set_notes(Some(String::from("prefers mornings"))).unwrap();
        assert_eq!(client.version().as_ref(), &4);
        assert_eq!(client.profile().unwrap().name(), "Bia");
    }

    #[test]
    fn tags_must_belong_to_author() {
        let mut client = client();
        let author = *client.author_id();
        let owned = BTreeSet::from([Tag::new("diet", "vegan", author, TagType::Client)]);
        client.set_tags(owned.clone()).unwrap();
        assert_eq!(client.tags().unwrap(), &owned);
        assert_eq!(client.version().as_ref(), &2);

        let wrong = Tag::new("k", "v", AuthorId::new(Uuid::new_v4()), TagType::Client);
        let report = client.set_tags(BTreeSet::from([wrong])).unwrap_err();
        assert_eq!(report.current_context(), &KernelError::BusinessRule);
        assert!(report.downcast_ref::<BrokenRule>().is_some());
        assert_eq!(client.tags().unwrap(), &owned);
        assert_eq!(client.version().as_ref(), &2);

        let wrong_type = Tag::new("k", "v", author, TagType::Meal);
        assert!(client.set_tags(BTreeSet::from([wrong_type])).is_err());
    }

    #[test]
    fn update_properties_bumps_once() {
        let mut client = client();
        client
            .update_properties(ClientUpdates {
                profile: Some(profile("Bia")),
                notes: Some(Some(String::from("note"))),
                contact_info: Some(None),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(client.version().as_ref(), &2);
        assert_eq!(client.contact_info().unwrap(), None);

        client
            .update_properties(ClientUpdates {
                profile: Some(profile("Bia")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(client.version().as_ref(), &2);
    }

    #[test]
    fn menus_are_created_and_updated_through_client() {
        let mut client = client();
        let menu_id = client.create_menu(Some(String::from("week 1")), BTreeSet::new()).unwrap();
        assert_eq!(client.version().as_ref(), &2);

        let menu = client.find_menu(&menu_id).unwrap().unwrap();
        assert_eq!(menu.client_id(), client.id());
        assert_eq!(menu.author_id(), client.author_id());

        client
            .update_menu(
                &menu_id,
                MenuUpdates {
                    description: Some(Some(String::from("week 2"))),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(client.version().as_ref(), &3);

        client
            .update_menu(
                &menu_id,
                MenuUpdates {
                    description: Some(Some(String::from("week 2"))),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(client.version().as_ref(), &3);

        let missing = crate::entity::MenuId::new(Uuid::new_v4());
        let report = client.update_menu(&missing, MenuUpdates::default()).unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
    }

    #[test]
    fn delete_menu_discards_and_removes() {
        let mut client = client();
        let menu_id = client.create_menu(None, BTreeSet::new()).unwrap();
        let version = client.version().clone();

        let deleted = client.delete_menu(&menu_id).unwrap().unwrap();
        assert!(deleted.is_discarded());
        assert_eq!(client.version().as_ref(), &(version.as_ref() + 1));
        assert!(client.menus().unwrap().is_empty());
        assert!(client.discarded_menus().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_or_repeated_menu_is_noop() {
        let mut client = client();
        let menu_id = client.create_menu(None, BTreeSet::new()).unwrap();
        let deleted = client.delete_menu(&menu_id).unwrap().unwrap();
        let version = client.version().clone();

        assert!(client.delete_menu(&menu_id).unwrap().is_none());
        assert_eq!(client.version(), &version);
        assert!(deleted.is_discarded());

        let other = crate::entity::MenuId::new(Uuid::new_v4());
        assert!(client.delete_menu(&other).unwrap().is_none());
        assert_eq!(client.version(), &version);
    }

    #[test]
    fn delete_cascades_and_guards() {
        let mut client = client();
        client.create_menu(None, BTreeSet::new()).unwrap();
        client.delete();
        assert!(client.is_discarded());
        let version = client.version().clone();

        assert_eq!(
            client.profile().unwrap_err().current_context(),
            &KernelError::Discarded
        );
        assert!(client.menus().is_err());
        assert!(client.set_notes(None).is_err());
        assert!(client.create_menu(None, BTreeSet::new()).is_err());

        client.delete();
        assert_eq!(client.version(), &version);

        let destruct = client.into_destruct();
        assert!(destruct.menus.iter().all(|menu| menu.is_discarded()));
    }

    #[test]
    fn restore_rejects_menu_of_another_author() {
        let mut client = client();
        let menu_id = client.create_menu(None, BTreeSet::new()).unwrap();
        let restored = Client::restore(client.clone().into_destruct()).unwrap();
        assert_eq!(restored, client);

        let mut destruct = client.into_destruct();
        let menu = destruct
            .menus
            .iter()
            .position(|menu| menu.id() == &menu_id)
            .unwrap();
        let mut foreign = destruct.menus.remove(menu).into_destruct();
        foreign.author_id = AuthorId::new(Uuid::new_v4());
        destruct.menus.push(Menu::restore(foreign).unwrap());

        let report = Client::restore(destruct).unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Validation);
    }
}
