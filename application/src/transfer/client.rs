use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use kernel::prelude::entity::{
    Address, AuthorId, Client, ClientId, ContactInfo, DestructClient, Profile, TagType,
};

use crate::transfer::{
    check_chronology, check_tags, domain_rejected, restore_lifecycle, tags_from_domain,
    tags_to_domain, ApiMenu, ApiSchema, ApiTag, ConversionDirection, ConversionError, FieldError,
};

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]{5,19}$").unwrap());

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiAddress {
    #[validate(length(max = 255))]
    pub street: Option<String>,
    #[validate(length(max = 32))]
    pub number: Option<String>,
    #[validate(length(max = 16))]
    pub zip_code: Option<String>,
    #[validate(length(max = 255))]
    pub district: Option<String>,
    #[validate(length(max = 255))]
    pub city: Option<String>,
    #[validate(length(max = 64))]
    pub state: Option<String>,
    #[validate(length(max = 255))]
    pub complement: Option<String>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

impl ApiSchema for ApiAddress {
    const SCHEMA: &'static str = "ApiAddress";
}

impl ApiAddress {
    pub fn from_domain(address: &Address) -> error_stack::Result<Self, ConversionError> {
        let api = Self {
            street: address.street.clone(),
            number: address.number.clone(),
            zip_code: address.zip_code.clone(),
            district: address.district.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            complement: address.complement.clone(),
            note: address.note.clone(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Address, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(Address {
            street: self.street.clone(),
            number: self.number.clone(),
            zip_code: self.zip_code.clone(),
            district: self.district.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            complement: self.complement.clone(),
            note: self.note.clone(),
        })
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiContactInfo {
    #[validate(regex(path = "*PHONE"))]
    pub main_phone: Option<String>,
    #[validate(email)]
    pub main_email: Option<String>,
    pub all_phones: BTreeSet<String>,
    pub all_emails: BTreeSet<String>,
}

impl ApiSchema for ApiContactInfo {
    const SCHEMA: &'static str = "ApiContactInfo";

    fn check_invariants(&self) -> Vec<FieldError> {
        let phones = self
            .all_phones
            .iter()
            .filter(|phone| !PHONE.is_match(phone))
            .map(|phone| FieldError::new("all_phones", "regex", format!("{phone} is not a phone number")));
        let emails = self
            .all_emails
            .iter()
            .filter(|email| !email.validate_email())
            .map(|email| FieldError::new("all_emails", "email", format!("{email} is not an email")));
        phones.chain(emails).collect()
    }
}

impl ApiContactInfo {
    pub fn from_domain(contact_info: &ContactInfo) -> error_stack::Result<Self, ConversionError> {
        let api = Self {
            main_phone: contact_info.main_phone().clone(),
            main_email: contact_info.main_email().clone(),
            all_phones: contact_info.all_phones().clone(),
            all_emails: contact_info.all_emails().clone(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<ContactInfo, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(ContactInfo::new(
            self.main_phone.clone(),
            self.main_email.clone(),
            self.all_phones.clone(),
            self.all_emails.clone(),
        ))
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiProfile {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 32))]
    pub sex: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub birthday: Option<Date>,
}

impl ApiSchema for ApiProfile {
    const SCHEMA: &'static str = "ApiProfile";

    fn check_invariants(&self) -> Vec<FieldError> {
        match self.birthday {
            Some(birthday) if birthday > OffsetDateTime::now_utc().date() => vec![FieldError::new(
                "birthday",
                "future_date",
                "birthday lies in the future",
            )],
            _ => Vec::new(),
        }
    }
}

impl ApiProfile {
    pub fn from_domain(profile: &Profile) -> error_stack::Result<Self, ConversionError> {
        let api = Self {
            name: profile.name().clone(),
            sex: profile.sex().clone(),
            birthday: *profile.birthday(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Profile, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(Profile::new(self.name.clone(), self.sex.clone(), self.birthday))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiClient {
    pub id: Uuid,
    pub author_id: Uuid,
    #[validate(nested)]
    pub profile: ApiProfile,
    #[validate(nested)]
    pub contact_info: Option<ApiContactInfo>,
    #[validate(nested)]
    pub address: Option<ApiAddress>,
    pub tags: BTreeSet<ApiTag>,
    #[validate(nested)]
    pub menus: Vec<ApiMenu>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub onboarding_data: Option<serde_json::Value>,
    #[validate(range(min = 1))]
    pub version: i64,
    pub discarded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ApiSchema for ApiClient {
    const SCHEMA: &'static str = "ApiClient";

    fn check_invariants(&self) -> Vec<FieldError> {
        let mut errors = check_tags("tags", &self.tags, &self.author_id, TagType::Client);
        errors.extend(
            self.profile
                .check_invariants()
                .into_iter()
                .map(|error| error.nested_in("profile")),
        );
        if let Some(contact_info) = &self.contact_info {
            errors.extend(
                contact_info
                    .check_invariants()
                    .into_iter()
                    .map(|error| error.nested_in("contact_info")),
            );
        }
        for (index, menu) in self.menus.iter().enumerate() {
            let path = format!("menus[{index}]");
            errors.extend(
                menu.check_invariants()
                    .into_iter()
                    .map(|error| error.nested_in(&path)),
            );
            if menu.client_id != self.id {
                errors.push(FieldError::new(
                    format!("{path}.client_id"),
                    "owner",
                    "menu belongs to another client",
                ));
            }
            if menu.author_id != self.author_id {
                errors.push(FieldError::new(
                    format!("{path}.author_id"),
                    "owner",
                    "menu belongs to another author",
                ));
            }
        }
        if let Some(data) = &self.onboarding_data {
            if !data.is_object() {
                errors.push(FieldError::new(
                    "onboarding_data",
                    "type",
                    "onboarding data must be a JSON object",
                ));
            }
        }
        errors.extend(check_chronology(self.created_at, self.updated_at));
        errors
    }
}

impl ApiClient {
    pub fn from_domain(client: &Client) -> error_stack::Result<Self, ConversionError> {
        let DestructClient {
            id,
            author_id,
            profile,
            contact_info,
            address,
            tags,
            menus,
            notes,
            onboarding_data,
            lifecycle,
        } = client.clone().into_destruct();
        let api = Self {
            id: id.into(),
            author_id: author_id.into(),
            profile: ApiProfile::from_domain(&profile)?,
            contact_info: contact_info
                .as_ref()
                .map(ApiContactInfo::from_domain)
                .transpose()?,
            address: address.as_ref().map(ApiAddress::from_domain).transpose()?,
            tags: tags_from_domain(&tags)?,
            menus: menus
                .iter()
                .map(ApiMenu::from_domain)
                .collect::<error_stack::Result<_, _>>()?,
            notes,
            onboarding_data,
            version: *lifecycle.version().as_ref(),
            discarded: lifecycle.is_discarded(),
            created_at: *lifecycle.created_at().as_ref(),
            updated_at: *lifecycle.updated_at().as_ref(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Client, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        let client = DestructClient {
            id: ClientId::new(self.id),
            author_id: AuthorId::new(self.author_id),
            profile: self.profile.to_domain()?,
            contact_info: self
                .contact_info
                .as_ref()
                .map(ApiContactInfo::to_domain)
                .transpose()?,
            address: self.address.as_ref().map(ApiAddress::to_domain).transpose()?,
            tags: tags_to_domain(&self.tags)?,
            menus: self
                .menus
                .iter()
                .map(ApiMenu::to_domain)
                .collect::<error_stack::Result<_, _>>()?,
            notes: self.notes.clone(),
            onboarding_data: self.onboarding_data.clone(),
            lifecycle: restore_lifecycle(
                self.version,
                self.discarded,
                self.created_at,
                self.updated_at,
            ),
        };
        Client::restore(client).map_err(|report| domain_rejected(self, report))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use serde_json::json;
    use time::macros::date;
    use time::Duration;
    use uuid::Uuid;

    use kernel::prelude::entity::{
        Address, AuthorId, Client, ContactInfo, MenuUpdates, Profile, Tag, TagType,
    };

    use super::{ApiClient, ApiContactInfo, ApiProfile};
    use crate::transfer::ApiSchema;

    fn client() -> Client {
        let author = AuthorId::new(Uuid::new_v4());
        let mut client = Client::create_client(
            author,
            Profile::new("Ana", Some(String::from("female")), Some(date!(1990 - 04 - 12))),
            Some(ContactInfo::new(
                Some(String::from("+55 81 99999-0000")),
                Some(String::from("ana@example.com")),
                BTreeSet::from([String::from("+55 81 99999-0000")]),
                BTreeSet::from([String::from("ana@example.com")]),
            )),
            Some(Address {
                city: Some(String::from("Recife")),
                ..Default::default()
            }),
            BTreeSet::from([Tag::new("goal", "bulk", author, TagType::Client)]),
            Some(String::from("allergic to peanuts")),
            Some(json!({"answers": {"age": 34}})),
        )
        .unwrap();
        let menu_id = client
            .create_menu(
                Some(String::from("week 1")),
                BTreeSet::from([Tag::new("phase", "1", author, TagType::Menu)]),
            )
            .unwrap();
        client
            .update_menu(
                &menu_id,
                MenuUpdates {
                    description: Some(Some(String::from("week one"))),
                    ..Default::default()
                },
            )
            .unwrap();
        client
    }

    #[test]
    fn domain_round_trip_preserves_every_field() {
        let client = client();
        let api = ApiClient::from_domain(&client).unwrap();
        assert_eq!(api.version, 3);
        assert_eq!(api.menus.len(), 1);
        assert_eq!(api.to_domain().unwrap(), client);
    }

    #[test]
    fn json_round_trip() {
        let api = ApiClient::from_domain(&client()).unwrap();
        let json = api.to_json().unwrap();
        assert!(json.contains(r#""birthday":"1990-04-12""#));
        assert_eq!(ApiClient::from_json(&json).unwrap(), api);
    }

    #[test]
    fn discarded_client_converts_with_flag() {
        let mut client = client();
        client.delete();
        let api = ApiClient::from_domain(&client).unwrap();
        assert!(api.discarded);
        assert!(api.menus.iter().all(|menu| menu.discarded));
        assert!(api.to_domain().unwrap().is_discarded());
    }

    #[test]
    fn foreign_tag_is_rejected() {
        let mut api = ApiClient::from_domain(&client()).unwrap();
        let mut tag = api.tags.pop_first().unwrap();
        tag.author_id = Uuid::new_v4();
        api.tags.insert(tag);
        let report = api.to_domain().unwrap_err();
        assert!(report.current_context().has_error_on("tags"));
    }

    #[test]
    fn menu_of_other_client_is_rejected() {
        let mut api = ApiClient::from_domain(&client()).unwrap();
        api.menus[0].client_id = Uuid::new_v4();
        let report = api.to_json().unwrap_err();
        assert!(report.current_context().has_error_on("menus[0].client_id"));
    }

    #[test]
    fn field_errors_are_collected_together() {
        let mut api = ApiClient::from_domain(&client()).unwrap();
        api.profile.name = String::new();
        api.version = 0;
        if let Some(contact_info) = api.contact_info.as_mut() {
            contact_info.main_email = Some(String::from("not-an-email"));
        }
        let error = api.to_json().unwrap_err();
        let error = error.current_context();
        assert!(error.has_error_on("profile.name"));
        assert!(error.has_error_on("version"));
        assert!(error.has_error_on("contact_info.main_email"));
    }

    #[test]
    fn contact_sets_are_checked() {
        let contact_info = ApiContactInfo {
            all_phones: BTreeSet::from([String::from("call me")]),
            all_emails: BTreeSet::from([String::from("ana@example.com"), String::from("nope")]),
            ..Default::default()
        };
        let errors = contact_info.check_invariants();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn birthday_uses_iso_date() {
        let profile = ApiProfile::from_json(r#"{"name":"Ana","sex":null,"birthday":"1990-04-12"}"#)
            .unwrap();
        assert_eq!(profile.birthday, Some(date!(1990 - 04 - 12)));
        assert!(ApiProfile::from_json(r#"{"name":"Ana","birthday":"12/04/1990"}"#).is_err());
        assert!(ApiProfile::from_json(r#"{"name":"Ana","birthday":"2999-01-01"}"#).is_err());
    }

    #[test]
    fn update_before_creation_is_rejected() {
        let mut api = ApiClient::from_domain(&client()).unwrap();
        api.updated_at = api.created_at - Duration::days(1);
        let report = api.to_json().unwrap_err();
        assert!(report.current_context().has_error_on("updated_at"));

        api.updated_at = api.created_at;
        api.menus[0].updated_at = api.menus[0].created_at - Duration::days(1);
        let report = api.to_domain().unwrap_err();
        assert!(report.current_context().has_error_on("menus[0].updated_at"));
    }
}
