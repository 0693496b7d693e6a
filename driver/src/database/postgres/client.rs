use sqlx::types::Json;
use sqlx::PgConnection;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use application::transfer::{
    ApiAddress, ApiClient, ApiContactInfo, ApiMenu, ApiMenuMeal, ApiProfile, ApiSchema,
    ConversionDirection, ConversionError,
};
use kernel::interface::query::ClientQuery;
use kernel::interface::update::ClientModifier;
use kernel::prelude::entity::{Client, ClientId, Menu, Weekday};
use kernel::KernelError;

use crate::database::postgres::model::{tags_from_models, tags_to_models, TagModel};
use crate::database::postgres::{validated, PostgresConnection};
use crate::error::ConvertError;

pub struct PostgresClientRepository;

#[async_trait::async_trait]
impl ClientQuery for PostgresClientRepository {
    type Transaction = PostgresConnection;
    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &ClientId,
    ) -> error_stack::Result<Option<Client>, KernelError> {
        PgClientInternal::find_by_id(con.inner(), id).await
    }
}

#[async_trait::async_trait]
impl ClientModifier for PostgresClientRepository {
    type Transaction = PostgresConnection;

    async fn create(
        &self,
        con: &mut PostgresConnection,
        client: &Client,
    ) -> error_stack::Result<(), KernelError> {
        PgClientInternal::create(con.inner(), client).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        client: &Client,
        removed: &[Menu],
    ) -> error_stack::Result<(), KernelError> {
        PgClientInternal::update(con.inner(), client, removed).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct AddressModel {
    street: Option<String>,
    number: Option<String>,
    zip_code: Option<String>,
    district: Option<String>,
    city: Option<String>,
    state: Option<String>,
    complement: Option<String>,
    note: Option<String>,
}

impl From<&ApiAddress> for AddressModel {
    fn from(address: &ApiAddress) -> Self {
        Self {
            street: address.street.clone(),
            number: address.number.clone(),
            zip_code: address.zip_code.clone(),
            district: address.district.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            complement: address.complement.clone(),
            note: address.note.clone(),
        }
    }
}

impl From<AddressModel> for ApiAddress {
    fn from(model: AddressModel) -> Self {
        Self {
            street: model.street,
            number: model.number,
            zip_code: model.zip_code,
            district: model.district,
            city: model.city,
            state: model.state,
            complement: model.complement,
            note: model.note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct MenuMealModel {
    meal_id: Uuid,
    meal_name: String,
    week: u32,
    weekday: Weekday,
    meal_type: String,
}

impl From<&ApiMenuMeal> for MenuMealModel {
    fn from(meal: &ApiMenuMeal) -> Self {
        Self {
            meal_id: meal.meal_id,
            meal_name: meal.meal_name.clone(),
            week: meal.week,
            weekday: meal.weekday,
            meal_type: meal.meal_type.clone(),
        }
    }
}

impl From<MenuMealModel> for ApiMenuMeal {
    fn from(model: MenuMealModel) -> Self {
        Self {
            meal_id: model.meal_id,
            meal_name: model.meal_name,
            week: model.week,
            weekday: model.weekday,
            meal_type: model.meal_type,
        }
    }
}

/// `contact_all_phones` is NULL exactly when the client has no contact info.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    author_id: Uuid,
    name: String,
    sex: Option<String>,
    birthday: Option<Date>,
    contact_main_phone: Option<String>,
    contact_main_email: Option<String>,
    contact_all_phones: Option<Vec<String>>,
    contact_all_emails: Option<Vec<String>>,
    address: Option<Json<AddressModel>>,
    tags: Json<Vec<TagModel>>,
    notes: Option<String>,
    onboarding_data: Option<serde_json::Value>,
    version: i64,
    discarded: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<&ApiClient> for ClientRow {
    fn from(client: &ApiClient) -> Self {
        let contact = client.contact_info.as_ref();
        Self {
            id: client.id,
            author_id: client.author_id,
            name: client.profile.name.clone(),
            sex: client.profile.sex.clone(),
            birthday: client.profile.birthday,
            contact_main_phone: contact.and_then(|contact| contact.main_phone.clone()),
            contact_main_email: contact.and_then(|contact| contact.main_email.clone()),
            contact_all_phones: contact
                .map(|contact| contact.all_phones.iter().cloned().collect()),
            contact_all_emails: contact
                .map(|contact| contact.all_emails.iter().cloned().collect()),
            address: client.address.as_ref().map(|address| Json(address.into())),
            tags: Json(tags_to_models(&client.tags)),
            notes: client.notes.clone(),
            onboarding_data: client.onboarding_data.clone(),
            version: client.version,
            discarded: client.discarded,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

impl ClientRow {
    fn into_api(self, menus: Vec<MenuRow>) -> error_stack::Result<ApiClient, ConversionError> {
        let contact_info = match (self.contact_all_phones, self.contact_all_emails) {
            (None, None) => None,
            (phones, emails) => Some(ApiContactInfo {
                main_phone: self.contact_main_phone,
                main_email: self.contact_main_email,
                all_phones: phones.unwrap_or_default().into_iter().collect(),
                all_emails: emails.unwrap_or_default().into_iter().collect(),
            }),
        };
        let menus = menus
            .into_iter()
            .map(ApiMenu::try_from)
            .collect::<error_stack::Result<Vec<_>, _>>()?;
        validated(ApiClient {
            id: self.id,
            author_id: self.author_id,
            profile: ApiProfile {
                name: self.name,
                sex: self.sex,
                birthday: self.birthday,
            },
            contact_info,
            address: self.address.map(|Json(address)| address.into()),
            tags: tags_from_models(self.tags.0),
            menus,
            notes: self.notes,
            onboarding_data: self.onboarding_data,
            version: self.version,
            discarded: self.discarded,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct MenuRow {
    id: Uuid,
    client_id: Uuid,
    author_id: Uuid,
    description: Option<String>,
    tags: Json<Vec<TagModel>>,
    meals: Json<Vec<MenuMealModel>>,
    version: i64,
    discarded: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<&ApiMenu> for MenuRow {
    fn from(menu: &ApiMenu) -> Self {
        Self {
            id: menu.id,
            client_id: menu.client_id,
            author_id: menu.author_id,
            description: menu.description.clone(),
            tags: Json(tags_to_models(&menu.tags)),
            meals: Json(menu.meals.iter().map(MenuMealModel::from).collect()),
            version: menu.version,
            discarded: menu.discarded,
            created_at: menu.created_at,
            updated_at: menu.updated_at,
        }
    }
}

impl TryFrom<MenuRow> for ApiMenu {
    type Error = error_stack::Report<ConversionError>;
    fn try_from(row: MenuRow) -> Result<Self, Self::Error> {
        validated(ApiMenu {
            id: row.id,
            client_id: row.client_id,
            author_id: row.author_id,
            description: row.description,
            tags: tags_from_models(row.tags.0),
            meals: row.meals.0.into_iter().map(ApiMenuMeal::from).collect(),
            version: row.version,
            discarded: row.discarded,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(in crate::database) struct PgClientInternal;

impl PgClientInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &ClientId,
    ) -> error_stack::Result<Option<Client>, KernelError> {
        let row = sqlx::query_as::<_, ClientRow>(
            // language=postgresql
            r#"
            SELECT id, author_id, name, sex, birthday,
                   contact_main_phone, contact_main_email, contact_all_phones, contact_all_emails,
                   address, tags, notes, onboarding_data,
                   version, discarded, created_at, updated_at
            FROM clients
            WHERE id = $1 AND discarded = false
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(&mut *con)
        .await
        .convert_error()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let menus = sqlx::query_as::<_, MenuRow>(
            // language=postgresql
            r#"
            SELECT id, client_id, author_id, description, tags, meals,
                   version, discarded, created_at, updated_at
            FROM menus
            WHERE client_id = $1 AND discarded = false
            ORDER BY created_at, id
            "#,
        )
        .bind(id.as_ref())
        .fetch_all(&mut *con)
        .await
        .convert_error()?;
        let api = row.into_api(menus).convert_error()?;
        let client = api.to_domain().convert_error()?;
        Ok(Some(client))
    }

    async fn create(con: &mut PgConnection, client: &Client) -> error_stack::Result<(), KernelError> {
        let api = ApiClient::from_domain(client).convert_error()?;
        api.ensure_valid(ConversionDirection::ApiToOrm)
            .convert_error()?;
        let row = ClientRow::from(&api);
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO clients (id, author_id, name, sex, birthday,
                                 contact_main_phone, contact_main_email, contact_all_phones, contact_all_emails,
                                 address, tags, notes, onboarding_data,
                                 version, discarded, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(row.id)
        .bind(row.author_id)
        .bind(row.name)
        .bind(row.sex)
        .bind(row.birthday)
        .bind(row.contact_main_phone)
        .bind(row.contact_main_email)
        .bind(row.contact_all_phones)
        .bind(row.contact_all_emails)
        .bind(row.address)
        .bind(row.tags)
        .bind(row.notes)
        .bind(row.onboarding_data)
        .bind(row.version)
        .bind(row.discarded)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *con)
        .await
        .convert_error()?;
        for menu in &api.menus {
            Self::upsert_menu(con, MenuRow::from(menu)).await?;
        }
        tracing::debug!(client_id = %api.id, menus = api.menus.len(), "client inserted");
        Ok(())
    }

    async fn update(
        con: &mut PgConnection,
        client: &Client,
        removed: &[Menu],
    ) -> error_stack::Result<(), KernelError> {
        let Some(loaded) = client.persisted_version() else {
            return Err(error_stack::Report::new(KernelError::Concurrency)
                .attach_printable(format!("client {} was never loaded", client.id().as_ref())));
        };
        let loaded = *loaded.as_ref();
        let api = ApiClient::from_domain(client).convert_error()?;
        api.ensure_valid(ConversionDirection::ApiToOrm)
            .convert_error()?;
        let row = ClientRow::from(&api);
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = $2, sex = $3, birthday = $4,
                contact_main_phone = $5, contact_main_email = $6,
                contact_all_phones = $7, contact_all_emails = $8,
                address = $9, tags = $10, notes = $11, onboarding_data = $12,
                version = $13, discarded = $14, updated_at = $15
            WHERE id = $1 AND version = $16
            "#,
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.sex)
        .bind(row.birthday)
        .bind(row.contact_main_phone)
        .bind(row.contact_main_email)
        .bind(row.contact_all_phones)
        .bind(row.contact_all_emails)
        .bind(row.address)
        .bind(row.tags)
        .bind(row.notes)
        .bind(row.onboarding_data)
        .bind(row.version)
        .bind(row.discarded)
        .bind(row.updated_at)
        .bind(loaded)
        .execute(&mut *con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(error_stack::Report::new(KernelError::Concurrency).attach_printable(
                format!("client {} is missing or no longer at version {loaded}", row.id),
            ));
        }
        for menu in &api.menus {
            Self::upsert_menu(con, MenuRow::from(menu)).await?;
        }
        for menu in removed {
            let menu = ApiMenu::from_domain(menu).convert_error()?;
            Self::upsert_menu(con, MenuRow::from(&menu)).await?;
        }
        tracing::debug!(
            client_id = %api.id,
            version = api.version,
            removed_menus = removed.len(),
            "client updated"
        );
        Ok(())
    }

    async fn upsert_menu(con: &mut PgConnection, row: MenuRow) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO menus (id, client_id, author_id, description, tags, meals,
                               version, discarded, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE
            SET description = excluded.description, tags = excluded.tags, meals = excluded.meals,
                version = excluded.version, discarded = excluded.discarded,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.id)
        .bind(row.client_id)
        .bind(row.author_id)
        .bind(row.description)
        .bind(row.tags)
        .bind(row.meals)
        .bind(row.version)
        .bind(row.discarded)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}
