use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use kernel::prelude::entity::{
    AuthorId, ClientId, DestructMenu, MealId, Menu, MenuId, MenuMeal, TagType, Weekday,
};

use crate::transfer::{
    check_chronology, check_tags, domain_rejected, restore_lifecycle, tags_from_domain,
    tags_to_domain, ApiSchema, ApiTag, ConversionDirection, ConversionError, FieldError,
};

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiMenuMeal {
    pub meal_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub meal_name: String,
    #[validate(range(min = 1))]
    pub week: u32,
    pub weekday: Weekday,
    #[validate(length(min = 1, max = 64))]
    pub meal_type: String,
}

impl ApiSchema for ApiMenuMeal {
    const SCHEMA: &'static str = "ApiMenuMeal";
}

impl ApiMenuMeal {
    pub fn from_domain(meal: &MenuMeal) -> error_stack::Result<Self, ConversionError> {
        let api = Self {
            meal_id: *meal.meal_id().as_ref(),
            meal_name: meal.meal_name().clone(),
            week: *meal.week(),
            weekday: *meal.weekday(),
            meal_type: meal.meal_type().clone(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<MenuMeal, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(MenuMeal::new(
            MealId::new(self.meal_id),
            self.meal_name.clone(),
            self.week,
            self.weekday,
            self.meal_type.clone(),
        ))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiMenu {
    pub id: Uuid,
    pub client_id: Uuid,
    pub author_id: Uuid,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub tags: BTreeSet<ApiTag>,
    pub meals: BTreeSet<ApiMenuMeal>,
    #[validate(range(min = 1))]
    pub version: i64,
    pub discarded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ApiSchema for ApiMenu {
    const SCHEMA: &'static str = "ApiMenu";

    fn check_invariants(&self) -> Vec<FieldError> {
        let mut errors = check_tags("tags", &self.tags, &self.author_id, TagType::Menu);
        for meal in &self.meals {
            if let Err(invalid) = meal.validate() {
                errors.extend(
                    FieldError::flatten(&invalid)
                        .into_iter()
                        .map(|error| error.nested_in("meals")),
                );
            }
        }
        errors.extend(check_chronology(self.created_at, self.updated_at));
        errors
    }
}

impl ApiMenu {
    pub fn from_domain(menu: &Menu) -> error_stack::Result<Self, ConversionError> {
        let DestructMenu {
            id,
            client_id,
            author_id,
            description,
            tags,
            meals,
            lifecycle,
        } = menu.clone().into_destruct();
        let api = Self {
            id: id.into(),
            client_id: client_id.into(),
            author_id: author_id.into(),
            description,
            tags: tags_from_domain(&tags)?,
            meals: meals
                .iter()
                .map(ApiMenuMeal::from_domain)
                .collect::<error_stack::Result<_, _>>()?,
            version: *lifecycle.version().as_ref(),
            discarded: lifecycle.is_discarded(),
            created_at: *lifecycle.created_at().as_ref(),
            updated_at: *lifecycle.updated_at().as_ref(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Menu, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        let menu = DestructMenu {
            id: MenuId::new(self.id),
            client_id: ClientId::new(self.client_id),
            author_id: AuthorId::new(self.author_id),
            description: self.description.clone(),
            tags: tags_to_domain(&self.tags)?,
            meals: self
                .meals
                .iter()
                .map(ApiMenuMeal::to_domain)
                .collect::<error_stack::Result<_, _>>()?,
            lifecycle: restore_lifecycle(
                self.version,
                self.discarded,
                self.created_at,
                self.updated_at,
            ),
        };
        Menu::restore(menu).map_err(|report| domain_rejected(self, report))
    }
}
