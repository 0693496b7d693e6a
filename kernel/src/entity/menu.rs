mod id;
mod menu_meal;

use std::collections::BTreeSet;

use destructure::Destructure;
use uuid::Uuid;

pub use self::{id::*, menu_meal::*};
use crate::entity::common::replace_if_changed;
use crate::entity::{
    AuthorId, ClientId, CreatedAt, Lifecycle, MealId, Tag, TagType, UpdatedAt, Version,
};
use crate::rule::{check_rule, TagsOwnedBy};
use crate::KernelError;

/// Weekly plan owned by a [`Client`](crate::entity::Client).
///
/// Menus are created and discarded only through their client.
#[derive(Debug, Clone, Eq, PartialEq, Destructure)]
pub struct Menu {
    id: MenuId,
    client_id: ClientId,
    author_id: AuthorId,
    description: Option<String>,
    tags: BTreeSet<Tag>,
    meals: BTreeSet<MenuMeal>,
    lifecycle: Lifecycle<Menu>,
}

/// Fields of a menu to change at once. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MenuUpdates {
    pub description: Option<Option<String>>,
    pub tags: Option<BTreeSet<Tag>>,
    pub meals: Option<BTreeSet<MenuMeal>>,
}

impl Menu {
    pub(crate) fn create_menu(
        client_id: ClientId,
        author_id: AuthorId,
        description: Option<String>,
        tags: BTreeSet<Tag>,
    ) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(&tags, &author_id, TagType::Menu))?;
        Ok(Self {
            id: MenuId::new(Uuid::new_v4()),
            client_id,
            author_id,
            description,
            tags,
            meals: BTreeSet::new(),
            lifecycle: Lifecycle::new(),
        })
    }

    /// Rebuilds a persisted menu, re-checking its tag ownership.
    pub fn restore(menu: DestructMenu) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(&menu.tags, &menu.author_id, TagType::Menu))?;
        Ok(menu.freeze())
    }

    pub fn id(&self) -> &MenuId {
        &self.id
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    pub fn version(&self) -> &Version<Menu> {
        self.lifecycle.version()
    }

    pub fn is_discarded(&self) -> bool {
        self.lifecycle.is_discarded()
    }

    pub fn created_at(&self) -> &CreatedAt<Menu> {
        self.lifecycle.created_at()
    }

    pub fn updated_at(&self) -> &UpdatedAt<Menu> {
        self.lifecycle.updated_at()
    }

    pub fn description(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.description.as_ref())
    }

    pub fn tags(&self) -> error_stack::Result<&BTreeSet<Tag>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.tags)
    }

    pub fn meals(&self) -> error_stack::Result<&BTreeSet<MenuMeal>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.meals)
    }

    pub fn set_description(
        &mut self,
        description: Option<String>,
    ) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.description, description) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_tags(&mut self, tags: BTreeSet<Tag>) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        check_rule(TagsOwnedBy::of(&tags, &self.author_id, TagType::Menu))?;
        if replace_if_changed(&mut self.tags, tags) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn set_meals(&mut self, meals: BTreeSet<MenuMeal>) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if replace_if_changed(&mut self.meals, meals) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn add_meal(&mut self, meal: MenuMeal) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if self.meals.insert(meal) {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    /// Unschedules every occurrence of the meal in this menu.
    pub fn remove_meal(&mut self, meal_id: &MealId) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let before = self.meals.len();
        self.meals.retain(|meal| meal.meal_id() != meal_id);
        if self.meals.len() != before {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn update_properties(&mut self, updates: MenuUpdates) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let MenuUpdates {
            description,
            tags,
            meals,
        } = updates;
        if let Some(tags) = &tags {
            check_rule(TagsOwnedBy::of(tags, &self.author_id, TagType::Menu))?;
        }
        let mut changed = false;
        if let Some(description) = description {
            changed |= replace_if_changed(&mut self.description, description);
        }
        if let Some(tags) = tags {
            changed |= replace_if_changed(&mut self.tags, tags);
        }
        if let Some(meals) = meals {
            changed |= replace_if_changed(&mut self.meals, meals);
        }
        if changed {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub(crate) fn discard(&mut self) -> bool {
        self.lifecycle.discard()
    }
}
