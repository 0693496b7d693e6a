use error_stack::Report;
use sqlx::types::Json;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use application::transfer::{
    ApiIngredient, ApiMeal, ApiRating, ApiRecipe, ApiSchema, ConversionDirection,
    ConversionError, FieldError,
};
use kernel::interface::query::MealQuery;
use kernel::interface::update::MealModifier;
use kernel::prelude::entity::{Meal, MealId, MeasureUnit, Privacy, Recipe};
use kernel::KernelError;

use crate::database::postgres::model::{
    tags_from_models, tags_to_models, NutriFactsModel, TagModel,
};
use crate::database::postgres::{column_from_u32, column_to_u32, validated, PostgresConnection};
use crate::error::ConvertError;

pub struct PostgresMealRepository;

#[async_trait::async_trait]
impl MealQuery for PostgresMealRepository {
    type Transaction = PostgresConnection;
    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &MealId,
    ) -> error_stack::Result<Option<Meal>, KernelError> {
        PgMealInternal::find_by_id(con.inner(), id).await
    }
}

#[async_trait::async_trait]
impl MealModifier for PostgresMealRepository {
    type Transaction = PostgresConnection;

    async fn create(
        &self,
        con: &mut PostgresConnection,
        meal: &Meal,
    ) -> error_stack::Result<(), KernelError> {
        PgMealInternal::create(con.inner(), meal).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        meal: &Meal,
        removed: &[Recipe],
    ) -> error_stack::Result<(), KernelError> {
        PgMealInternal::update(con.inner(), meal, removed).await
    }
}

fn privacy_to_column(privacy: Privacy) -> &'static str {
    match privacy {
        Privacy::Private => "private",
        Privacy::Public => "public",
    }
}

fn privacy_from_column(column: &str) -> error_stack::Result<Privacy, ConversionError> {
    match column {
        "private" => Ok(Privacy::Private),
        "public" => Ok(Privacy::Public),
        other => Err(Report::new(
            ConversionError::new(ApiRecipe::SCHEMA, ConversionDirection::OrmToApi, other)
                .with_errors(vec![FieldError::new(
                    "privacy",
                    "enum",
                    format!("unknown privacy {other}"),
                )]),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct IngredientModel {
    name: String,
    quantity: f64,
    unit: MeasureUnit,
    position: u32,
    full_text: Option<String>,
    product_id: Option<Uuid>,
}

impl From<&ApiIngredient> for IngredientModel {
    fn from(ingredient: &ApiIngredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity,
            unit: ingredient.unit,
            position: ingredient.position,
            full_text: ingredient.full_text.clone(),
            product_id: ingredient.product_id,
        }
    }
}

impl From<IngredientModel> for ApiIngredient {
    fn from(model: IngredientModel) -> Self {
        Self {
            name: model.name,
            quantity: model.quantity,
            unit: model.unit,
            position: model.position,
            full_text: model.full_text,
            product_id: model.product_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct RatingModel {
    user_id: Uuid,
    recipe_id: Uuid,
    taste: u8,
    convenience: u8,
    comment: Option<String>,
}

impl From<&ApiRating> for RatingModel {
    fn from(rating: &ApiRating) -> Self {
        Self {
            user_id: rating.user_id,
            recipe_id: rating.recipe_id,
            taste: rating.taste,
            convenience: rating.convenience,
            comment: rating.comment.clone(),
        }
    }
}

impl From<RatingModel> for ApiRating {
    fn from(model: RatingModel) -> Self {
        Self {
            user_id: model.user_id,
            recipe_id: model.recipe_id,
            taste: model.taste,
            convenience: model.convenience,
            comment: model.comment,
        }
    }
}

/// Computed columns are written for reporting queries and ignored on read;
/// the domain recomputes them from the recipes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct MealRow {
    id: Uuid,
    name: String,
    author_id: Uuid,
    menu_id: Option<Uuid>,
    description: Option<String>,
    notes: Option<String>,
    liked: Option<bool>,
    image_url: Option<String>,
    tags: Json<Vec<TagModel>>,
    nutri_facts: Option<Json<NutriFactsModel>>,
    weight_in_grams: Option<i64>,
    total_time: Option<i64>,
    calorie_density: Option<f64>,
    carbo_percentage: Option<f64>,
    protein_percentage: Option<f64>,
    total_fat_percentage: Option<f64>,
    version: i64,
    discarded: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<&ApiMeal> for MealRow {
    fn from(meal: &ApiMeal) -> Self {
        Self {
            id: meal.id,
            name: meal.name.clone(),
            author_id: meal.author_id,
            menu_id: meal.menu_id,
            description: meal.description.clone(),
            notes: meal.notes.clone(),
            liked: meal.like,
            image_url: meal.image_url.clone(),
            tags: Json(tags_to_models(&meal.tags)),
            nutri_facts: meal.nutri_facts.as_ref().map(|facts| Json(facts.into())),
            weight_in_grams: column_from_u32(meal.weight_in_grams),
            total_time: column_from_u32(meal.total_time),
            calorie_density: meal.calorie_density,
            carbo_percentage: meal.carbo_percentage,
            protein_percentage: meal.protein_percentage,
            total_fat_percentage: meal.total_fat_percentage,
            version: meal.version,
            discarded: meal.discarded,
            created_at: meal.created_at,
            updated_at: meal.updated_at,
        }
    }
}

impl MealRow {
    fn into_api(self, recipes: Vec<RecipeRow>) -> error_stack::Result<ApiMeal, ConversionError> {
        let recipes = recipes
            .into_iter()
            .map(ApiRecipe::try_from)
            .collect::<error_stack::Result<Vec<_>, _>>()?;
        validated(ApiMeal {
            id: self.id,
            name: self.name,
            author_id: self.author_id,
            menu_id: self.menu_id,
            description: self.description,
            notes: self.notes,
            like: self.liked,
            image_url: self.image_url,
            tags: tags_from_models(self.tags.0),
            recipes,
            nutri_facts: self.nutri_facts.map(|Json(facts)| facts.into()),
            weight_in_grams: column_to_u32::<ApiMeal>("weight_in_grams", self.weight_in_grams)?,
            total_time: column_to_u32::<ApiMeal>("total_time", self.total_time)?,
            calorie_density: self.calorie_density,
            carbo_percentage: self.carbo_percentage,
            protein_percentage: self.protein_percentage,
            total_fat_percentage: self.total_fat_percentage,
            version: self.version,
            discarded: self.discarded,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct RecipeRow {
    id: Uuid,
    meal_id: Uuid,
    author_id: Uuid,
    name: String,
    description: Option<String>,
    instructions: String,
    utensils: Option<String>,
    total_time: Option<i64>,
    notes: Option<String>,
    tags: Json<Vec<TagModel>>,
    privacy: String,
    ingredients: Json<Vec<IngredientModel>>,
    ratings: Json<Vec<RatingModel>>,
    nutri_facts: Option<Json<NutriFactsModel>>,
    weight_in_grams: Option<i64>,
    image_url: Option<String>,
    average_taste_rating: Option<f64>,
    average_convenience_rating: Option<f64>,
    version: i64,
    discarded: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<&ApiRecipe> for RecipeRow {
    fn from(recipe: &ApiRecipe) -> Self {
        Self {
            id: recipe.id,
            meal_id: recipe.meal_id,
            author_id: recipe.author_id,
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            instructions: recipe.instructions.clone(),
            utensils: recipe.utensils.clone(),
            total_time: column_from_u32(recipe.total_time),
            notes: recipe.notes.clone(),
            tags: Json(tags_to_models(&recipe.tags)),
            privacy: privacy_to_column(recipe.privacy).to_string(),
            ingredients: Json(recipe.ingredients.iter().map(IngredientModel::from).collect()),
            ratings: Json(recipe.ratings.iter().map(RatingModel::from).collect()),
            nutri_facts: recipe.nutri_facts.as_ref().map(|facts| Json(facts.into())),
            weight_in_grams: column_from_u32(recipe.weight_in_grams),
            image_url: recipe.image_url.clone(),
            average_taste_rating: recipe.average_taste_rating,
            average_convenience_rating: recipe.average_convenience_rating,
            version: recipe.version,
            discarded: recipe.discarded,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

impl TryFrom<RecipeRow> for ApiRecipe {
    type Error = Report<ConversionError>;
    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        validated(ApiRecipe {
            id: row.id,
            meal_id: row.meal_id,
            author_id: row.author_id,
            name: row.name,
            description: row.description,
            instructions: row.instructions,
            utensils: row.utensils,
            total_time: column_to_u32::<ApiRecipe>("total_time", row.total_time)?,
            notes: row.notes,
            tags: tags_from_models(row.tags.0),
            privacy: privacy_from_column(&row.privacy)?,
            ingredients: row.ingredients.0.into_iter().map(ApiIngredient::from).collect(),
            ratings: row.ratings.0.into_iter().map(ApiRating::from).collect(),
            nutri_facts: row.nutri_facts.map(|Json(facts)| facts.into()),
            weight_in_grams: column_to_u32::<ApiRecipe>("weight_in_grams", row.weight_in_grams)?,
            image_url: row.image_url,
            average_taste_rating: row.average_taste_rating,
            average_convenience_rating: row.average_convenience_rating,
            version: row.version,
            discarded: row.discarded,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(in crate::database) struct PgMealInternal;

impl PgMealInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &MealId,
    ) -> error_stack::Result<Option<Meal>, KernelError> {
        let row = sqlx::query_as::<_, MealRow>(
            // language=postgresql
            r#"
            SELECT id, name, author_id, menu_id, description, notes, liked, image_url, tags,
                   nutri_facts, weight_in_grams, total_time, calorie_density,
                   carbo_percentage, protein_percentage, total_fat_percentage,
                   version, discarded, created_at, updated_at
            FROM meals
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
        let recipes = sqlx::query_as::<_, RecipeRow>(
            // language=postgresql
            r#"
            SELECT id, meal_id, author_id, name, description, instructions, utensils, total_time,
                   notes, tags, privacy, ingredients, ratings, nutri_facts, weight_in_grams,
                   image_url, average_taste_rating, average_convenience_rating,
                   version, discarded, created_at, updated_at
            FROM recipes
            WHERE meal_id = $1 AND discarded = false
            ORDER BY created_at, id
            "#,
        )
        .bind(id.as_ref())
        .fetch_all(&mut *con)
        .await
        .convert_error()?;
        let api = row.into_api(recipes).convert_error()?;
        let meal = api.to_domain().convert_error()?;
        Ok(Some(meal))
    }

    async fn create(con: &mut PgConnection, meal: &Meal) -> error_stack::Result<(), KernelError> {
        let api = ApiMeal::from_domain(meal).convert_error()?;
        api.ensure_valid(ConversionDirection::ApiToOrm)
            .convert_error()?;
        let row = MealRow::from(&api);
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO meals (id, name, author_id, menu_id, description, notes, liked, image_url, tags,
                               nutri_facts, weight_in_grams, total_time, calorie_density,
                               carbo_percentage, protein_percentage, total_fat_percentage,
                               version, discarded, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.author_id)
        .bind(row.menu_id)
        .bind(row.description)
        .bind(row.notes)
        .bind(row.liked)
        .bind(row.image_url)
        .bind(row.tags)
        .bind(row.nutri_facts)
        .bind(row.weight_in_grams)
        .bind(row.total_time)
        .bind(row.calorie_density)
        .bind(row.carbo_percentage)
        .bind(row.protein_percentage)
        .bind(row.total_fat_percentage)
        .bind(row.version)
        .bind(row.discarded)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *con)
        .await
        .convert_error()?;
        for recipe in &api.recipes {
            Self::upsert_recipe(con, RecipeRow::from(recipe)).await?;
        }
        tracing::debug!(meal_id = %api.id, recipes = api.recipes.len(), "meal inserted");
        Ok(())
    }

    async fn update(
        con: &mut PgConnection,
        meal: &Meal,
        removed: &[Recipe],
    ) -> error_stack::Result<(), KernelError> {
        let Some(loaded) = meal.persisted_version() else {
            return Err(Report::new(KernelError::Concurrency)
                .attach_printable(format!("meal {} was never loaded", meal.id().as_ref())));
        };
        let loaded = *loaded.as_ref();
        let api = ApiMeal::from_domain(meal).convert_error()?;
        api.ensure_valid(ConversionDirection::ApiToOrm)
            .convert_error()?;
        let row = MealRow::from(&api);
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE meals
            SET name = $2, menu_id = $3, description = $4, notes = $5, liked = $6,
                image_url = $7, tags = $8, nutri_facts = $9, weight_in_grams = $10,
                total_time = $11, calorie_density = $12, carbo_percentage = $13,
                protein_percentage = $14, total_fat_percentage = $15,
                version = $16, discarded = $17, updated_at = $18
            WHERE id = $1 AND version = $19
            "#,
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.menu_id)
        .bind(row.description)
        .bind(row.notes)
        .bind(row.liked)
        .bind(row.image_url)
        .bind(row.tags)
        .bind(row.nutri_facts)
        .bind(row.weight_in_grams)
        .bind(row.total_time)
        .bind(row.calorie_density)
        .bind(row.carbo_percentage)
        .bind(row.protein_percentage)
        .bind(row.total_fat_percentage)
        .bind(row.version)
        .bind(row.discarded)
        .bind(row.updated_at)
        .bind(loaded)
        .execute(&mut *con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::Concurrency).attach_printable(format!(
                "meal {} is missing or no longer at version {loaded}",
                row.id
            )));
        }
        for recipe in &api.recipes {
            Self::upsert_recipe(con, RecipeRow::from(recipe)).await?;
        }
        for recipe in removed {
            let recipe = ApiRecipe::from_domain(recipe).convert_error()?;
            Self::upsert_recipe(con, RecipeRow::from(&recipe)).await?;
        }
        tracing::debug!(
            meal_id = %api.id,
            version = api.version,
            removed_recipes = removed.len(),
            "meal updated"
        );
        Ok(())
    }

    async fn upsert_recipe(
        con: &mut PgConnection,
        row: RecipeRow,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO recipes (id, meal_id, author_id, name, description, instructions, utensils,
                                 total_time, notes, tags, privacy, ingredients, ratings, nutri_facts,
                                 weight_in_grams, image_url, average_taste_rating,
                                 average_convenience_rating, version, discarded, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            ON CONFLICT (id) DO UPDATE
            SET name = excluded.name, description = excluded.description,
                instructions = excluded.instructions, utensils = excluded.utensils,
                total_time = excluded.total_time, notes = excluded.notes, tags = excluded.tags,
                privacy = excluded.privacy, ingredients = excluded.ingredients,
                ratings = excluded.ratings, nutri_facts = excluded.nutri_facts,
                weight_in_grams = excluded.weight_in_grams, image_url = excluded.image_url,
                average_taste_rating = excluded.average_taste_rating,
                average_convenience_rating = excluded.average_convenience_rating,
                version = excluded.version, discarded = excluded.discarded,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.id)
        .bind(row.meal_id)
        .bind(row.author_id)
        .bind(row.name)
        .bind(row.description)
        .bind(row.instructions)
        .bind(row.utensils)
        .bind(row.total_time)
        .bind(row.notes)
        .bind(row.tags)
        .bind(row.privacy)
        .bind(row.ingredients)
        .bind(row.ratings)
        .bind(row.nutri_facts)
        .bind(row.weight_in_grams)
        .bind(row.image_url)
        .bind(row.average_taste_rating)
        .bind(row.average_convenience_rating)
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
