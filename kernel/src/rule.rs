use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};

use error_stack::Report;

use crate::entity::{AuthorId, Ingredient, Rating, Tag, TagType, UserId};
use crate::KernelError;

/// Cross-field invariant checked on values that are already well-formed.
pub trait BusinessRule {
    fn name(&self) -> &'static str;
    fn is_broken(&self) -> bool;
    fn message(&self) -> String;
}

/// Attached to every `KernelError::BusinessRule` report.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BrokenRule {
    pub rule: &'static str,
    pub message: String,
}

impl Display for BrokenRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

pub fn check_rule(rule: impl BusinessRule) -> error_stack::Result<(), KernelError> {
    if rule.is_broken() {
        return Err(Report::new(KernelError::BusinessRule).attach_printable(BrokenRule {
            rule: rule.name(),
            message: rule.message(),
        }));
    }
    Ok(())
}

/// Every tag must belong to the owner's author and carry the owner's kind.
pub struct TagsOwnedBy<'a, I> {
    tags: I,
    author_id: &'a AuthorId,
    tag_type: TagType,
}

impl<'a, I> TagsOwnedBy<'a, I>
where
    I: IntoIterator<Item = &'a Tag> + Clone,
{
    pub fn new(tags: I, author_id: &'a AuthorId, tag_type: TagType) -> Self {
        Self {
            tags,
            author_id,
            tag_type,
        }
    }

    pub fn first_mismatch(&self) -> Option<&'a Tag> {
        self.tags
            .clone()
            .into_iter()
            .find(|tag| !tag.is_owned_by(self.author_id, self.tag_type))
    }
}

impl<'a> TagsOwnedBy<'a, &'a BTreeSet<Tag>> {
    pub fn of(tags: &'a BTreeSet<Tag>, author_id: &'a AuthorId, tag_type: TagType) -> Self {
        Self::new(tags, author_id, tag_type)
    }
}

impl<'a, I> BusinessRule for TagsOwnedBy<'a, I>
where
    I: IntoIterator<Item = &'a Tag> + Clone,
{
    fn name(&self) -> &'static str {
        "TagsOwnedBy"
    }

    fn is_broken(&self) -> bool {
        self.first_mismatch().is_some()
    }

    fn message(&self) -> String {
        match self.first_mismatch() {
            Some(tag) => format!(
                "tag {tag} does not belong to author {} as a {} tag",
                self.author_id.as_ref(),
                self.tag_type
            ),
            None => String::from("all tags belong to their owner"),
        }
    }
}

/// No two ingredients of a recipe may share a position.
pub struct IngredientPositionsAreUnique<'a> {
    ingredients: &'a [Ingredient],
}

impl<'a> IngredientPositionsAreUnique<'a> {
    pub fn new(ingredients: &'a [Ingredient]) -> Self {
        Self { ingredients }
    }

    fn duplicate(&self) -> Option<u32> {
        let mut seen = HashSet::new();
        self.ingredients
            .iter()
            .map(|ingredient| *ingredient.position())
            .find(|position| !seen.insert(*position))
    }
}

impl BusinessRule for IngredientPositionsAreUnique<'_> {
    fn name(&self) -> &'static str {
        "IngredientPositionsAreUnique"
    }

    fn is_broken(&self) -> bool {
        self.duplicate().is_some()
    }

    fn message(&self) -> String {
        match self.duplicate() {
            Some(position) => format!("more than one ingredient at position {position}"),
            None => String::from("ingredient positions are unique"),
        }
    }
}

/// A user rates a recipe at most once.
pub struct RatingsAreUniquePerUser<'a> {
    ratings: &'a [Rating],
}

impl<'a> RatingsAreUniquePerUser<'a> {
    pub fn new(ratings: &'a [Rating]) -> Self {
        Self { ratings }
    }

    fn duplicate(&self) -> Option<&'a UserId> {
        let mut seen = HashSet::new();
        self.ratings
            .iter()
            .map(Rating::user_id)
            .find(|user_id| !seen.insert(*user_id))
    }
}

impl BusinessRule for RatingsAreUniquePerUser<'_> {
    fn name(&self) -> &'static str {
        "RatingsAreUniquePerUser"
    }

    fn is_broken(&self) -> bool {
        self.duplicate().is_some()
    }

    fn message(&self) -> String {
        match self.duplicate() {
            Some(user_id) => format!("user {} rated more than once", user_id.as_ref()),
            None => String::from("every user rated at most once"),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::{
        check_rule, BrokenRule, BusinessRule, IngredientPositionsAreUnique,
        RatingsAreUniquePerUser, TagsOwnedBy,
    };
    use crate::entity::{
        AuthorId, Ingredient, MeasureUnit, Rating, RecipeId, Tag, TagType, UserId,
    };
    use crate::KernelError;

    #[test]
    fn accepts_owned_tags() {
        let author = AuthorId::new(Uuid::new_v4());
        let tags = BTreeSet::from([
            Tag::new("diet", "vegan", author, TagType::Client),
            Tag::new("goal", "weight", author, TagType::Client),
        ]);
        assert!(!TagsOwnedBy::of(&tags, &author, TagType::Client).is_broken());
        assert!(check_rule(TagsOwnedBy::of(&tags, &author, TagType::Client)).is_ok());
    }

    #[test]
    fn reports_foreign_author() {
        let author = AuthorId::new(Uuid::new_v4());
        let stranger = AuthorId::new(Uuid::new_v4());
        let tags = BTreeSet::from([Tag::new("k", "v", stranger, TagType::Client)]);

        let report = check_rule(TagsOwnedBy::of(&tags, &author, TagType::Client)).unwrap_err();
        assert_eq!(report.current_context(), &KernelError::BusinessRule);
        let broken = report.downcast_ref::<BrokenRule>().unwrap();
        assert_eq!(broken.rule, "TagsOwnedBy");
        assert!(broken.message.contains("k:v"));
    }

    #[test]
    fn reports_wrong_type() {
        let author = AuthorId::new(Uuid::new_v4());
        let tags = BTreeSet::from([Tag::new("k", "v", author, TagType::Recipe)]);
        let rule = TagsOwnedBy::of(&tags, &author, TagType::Meal);
        assert!(rule.is_broken());
        assert_eq!(rule.first_mismatch().map(Tag::tag_type), Some(&TagType::Recipe));
    }

    #[test]
    fn reports_duplicate_positions() {
        let ingredients = vec![
            Ingredient::new("rice", 100.0, MeasureUnit::Gram, 0, None, None),
            Ingredient::new("beans", 80.0, MeasureUnit::Gram, 1, None, None),
        ];
        assert!(!IngredientPositionsAreUnique::new(&ingredients).is_broken());

        let ingredients = vec![
            Ingredient::new("rice", 100.0, MeasureUnit::Gram, 1, None, None),
            Ingredient::new("beans", 80.0, MeasureUnit::Gram, 1, None, None),
        ];
        let rule = IngredientPositionsAreUnique::new(&ingredients);
        assert!(rule.is_broken());
        assert!(rule.message().contains("position 1"));
    }

    #[test]
    fn reports_repeated_rater() {
        let recipe_id = RecipeId::new(Uuid::new_v4());
        let ana = UserId::new(Uuid::new_v4());
        let bia = UserId::new(Uuid::new_v4());
        let ratings = vec![
            Rating::new(ana, recipe_id, 4, 3, None),
            Rating::new(bia, recipe_id, 5, 5, None),
        ];
        assert!(!RatingsAreUniquePerUser::new(&ratings).is_broken());

        let ratings = vec![
            Rating::new(ana, recipe_id, 4, 3, None),
            Rating::new(ana, recipe_id, 1, 1, None),
        ];
        let report = check_rule(RatingsAreUniquePerUser::new(&ratings)).unwrap_err();
        assert_eq!(report.current_context(), &KernelError::BusinessRule);
        let broken = report.downcast_ref::<BrokenRule>().unwrap();
        assert_eq!(broken.rule, "RatingsAreUniquePerUser");
    }
}
