use destructure::Destructure;
use vodca::References;

use crate::entity::{RecipeId, UserId};

/// A user's score of a recipe, from 0 to 5 on both axes.
#[derive(Debug, Clone, Hash, Eq, PartialEq, References, Destructure)]
pub struct Rating {
    user_id: UserId,
    recipe_id: RecipeId,
    taste: u8,
    convenience: u8,
    comment: Option<String>,
}

impl Rating {
    pub const MAX_SCORE: u8 = 5;

    pub fn new(
        user_id: UserId,
        recipe_id: RecipeId,
        taste: u8,
        convenience: u8,
        comment: Option<String>,
    ) -> Self {
        Self {
            user_id,
            recipe_id,
            taste,
            convenience,
            comment,
        }
    }
}
