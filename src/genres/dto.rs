use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Genre;
use crate::titles::{self, TitlesInput};

#[derive(Debug, Serialize)]
pub struct GenreView {
    pub genre_id: Uuid,
    pub genre_titles: Vec<String>,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub genre_date_added: OffsetDateTime,
}

impl From<Genre> for GenreView {
    fn from(g: Genre) -> Self {
        Self {
            genre_titles: titles::decode(g.genre_titles.as_deref()),
            genre_id: g.genre_id,
            user_id: g.user_id,
            genre_date_added: g.genre_date_added,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateGenreRequest {
    pub genre_titles: Option<TitlesInput>,
    /// Defaults to the caller.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGenreRequest {
    pub genre_titles: Option<TitlesInput>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserGenresRequest {
    pub genre_titles: Option<TitlesInput>,
    /// Primary keys are immutable; present only to reject it explicitly.
    pub genre_id: Option<serde_json::Value>,
}
