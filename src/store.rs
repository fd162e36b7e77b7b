use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use std::path::Path;
use thiserror::Error;

use crate::{
    models::{HistoryRow, Recipe, SavedRecipeRow},
    preferences::UserPreferences,
};

// Embedded migrations (compiled in)
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recipe {recipe_id} is already saved")]
    Duplicate { recipe_id: String },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("could not encode recipe: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const HISTORY_COLS: &str = "id, user_id, recipe_id, title, recipe_data, created_at";
const SAVED_COLS: &str = "id, user_id, recipe_id, recipe_data, created_at";

/// Preferences, generation history and saved recipes, keyed by user id.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// # Errors
    ///
    /// Err if the parent directory cannot be created, the database cannot be
    /// opened, or a migration fails.
    pub async fn connect(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Connect, then **run migrations**
        let pool = SqlitePool::connect_with(opts).await?;
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    /* ---------- preferences ---------- */

    /// # Errors
    ///
    /// Err if querying the db fails
    pub async fn get_preferences(&self, user_id: &str) -> StoreResult<Option<UserPreferences>> {
        let row = sqlx::query_as::<_, UserPreferences>(
            r"
            SELECT effort_level, skill_level, calorie_consciousness,
                   protein_preference, spice_level
              FROM user_preferences
             WHERE user_id = ?
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Err if querying the db fails
    pub async fn upsert_preferences(
        &self,
        user_id: &str,
        p: &UserPreferences,
    ) -> StoreResult<UserPreferences> {
        let row = sqlx::query_as::<_, UserPreferences>(
            r"
            INSERT INTO user_preferences
                (user_id, effort_level, skill_level, calorie_consciousness,
                 protein_preference, spice_level, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT (user_id) DO UPDATE SET
                effort_level          = excluded.effort_level,
                skill_level           = excluded.skill_level,
                calorie_consciousness = excluded.calorie_consciousness,
                protein_preference    = excluded.protein_preference,
                spice_level           = excluded.spice_level,
                updated_at            = CURRENT_TIMESTAMP
            RETURNING effort_level, skill_level, calorie_consciousness,
                      protein_preference, spice_level
            ",
        )
        .bind(user_id)
        .bind(p.effort_level)
        .bind(p.skill_level)
        .bind(p.calorie_consciousness)
        .bind(p.protein_preference)
        .bind(p.spice_level)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /* ---------- history ---------- */

    /// # Errors
    ///
    /// Err if the recipe cannot be encoded or the insert fails
    pub async fn insert_history(&self, user_id: &str, recipe: &Recipe) -> StoreResult<HistoryRow> {
        let data = serde_json::to_string(recipe)?;
        let sql = format!(
            r"
            INSERT INTO recipe_history (user_id, recipe_id, title, recipe_data, created_at)
            VALUES (?, ?, ?, json(?), CURRENT_TIMESTAMP)
            RETURNING {HISTORY_COLS}
            "
        );
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(user_id)
            .bind(&recipe.id)
            .bind(&recipe.title)
            .bind(data)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Err if querying the db fails
    pub async fn list_history(&self, user_id: &str, limit: i64) -> StoreResult<Vec<HistoryRow>> {
        let sql = format!(
            "SELECT {HISTORY_COLS} FROM recipe_history WHERE user_id = ? ORDER BY id DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Titles of the `limit` most recent generations, newest first.
    ///
    /// # Errors
    ///
    /// Err if querying the db fails
    pub async fn recent_titles(&self, user_id: &str, limit: i64) -> StoreResult<Vec<String>> {
        let titles: Vec<(String,)> = sqlx::query_as(
            r"SELECT title FROM recipe_history WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(titles.into_iter().map(|(t,)| t).collect())
    }

    /* ---------- saved recipes ---------- */

    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if this user already saved `recipe.id`.
    pub async fn save_recipe(&self, user_id: &str, recipe: &Recipe) -> StoreResult<SavedRecipeRow> {
        let data = serde_json::to_string(recipe)?;
        let sql = format!(
            r"
            INSERT INTO saved_recipes (user_id, recipe_id, recipe_data, created_at)
            VALUES (?, ?, json(?), CURRENT_TIMESTAMP)
            RETURNING {SAVED_COLS}
            "
        );
        let resp = sqlx::query_as::<_, SavedRecipeRow>(&sql)
            .bind(user_id)
            .bind(&recipe.id)
            .bind(data)
            .fetch_one(&self.pool)
            .await;

        match resp {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate {
                    recipe_id: recipe.id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns how many rows were removed; zero is not an error.
    ///
    /// # Errors
    ///
    /// Err if querying the db fails
    pub async fn unsave_recipe(&self, user_id: &str, recipe_id: &str) -> StoreResult<u64> {
        let res = sqlx::query(r"DELETE FROM saved_recipes WHERE user_id = ? AND recipe_id = ?")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Err if querying the db fails
    pub async fn list_saved(&self, user_id: &str) -> StoreResult<Vec<SavedRecipeRow>> {
        let sql =
            format!("SELECT {SAVED_COLS} FROM saved_recipes WHERE user_id = ? ORDER BY id DESC");
        let rows = sqlx::query_as::<_, SavedRecipeRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
