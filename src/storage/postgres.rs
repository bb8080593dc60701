use crate::models::{
    Country, CountrySummary, CountryTally, NewCountry, NewVisit, Visit, VisitRefs,
};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const COUNTRY_COLUMNS: &str =
    "id, name, country_code, cuisine_style, cuisine_description, visit_count, color_intensity";

const VISIT_COLUMNS: &str = "id, country_id, restaurant_name, location, items_devoured, \
     king_julien_favorite, mort_favorite, rating, is_fusion, fusion_country_id, visit_date";

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS countries (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                country_code TEXT NOT NULL UNIQUE,
                cuisine_style TEXT NOT NULL DEFAULT '',
                cuisine_description TEXT,
                visit_count BIGINT NOT NULL DEFAULT 0,
                color_intensity DOUBLE PRECISION NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_countries_cuisine ON countries(cuisine_style)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS restaurants (
                id TEXT PRIMARY KEY,
                country_id TEXT NOT NULL REFERENCES countries(id),
                restaurant_name TEXT NOT NULL,
                location TEXT NOT NULL,
                items_devoured TEXT NOT NULL DEFAULT '',
                king_julien_favorite TEXT,
                mort_favorite TEXT,
                rating INTEGER CHECK (rating BETWEEN 1 AND 5),
                is_fusion BOOLEAN NOT NULL DEFAULT FALSE,
                fusion_country_id TEXT REFERENCES countries(id),
                visit_date DATE NOT NULL DEFAULT CURRENT_DATE
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_restaurants_country ON restaurants(country_id)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_restaurants_fusion ON restaurants(fusion_country_id)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn upsert_country(&self, country: &NewCountry) -> StorageResult<Country> {
        let row = sqlx::query_as::<_, Country>(&format!(
            r#"
            INSERT INTO countries (id, name, country_code, cuisine_style, cuisine_description, visit_count, color_intensity)
            VALUES ($1, $2, $3, $4, $5, 0, 0)
            ON CONFLICT (country_code) DO UPDATE SET
                name = EXCLUDED.name,
                cuisine_style = EXCLUDED.cuisine_style,
                cuisine_description = EXCLUDED.cuisine_description
            RETURNING {COUNTRY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&country.name)
        .bind(&country.country_code)
        .bind(&country.cuisine_style)
        .bind(&country.cuisine_description)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn get_country(&self, id: &str) -> StorageResult<Option<Country>> {
        let country = sqlx::query_as::<_, Country>(&format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(country)
    }

    async fn get_country_by_code(&self, country_code: &str) -> StorageResult<Option<Country>> {
        let country = sqlx::query_as::<_, Country>(&format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries WHERE country_code = $1"
        ))
        .bind(country_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(country)
    }

    async fn count_countries(&self) -> StorageResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM countries")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count.0)
    }

    async fn list_countries(&self, cuisine: Option<&str>) -> StorageResult<Vec<CountrySummary>> {
        // NULL filter matches every row
        let countries = sqlx::query_as::<_, CountrySummary>(
            r#"
            SELECT id, name, country_code, cuisine_style
            FROM countries
            WHERE $1::TEXT IS NULL OR cuisine_style = $1
            ORDER BY name
            "#,
        )
        .bind(cuisine)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(countries)
    }

    async fn list_cuisines(&self) -> StorageResult<Vec<String>> {
        let cuisines = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT cuisine_style
            FROM countries
            WHERE cuisine_style <> ''
            ORDER BY cuisine_style
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(cuisines)
    }

    async fn country_tallies(&self) -> StorageResult<Vec<CountryTally>> {
        let tallies = sqlx::query_as::<_, CountryTally>(
            r#"
            SELECT
                c.country_code,
                c.name,
                (SELECT COUNT(*) FROM restaurants r WHERE r.country_id = c.id) AS primary_visits,
                (SELECT COUNT(*) FROM restaurants r WHERE r.fusion_country_id = c.id) AS fusion_visits
            FROM countries c
            ORDER BY c.name
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tallies)
    }

    async fn count_primary_visits(&self, country_id: &str) -> StorageResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM restaurants WHERE country_id = $1")
                .bind(country_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count.0)
    }

    async fn count_fusion_visits(&self, country_id: &str) -> StorageResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM restaurants WHERE fusion_country_id = $1")
                .bind(country_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count.0)
    }

    async fn write_country_stats(
        &self,
        country_id: &str,
        visit_count: i64,
        color_intensity: f64,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE countries
            SET visit_count = $1, color_intensity = $2
            WHERE id = $3
            "#,
        )
        .bind(visit_count)
        .bind(color_intensity)
        .bind(country_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_visit(&self, visit: &NewVisit) -> StorageResult<Visit> {
        let row = sqlx::query_as::<_, Visit>(&format!(
            r#"
            INSERT INTO restaurants ({VISIT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {VISIT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&visit.country_id)
        .bind(&visit.restaurant_name)
        .bind(&visit.location)
        .bind(&visit.items_devoured)
        .bind(&visit.king_julien_favorite)
        .bind(&visit.mort_favorite)
        .bind(visit.rating)
        .bind(visit.is_fusion)
        .bind(&visit.fusion_country_id)
        .bind(visit.visit_date)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn get_visit_refs(&self, id: &str) -> StorageResult<Option<VisitRefs>> {
        let refs = sqlx::query_as::<_, VisitRefs>(
            "SELECT country_id, is_fusion, fusion_country_id FROM restaurants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(refs)
    }

    async fn update_visit(&self, id: &str, visit: &NewVisit) -> StorageResult<Option<Visit>> {
        let row = sqlx::query_as::<_, Visit>(&format!(
            r#"
            UPDATE restaurants
            SET country_id = $1,
                restaurant_name = $2,
                location = $3,
                items_devoured = $4,
                king_julien_favorite = $5,
                mort_favorite = $6,
                rating = $7,
                is_fusion = $8,
                fusion_country_id = $9,
                visit_date = $10
            WHERE id = $11
            RETURNING {VISIT_COLUMNS}
            "#
        ))
        .bind(&visit.country_id)
        .bind(&visit.restaurant_name)
        .bind(&visit.location)
        .bind(&visit.items_devoured)
        .bind(&visit.king_julien_favorite)
        .bind(&visit.mort_favorite)
        .bind(visit.rating)
        .bind(visit.is_fusion)
        .bind(&visit.fusion_country_id)
        .bind(visit.visit_date)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn delete_visit(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_primary_visits(&self, country_id: &str) -> StorageResult<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(&format!(
            r#"
            SELECT {VISIT_COLUMNS}
            FROM restaurants
            WHERE country_id = $1
            ORDER BY visit_date DESC, id
            "#
        ))
        .bind(country_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }

    async fn list_fusion_visits(&self, country_id: &str) -> StorageResult<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(&format!(
            r#"
            SELECT {VISIT_COLUMNS}
            FROM restaurants
            WHERE fusion_country_id = $1
            ORDER BY visit_date DESC, id
            "#
        ))
        .bind(country_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }
}
