use std::str::FromStr;

use landing_core::{Team, Vulnbox, VulnboxStatus};
use rand::{distr::Alphanumeric, Rng};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ctftime_id INTEGER UNIQUE,
    name TEXT NOT NULL,
    confirmed INTEGER NOT NULL DEFAULT 0,
    logo_url TEXT,
    country_code TEXT
);
CREATE TABLE IF NOT EXISTS vulnboxes (
    team_id INTEGER PRIMARY KEY REFERENCES teams(id),
    root_password TEXT,
    external_address TEXT,
    status INTEGER NOT NULL DEFAULT 0
);
"#;

const ROOT_PASSWORD_LEN: usize = 16;

/// SQLite-backed store for teams and their vulnboxes.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database exists per connection, so the pool must
        // hold exactly one and keep it alive.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("database schema applied");
        Ok(())
    }

    pub async fn get_team(&self, team_id: i64) -> Result<Team, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM teams WHERE id = ?")
            .bind(team_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(map_team(&row))
    }

    pub async fn get_team_and_vulnbox(
        &self,
        team_id: i64,
    ) -> Result<(Team, Vulnbox), sqlx::Error> {
        let row = sqlx::query(
            "SELECT t.id, t.ctftime_id, t.name, t.confirmed, t.logo_url, t.country_code, \
                    v.root_password, v.external_address, v.status \
             FROM teams t JOIN vulnboxes v ON v.team_id = t.id \
             WHERE t.id = ?",
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        let team = map_team(&row);
        let vulnbox = Vulnbox {
            team_id: team.id,
            root_password: row.get("root_password"),
            external_address: row.get("external_address"),
            status: VulnboxStatus::from_i64(row.get("status")),
        };
        Ok((team, vulnbox))
    }

    pub async fn ctftime_team_exists(&self, ctftime_id: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM teams WHERE ctftime_id = ?) AS present")
            .bind(ctftime_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("present") != 0)
    }

    /// Upsert keyed on the provider team id. A fresh team also gets its
    /// vulnbox row with a generated root password. Logo and country are
    /// only overwritten when the provider lookup produced them.
    pub async fn get_or_update_team(
        &self,
        ctftime_id: i64,
        name: &str,
        logo_url: Option<&str>,
        country_code: Option<&str>,
    ) -> Result<Team, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM teams WHERE ctftime_id = ?")
            .bind(ctftime_id)
            .fetch_optional(&mut *tx)
            .await?;

        let team_id = match existing {
            Some(row) => {
                let id: i64 = row.get("id");
                sqlx::query(
                    "UPDATE teams SET name = ?, \
                         logo_url = COALESCE(?, logo_url), \
                         country_code = COALESCE(?, country_code) \
                     WHERE id = ?",
                )
                .bind(name)
                .bind(logo_url)
                .bind(country_code)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO teams (ctftime_id, name, logo_url, country_code) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(ctftime_id)
                .bind(name)
                .bind(logo_url)
                .bind(country_code)
                .execute(&mut *tx)
                .await?;
                let id = result.last_insert_rowid();

                sqlx::query(
                    "INSERT INTO vulnboxes (team_id, root_password, status) VALUES (?, ?, ?)",
                )
                .bind(id)
                .bind(generate_root_password())
                .bind(VulnboxStatus::Uninitialized.as_i64())
                .execute(&mut *tx)
                .await?;
                info!(team_id = id, ctftime_id, "registered new team");
                id
            }
        };

        tx.commit().await?;
        self.get_team(team_id).await
    }

    pub async fn check_in(&self, team_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE teams SET confirmed = 1 WHERE id = ?")
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        info!(team_id, "team checked in");
        Ok(())
    }

    pub async fn confirmed_teams(&self) -> Result<Vec<Team>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM teams WHERE confirmed = 1 ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_team).collect())
    }

    pub async fn set_vulnbox_status(
        &self,
        team_id: i64,
        status: VulnboxStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE vulnboxes SET status = ? WHERE team_id = ?")
            .bind(status.as_i64())
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_external_address(
        &self,
        team_id: i64,
        address: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE vulnboxes SET external_address = ? WHERE team_id = ?")
            .bind(address)
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn map_team(row: &SqliteRow) -> Team {
    Team {
        id: row.get("id"),
        ctftime_id: row.get("ctftime_id"),
        name: row.get("name"),
        confirmed: row.get::<i64, _>("confirmed") != 0,
        logo_url: row.get("logo_url"),
        country_code: row.get("country_code"),
    }
}

fn generate_root_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(ROOT_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
