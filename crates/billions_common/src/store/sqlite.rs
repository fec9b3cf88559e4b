//! SQLite-backed user record store.
//!
//! Location: /var/lib/billions/billions.db unless configured otherwise.

use super::{GameResultRecord, NewUser, ProfileUpdate, UserProfile, UserStore};
use crate::error::{ParseVariantError, StoreError};
use crate::leaderboard::LeaderboardKind;
use crate::progression::{Level, UserProgression};
use crate::referral::REFERRER_BONUS_POINTS;
use crate::verification::VerificationStatus;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_DB_PATH: &str = "/var/lib/billions/billions.db";

const USER_COLUMNS: &str = "id, email, username, avatar_type, referral_code, referral_count, \
     referred_by, profile_picture_url, points, experience, total_exp, level, \
     is_verified, verification_status, created_at";

/// User store backed by a single SQLite connection
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteUserStore {
    /// Open or create the store at a specific path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Internal(format!("Failed to create directory {:?}: {}", parent, e))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        debug!("User store opened at {:?}", path);
        Ok(store)
    }

    /// Throwaway store for tests and single-process tools
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Internal("user store connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL,
                avatar_type TEXT NOT NULL DEFAULT 'penguin',
                referral_code TEXT NOT NULL UNIQUE,
                referral_count INTEGER NOT NULL DEFAULT 0,
                referred_by TEXT,
                profile_picture_url TEXT,
                points INTEGER NOT NULL DEFAULT 1000,
                experience INTEGER NOT NULL DEFAULT 0,
                total_exp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                is_verified INTEGER NOT NULL DEFAULT 0,
                verification_status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS game_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                game_id TEXT NOT NULL,
                points_earned INTEGER NOT NULL,
                exp_earned INTEGER NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_points ON users(points);
            CREATE INDEX IF NOT EXISTS idx_users_referral_count ON users(referral_count);
            CREATE INDEX IF NOT EXISTS idx_game_results_user ON game_results(user_id);
            "#,
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        Ok(())
    }

    /// Number of game result rows logged for a member
    pub fn game_result_count(&self, user_id: &str) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM game_results WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn fetch_user(conn: &Connection, id: &str) -> Result<UserProfile, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        row_to_profile,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        avatar_type: parse_text(row, 3)?,
        referral_code: row.get(4)?,
        referral_count: row.get(5)?,
        referred_by: row.get(6)?,
        profile_picture_url: row.get(7)?,
        progression: UserProgression {
            points: row.get(8)?,
            experience: row.get(9)?,
            total_exp: row.get(10)?,
            level: Level::from_i64(row.get(11)?),
        },
        is_verified: row.get(12)?,
        verification_status: parse_text(row, 13)?,
        created_at: row.get(14)?,
    })
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseVariantError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Uniqueness violations become `Conflict`, everything else stays a database error
fn map_write_error(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, message) = &err {
        if code.code == ErrorCode::ConstraintViolation {
            return StoreError::Conflict(message.clone().unwrap_or_else(|| code.to_string()));
        }
    }
    StoreError::Sqlite(err)
}

fn level_column(level: Level) -> i64 {
    i64::from(level.value())
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user: &NewUser) -> Result<UserProfile, StoreError> {
        let conn = self.conn()?;
        let progression = UserProgression::new(user.starting_points);

        conn.execute(
            r#"
            INSERT INTO users (id, email, username, avatar_type, referral_code, points,
                               level, experience, total_exp, is_verified, verification_status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)
            "#,
            params![
                &user.id,
                &user.email,
                &user.username,
                user.avatar_type.as_str(),
                &user.referral_code,
                progression.points,
                level_column(progression.level),
                progression.experience,
                progression.total_exp,
                VerificationStatus::Pending.as_str(),
                user.created_at,
            ],
        )
        .map_err(map_write_error)?;

        fetch_user(&conn, &user.id)
    }

    fn get_user(&self, id: &str) -> Result<UserProfile, StoreError> {
        let conn = self.conn()?;
        fetch_user(&conn, id)
    }

    fn get_progression(&self, id: &str) -> Result<UserProgression, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT points, experience, level, total_exp FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserProgression {
                    points: row.get(0)?,
                    experience: row.get(1)?,
                    level: Level::from_i64(row.get(2)?),
                    total_exp: row.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn update_progression(&self, id: &str, progression: &UserProgression) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET points = ?1, experience = ?2, total_exp = ?3, level = ?4 WHERE id = ?5",
            params![
                progression.points,
                progression.experience,
                progression.total_exp,
                level_column(progression.level),
                id
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<UserProfile, StoreError> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                r#"
                UPDATE users SET
                    username = COALESCE(?1, username),
                    avatar_type = COALESCE(?2, avatar_type),
                    profile_picture_url = COALESCE(?3, profile_picture_url)
                WHERE id = ?4
                "#,
                params![
                    &update.username,
                    update.avatar_type.map(|a| a.as_str()),
                    &update.profile_picture_url,
                    id
                ],
            )
            .map_err(map_write_error)?;

        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fetch_user(&conn, id)
    }

    fn set_verification(&self, id: &str, status: VerificationStatus) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET verification_status = ?1, is_verified = ?2 WHERE id = ?3",
            params![status.as_str(), status.is_verified(), id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn verify_with_bonus(
        &self,
        id: &str,
        bonus: &dyn Fn(&UserProgression) -> UserProgression,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let (already_verified, current) = tx
            .query_row(
                "SELECT is_verified, points, experience, level, total_exp FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, bool>(0)?,
                        UserProgression {
                            points: row.get(1)?,
                            experience: row.get(2)?,
                            level: Level::from_i64(row.get(3)?),
                            total_exp: row.get(4)?,
                        },
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if already_verified {
            return Ok(false);
        }

        let next = bonus(&current);
        tx.execute(
            "UPDATE users SET verification_status = ?1, is_verified = 1, \
             points = ?2, experience = ?3, total_exp = ?4, level = ?5 WHERE id = ?6",
            params![
                VerificationStatus::Verified.as_str(),
                next.points,
                next.experience,
                next.total_exp,
                level_column(next.level),
                id
            ],
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn record_game_result(&self, record: &GameResultRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO game_results (user_id, game_id, points_earned, exp_earned, result, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                &record.user_id,
                &record.game_id,
                record.points_earned,
                record.exp_earned,
                &record.result,
                Utc::now()
            ],
        )
        .map_err(map_write_error)?;
        Ok(())
    }

    fn process_referral_bonus(&self, referral_code: &str, new_user_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let referrer: Option<String> = tx
            .query_row(
                "SELECT id FROM users WHERE referral_code = ?1",
                params![referral_code],
                |row| row.get(0),
            )
            .optional()?;

        let Some(referrer_id) = referrer else {
            debug!("Unknown referral code {}", referral_code);
            return Ok(false);
        };

        if referrer_id == new_user_id {
            return Ok(false);
        }

        // Claim the new member first; a member can only be referred once
        let claimed = tx.execute(
            "UPDATE users SET referred_by = ?1 WHERE id = ?2 AND referred_by IS NULL",
            params![&referrer_id, new_user_id],
        )?;
        if claimed == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE users SET points = points + ?1, referral_count = referral_count + 1 WHERE id = ?2",
            params![REFERRER_BONUS_POINTS, &referrer_id],
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn top_players(&self, kind: LeaderboardKind, limit: usize) -> Result<Vec<UserProfile>, StoreError> {
        let order = match kind {
            LeaderboardKind::Points => "points DESC, username ASC",
            LeaderboardKind::Referrals => "referral_count DESC, username ASC",
            LeaderboardKind::Level => "level DESC, total_exp DESC, username ASC",
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY {} LIMIT ?1",
            USER_COLUMNS, order
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let players = stmt
            .query_map(params![limit], row_to_profile)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(players)
    }
}
