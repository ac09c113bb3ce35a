//! SQLite-backed persistence for app install records.
//!
//! One row per installed app, carrying the raw license document blob.
//! The UNIQUE constraint on `slug` is the serialization point for
//! duplicate license acceptance: the second caller creating the same app
//! fails with `Conflict` instead of silently duplicating state.

use crate::error::{StoreError, StoreResult};
use charter_types::{slugify, App, AppId, InstallState, InstallStatus, UpstreamRef};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::sync::{Arc, Mutex};

/// Raw column values of one app row, before decoding.
type AppRow = (String, String, String, String, bool, String, String);

const APP_COLUMNS: &str = "id, name, slug, upstream_ref, is_airgap_supported, install_state, created_at";

/// Store for apps and their raw license documents, backed by SQLite.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) a store at the given path.
    pub fn new(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS app (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                upstream_ref TEXT NOT NULL,
                license TEXT NOT NULL,
                is_airgap_supported INTEGER NOT NULL DEFAULT 0,
                install_state TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── App records ──────────────────────────────────────────────

    /// Creates the app record for an accepted license.
    ///
    /// The slug is derived from `name`. Creating a second app with the
    /// same slug fails with `Conflict`; concurrent duplicate submissions
    /// are serialized here rather than in the callers.
    pub fn create_app(
        &self,
        name: &str,
        upstream_ref: &UpstreamRef,
        raw_license: &str,
        is_airgap_supported: bool,
    ) -> StoreResult<App> {
        let app = App {
            id: AppId::new(),
            name: name.to_string(),
            slug: slugify(name),
            upstream_ref: upstream_ref.clone(),
            is_airgap_supported,
            install_state: InstallState::LicenseAccepted,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO app (id, name, slug, upstream_ref, license, is_airgap_supported, install_state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                app.id.to_string(),
                app.name,
                app.slug,
                app.upstream_ref.as_str(),
                raw_license,
                app.is_airgap_supported,
                app.install_state.as_str(),
                encode_time(app.created_at),
            ],
        );
        match result {
            Ok(_) => Ok(app),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(app.slug))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads an app by its routing slug.
    pub fn get_app_by_slug(&self, slug: &str) -> StoreResult<App> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {APP_COLUMNS} FROM app WHERE slug = ?1"),
                params![slug],
                row_to_tuple,
            )
            .optional()?;
        match row {
            Some(row) => decode_app(row),
            None => Err(StoreError::NotFound(format!("app with slug {slug:?}"))),
        }
    }

    /// Loads an app by id.
    pub fn get_app(&self, id: AppId) -> StoreResult<App> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {APP_COLUMNS} FROM app WHERE id = ?1"),
                params![id.to_string()],
                row_to_tuple,
            )
            .optional()?;
        match row {
            Some(row) => decode_app(row),
            None => Err(StoreError::NotFound(format!("app {id}"))),
        }
    }

    /// Lists all installed apps, oldest first.
    pub fn list_installed_apps(&self) -> StoreResult<Vec<App>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {APP_COLUMNS} FROM app ORDER BY created_at"))?;
        let rows = stmt.query_map([], row_to_tuple)?;

        let mut apps = Vec::new();
        for row in rows {
            apps.push(decode_app(row?)?);
        }
        Ok(apps)
    }

    /// Returns the single installed app.
    ///
    /// The platform compatibility query assumes a single-tenant
    /// deployment; this is where that precondition lives. Zero apps is
    /// `NotFound`, more than one is `MultipleApps`.
    pub fn single_installed_app(&self) -> StoreResult<App> {
        let mut apps = self.list_installed_apps()?;
        match apps.len() {
            0 => Err(StoreError::NotFound("no app is installed".to_string())),
            1 => Ok(apps.remove(0)),
            n => Err(StoreError::MultipleApps(n)),
        }
    }

    // ── License blobs ────────────────────────────────────────────

    /// Loads the raw license document persisted for an app.
    ///
    /// An app row with an empty license column counts as not found: a
    /// resume cannot proceed without the document.
    pub fn get_license_for_app(&self, id: AppId) -> StoreResult<String> {
        let conn = self.conn.lock().unwrap();
        let license: Option<String> = conn
            .query_row(
                "SELECT license FROM app WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match license {
            Some(raw) if !raw.is_empty() => Ok(raw),
            _ => Err(StoreError::NotFound(format!("license for app {id}"))),
        }
    }

    /// Replaces the raw license document persisted for an app.
    pub fn update_app_license(&self, id: AppId, raw_license: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE app SET license = ?2 WHERE id = ?1",
            params![id.to_string(), raw_license],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("app {id}")));
        }
        Ok(())
    }

    // ── Install state ────────────────────────────────────────────

    /// Moves an app to a new install state.
    pub fn set_install_state(&self, id: AppId, state: InstallState) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE app SET install_state = ?2 WHERE id = ?1",
            params![id.to_string(), state.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("app {id}")));
        }
        Ok(())
    }

    /// Projects the current install state for polling clients.
    ///
    /// Reports `NoLicense` when no app record exists. With multiple
    /// records (not expected in a single-tenant deployment) the most
    /// recent wins.
    pub fn pending_install_status(&self) -> StoreResult<InstallStatus> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT slug, install_state FROM app ORDER BY created_at DESC LIMIT 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        match row {
            None => Ok(InstallStatus::none()),
            Some((slug, state)) => Ok(InstallStatus {
                state: decode_state(&state)?,
                slug: Some(slug),
            }),
        }
    }
}

fn row_to_tuple(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_app(row: AppRow) -> StoreResult<App> {
    let (id, name, slug, upstream_ref, is_airgap_supported, state, created_at) = row;
    let id = AppId::parse(&id)
        .map_err(|e| StoreError::InvalidRecord(format!("app id {id:?}: {e}")))?;
    let install_state = decode_state(&state)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::InvalidRecord(format!("created_at {created_at:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(App {
        id,
        name,
        slug,
        upstream_ref: UpstreamRef::from_raw(upstream_ref),
        is_airgap_supported,
        install_state,
        created_at,
    })
}

fn decode_state(state: &str) -> StoreResult<InstallState> {
    state
        .parse()
        .map_err(|e: charter_types::Error| StoreError::InvalidRecord(e.to_string()))
}

// Fixed-width fraction keeps lexicographic order chronological, and full
// nanosecond precision round-trips `created_at` exactly.
fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
