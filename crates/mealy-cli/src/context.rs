//! Wiring shared by the commands that talk to a status store.

use mealy_core::remote::Household;
use mealy_core::storage::data_dir;
use mealy_core::{
    Config, Database, HttpStatusStore, InMemoryStatusStore, MealSession, StatusStore,
};
use std::path::PathBuf;
use std::sync::Arc;

const OFFLINE_HOUSEHOLD_FILE: &str = "offline_household.json";
const OFFLINE_DB_FILE: &str = "mealy-offline.db";
const OFFLINE_DEFAULT_MEMBER: &str = "asha";

/// A ready session plus whatever must be written back afterwards.
pub struct Context {
    pub config: Config,
    pub session: Arc<MealSession>,
    offline: Option<InMemoryStatusStore>,
}

impl Context {
    pub fn build(offline: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;

        let store: Arc<dyn StatusStore>;
        let persistence: Arc<Database>;
        let mut offline_store = None;
        let mut member_uid = config.member_uid().map(str::to_string);
        if offline {
            // Offline period state is kept apart from the real one.
            persistence = Arc::new(Database::open_at(&data_dir()?.join(OFFLINE_DB_FILE))?);
            let household = InMemoryStatusStore::new(load_household()?);
            let uid = member_uid.get_or_insert_with(|| OFFLINE_DEFAULT_MEMBER.to_string());
            store = Arc::new(household.acting_as(uid.clone()));
            offline_store = Some(household);
        } else {
            persistence = Arc::new(Database::open()?);
            store = Arc::new(HttpStatusStore::from_config(&config)?);
        }
        tracing::debug!("using {} status store", store.name());

        let session = MealSession::new(store, persistence)
            .with_schedule(config.fallback_schedule()?)
            .with_member_uid(member_uid);

        Ok(Self {
            config,
            session: Arc::new(session),
            offline: offline_store,
        })
    }

    /// Persist the offline household, if any.
    pub fn finish(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(store) = &self.offline {
            let json = serde_json::to_string_pretty(&store.household())?;
            std::fs::write(household_path()?, json)?;
        }
        Ok(())
    }
}

fn household_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join(OFFLINE_HOUSEHOLD_FILE))
}

fn load_household() -> Result<Household, Box<dyn std::error::Error>> {
    let path = household_path()?;
    match std::fs::read_to_string(&path) {
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Household::demo()),
        Err(e) => Err(e.into()),
    }
}

/// Print a serializable value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
