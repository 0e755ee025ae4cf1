use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::domain::{
    error::DomainError,
    models::{Channels, Teams, Users},
};

use super::util::{from_json_text, to_pretty_json_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Teams,
    Users,
    Channels,
}

impl Collection {
    pub const ALL: [Self; 3] = [Self::Teams, Self::Users, Self::Channels];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::Users => "users",
            Self::Channels => "channels",
        }
    }

    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Teams => "teams.json",
            Self::Users => "users.json",
            Self::Channels => "channels.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole-document JSON persistence for the three collections.
///
/// Every load reads the current file and every save replaces it, so concurrent
/// load-modify-save cycles on the same collection resolve as last writer wins. Saves go through a
/// temporary sibling file and a rename, so a reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
    write_seq: Arc<AtomicU64>,
}

impl JsonStore {
    pub async fn open(dir: &Path) -> Result<Self, DomainError> {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir).await.map_err(|error| {
                DomainError::Storage(format!(
                    "failed to create data directory {}: {error}",
                    dir.display()
                ))
            })?;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            write_seq: Arc::new(AtomicU64::new(0)),
        })
    }

    #[must_use]
    pub fn path_of(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Writes an empty document for every collection file that does not exist yet.
    pub async fn ensure_initialized(&self) -> Result<(), DomainError> {
        for collection in Collection::ALL {
            let path = self.path_of(collection);
            let exists = tokio::fs::try_exists(&path).await.map_err(|error| {
                DomainError::Storage(format!("failed to stat {}: {error}", path.display()))
            })?;
            if exists {
                continue;
            }

            info!("creating {}", path.display());
            match collection {
                Collection::Teams => self.save_teams(&Teams::default()).await?,
                Collection::Users => self.save_users(&Users::default()).await?,
                Collection::Channels => self.save_channels(&Channels::default()).await?,
            }
        }
        Ok(())
    }

    pub async fn load_teams(&self) -> Result<Teams, DomainError> {
        self.load(Collection::Teams).await
    }

    pub async fn save_teams(&self, teams: &Teams) -> Result<(), DomainError> {
        self.save(Collection::Teams, teams).await
    }

    pub async fn load_users(&self) -> Result<Users, DomainError> {
        self.load(Collection::Users).await
    }

    pub async fn save_users(&self, users: &Users) -> Result<(), DomainError> {
        self.save(Collection::Users, users).await
    }

    pub async fn load_channels(&self) -> Result<Channels, DomainError> {
        self.load(Collection::Channels).await
    }

    pub async fn save_channels(&self, channels: &Channels) -> Result<(), DomainError> {
        self.save(Collection::Channels, channels).await
    }

    async fn load<T>(&self, collection: Collection) -> Result<T, DomainError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_of(collection);
        debug!("reading {collection}");

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist, using empty {collection}", path.display());
                return Ok(T::default());
            }
            Err(error) => {
                return Err(DomainError::Storage(format!(
                    "failed to read {}: {error}",
                    path.display()
                )));
            }
        };

        from_json_text::<T>(&text).map_err(|error| {
            DomainError::Storage(format!("invalid {collection} document: {error}"))
        })
    }

    async fn save<T: Serialize>(&self, collection: Collection, value: &T) -> Result<(), DomainError> {
        let path = self.path_of(collection);
        debug!("writing {collection}");

        let text = to_pretty_json_text(value).map_err(|error| {
            DomainError::Storage(format!("failed to serialize {collection}: {error}"))
        })?;

        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .dir
            .join(format!(".{}.{}.{seq}.tmp", collection.file_name(), std::process::id()));

        if let Err(error) = tokio::fs::write(&staging, text.as_bytes()).await {
            return Err(DomainError::Storage(format!(
                "failed to write {}: {error}",
                staging.display()
            )));
        }

        if let Err(error) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(DomainError::Storage(format!(
                "failed to replace {}: {error}",
                path.display()
            )));
        }

        Ok(())
    }
}
