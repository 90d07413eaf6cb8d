//! Production backends: the Hackpad API and one git repository per site.

use crate::client::http::HackpadClient;
use crate::commands::run::SiteBackends;
use crate::config::BackupConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::model::SiteName;
use crate::store::git::GitStore;

/// Opens [`HackpadClient`]s and [`GitStore`]s as described by a config.
///
/// The API key file is read on the first service request, so commands that
/// never talk to the network work without it.
pub struct LiveSites<'a> {
    config: &'a BackupConfig,
    credentials: Option<Credentials>,
}

impl<'a> LiveSites<'a> {
    pub fn new(config: &'a BackupConfig) -> Self {
        Self {
            config,
            credentials: None,
        }
    }

    pub fn with_credentials(config: &'a BackupConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials: Some(credentials),
        }
    }

    fn credentials(&mut self) -> Result<&Credentials> {
        if self.credentials.is_none() {
            self.credentials = Some(Credentials::load(&self.config.api_keys_file)?);
        }
        Ok(self.credentials.get_or_insert_with(Credentials::default))
    }

    fn with_identity(&self, store: GitStore) -> GitStore {
        store.with_fallback_identity(&self.config.author_name, &self.config.author_email)
    }
}

impl SiteBackends for LiveSites<'_> {
    type Service = HackpadClient;
    type Store = GitStore;

    fn open_service(&mut self, site: &SiteName) -> Result<HackpadClient> {
        let key = self.credentials()?.get(site)?.clone();
        HackpadClient::new(self.config, site, key)
    }

    fn open_store(&mut self, site: &SiteName) -> Result<GitStore> {
        let store = GitStore::open_or_init(&self.config.site_dir(site))?;
        Ok(self.with_identity(store))
    }

    fn existing_store(&mut self, site: &SiteName) -> Result<Option<GitStore>> {
        let store = GitStore::open_existing(&self.config.site_dir(site))?;
        Ok(store.map(|s| self.with_identity(s)))
    }
}
