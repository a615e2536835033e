//! This module provides a local backend, that stores its sources and items in a JSON file

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::calendar::cached_calendar::CachedCalendar;
use crate::calendar::{CalendarSource, ClientPurpose, ExtensionKind};
use crate::component::Component;
use crate::error::{Error, Result};
use crate::mock_behaviour::MockBehaviour;
use crate::traits::SourceRegistry;
use crate::utils::lock;


/// A backend that stores its sources and items in a local file
#[derive(Debug)]
pub struct Cache {
    store: Arc<Store>,
}

/// The state shared by a [`Cache`] and the [`CachedCalendar`]s it opened
#[derive(Debug)]
pub(crate) struct Store {
    backing_file: PathBuf,
    data: Mutex<CachedData>,
    mock_behaviours: Mutex<HashMap<String, MockBehaviour>>,
}

#[derive(Default, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct CachedData {
    /// Sources, in enumeration order
    pub(crate) sources: Vec<CalendarSource>,
    /// Items of every source, by source uid
    #[serde(default)]
    pub(crate) items: BTreeMap<String, Vec<StoredItem>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredItem {
    pub(crate) uid: String,
    /// The iCal file of this item
    pub(crate) ical: String,
}

impl Cache {
    /// Initialize a cache from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = match std::fs::File::open(path) {
            Err(err) => {
                return Err(Error::Backend(format!("Unable to open file {:?}: {}", path, err)));
            },
            Ok(file) => serde_json::from_reader(file)?,
        };

        Ok(Self::with_data(path, data))
    }

    /// Initialize a cache with the default contents
    pub fn new(path: &Path) -> Self {
        Self::with_data(path, CachedData::default())
    }

    /// Load the backing file if it exists, or start an empty cache
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::info!("No cache file at {:?}, starting with an empty one", path);
            Ok(Self::new(path))
        }
    }

    fn with_data(path: &Path, data: CachedData) -> Self {
        Self {
            store: Arc::new(Store {
                backing_file: PathBuf::from(path),
                data: Mutex::new(data),
                mock_behaviours: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn backing_file(&self) -> &Path {
        &self.store.backing_file
    }

    /// Store the current Cache to its backing file
    pub fn save_to_file(&self) -> Result<()> {
        self.store.save()
    }

    /// Register a source. A source with the same uid is replaced
    pub fn add_source(&mut self, source: CalendarSource) {
        let mut data = lock(&self.store.data);
        match data.sources.iter_mut().find(|s| s.uid() == source.uid()) {
            Some(existing) => *existing = source,
            None => data.sources.push(source),
        }
    }

    /// Store an item in a source, without going through a client session.
    /// A uid is assigned in case the component has none.
    pub fn add_component(&mut self, source_uid: &str, mut component: Component) -> Result<String> {
        let uid = component.ensure_uid();
        let ical = crate::ical::build_from(&component)?;
        lock(&self.store.data).items
            .entry(source_uid.to_string())
            .or_insert_with(Vec::new)
            .push(StoredItem { uid: uid.clone(), ical });
        Ok(uid)
    }

    /// Make a source misbehave (see [`MockBehaviour`])
    pub fn set_mock_behaviour(&mut self, source_uid: &str, behaviour: MockBehaviour) {
        lock(&self.store.mock_behaviours).insert(source_uid.to_string(), behaviour);
    }

    /// Returns the items a source contains, in storage order
    pub fn components(&self, source_uid: &str) -> Result<Vec<Component>> {
        self.store.components(source_uid)
    }
}

impl Store {
    pub(crate) fn data(&self) -> MutexGuard<'_, CachedData> {
        lock(&self.data)
    }

    pub(crate) fn save(&self) -> Result<()> {
        let text = serde_json::to_string_pretty(&*self.data())?;
        if let Some(parent) = self.backing_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.backing_file, text)?;
        log::debug!("Saved cache to {:?}", self.backing_file);
        Ok(())
    }

    /// Run a [`MockBehaviour`] check for a source. Sources with no behaviour always succeed
    pub(crate) fn check<F>(&self, source_uid: &str, can: F) -> Result<(), String>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), String>,
    {
        match lock(&self.mock_behaviours).get_mut(source_uid) {
            None => Ok(()),
            Some(behaviour) => can(behaviour),
        }
    }

    pub(crate) fn components(&self, source_uid: &str) -> Result<Vec<Component>> {
        let items = self.data().items.get(source_uid).cloned().unwrap_or_default();
        let mut components = Vec::with_capacity(items.len());
        for item in items {
            match crate::ical::parse(&item.ical) {
                Ok(component) => components.push(component),
                Err(err) => log::warn!("Unable to parse item {} of source {}: {}. Ignoring it", item.uid, source_uid, err),
            }
        }
        Ok(components)
    }
}

#[async_trait]
impl SourceRegistry for Cache {
    type Client = CachedCalendar;

    async fn list_sources(&self, kind: ExtensionKind) -> Result<Vec<CalendarSource>> {
        Ok(self.store.data().sources.iter()
            .filter(|source| source.has_extension(kind))
            .cloned()
            .collect())
    }

    async fn ref_source(&self, uid: &str) -> Result<Option<CalendarSource>> {
        Ok(self.store.data().sources.iter()
            .find(|source| source.uid() == uid)
            .cloned())
    }

    async fn connect(&self, source: &CalendarSource, purpose: ClientPurpose) -> Result<Self::Client> {
        self.store.check(source.uid(), MockBehaviour::can_connect)
            .map_err(|err| Error::connection(source.uid(), err))?;

        let known = self.store.data().sources.iter().any(|s| s.uid() == source.uid());
        if known == false {
            return Err(Error::connection(source.uid(), "no such source in this cache"));
        }

        log::debug!("Opened a {:?} session on {}", purpose, source.uid());
        Ok(CachedCalendar::new(source.uid().to_string(), purpose, Arc::clone(&self.store)))
    }
}
