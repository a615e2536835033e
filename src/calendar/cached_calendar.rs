use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{Store, StoredItem};
use crate::calendar::{ClientPurpose, SearchFilter};
use crate::component::{Component, ComponentKind};
use crate::error::{Error, Missing, Result};
use crate::mock_behaviour::MockBehaviour;
use crate::traits::CalendarClient;


/// A session on a source of the [`cache`](crate::cache) module
#[derive(Debug)]
pub struct CachedCalendar {
    source_uid: String,
    purpose: ClientPurpose,
    store: Arc<Store>,
}

impl CachedCalendar {
    pub(crate) fn new(source_uid: String, purpose: ClientPurpose, store: Arc<Store>) -> Self {
        Self { source_uid, purpose, store }
    }

    pub fn source_uid(&self) -> &str {
        &self.source_uid
    }

    fn check<F>(&self, can: F) -> Result<()>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), String>,
    {
        self.store.check(&self.source_uid, can).map_err(Error::Backend)
    }

    fn accepts(&self, kind: ComponentKind) -> bool {
        match self.purpose {
            ClientPurpose::Events => kind == ComponentKind::Event,
            ClientPurpose::Tasks => kind == ComponentKind::Todo,
        }
    }
}

#[async_trait]
impl CalendarClient for CachedCalendar {
    async fn create_object(&mut self, mut component: Component) -> Result<String> {
        self.check(MockBehaviour::can_create_object)?;
        if self.accepts(component.kind()) == false {
            return Err(Error::Backend(format!("A {:?} session cannot store a {}", self.purpose, component.kind().name())));
        }

        let uid = component.ensure_uid();
        let ical = crate::ical::build_from(&component)?;
        {
            let mut data = self.store.data();
            let items = data.items.entry(self.source_uid.clone()).or_insert_with(Vec::new);
            if items.iter().any(|item| item.uid == uid) {
                return Err(Error::Backend(format!("An item with uid {} already exists in {}", uid, self.source_uid)));
            }
            items.push(StoredItem { uid: uid.clone(), ical });
        }
        self.store.save()?;
        log::info!("Created {} {} in {}", component.kind().name(), uid, self.source_uid);
        Ok(uid)
    }

    async fn get_object(&self, uid: &str) -> Result<Option<Component>> {
        self.check(MockBehaviour::can_get_object)?;
        let ical = self.store.data().items.get(&self.source_uid)
            .and_then(|items| items.iter().find(|item| item.uid == uid))
            .map(|item| item.ical.clone());

        match ical {
            None => Ok(None),
            Some(ical) => crate::ical::parse(&ical).map(Some),
        }
    }

    async fn modify_object(&mut self, component: &Component) -> Result<()> {
        self.check(MockBehaviour::can_modify_object)?;
        let uid = component.uid()
            .ok_or_else(|| Error::Backend("Cannot modify an item that has no uid".into()))?;
        let ical = crate::ical::build_from(component)?;
        {
            let mut data = self.store.data();
            let item = data.items.get_mut(&self.source_uid)
                .and_then(|items| items.iter_mut().find(|item| item.uid == uid))
                .ok_or_else(|| Error::NotFound(Missing::Item(uid.to_string())))?;
            item.ical = ical;
        }
        self.store.save()?;
        log::info!("Modified {} in {}", uid, self.source_uid);
        Ok(())
    }

    async fn remove_object(&mut self, uid: &str) -> Result<()> {
        self.check(MockBehaviour::can_remove_object)?;
        {
            let mut data = self.store.data();
            let items = data.items.get_mut(&self.source_uid)
                .ok_or_else(|| Error::NotFound(Missing::Item(uid.to_string())))?;
            let count_before = items.len();
            items.retain(|item| item.uid != uid);
            if items.len() == count_before {
                return Err(Error::NotFound(Missing::Item(uid.to_string())));
            }
        }
        self.store.save()?;
        log::info!("Removed {} from {}", uid, self.source_uid);
        Ok(())
    }

    async fn get_object_list(&self, filter: &SearchFilter) -> Result<Vec<Component>> {
        self.check(MockBehaviour::can_get_object_list)
            .map_err(|err| Error::query(&self.source_uid, err))?;

        Ok(self.store.components(&self.source_uid)?
            .into_iter()
            .filter(|component| filter.matches(component))
            .collect())
    }
}
