use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use minidom::Element;
use reqwest::{header::CONTENT_TYPE, header::CONTENT_LENGTH, StatusCode};
use url::Url;

use crate::calendar::{ClientPurpose, SearchFilter};
use crate::component::{Component, ComponentKind};
use crate::error::{Error, Missing, Result};
use crate::resource::Resource;
use crate::traits::CalendarClient;
use crate::utils::{find_elem, lock, xml_escape};


/// Where an object lives on the server
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RemoteObject {
    url: Url,
    etag: Option<String>,
}

/// A session on a CalDAV calendar, opened by a [`Client`](crate::client::Client).
#[derive(Debug)]
pub struct RemoteCalendar {
    source_uid: String,
    resource: Resource,
    purpose: ClientPurpose,

    known_objects: Mutex<HashMap<String, RemoteObject>>,
}

fn component_name(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Event => "VEVENT",
        ComponentKind::Todo => "VTODO",
    }
}

/// Build a calendar-query REPORT body
fn calendar_query(component: Option<&str>, uid: Option<&str>) -> String {
    let inner = match (component, uid) {
        (None, _) => String::new(),
        (Some(comp), None) => format!(r#"<c:comp-filter name="{}" />"#, comp),
        (Some(comp), Some(uid)) => format!(
            r#"<c:comp-filter name="{}"><c:prop-filter name="UID"><c:text-match collation="i;octet">{}</c:text-match></c:prop-filter></c:comp-filter>"#,
            comp, xml_escape(uid)),
    };

    format!(r#"
    <c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
        <d:prop>
            <d:getetag />
            <c:calendar-data />
        </d:prop>
        <c:filter>
            <c:comp-filter name="VCALENDAR">{}</c:comp-filter>
        </c:filter>
    </c:calendar-query>
"#, inner)
}

/// Extract the objects contained in the `<response>`s of a calendar-query
pub(crate) fn parse_objects(resource: &Resource, responses: &[Element]) -> Vec<(RemoteObject, Component)> {
    let mut objects = Vec::new();
    for response in responses {
        let url = match find_elem(response, "href") {
            None => {
                log::warn!("Unable to extract HREF");
                continue;
            },
            Some(href) => resource.combine(&href.text()).url().clone(),
        };

        let etag = find_elem(response, "getetag").map(|etag| etag.text());

        let component = match find_elem(response, "calendar-data").map(|data| crate::ical::parse(&data.text())) {
            None => {
                log::warn!("No calendar data for {}, ignoring it", url);
                continue;
            },
            Some(Err(err)) => {
                log::warn!("Unable to parse {}: {}. Ignoring it", url, err);
                continue;
            },
            Some(Ok(component)) => component,
        };

        objects.push((RemoteObject { url, etag }, component));
    }
    objects
}

impl RemoteCalendar {
    pub(crate) fn new(source_uid: String, resource: Resource, purpose: ClientPurpose) -> Self {
        Self {
            source_uid,
            resource: resource.as_collection(),
            purpose,
            known_objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn source_uid(&self) -> &str {
        &self.source_uid
    }

    fn purpose_kind(&self) -> ComponentKind {
        match self.purpose {
            ClientPurpose::Events => ComponentKind::Event,
            ClientPurpose::Tasks => ComponentKind::Todo,
        }
    }

    async fn query(&self, body: String) -> Result<Vec<(RemoteObject, Component)>> {
        let responses = crate::client::sub_request_and_extract_elems(&self.resource, "REPORT", body, "response").await?;
        let objects = parse_objects(&self.resource, &responses);

        let mut known = lock(&self.known_objects);
        for (object, component) in &objects {
            if let Some(uid) = component.uid() {
                known.insert(uid.to_string(), object.clone());
            }
        }
        Ok(objects)
    }

    /// Find where an object is stored, asking the server in case it is not known yet
    async fn locate(&self, uid: &str) -> Result<Option<RemoteObject>> {
        let known = lock(&self.known_objects).get(uid).cloned();
        if known.is_some() {
            return Ok(known);
        }

        let body = calendar_query(Some(component_name(self.purpose_kind())), Some(uid));
        let found = self.query(body).await?
            .into_iter()
            .find(|(_, component)| component.uid() == Some(uid))
            .map(|(object, _)| object);
        Ok(found)
    }
}

#[async_trait]
impl CalendarClient for RemoteCalendar {
    async fn create_object(&mut self, mut component: Component) -> Result<String> {
        if component.kind() != self.purpose_kind() {
            return Err(Error::Backend(format!("A {:?} session cannot store a {}", self.purpose, component.kind().name())));
        }
        let uid = component.ensure_uid();
        let ical_text = crate::ical::build_from(&component)?;
        let url = self.resource.url().join(&format!("{}.ics", uid))?;

        let response = reqwest::Client::new()
            .put(url.clone())
            .header("If-None-Match", "*")
            .header(CONTENT_TYPE, "text/calendar")
            .header(CONTENT_LENGTH, ical_text.len())
            .basic_auth(self.resource.username(), Some(self.resource.password()))
            .body(ical_text)
            .send()
            .await?;

        if response.status() == StatusCode::PRECONDITION_FAILED {
            return Err(Error::Backend(format!("An item with uid {} already exists in {}", uid, self.source_uid)));
        }
        if response.status().is_success() == false {
            return Err(Error::Backend(format!("Unexpected HTTP status code {:?}", response.status())));
        }

        let etag = response.headers().get("ETag")
            .and_then(|etag| etag.to_str().ok())
            .map(String::from);
        lock(&self.known_objects).insert(uid.clone(), RemoteObject { url, etag });
        log::info!("Created {} {} in {}", component.kind().name(), uid, self.source_uid);
        Ok(uid)
    }

    async fn get_object(&self, uid: &str) -> Result<Option<Component>> {
        let body = calendar_query(Some(component_name(self.purpose_kind())), Some(uid));
        Ok(self.query(body).await?
            .into_iter()
            .map(|(_, component)| component)
            .find(|component| component.uid() == Some(uid)))
    }

    async fn modify_object(&mut self, component: &Component) -> Result<()> {
        let uid = component.uid()
            .ok_or_else(|| Error::Backend("Cannot modify an item that has no uid".into()))?;
        let object = self.locate(uid).await?
            .ok_or_else(|| Error::NotFound(Missing::Item(uid.to_string())))?;
        let ical_text = crate::ical::build_from(component)?;

        let mut request = reqwest::Client::new()
            .put(object.url.clone())
            .header(CONTENT_TYPE, "text/calendar")
            .header(CONTENT_LENGTH, ical_text.len())
            .basic_auth(self.resource.username(), Some(self.resource.password()));
        if let Some(etag) = &object.etag {
            request = request.header("If-Match", etag.as_str());
        }
        let response = request.body(ical_text).send().await?;

        if response.status().is_success() == false {
            return Err(Error::Backend(format!("Unexpected HTTP status code {:?}", response.status())));
        }

        let etag = response.headers().get("ETag")
            .and_then(|etag| etag.to_str().ok())
            .map(String::from);
        lock(&self.known_objects).insert(uid.to_string(), RemoteObject { url: object.url, etag });
        log::info!("Modified {} in {}", uid, self.source_uid);
        Ok(())
    }

    async fn remove_object(&mut self, uid: &str) -> Result<()> {
        let object = self.locate(uid).await?
            .ok_or_else(|| Error::NotFound(Missing::Item(uid.to_string())))?;

        let del_response = reqwest::Client::new()
            .delete(object.url.clone())
            .basic_auth(self.resource.username(), Some(self.resource.password()))
            .send()
            .await?;

        if del_response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(Missing::Item(uid.to_string())));
        }
        if del_response.status().is_success() == false {
            return Err(Error::Backend(format!("Unexpected HTTP status code {:?}", del_response.status())));
        }

        lock(&self.known_objects).remove(uid);
        log::info!("Removed {} from {}", uid, self.source_uid);
        Ok(())
    }

    async fn get_object_list(&self, filter: &SearchFilter) -> Result<Vec<Component>> {
        let component = match filter {
            SearchFilter::All => None,
            SearchFilter::Todos => Some(component_name(ComponentKind::Todo)),
            SearchFilter::Events => Some(component_name(ComponentKind::Event)),
        };

        let objects = self.query(calendar_query(component, None)).await
            .map_err(|err| Error::query(&self.source_uid, err))?;
        Ok(objects.into_iter()
            .map(|(_, component)| component)
            .filter(|component| filter.matches(component))
            .collect())
    }
}
