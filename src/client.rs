//! This module provides a client to connect to a CalDAV server

use std::convert::TryFrom;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use minidom::Element;
use url::Url;

use crate::calendar::remote_calendar::RemoteCalendar;
use crate::calendar::{CalendarSource, ClientPurpose, ExtensionKind, Extensions};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::traits::SourceRegistry;
use crate::utils::{find_elem, find_elems, lock};


static DAVCLIENT_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:">
       <d:prop>
           <d:current-user-principal />
       </d:prop>
    </d:propfind>
"#;

static HOMESET_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
      <d:self/>
      <d:prop>
        <c:calendar-home-set />
      </d:prop>
    </d:propfind>
"#;

static CAL_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
       <d:prop>
         <d:displayname />
         <d:resourcetype />
         <c:supported-calendar-component-set />
       </d:prop>
    </d:propfind>
"#;

static PING_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:">
       <d:prop>
         <d:resourcetype />
       </d:prop>
    </d:propfind>
"#;


pub(crate) async fn sub_request(resource: &Resource, method: &str, body: String, depth: u32) -> Result<String> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|err| Error::Backend(format!("Invalid HTTP method {}: {}", method, err)))?;

    let res = reqwest::Client::new()
        .request(method, resource.url().clone())
        .header("Depth", depth)
        .header(CONTENT_TYPE, "application/xml")
        .basic_auth(resource.username(), Some(resource.password()))
        .body(body)
        .send()
        .await?;

    if res.status().is_success() == false {
        return Err(Error::Backend(format!("Unexpected HTTP status code {:?} for {}", res.status(), resource.url())));
    }

    let text = res.text().await?;
    Ok(text)
}

pub(crate) async fn sub_request_and_extract_elem(resource: &Resource, body: String, items: &[&str]) -> Result<String> {
    let text = sub_request(resource, "PROPFIND", body, 0).await?;

    let root: Element = text.parse()?;
    let mut current_element: &Element = &root;
    for item in items {
        current_element = find_elem(current_element, item)
            .ok_or_else(|| Error::Backend(format!("Missing <{}> in the reply of {}", item, resource.url())))?;
    }

    Ok(current_element.text())
}

pub(crate) async fn sub_request_and_extract_elems(resource: &Resource, method: &str, body: String, item: &str) -> Result<Vec<Element>> {
    let text = sub_request(resource, method, body, 1).await?;

    let root: Element = text.parse()?;
    Ok(find_elems(&root, item)
        .into_iter()
        .cloned()
        .collect())
}


/// A CalDAV source registry, that fetches its data from a CalDAV server
#[derive(Debug)]
pub struct Client {
    resource: Resource,

    /// The sources, once they have been discovered
    cached_sources: Mutex<Option<Vec<CalendarSource>>>,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(url: S, username: T, password: U) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;

        Ok(Self{
            resource: Resource::new(url, username.to_string(), password.to_string()),
            cached_sources: Mutex::new(None),
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Return the Principal URL
    async fn get_principal(&self) -> Result<Resource> {
        let href = sub_request_and_extract_elem(&self.resource, DAVCLIENT_BODY.into(), &["current-user-principal", "href"]).await?;
        log::debug!("Principal URL is {}", href);
        Ok(self.resource.combine(&href))
    }

    /// Return the Homeset URL
    async fn get_cal_home_set(&self) -> Result<Resource> {
        let principal = self.get_principal().await?;

        let href = sub_request_and_extract_elem(&principal, HOMESET_BODY.into(), &["calendar-home-set", "href"]).await?;
        let chs = self.resource.combine(&href);
        log::debug!("Calendar home set URL is {:?}", chs.url().path());
        Ok(chs)
    }

    /// Return the calendar collections of the server, or fetch them if not known yet
    pub async fn get_sources(&self) -> Result<Vec<CalendarSource>> {
        let cached = lock(&self.cached_sources).clone();
        if let Some(sources) = cached {
            return Ok(sources);
        }

        let cal_home_set = self.get_cal_home_set().await?;
        let reps = sub_request_and_extract_elems(&cal_home_set, "PROPFIND", CAL_BODY.into(), "response").await?;
        let sources = parse_collections(&self.resource, &reps);

        // The lock is not held during the requests. Concurrent discoveries would only waste a request
        *lock(&self.cached_sources) = Some(sources.clone());
        Ok(sources)
    }
}

/// Turn the `<response>`s of a depth-1 PROPFIND on a calendar home set into sources
pub(crate) fn parse_collections(base: &Resource, reps: &[Element]) -> Vec<CalendarSource> {
    let mut sources = Vec::new();
    for rep in reps {
        let display_name = find_elem(rep, "displayname").map(|e| e.text()).unwrap_or("<no name>".to_string());
        log::debug!("Considering calendar {}", display_name);

        // We filter out non-calendar items
        let resource_types = match find_elem(rep, "resourcetype") {
            None => continue,
            Some(rt) => rt,
        };
        let found_calendar_type = resource_types.children().any(|rt| rt.name() == "calendar");
        if found_calendar_type == false {
            continue;
        }

        // We filter out the root calendar collection, that has an empty supported-calendar-component-set
        let el_supported_comps = match find_elem(rep, "supported-calendar-component-set") {
            None => continue,
            Some(comps) => comps,
        };
        if el_supported_comps.children().count() == 0 {
            continue;
        }

        let calendar_href = match find_elem(rep, "href") {
            None => {
                log::warn!("Calendar {} has no URL! Ignoring it.", display_name);
                continue;
            },
            Some(h) => h.text(),
        };

        let extensions = match Extensions::try_from(el_supported_comps.clone()) {
            Err(err) => {
                log::warn!("Calendar {} has invalid supported components ({})! Ignoring it.", display_name, err);
                continue;
            },
            Ok(ext) => ext,
        };

        let url = base.combine(&calendar_href).url().to_string();
        log::info!("Found calendar {}", display_name);
        sources.push(CalendarSource::new(url, display_name, extensions, true));
    }
    sources
}

#[async_trait]
impl SourceRegistry for Client {
    type Client = RemoteCalendar;

    async fn list_sources(&self, kind: ExtensionKind) -> Result<Vec<CalendarSource>> {
        Ok(self.get_sources().await?
            .into_iter()
            .filter(|source| source.has_extension(kind))
            .collect())
    }

    async fn ref_source(&self, uid: &str) -> Result<Option<CalendarSource>> {
        Ok(self.get_sources().await?
            .into_iter()
            .find(|source| source.uid() == uid))
    }

    async fn connect(&self, source: &CalendarSource, purpose: ClientPurpose) -> Result<Self::Client> {
        let url = Url::parse(source.uid())
            .map_err(|err| Error::connection(source.uid(), err))?;
        let collection = self.resource.with_url(url).as_collection();

        sub_request(&collection, "PROPFIND", PING_BODY.into(), 0).await
            .map_err(|err| Error::connection(source.uid(), err))?;

        log::debug!("Opened a {:?} session on {}", purpose, source.uid());
        Ok(RemoteCalendar::new(source.uid().to_string(), collection, purpose))
    }
}
