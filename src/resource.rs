use url::Url;

/// Just a wrapper around a URL and credentials
#[derive(Clone, Debug)]
pub struct Resource {
    url: Url,
    username: String,
    password: String,
}

impl Resource {
    pub fn new(url: Url, username: String, password: String) -> Self {
        Self { url, username, password }
    }

    pub fn url(&self) -> &Url { &self.url }
    pub fn username(&self) -> &String { &self.username }
    pub fn password(&self) -> &String { &self.password }

    /// Build a new Resource by keeping the same credentials, scheme and server from `base` but changing the path part
    pub fn combine(&self, new_path: &str) -> Resource {
        let mut built = (*self).clone();
        built.url.set_path(&new_path);
        built
    }

    /// Build a new Resource with the same credentials, for another URL
    pub fn with_url(&self, url: Url) -> Resource {
        Self { url, ..self.clone() }
    }

    /// The same resource, viewed as a collection (i.e. with a trailing slash), so that members can be joined to it
    pub fn as_collection(&self) -> Resource {
        if self.url.path().ends_with('/') {
            return self.clone();
        }
        let path = format!("{}/", self.url.path());
        self.combine(&path)
    }
}
