///! Some utility functions

use std::sync::{Mutex, MutexGuard, PoisonError};

use minidom::Element;

pub mod comparison;

/// Walks an XML tree and returns every element that has the given name
pub fn find_elems<S: AsRef<str>>(root: &Element, searched_name: S) -> Vec<&Element> {
    let searched_name = searched_name.as_ref();
    let mut elems: Vec<&Element> = Vec::new();

    for el in root.children() {
        if el.name() == searched_name {
            elems.push(el);
        } else {
            let ret = find_elems(el, searched_name);
            elems.extend(ret);
        }
    }
    elems
}

/// Walks an XML tree until it finds an elements with the given name
pub fn find_elem<S: AsRef<str>>(root: &Element, searched_name: S) -> Option<&Element> {
    let searched_name = searched_name.as_ref();
    if root.name() == searched_name {
        return Some(root);
    }

    for el in root.children() {
        if el.name() == searched_name {
            return Some(el);
        } else {
            let ret = find_elem(el, searched_name);
            if ret.is_some() {
                return ret;
            }
        }
    }
    None
}

/// Lock a mutex, even if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Escape a string so that it can be inserted in an XML text node
pub(crate) fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_nested_elements() {
        let xml = r#"<multistatus xmlns="DAV:"><response><href>/a</href></response><response><propstat><href>/b</href></propstat></response></multistatus>"#;
        let root: Element = xml.parse().unwrap();

        let hrefs: Vec<String> = find_elems(&root, "href").iter().map(|e| e.text()).collect();
        assert_eq!(hrefs, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(find_elem(&root, "href").map(|e| e.text()), Some("/a".to_string()));
        assert!(find_elem(&root, "getetag").is_none());
        assert_eq!(find_elem(&root, "multistatus").map(|e| e.name()), Some("multistatus"));
    }

    #[test]
    fn escape_xml_text() {
        assert_eq!(xml_escape("a<b>&c"), "a&lt;b&gt;&amp;c");
    }
}
