//! Cursor-following pagination over a JSON transport.

use serde_json::Value;

use crate::error::VgError;

/// Anything that can answer a request with a JSON document.
///
/// Requests are either paths relative to the dataset host
/// (`/api/v0/images/all?page=1`) or the absolute URLs the server hands back
/// as `next` cursors.
pub trait Transport {
    fn get_json(&mut self, request: &str) -> Result<Value, VgError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn get_json(&mut self, request: &str) -> Result<Value, VgError> {
        (**self).get_json(request)
    }
}

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub results: Vec<Value>,
    /// Cursor of the following page; `None` ends the stream.
    pub next: Option<String>,
}

impl Page {
    /// Reads `{results: [...], next: "..." | null}`. A missing `next` ends the stream.
    pub fn from_value(request: &str, value: Value) -> Result<Self, VgError> {
        let malformed = |message: &str| VgError::MalformedPage {
            request: request.to_string(),
            message: message.to_string(),
        };

        let Value::Object(mut map) = value else {
            return Err(malformed("expected a JSON object"));
        };

        let results = match map.remove("results") {
            Some(Value::Array(results)) => results,
            Some(_) => return Err(malformed("'results' is not an array")),
            None => return Err(malformed("missing 'results'")),
        };

        let next = match map.remove("next") {
            None | Some(Value::Null) => None,
            Some(Value::String(next)) => Some(next),
            Some(_) => return Err(malformed("'next' is neither a string nor null")),
        };

        Ok(Self { results, next })
    }
}

/// Items gathered from a paginated listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Number of pages fetched.
    pub pages: usize,
}

/// Follows `next` cursors from `first` until the stream ends or `limit` items
/// have been gathered, whichever comes first.
///
/// `on_page` turns the raw results of one page into items; it also receives
/// the transport so it can make follow-up lookups, and the request that
/// produced the page so errors can name it. Any error aborts the whole run.
pub fn collect_pages<S, T, F>(
    transport: &mut S,
    first: &str,
    limit: Option<usize>,
    mut on_page: F,
) -> Result<Paged<T>, VgError>
where
    S: Transport + ?Sized,
    F: FnMut(&mut S, &str, Vec<Value>) -> Result<Vec<T>, VgError>,
{
    let mut items = Vec::new();
    let mut pages = 0;
    let mut request = Some(first.to_string());

    while let Some(current) = request.take() {
        let value = transport.get_json(&current)?;
        let page = Page::from_value(&current, value)?;
        pages += 1;

        let batch = on_page(transport, &current, page.results)?;
        tracing::info!(request = %current, items = batch.len(), "fetched page");
        items.extend(batch);

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }

        if page.next.as_deref() == Some(current.as_str()) {
            return Err(VgError::MalformedPage {
                request: current,
                message: "'next' points back at the same page".to_string(),
            });
        }
        request = page.next;
    }

    Ok(Paged { items, pages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct Fixture(HashMap<String, Value>);

    impl Transport for Fixture {
        fn get_json(&mut self, request: &str) -> Result<Value, VgError> {
            self.0.get(request).cloned().ok_or_else(|| VgError::Http {
                request: request.to_string(),
                message: "404".to_string(),
            })
        }
    }

    fn three_pages() -> Fixture {
        Fixture(HashMap::from([
            ("p1".to_string(), json!({"results": [1, 2], "next": "p2"})),
            ("p2".to_string(), json!({"results": [3, 4], "next": "p3"})),
            ("p3".to_string(), json!({"results": [5], "next": null})),
        ]))
    }

    fn as_numbers(_: &mut Fixture, _: &str, results: Vec<Value>) -> Result<Vec<u64>, VgError> {
        Ok(results.iter().filter_map(Value::as_u64).collect())
    }

    #[test]
    fn test_follows_cursors_until_null() {
        let paged = collect_pages(&mut three_pages(), "p1", None, as_numbers).expect("collect");
        assert_eq!(paged.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(paged.pages, 3);
    }

    #[test]
    fn test_limit_truncates_and_stops_early() {
        let paged = collect_pages(&mut three_pages(), "p1", Some(3), as_numbers).expect("collect");
        assert_eq!(paged.items, vec![1, 2, 3]);
        assert_eq!(paged.pages, 2);
    }

    #[test]
    fn test_missing_results_is_malformed() {
        let mut fixture = Fixture(HashMap::from([("p1".to_string(), json!({"next": null}))]));
        let err = collect_pages(&mut fixture, "p1", None, as_numbers).unwrap_err();
        assert!(matches!(err, VgError::MalformedPage { ref request, .. } if request == "p1"));
    }

    #[test]
    fn test_self_referencing_cursor_is_rejected() {
        let mut fixture = Fixture(HashMap::from([(
            "p1".to_string(),
            json!({"results": [1], "next": "p1"}),
        )]));
        assert!(collect_pages(&mut fixture, "p1", None, as_numbers).is_err());
    }

    #[test]
    fn test_absent_next_ends_stream() {
        let page = Page::from_value("r", json!({"results": []})).expect("parse page");
        assert_eq!(page.next, None);
    }
}
