//! Search query construction
//!
//! Turns a [`SearchQuery`] into the exact HTTP request the service
//! expects. Parameter order is fixed so equal queries always yield equal
//! requests.

use crate::config::{Config, SearchConfig, ServiceConfig};
use crate::constants::api::{GEOMETRY_PATH, SEARCH_PATH, VIEW_PATH};
use crate::error::{Error, Result};
use crate::geo::{bounding_box, Coordinates};
use serde::{Deserialize, Serialize};

/// What the caller is looking for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
    pub max_results: usize,
    /// First results page to request, 1-based
    pub page: u32,
}

impl SearchQuery {
    /// Free-text query with default paging
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            center: None,
            radius_km: None,
            max_results: crate::config::defaults::DEFAULT_MAX_RESULTS,
            page: 1,
        }
    }

    /// Geographic query around a center
    pub fn near(center: Coordinates, radius_km: f64) -> Self {
        Self {
            text: None,
            center: Some(center),
            radius_km: Some(radius_km),
            max_results: crate::config::defaults::DEFAULT_MAX_RESULTS,
            page: 1,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Trimmed search text, if any was given
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim)
    }
}

/// A fully specified outbound GET request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSpec {
    /// Scheme and authority, without trailing slash
    pub base_url: String,
    /// Absolute path starting with `/`
    pub path: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// Full URL with percent-encoded query string
    pub fn url(&self) -> String {
        let mut url = format!("{}{}", self.base_url, self.path);
        for (i, (key, value)) in self.params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Value of the first parameter named `key`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builds requests against the configured service
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    service: ServiceConfig,
    search: SearchConfig,
}

impl QueryBuilder {
    pub fn new(service: ServiceConfig, search: SearchConfig) -> Self {
        Self { service, search }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.service.clone(), config.search.clone())
    }

    pub fn base_url(&self) -> &str {
        self.service.base_url.trim_end_matches('/')
    }

    pub fn page_size(&self) -> u32 {
        self.service.page_size
    }

    pub fn default_max_results(&self) -> usize {
        self.search.default_max_results
    }

    /// Check a query against the service's constraints
    pub fn validate(&self, query: &SearchQuery) -> Result<()> {
        if let Some(text) = query.trimmed_text() {
            if text.is_empty() {
                return Err(Error::InvalidQuery("search text is empty".to_string()));
            }
        }

        match (query.center, query.radius_km) {
            (None, None) if query.text.is_none() => {
                return Err(Error::InvalidQuery(
                    "either search text or a center location is required".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(Error::InvalidQuery(
                    "a radius requires a center location".to_string(),
                ));
            }
            (Some(center), radius) => {
                center.validate()?;
                if let Some(radius) = radius {
                    if !(radius > 0.0) || radius > self.search.max_radius_km {
                        return Err(Error::InvalidQuery(format!(
                            "radius {} km is outside (0, {}]",
                            radius, self.search.max_radius_km
                        )));
                    }
                }
            }
            (None, None) => {}
        }

        if query.max_results == 0 || query.max_results > self.search.max_results_cap {
            return Err(Error::InvalidQuery(format!(
                "max_results {} is outside 1..={}",
                query.max_results, self.search.max_results_cap
            )));
        }
        if query.page == 0 {
            return Err(Error::InvalidQuery("page numbers start at 1".to_string()));
        }

        Ok(())
    }

    /// Request for the query's first page
    pub fn build(&self, query: &SearchQuery) -> Result<RequestSpec> {
        self.build_page(query, query.page)
    }

    /// Request for a specific results page of the query
    pub fn build_page(&self, query: &SearchQuery, page: u32) -> Result<RequestSpec> {
        self.validate(query)?;
        if page == 0 {
            return Err(Error::InvalidQuery("page numbers start at 1".to_string()));
        }

        let mut params = vec![("event".to_string(), "map".to_string())];

        if let Some(text) = query.trimmed_text() {
            params.push(("q".to_string(), text.to_string()));
        }

        if let Some(center) = query.center {
            let radius = query.radius_km.unwrap_or(self.search.default_radius_km);
            let bbox = bounding_box(center, radius);
            params.push(("sw".to_string(), format_corner(bbox.south_west)));
            params.push(("ne".to_string(), format_corner(bbox.north_east)));
        }

        params.push(("page".to_string(), page.to_string()));
        params.push(("to".to_string(), self.service.page_size.to_string()));
        params.push(("lang".to_string(), self.service.locale.clone()));
        params.push(("sort".to_string(), self.service.sort.clone()));

        Ok(RequestSpec {
            base_url: self.base_url().to_string(),
            path: SEARCH_PATH.to_string(),
            params,
            headers: self.headers(),
        })
    }

    /// Request for a trail's WKB geometry
    pub fn geometry_request(&self, external_id: &str) -> RequestSpec {
        RequestSpec {
            base_url: self.base_url().to_string(),
            path: GEOMETRY_PATH.to_string(),
            params: vec![
                ("id".to_string(), external_id.to_string()),
                ("format".to_string(), "wkb".to_string()),
            ],
            headers: self.headers(),
        }
    }

    /// Request for a trail's detail page
    ///
    /// Relative references are resolved against the service base URL.
    /// Absolute references are only followed when they point at the service
    /// origin; anything else falls back to the service's own view page for
    /// `external_id`. Query strings embedded in the reference are carried
    /// over as parameters.
    pub fn detail_request(&self, external_id: &str, reference: &str) -> RequestSpec {
        let rest = match split_origin(reference) {
            None => reference,
            Some((origin, rest)) if self.is_service_origin(origin) => rest,
            Some(_) => return self.view_request(external_id),
        };
        let base_url = self.base_url().to_string();

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let params = query
            .map(|q| {
                q.split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| {
                        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                        (decode_component(k), decode_component(v))
                    })
                    .collect()
            })
            .unwrap_or_default();

        RequestSpec {
            base_url,
            path,
            params,
            headers: self.headers(),
        }
    }

    fn view_request(&self, external_id: &str) -> RequestSpec {
        RequestSpec {
            base_url: self.base_url().to_string(),
            path: VIEW_PATH.to_string(),
            params: vec![("id".to_string(), external_id.to_string())],
            headers: self.headers(),
        }
    }

    fn is_service_origin(&self, origin: &str) -> bool {
        split_origin(self.base_url())
            .is_some_and(|(service, _)| service.eq_ignore_ascii_case(origin))
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("User-Agent".to_string(), self.service.user_agent.clone()),
            ("Accept-Language".to_string(), self.service.locale.clone()),
        ]
    }
}

fn format_corner(c: Coordinates) -> String {
    format!("{:.6},{:.6}", c.lat, c.lng)
}

/// Split `scheme://authority/rest` into (`scheme://authority`, `/rest`)
fn split_origin(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")? + 3;
    let path_start = url[scheme_end..]
        .find(['/', '?'])
        .map_or(url.len(), |i| scheme_end + i);
    Some((&url[..path_start], &url[path_start..]))
}

fn decode_component(s: &str) -> String {
    let s = s.replace('+', " ");
    urlencoding::decode(&s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
