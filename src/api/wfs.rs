use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use std::time::Duration;

use crate::domain::FeatureCollection;

const USER_AGENT: &str = "wfs2svg/0.1.0 (https://github.com/ici-tools/wfs2svg)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;

/// WFS `resultType`: full results, or a count-only (hits) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Results,
    Hits,
}

impl ResultType {
    fn as_str(self) -> &'static str {
        match self {
            ResultType::Results => "results",
            ResultType::Hits => "hits",
        }
    }
}

/// One queryable layer of a WFS endpoint.
///
/// Holds the endpoint base URL, the layer (feature type) name, and the
/// optional query parameters of a GetFeature request. Construction is
/// builder-style; the fetch methods are blocking.
#[derive(Debug, Clone)]
pub struct WfsLayer {
    base_url: String,
    layer_name: String,
    version: String,
    cql_filter: Option<String>,
    output_srs: Option<u32>,
    sort_by: Option<String>,
    property_name: Option<String>,
    count: Option<u32>,
    timeout_secs: u64,
}

impl WfsLayer {
    pub fn new(base_url: impl Into<String>, layer_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            layer_name: layer_name.into(),
            version: "2.0.0".to_string(),
            cql_filter: None,
            output_srs: None,
            sort_by: None,
            property_name: None,
            count: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// WFS protocol version, e.g. "2.0.0" or "1.1.0".
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_cql_filter(mut self, filter: impl Into<String>) -> Self {
        self.cql_filter = Some(filter.into());
        self
    }

    /// Request geometries reprojected by the server to this EPSG code.
    pub fn with_output_srs(mut self, epsg: u32) -> Self {
        self.output_srs = Some(epsg);
        self
    }

    pub fn with_sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    /// Restrict returned properties to a comma-separated list of names.
    pub fn with_property_name(mut self, property_name: impl Into<String>) -> Self {
        self.property_name = Some(property_name.into());
        self
    }

    /// Limit the number of returned features.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[allow(dead_code)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[allow(dead_code)]
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    #[allow(dead_code)]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build the `DWITHIN` CQL fragment matching features within `meters`
    /// of a WKT point.
    #[allow(dead_code)]
    pub fn filter_by_point_distance(geom_name: &str, point: &str, meters: u32) -> String {
        format!("DWITHIN({geom_name}, {point}, {meters}, meters)")
    }

    /// Ordered GetFeature query fields.
    ///
    /// Optional parameters appear only when set. The feature limit key
    /// depends on the protocol version: WFS 2.x renamed `maxFeatures` to
    /// `count`.
    pub fn query_fields(&self, result_type: ResultType) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("service", "WFS".to_string()),
            ("version", self.version.clone()),
            ("request", "GetFeature".to_string()),
            ("typeName", self.layer_name.clone()),
            ("outputFormat", "json".to_string()),
            ("resultType", result_type.as_str().to_string()),
        ];

        if let Some(srs) = self.output_srs {
            fields.push(("srsName", format!("EPSG:{srs}")));
        }
        if let Some(ref sort_by) = self.sort_by {
            fields.push(("sortBy", sort_by.clone()));
        }
        if let Some(ref property_name) = self.property_name {
            fields.push(("propertyname", property_name.clone()));
        }
        if let Some(ref cql_filter) = self.cql_filter {
            fields.push(("cql_filter", cql_filter.clone()));
        }
        if let Some(count) = self.count {
            let key = if self.version_major() > 1 {
                "count"
            } else {
                "maxFeatures"
            };
            fields.push((key, count.to_string()));
        }

        fields
    }

    /// The full GetFeature URL for this layer, with the query string encoded.
    pub fn query_url(&self) -> Result<Url> {
        Url::parse_with_params(&self.base_url, self.query_fields(ResultType::Results))
            .with_context(|| format!("Invalid WFS base URL: {}", self.base_url))
    }

    /// Fetch matching features as a GeoJSON collection.
    ///
    /// Transient server statuses (429/503/504) are retried with a linear
    /// backoff; any other non-200 status is a hard error.
    pub fn fetch(&self) -> Result<FeatureCollection> {
        let client = self.client()?;
        let fields = self.query_fields(ResultType::Results);
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let wait_secs = 5 * attempt as u64;
                eprintln!(
                    "WFS server busy, retrying in {} seconds (attempt {}/{})",
                    wait_secs,
                    attempt + 1,
                    MAX_RETRIES
                );
                std::thread::sleep(Duration::from_secs(wait_secs));
            }

            let response = client
                .get(&self.base_url)
                .query(&fields)
                .send()
                .context("Failed to send GetFeature request")?;

            match response.status().as_u16() {
                200 => {
                    return response
                        .json()
                        .context("Failed to parse GeoJSON feature collection");
                }
                429 | 503 | 504 => {
                    last_error = Some(format!(
                        "WFS server returned status {} (attempt {})",
                        response.status(),
                        attempt + 1
                    ));
                    continue;
                }
                status => {
                    bail!("WFS server returned error status: {}", status);
                }
            }
        }

        bail!(
            "WFS request failed after {} retries: {}",
            MAX_RETRIES,
            last_error.unwrap_or_else(|| "Unknown error".to_string())
        )
    }

    /// Count matching features without downloading them.
    ///
    /// GeoServer answers a hits request with an XML envelope regardless of
    /// the requested output format, so the count is pulled out of the
    /// `numberMatched` attribute textually.
    pub fn hits(&self) -> Result<u64> {
        let client = self.client()?;
        let response = client
            .get(&self.base_url)
            .query(&self.query_fields(ResultType::Hits))
            .send()
            .context("Failed to send hits request")?;

        if !response.status().is_success() {
            bail!("WFS server returned error status: {}", response.status());
        }

        let body = response.text().context("Failed to read hits response")?;
        parse_number_matched(&body)
            .ok_or_else(|| anyhow!("Hits response did not contain a numberMatched attribute"))
    }

    fn version_major(&self) -> u32 {
        self.version
            .split('.')
            .next()
            .and_then(|major| major.parse().ok())
            .unwrap_or(0)
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("Failed to create HTTP client")
    }
}

fn parse_number_matched(body: &str) -> Option<u64> {
    let (_, rest) = body.split_once("numberMatched=\"")?;
    rest.split('"').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> WfsLayer {
        WfsLayer::new(
            "https://geoservices.example.org/ws",
            "urbis:municipalities",
        )
    }

    #[test]
    fn test_query_fields_defaults() {
        let fields = layer().query_fields(ResultType::Results);

        assert_eq!(
            fields,
            vec![
                ("service", "WFS".to_string()),
                ("version", "2.0.0".to_string()),
                ("request", "GetFeature".to_string()),
                ("typeName", "urbis:municipalities".to_string()),
                ("outputFormat", "json".to_string()),
                ("resultType", "results".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_fields_optional_params() {
        let fields = layer()
            .with_output_srs(4326)
            .with_sort_by("name")
            .with_property_name("name,population")
            .with_cql_filter("population > 100000")
            .with_count(5)
            .query_fields(ResultType::Results);

        assert!(fields.contains(&("srsName", "EPSG:4326".to_string())));
        assert!(fields.contains(&("sortBy", "name".to_string())));
        assert!(fields.contains(&("propertyname", "name,population".to_string())));
        assert!(fields.contains(&("cql_filter", "population > 100000".to_string())));
        assert!(fields.contains(&("count", "5".to_string())));
    }

    #[test]
    fn test_count_key_depends_on_version() {
        let v1 = layer().with_version("1.1.0").with_count(10);
        let fields = v1.query_fields(ResultType::Results);
        assert!(fields.contains(&("maxFeatures", "10".to_string())));
        assert!(!fields.iter().any(|(key, _)| *key == "count"));

        let v2 = layer().with_count(10);
        let fields = v2.query_fields(ResultType::Results);
        assert!(fields.contains(&("count", "10".to_string())));
    }

    #[test]
    fn test_query_url_encodes_fields() {
        let url = layer()
            .with_cql_filter("name = 'Uccle'")
            .query_url()
            .unwrap();

        assert!(url.as_str().starts_with("https://geoservices.example.org/ws?service=WFS"));
        assert!(url.as_str().contains("typeName=urbis%3Amunicipalities"));
        assert!(url.as_str().contains("cql_filter=name+%3D+%27Uccle%27"));
    }

    #[test]
    fn test_hits_query_sets_result_type() {
        let fields = layer().query_fields(ResultType::Hits);
        assert!(fields.contains(&("resultType", "hits".to_string())));
    }

    #[test]
    fn test_filter_by_point_distance() {
        assert_eq!(
            WfsLayer::filter_by_point_distance("geom", "POINT(4.35 50.85)", 15),
            "DWITHIN(geom, POINT(4.35 50.85), 15, meters)"
        );
    }

    #[test]
    fn test_parse_number_matched() {
        let body = r#"<wfs:FeatureCollection numberMatched="271" numberReturned="0"/>"#;
        assert_eq!(parse_number_matched(body), Some(271));
        assert_eq!(parse_number_matched("<wfs:FeatureCollection/>"), None);
    }
}
