// Google Places Details lookup for a business's map listing.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::traits::{ListingDetails, ListingProvider};

const PLACES_DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    name: String,
    website: Option<String>,
    /// The listing's own maps URL.
    url: Option<String>,
}

pub struct PlacesListingProvider {
    api_key: String,
    client: reqwest::Client,
}

impl PlacesListingProvider {
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .context("Failed to build HTTP client")?,
        })
    }
}

#[async_trait]
impl ListingProvider for PlacesListingProvider {
    async fn listing(&self, listing_id: &str) -> Result<ListingDetails> {
        info!(listing_id, "Places details lookup");

        let data: DetailsResponse = self
            .client
            .get(PLACES_DETAILS_URL)
            .query(&[
                ("place_id", listing_id),
                ("fields", "name,website,url"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Places API request failed")?
            .json()
            .await
            .context("Failed to parse Places response")?;

        if data.status != "OK" {
            bail!(
                "Places API status {}: {}",
                data.status,
                data.error_message.unwrap_or_default()
            );
        }
        let Some(place) = data.result else {
            bail!("Places API returned no result for {listing_id}");
        };

        Ok(details_from_place(place))
    }
}

/// Businesses often enter a social profile as their "website"; the adapter decides
/// which links belong to which platform.
fn details_from_place(place: PlaceResult) -> ListingDetails {
    ListingDetails {
        name: place.name,
        website: place.website,
        social_links: place.url.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_details_payload() {
        let json = r#"{
            "status": "OK",
            "result": {
                "name": "Acme Roofing",
                "website": "https://www.facebook.com/acmeroofing/",
                "url": "https://maps.google.com/?cid=123"
            }
        }"#;
        let data: DetailsResponse = serde_json::from_str(json).unwrap();
        let details = details_from_place(data.result.unwrap());
        assert_eq!(details.name, "Acme Roofing");
        assert_eq!(details.website.as_deref(), Some("https://www.facebook.com/acmeroofing/"));
        assert_eq!(details.social_links, vec!["https://maps.google.com/?cid=123"]);
    }

    #[test]
    fn missing_fields_default() {
        let data: DetailsResponse = serde_json::from_str(r#"{"status":"NOT_FOUND"}"#).unwrap();
        assert!(data.result.is_none());
        assert_eq!(data.error_message, None);
    }
}
