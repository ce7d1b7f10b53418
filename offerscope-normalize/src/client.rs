//! Normalization Client: resolves raw location and salary strings through
//! the remote cleaning service.
use crate::error::NormalizationError;
use crate::single_flight::SingleFlight;
use futures::FutureExt;
use offerscope_common::{Location, Offer, OfferToBeFormatted, Salary};
use offerscope_http::{Auth, HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SALARIES_PATH: &str = "clean-salaries";
const LOCATIONS_PATH: &str = "clean-locations";
const COMBINED_PATH: &str = "format_offers";

/// How the cleaning service is deployed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizationMode {
    /// Two endpoints queried concurrently, authenticated with `X-API-Key`.
    #[default]
    Split,
    /// One endpoint taking the user's email and both string lists.
    Combined,
}

type SalaryMap = HashMap<String, Option<Salary>>;
type LocationMap = HashMap<String, Vec<Location>>;
type BatchResult = Result<Vec<Offer>, NormalizationError>;

#[derive(Debug, Deserialize)]
struct SalariesResponse {
    salaries: SalaryMap,
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    locations: LocationMap,
}

#[derive(Debug, Serialize)]
struct CombinedRequest<'a> {
    email: &'a str,
    salaries: &'a [String],
    locations: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CombinedResponse {
    salaries: SalaryMap,
    locations: LocationMap,
}

/// Distinct values in first-seen order.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Stable key for one batch: same email and same raw strings, same key.
fn batch_key(email: &str, salaries: &[String], locations: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(email.as_bytes());
    for group in [salaries, locations] {
        hasher.update(&[0xff]);
        for value in group {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
    }
    hex::encode(hasher.finalize().as_bytes())
}

/// Rebuild offers from the service maps; unknown raw strings fall back to
/// themselves.
fn apply(
    offers: &[OfferToBeFormatted],
    salaries: &SalaryMap,
    locations: &LocationMap,
) -> Vec<Offer> {
    offers
        .iter()
        .cloned()
        .map(|offer| {
            offer.map_normalized(
                |raw| match locations.get(&raw) {
                    Some(resolved) => resolved.clone(),
                    None => {
                        tracing::debug!(location = %raw, "normalize.location.unmapped");
                        vec![Location::unresolved(raw)]
                    }
                },
                |raw| match salaries.get(&raw) {
                    Some(resolved) => resolved.clone(),
                    None => {
                        tracing::debug!(salary = %raw, "normalize.salary.unmapped");
                        Some(Salary::Text(raw))
                    }
                },
            )
        })
        .collect()
}

/// Client for the cleaning service. Cheap to clone; clones share the
/// single-flight table.
#[derive(Clone)]
pub struct Normalizer {
    client: HttpClient,
    mode: NormalizationMode,
    api_key: Option<String>,
    flights: Arc<SingleFlight<BatchResult>>,
}

impl Normalizer {
    /// ```
    /// use offerscope_normalize::{NormalizationMode, Normalizer};
    ///
    /// let normalizer =
    ///     Normalizer::new("https://normalizer.example.com/api", NormalizationMode::Split)
    ///         .unwrap()
    ///         .with_api_key("k-123");
    /// assert_eq!(normalizer.mode(), NormalizationMode::Split);
    /// ```
    pub fn new(api_base: &str, mode: NormalizationMode) -> Result<Self, NormalizationError> {
        // endpoints are joined relative to the base
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        let client =
            HttpClient::new(&base).map_err(|e| NormalizationError::Config(e.to_string()))?;
        Ok(Self {
            client,
            mode,
            api_key: None,
            flights: Arc::new(SingleFlight::new()),
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    /// Resolve the location and salary of every offer.
    ///
    /// Firing `cancel` aborts every request of this call and yields
    /// [`NormalizationError::Cancelled`]; there are no partial results.
    pub async fn normalize(
        &self,
        email: &str,
        offers: &[OfferToBeFormatted],
        cancel: &CancellationToken,
    ) -> Result<Vec<Offer>, NormalizationError> {
        if offers.is_empty() {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(NormalizationError::Cancelled);
        }

        let salaries = unique(offers.iter().map(|o| o.salary.as_str()));
        let locations = unique(offers.iter().map(|o| o.location.as_str()));
        tracing::info!(
            offers = offers.len(),
            salaries = salaries.len(),
            locations = locations.len(),
            mode = ?self.mode,
            "normalize.request.start"
        );

        let result = match self.mode {
            NormalizationMode::Split => self.fetch_split(&salaries, &locations, cancel).await,
            NormalizationMode::Combined => {
                self.fetch_combined(email, &salaries, &locations, cancel)
                    .await
            }
        };
        let (salary_map, location_map) = match result {
            Ok(maps) => maps,
            Err(err) => {
                tracing::warn!(error = %err, "normalize.request.failed");
                return Err(err);
            }
        };

        let normalized = apply(offers, &salary_map, &location_map);
        tracing::info!(offers = normalized.len(), "normalize.request.done");
        Ok(normalized)
    }

    /// Like [`Self::normalize`], but a call for a batch identical to one
    /// already in flight waits for that call instead of sending new requests.
    ///
    /// The batch is keyed by email and raw strings; the first caller's
    /// cancellation token governs the shared request.
    pub async fn normalize_once(
        &self,
        email: &str,
        offers: &[OfferToBeFormatted],
        cancel: &CancellationToken,
    ) -> Result<Vec<Offer>, NormalizationError> {
        let salaries: Vec<String> = offers.iter().map(|o| o.salary.clone()).collect();
        let locations: Vec<String> = offers.iter().map(|o| o.location.clone()).collect();
        let key = batch_key(email, &salaries, &locations);

        let this = self.clone();
        let email = email.to_string();
        let owned = offers.to_vec();
        let cancel = cancel.clone();
        let shared = self
            .flights
            .run(key, move || {
                async move { this.normalize(&email, &owned, &cancel).await }.boxed()
            })
            .await?;

        // A joined call may carry another batch's ids for identical raw
        // strings; rebuild from our own offers.
        Ok(offers
            .iter()
            .zip(shared)
            .map(|(mine, resolved)| {
                mine.clone()
                    .map_normalized(|_| resolved.location, |_| resolved.salary)
            })
            .collect())
    }

    fn auth(&self) -> Result<Option<Auth<'_>>, NormalizationError> {
        match (self.mode, self.api_key.as_deref()) {
            (NormalizationMode::Split, Some(key)) => Auth::api_key(key)
                .map(Some)
                .map_err(|e| NormalizationError::Config(e.to_string())),
            (NormalizationMode::Split, None) => Err(NormalizationError::Config(
                "an API key is required for the split endpoints".into(),
            )),
            (NormalizationMode::Combined, Some(key)) => Ok(Some(Auth::Bearer(key))),
            (NormalizationMode::Combined, None) => Ok(None),
        }
    }

    fn opts(&self, cancel: &CancellationToken) -> Result<RequestOpts<'_>, NormalizationError> {
        Ok(RequestOpts {
            auth: self.auth()?,
            cancel: Some(cancel.clone()),
            ..Default::default()
        })
    }

    async fn fetch_split(
        &self,
        salaries: &[String],
        locations: &[String],
        cancel: &CancellationToken,
    ) -> Result<(SalaryMap, LocationMap), NormalizationError> {
        let salaries_req = self.client.post_json_opts::<_, SalariesResponse>(
            SALARIES_PATH,
            salaries,
            self.opts(cancel)?,
        );
        let locations_req = self.client.post_json_opts::<_, LocationsResponse>(
            LOCATIONS_PATH,
            locations,
            self.opts(cancel)?,
        );
        let (salaries, locations) = tokio::try_join!(salaries_req, locations_req)?;
        Ok((salaries.salaries, locations.locations))
    }

    async fn fetch_combined(
        &self,
        email: &str,
        salaries: &[String],
        locations: &[String],
        cancel: &CancellationToken,
    ) -> Result<(SalaryMap, LocationMap), NormalizationError> {
        if email.trim().is_empty() {
            return Err(NormalizationError::Config(
                "an email is required for the combined endpoint".into(),
            ));
        }
        let body = CombinedRequest {
            email,
            salaries,
            locations,
        };
        let response: CombinedResponse = self
            .client
            .post_json_opts(COMBINED_PATH, &body, self.opts(cancel)?)
            .await?;
        Ok((response.salaries, response.locations))
    }
}
