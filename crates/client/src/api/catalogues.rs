//! Catalogue endpoints.

use tracing::{debug, instrument};
use vitrine_core::{AccessRequest, Catalogue, CatalogueId, CatalogueProduct, Page, VerificationCode};

use super::types::{VerifyAccessBody, VerifyAccessResponse};
use super::{ApiClient, ApiError, CacheKey, CacheValue};

impl ApiClient {
    /// Get a catalogue by its public slug.
    ///
    /// Results are cached per slug until the TTL expires, the bearer token
    /// changes, or [`ApiClient::invalidate_catalogue`] is called.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` on a 404 or an empty body, or another
    /// error if the request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_catalogue_by_slug(&self, slug: &str) -> Result<Catalogue, ApiError> {
        let cache_key = CacheKey::Catalogue(slug.to_string());

        // Check cache
        if let Some(CacheValue::Catalogue(catalogue)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for catalogue");
            return Ok(*catalogue);
        }

        let url = self.endpoint(&["catalogues", "view", slug])?;
        let catalogue: Option<Catalogue> = self.execute(self.inner.client.get(url)).await?;
        let catalogue =
            catalogue.ok_or_else(|| ApiError::NotFound(format!("Catalogue not found: {slug}")))?;

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Catalogue(Box::new(catalogue.clone())))
            .await;

        Ok(catalogue)
    }

    /// Drop the cached catalogue for `slug`.
    pub async fn invalidate_catalogue(&self, slug: &str) {
        self.inner
            .cache
            .invalidate(&CacheKey::Catalogue(slug.to_string()))
            .await;
    }

    /// Get one page of a catalogue's products.
    ///
    /// Not cached: the listing depends on the viewer's access.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Forbidden` when the
    /// viewer has no access, or another error if the request fails.
    #[instrument(skip(self), fields(catalogue_id = %catalogue_id))]
    pub async fn get_catalogue_products(
        &self,
        catalogue_id: &CatalogueId,
        page: u32,
        limit: u32,
    ) -> Result<Page<CatalogueProduct>, ApiError> {
        let url = self.endpoint(&["catalogues", catalogue_id.as_str(), "products"])?;
        let request = self
            .inner
            .client
            .get(url)
            .query(&[("page", page), ("limit", limit)]);
        self.execute(request).await
    }

    /// Ask for an access code to be sent to the viewer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, request), fields(catalogue_id = %catalogue_id))]
    pub async fn request_catalogue_access(
        &self,
        catalogue_id: &CatalogueId,
        request: &AccessRequest,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["catalogues", catalogue_id.as_str(), "request-access"])?;
        let _: serde::de::IgnoredAny = self
            .execute(self.inner.client.post(url).json(request))
            .await?;
        debug!("Access code requested");
        Ok(())
    }

    /// Exchange an access code for a grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the request fails.
    #[instrument(skip(self, code), fields(catalogue_id = %catalogue_id))]
    pub async fn verify_catalogue_access(
        &self,
        catalogue_id: &CatalogueId,
        code: &VerificationCode,
    ) -> Result<VerifyAccessResponse, ApiError> {
        let url = self.endpoint(&["catalogues", catalogue_id.as_str(), "verify-access"])?;
        let body = VerifyAccessBody {
            code: code.as_str(),
        };
        let response: Option<VerifyAccessResponse> = self
            .execute(self.inner.client.post(url).json(&body))
            .await?;
        Ok(response.unwrap_or_default())
    }
}
