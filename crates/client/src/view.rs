//! One catalogue page view.
//!
//! A [`CatalogueView`] loads a catalogue, decides whether it is gated, drives
//! the access flow against the API and lists products once the gate allows
//! it. All of its requests are bound to the view's cancellation token, which
//! fires when the view is dropped; responses arriving after that are
//! discarded instead of being applied to state nobody is looking at.

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use vitrine_core::{
    AccessGate, AccessRequestForm, Catalogue, CatalogueProduct, CatalogueProductId, Page,
    Storage, derive_privacy,
};

use crate::api::{ApiClient, ApiError};
use crate::error::ClientError;
use crate::session::Session;

/// A catalogue being viewed, with its access gate.
#[derive(Debug)]
pub struct CatalogueView<'s, S> {
    client: ApiClient,
    session: &'s mut Session<S>,
    slug: String,
    catalogue: Catalogue,
    private: bool,
    gate: AccessGate,
}

impl<'s, S: Storage> CatalogueView<'s, S> {
    /// Load the catalogue for `slug` and set up its gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be loaded.
    pub async fn open(
        client: &ApiClient,
        session: &'s mut Session<S>,
        slug: &str,
    ) -> Result<Self, ClientError> {
        Self::open_with_cancellation(client, session, slug, CancellationToken::new()).await
    }

    /// Like [`CatalogueView::open`], but cancelled together with `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be loaded.
    pub async fn open_child(
        client: &ApiClient,
        session: &'s mut Session<S>,
        slug: &str,
        parent: &CancellationToken,
    ) -> Result<Self, ClientError> {
        Self::open_with_cancellation(client, session, slug, parent.child_token()).await
    }

    #[instrument(skip(client, session, cancel), fields(slug = %slug))]
    async fn open_with_cancellation(
        client: &ApiClient,
        session: &'s mut Session<S>,
        slug: &str,
        cancel: CancellationToken,
    ) -> Result<Self, ClientError> {
        let client = client.with_cancellation(cancel);
        client.set_token(session.token().cloned());

        let catalogue = match client.get_catalogue_by_slug(slug).await {
            Ok(catalogue) => catalogue,
            Err(e) => {
                // The view never existed, so nothing else will cancel its token
                client.cancellation_token().cancel();
                return Err(e.into());
            }
        };
        let private = derive_privacy(&catalogue, session.viewer_business_id());
        // A stored token the server has already honoured counts as a grant
        let granted = session.token().is_some() && catalogue.is_locked == Some(false);
        info!(catalogue_id = %catalogue.id, private, granted, "Catalogue loaded");

        Ok(Self {
            client,
            session,
            slug: slug.to_string(),
            catalogue,
            private,
            gate: AccessGate::new(private && !granted),
        })
    }

    #[must_use]
    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Whether the catalogue was shown behind the gate when the view opened.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.private
    }

    #[must_use]
    pub const fn gate(&self) -> &AccessGate {
        &self.gate
    }

    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        self.session
    }

    /// Token that cancels every request of this view.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.client.cancellation_token().clone()
    }

    /// Validate the form and ask the server to send an access code.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made, or the API
    /// error if sending fails. The gate stays on the request step on error.
    pub async fn request_access(&mut self, form: &AccessRequestForm) -> Result<(), ClientError> {
        let request = self.gate.prepare_request(form)?;

        match self
            .client
            .request_catalogue_access(&self.catalogue.id, &request)
            .await
        {
            Ok(()) => {
                self.gate.request_sent(request)?;
                Ok(())
            }
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled.into()),
            Err(e) => {
                let e = ClientError::from(e);
                self.gate.request_failed(e.user_message());
                Err(e)
            }
        }
    }

    /// Submit a typed access code.
    ///
    /// On success the returned token is stored in the session and attached
    /// to later requests, and the catalogue is reloaded so it reflects the
    /// grant.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCode` before any request is made, or the API error
    /// if the server rejects the code. Nothing is persisted on error.
    pub async fn verify(&mut self, code: &str) -> Result<(), ClientError> {
        let code = self.gate.prepare_code(code)?;

        let response = match self
            .client
            .verify_catalogue_access(&self.catalogue.id, &code)
            .await
        {
            Ok(response) => response,
            Err(ApiError::Cancelled) => return Err(ApiError::Cancelled.into()),
            Err(e) => {
                warn!(catalogue_id = %self.catalogue.id, error = %e, "Access code rejected");
                self.gate.verification_failed();
                return Err(e.into());
            }
        };

        self.gate.verified()?;
        info!(catalogue_id = %self.catalogue.id, "Catalogue access granted");

        let stored = match response.access_token {
            Some(token) => {
                let token = SecretString::from(token);
                self.client.set_token(Some(token.clone()));
                self.session.store_token(token)
            }
            None => Ok(()),
        };

        self.client.invalidate_catalogue(&self.slug).await;
        match self.client.get_catalogue_by_slug(&self.slug).await {
            Ok(catalogue) => self.catalogue = catalogue,
            Err(e) => warn!(error = %e, "Failed to reload catalogue after access grant"),
        }

        stored.map_err(Into::into)
    }

    /// Return from code entry to the request form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless a code is being entered.
    pub fn back(&mut self) -> Result<(), ClientError> {
        self.gate.back().map_err(Into::into)
    }

    /// Load one page of visible products.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccessRequired` without any request while the
    /// gate is closed, or the API error if the request fails.
    pub async fn products(&self, page: u32, limit: u32) -> Result<Page<CatalogueProduct>, ClientError> {
        if !self.gate.allows_products() {
            return Err(ClientError::AccessRequired);
        }

        let page = self
            .client
            .get_catalogue_products(&self.catalogue.id, page.max(1), limit)
            .await?;
        Ok(page.without_hidden())
    }

    /// Find a visible product by its catalogue product ID, walking pages.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if no page lists the product, or any
    /// error from [`CatalogueView::products`].
    pub async fn find_product(
        &self,
        id: &CatalogueProductId,
        limit: u32,
    ) -> Result<CatalogueProduct, ClientError> {
        let mut page_number = 1;
        loop {
            let page = self.products(page_number, limit).await?;
            if let Some(item) = page.items.into_iter().find(|item| item.id == *id) {
                return Ok(item);
            }
            // Count pages locally; the echoed page number is not trusted
            if page_number >= page.meta.total_pages {
                return Err(ClientError::NotFound(format!(
                    "Product {id} is not listed in {}",
                    self.catalogue.name
                )));
            }
            page_number += 1;
        }
    }
}

impl<S> Drop for CatalogueView<'_, S> {
    fn drop(&mut self) {
        self.client.cancellation_token().cancel();
    }
}
