//! CLI command implementations.

pub mod access;
pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod session;

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use vitrine_client::{
    ApiClient, CatalogueView, ClientConfig, ClientError, FileStorage, Session,
};
use vitrine_core::CartStore;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Reading interactive input failed.
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// Input ended before the flow finished.
    #[error("Input closed before access was granted")]
    Aborted,
}

macro_rules! via_client_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(e: $ty) -> Self {
                    Self::Client(e.into())
                }
            }
        )+
    };
}

via_client_error!(
    vitrine_client::ApiError,
    vitrine_core::AccessError,
    vitrine_core::CatalogueError,
    vitrine_core::OrderError,
    vitrine_core::PriceError,
    vitrine_core::StorageError,
);

/// Shared state for a command run.
pub struct App {
    pub config: ClientConfig,
    pub client: ApiClient,
    pub session: Session<Arc<FileStorage>>,
    pub cart: CartStore<Arc<FileStorage>>,
    /// Fires on Ctrl-C; catalogue views hang their tokens off it.
    pub shutdown: CancellationToken,
}

impl App {
    /// Open the stored session and cart and build the API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, shutdown: CancellationToken) -> Result<Self, CliError> {
        let storage = Arc::new(FileStorage::new(&config.state_dir));
        let session = Session::load(Arc::clone(&storage));
        let cart = CartStore::open(storage);

        let client = ApiClient::new(&config)?.with_cancellation(shutdown.child_token());
        client.set_token(session.token().cloned());

        Ok(Self {
            config,
            client,
            session,
            cart,
            shutdown,
        })
    }

    /// Open a view of `slug`, cancelled on Ctrl-C.
    ///
    /// Borrows only the session, so the cart stays usable alongside it.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be loaded.
    pub async fn open_view<'s>(
        client: &ApiClient,
        session: &'s mut Session<Arc<FileStorage>>,
        shutdown: &CancellationToken,
        slug: &str,
    ) -> Result<CatalogueView<'s, Arc<FileStorage>>, ClientError> {
        CatalogueView::open_child(client, session, slug, shutdown).await
    }
}

// =============================================================================
// Terminal I/O
// =============================================================================

/// Print a line of command output.
#[allow(clippy::print_stdout)]
pub fn say(line: impl AsRef<str>) {
    println!("{}", line.as_ref());
}

/// Line reader over stdin for interactive prompts.
pub struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Ask for one line of input. Returns `None` once input is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read.
    #[allow(clippy::print_stdout)]
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>, CliError> {
        print!("{label}: ");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}
