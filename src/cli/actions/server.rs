use crate::{
    credo,
    store::{self, Backend, PasswordHasher},
};
use anyhow::{Context, Result};
use std::net::IpAddr;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub listen: IpAddr,
    pub backend: Backend,
    pub bcrypt_cost: u32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the credential store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let hasher = PasswordHasher::new(args.bcrypt_cost)?;

    let store = store::open(&args.backend, hasher)
        .await
        .context("Failed to open credential store")?;

    match &args.backend {
        Backend::File(path) => info!("Using credential file {}", path.display()),
        Backend::Sqlite(_) => info!("Using SQLite credential store"),
    }

    credo::new(args.listen, args.port, store).await
}
