//! Creates the administrator account, or promotes an existing user.
//!
//! ```text
//! seed [USERNAME] [PASSWORD] [FULL_NAME]
//! ```
//!
//! Missing arguments fall back to `ADMIN_USERNAME`, `ADMIN_PASSWORD` and
//! `ADMIN_FULL_NAME`. Needs `DATABASE_URL`; there is nothing to seed in memory.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use auth_adapters::{Argon2Hasher, JwtTokenService};
use configs::Settings;
use services::AuthService;
use storage_adapters::PgStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct AdminArgs {
    username: String,
    password: String,
    full_name: Option<String>,
}

impl AdminArgs {
    fn from_env(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut pick = |var: &str| args.next().or_else(|| env::var(var).ok()).filter(|v| !v.trim().is_empty());
        let username = pick("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string());
        let Some(password) = pick("ADMIN_PASSWORD") else {
            bail!("admin password missing: pass it as the second argument or set ADMIN_PASSWORD");
        };
        let full_name = pick("ADMIN_FULL_NAME");
        Ok(Self { username, password, full_name })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.level)))
        .init();

    let admin = AdminArgs::from_env(env::args().skip(1))?;
    let Some(url) = settings.database_url() else {
        bail!("DATABASE_URL must be set to seed an admin");
    };

    let store = PgStore::connect(url, 1).await.context("connecting to PostgreSQL")?;
    store.migrate().await.context("running migrations")?;

    let auth = AuthService::new(
        Arc::new(store),
        Arc::new(Argon2Hasher::new()),
        Arc::new(JwtTokenService::new(
            &settings.auth.jwt_secret,
            chrono::Duration::minutes(settings.auth.token_ttl_minutes),
        )),
    );
    let user = auth
        .ensure_admin(&admin.username, &admin.password, admin.full_name)
        .await
        .context("creating admin")?;

    info!(user_id = %user.id, username = %user.username, "admin ready");
    println!("Admin '{}' ready ({})", user.username, user.id);
    Ok(())
}
