use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use studio_client::config::ConfigError;
use studio_client::{
    ApiClient, ApiError, ClientConfig, FileTokenStore, ProfileUpdate, SessionError, SessionSnapshot, SessionState,
    SessionStore, TokenStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("not signed in; run `studio login` first")]
    NotSignedIn,
    #[error("backend unreachable; session kept but profile unavailable")]
    ProfileUnavailable,
    #[error("nothing to update; pass at least one field")]
    EmptyUpdate,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "studio", about = "Wedding studio back-office session CLI")]
struct Cli {
    /// Overrides the environment-selected API base URL.
    #[arg(long, env = "STUDIO_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding the persisted credential token.
    #[arg(long, env = "STUDIO_TOKEN_DIR")]
    token_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the issued token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in with it.
    Register(RegisterArgs),
    /// Print the signed-in user's profile.
    Whoami,
    /// Print the resolved session state.
    Status,
    /// Update profile fields.
    Profile(ProfileArgs),
    /// Sign out. Calls the backend unless `--local` is given.
    Logout {
        #[arg(long, default_value_t = false)]
        local: bool,
    },
    /// Print the public URL of an uploaded file.
    StorageUrl { path: String },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    facebook: Option<String>,
    #[arg(long)]
    zalo: Option<String>,
    #[arg(long)]
    gmail: Option<String>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            phone: args.phone,
            address: args.address,
            facebook: args.facebook,
            zalo: args.zalo,
            gmail: args.gmail,
        }
    }
}

struct CliContext {
    config: ClientConfig,
    session: SessionStore,
}

impl CliContext {
    fn new(cli: &Cli) -> Result<Self, CliError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(base_url) = &cli.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(dir) = &cli.token_dir {
            config.token_dir.clone_from(dir);
        }

        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_dir));
        let api = Arc::new(ApiClient::new(config.clone(), tokens.clone())?);
        let session = SessionStore::new(api, tokens);
        Ok(Self { config, session })
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext::new(&cli)?;
    tracing::debug!(base_url = %ctx.config.base_url, "studio cli starting");

    match cli.command {
        Command::Login { email, password } => run_login(&ctx, &email, &password).await,
        Command::Register(args) => run_register(&ctx, args).await,
        Command::Whoami => run_whoami(&ctx).await,
        Command::Status => run_status(&ctx).await,
        Command::Profile(args) => run_profile(&ctx, args).await,
        Command::Logout { local } => run_logout(&ctx, local).await,
        Command::StorageUrl { path } => {
            println!("{}", ctx.config.storage_url(&path));
            Ok(())
        }
    }
}

async fn run_login(ctx: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    let snapshot = ctx.session.login(email, password).await?;
    print_json(&snapshot_json(&snapshot))
}

async fn run_register(ctx: &CliContext, args: RegisterArgs) -> Result<(), CliError> {
    match ctx.session.register(&args.name, &args.email, &args.password, &args.password).await {
        Ok(snapshot) => print_json(&snapshot_json(&snapshot)),
        Err(SessionError::MissingToken) => {
            eprintln!("account created; sign in with `studio login`");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let snapshot = ctx.session.initialize().await;
    match snapshot.state {
        SessionState::Authenticated(user) => print_json(&serde_json::to_value(user)?),
        SessionState::Provisional(_) => Err(CliError::ProfileUnavailable),
        SessionState::Unknown | SessionState::Unauthenticated => Err(CliError::NotSignedIn),
    }
}

async fn run_status(ctx: &CliContext) -> Result<(), CliError> {
    let snapshot = ctx.session.initialize().await;
    print_json(&snapshot_json(&snapshot))
}

async fn run_profile(ctx: &CliContext, args: ProfileArgs) -> Result<(), CliError> {
    let fields = ProfileUpdate::from(args);
    if fields.is_empty() {
        return Err(CliError::EmptyUpdate);
    }
    if !ctx.session.initialize().await.is_logged_in() {
        return Err(CliError::NotSignedIn);
    }
    let user = ctx.session.update_profile(&fields).await?;
    print_json(&serde_json::to_value(user)?)
}

async fn run_logout(ctx: &CliContext, local: bool) -> Result<(), CliError> {
    if local {
        ctx.session.logout();
    } else {
        ctx.session.sign_out().await;
    }
    println!("signed out");
    Ok(())
}

fn snapshot_json(snapshot: &SessionSnapshot) -> Value {
    let state = match snapshot.state {
        SessionState::Unknown => "unknown",
        SessionState::Authenticated(_) => "authenticated",
        SessionState::Provisional(_) => "provisional",
        SessionState::Unauthenticated => "unauthenticated",
    };
    json!({
        "state": state,
        "loading": snapshot.is_loading(),
        "logged_in": snapshot.is_logged_in(),
        "user": snapshot.user(),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
