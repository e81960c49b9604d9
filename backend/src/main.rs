//! `lunchbox-admin`: operator commands over the lunch store.
//!
//! Every command prints one JSON document on stdout. Logs go to stderr as
//! JSON, filtered by `RUST_LOG`.

use std::ffi::OsString;
use std::io::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr as _, bail, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig as _;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use lunchbox::domain::ports::UserRepository as _;
use lunchbox::domain::{
    AccountService, CascadeDeletion, DailyAward, DashboardQuery, LikeLedger, Nickname,
    PostDeletion, PostId, PostService,
};
use lunchbox::outbound::blob_fs::CapStdBlobStore;
use lunchbox::outbound::credentials::Sha256CredentialHasher;
use lunchbox::outbound::persistence::{DbPool, DieselLunchStore, run_pending_migrations};
use lunchbox::settings::LunchboxSettings;

/// `lunchbox-admin` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "lunchbox-admin",
    about = "Administer the lunch store: migrations, stats and cascaded deletions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Create the administrator account if it does not exist.
    BootstrapAdmin,
    /// Print dashboard figures.
    Stats,
    /// Print the most-liked post of a local day.
    Award {
        /// Local date as `YYYY-MM-DD`; today when omitted.
        #[arg(long, value_name = "date")]
        date: Option<NaiveDate>,
    },
    /// List every member except the administrator.
    Members,
    /// Print posts newest first, with whether posting is open right now.
    Timeline {
        /// Only posts by this member.
        #[arg(long, value_name = "nickname")]
        member: Option<String>,
    },
    /// Delete a member with their posts, images and likes.
    DeleteUser {
        /// Nickname of the member.
        nickname: String,
    },
    /// Delete one post with its likes and image.
    DeletePost {
        /// Post identifier.
        post_id: String,
    },
    /// Recount a post's likes and fix its counter.
    Reconcile {
        /// Post identifier.
        post_id: String,
    },
}

type Store = DieselLunchStore;

struct Context {
    settings: LunchboxSettings,
    store: Arc<Store>,
}

impl Context {
    async fn connect(settings: LunchboxSettings) -> color_eyre::Result<Self> {
        let pool = DbPool::new(settings.pool_config()?)
            .await
            .wrap_err("create database pool")?;
        Ok(Self {
            settings,
            store: Arc::new(DieselLunchStore::new(pool)),
        })
    }

    fn accounts(&self) -> AccountService<Store, Sha256CredentialHasher> {
        AccountService::new(
            Arc::clone(&self.store),
            Arc::new(Sha256CredentialHasher),
            Arc::new(DefaultClock),
        )
    }

    fn cascade(&self) -> color_eyre::Result<CascadeDeletion<Store, Store, Store, CapStdBlobStore>> {
        let blobs = CapStdBlobStore::open(self.settings.blob_root())
            .wrap_err("open blob directory")?;
        Ok(CascadeDeletion::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::new(blobs),
        ))
    }

    fn posts(&self) -> color_eyre::Result<PostService<Store, Store, Store, CapStdBlobStore>> {
        Ok(PostService::new(
            Arc::clone(&self.store),
            self.cascade()?,
            self.settings.posting_window()?,
            Arc::new(DefaultClock),
        ))
    }
}

fn parse_nickname(raw: &str) -> color_eyre::Result<Nickname> {
    Nickname::new(raw).map_err(|err| eyre!("invalid nickname {raw:?}: {err}"))
}

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

fn emit<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn parse_post_id(raw: &str) -> color_eyre::Result<PostId> {
    PostId::new(raw).map_err(|err| eyre!("invalid post id {raw:?}: {err}"))
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let settings = LunchboxSettings::load_from_iter([OsString::from("lunchbox-admin")])
        .map_err(|err| eyre!("load settings: {err}"))?;

    if matches!(cli.command, Command::Migrate) {
        let url = settings.database_url()?.to_owned();
        let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
            .await
            .wrap_err("migration task panicked")??;
        return emit(&json!({ "applied": applied }));
    }

    let ctx = Context::connect(settings).await?;
    run(&ctx, cli.command).await
}

async fn run(ctx: &Context, command: Command) -> color_eyre::Result<()> {
    let offset = ctx.settings.utc_offset()?;
    match command {
        Command::Migrate => bail!("migrate runs before connecting"),
        Command::BootstrapAdmin => {
            let nickname = ctx.settings.admin_nickname()?;
            let password = ctx.settings.admin_password()?;
            let outcome = ctx
                .accounts()
                .ensure_admin(nickname.as_ref(), password)
                .await?;
            emit(&outcome)
        }
        Command::Stats => {
            let store = &ctx.store;
            let query = DashboardQuery::new(Arc::clone(store), Arc::clone(store), Arc::clone(store));
            emit(&query.stats(&offset).await?)
        }
        Command::Award { date } => {
            let award = DailyAward::new(Arc::clone(&ctx.store), Arc::new(DefaultClock));
            let winner = match date {
                Some(day) => award.award_for_day(day, &offset).await?,
                None => award.daily_award(&offset).await?,
            };
            emit(&json!({ "award": winner }))
        }
        Command::Members => {
            let admin = ctx.settings.admin_nickname()?;
            emit(&ctx.accounts().members(&admin).await?)
        }
        Command::Timeline { member } => timeline(ctx, member.as_deref()).await,
        Command::DeleteUser { nickname } => delete_user(ctx, &nickname).await,
        Command::DeletePost { post_id } => {
            let post_id = parse_post_id(&post_id)?;
            match ctx.cascade()?.delete_post(post_id).await? {
                PostDeletion::Deleted(report) => emit(&report),
                PostDeletion::NotFound => emit(&json!({ "status": "not_found", "postId": post_id })),
            }
        }
        Command::Reconcile { post_id } => {
            let post_id = parse_post_id(&post_id)?;
            let ledger = LikeLedger::new(
                Arc::clone(&ctx.store),
                Arc::clone(&ctx.store),
                Arc::new(DefaultClock),
            );
            emit(&ledger.reconcile(post_id).await?)
        }
    }
}

async fn timeline(ctx: &Context, member: Option<&str>) -> color_eyre::Result<()> {
    let service = ctx.posts()?;
    let posts = match member {
        None => service.timeline().await?,
        Some(raw) => {
            let nickname = parse_nickname(raw)?;
            let Some(user) = ctx.store.find_by_nickname(&nickname).await? else {
                return emit(&json!({ "status": "not_found", "nickname": nickname }));
            };
            service.posts_by_user(*user.id()).await?
        }
    };
    emit(&json!({ "postingOpen": service.posting_open(), "posts": posts }))
}

async fn delete_user(ctx: &Context, raw: &str) -> color_eyre::Result<()> {
    let nickname = parse_nickname(raw)?;
    if nickname == ctx.settings.admin_nickname()? {
        bail!("refusing to delete the administrator account");
    }
    let Some(user) = ctx.store.find_by_nickname(&nickname).await? else {
        return emit(&json!({ "status": "not_found", "nickname": nickname }));
    };
    match ctx.cascade()?.delete_user(*user.id()).await {
        Ok(report) => {
            info!(user_id = %user.id(), posts = report.posts.len(), "member deleted");
            emit(&report)
        }
        Err(err) => {
            emit(&json!({ "error": &err }))?;
            Err(err.into())
        }
    }
}
