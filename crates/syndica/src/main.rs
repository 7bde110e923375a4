mod cli;

use std::io;
use std::sync::Arc;

use clap::Parser;
use cli::{BatchOpts, BloggerOpts, GlobalOpts, Opts};
use snafu::{FromString, ResultExt, Snafu, Whatever};
use syndica_blogger::BloggerClient;
use syndica_db::{Database, DbError};
use syndica_publisher::{BloggerGateway, Pipeline};
use syndica_web::{AppState, Server, SharedState, WebServerError};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const PROJECT_NAME: &str = "syndica";
pub const LOG_TARGET: &str = "syndica::cli";

type WhateverResult<T> = std::result::Result<T, snafu::Whatever>;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Database error: {source}"))]
    Database { source: DbError },
    #[snafu(display("Data dir error: {source:?}"))]
    DataDir { source: io::Error },
    #[snafu(display("Web server error: {source}"))]
    WebServer { source: WebServerError },
    #[snafu(display("Invalid UTC offset: {source}"))]
    Offset { source: time::error::ComponentRange },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    match handle_cmd(opts).await {
        Ok(v) => {
            println!("{}", serde_json::to_string_pretty(&v).expect("Can't fail"));
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    Ok(match opts.cmd {
        cli::OptsCmd::AuthUrl { blogger } => {
            let client = BloggerClient::new(blogger.config());

            serde_json::json!({
                "url": client.authorization_url(),
            })
        }
        cli::OptsCmd::RunBatch { blogger, batch } => {
            let state = build_state(&opts.global, &blogger, &batch).await?;

            let summary = state.pipeline.run_batch().await.context(DatabaseSnafu)?;

            serde_json::to_value(summary).expect("Can't fail")
        }
        cli::OptsCmd::Serve {
            blogger,
            batch,
            listen,
            reuseport,
            cors_origin,
        } => {
            let state = build_state(&opts.global, &blogger, &batch).await?;

            let server = Server::init(
                syndica_web::Opts {
                    listen,
                    cors_origin,
                    reuseport,
                },
                state,
            )
            .await
            .context(WebServerSnafu)?;

            info!(target: LOG_TARGET, "Starting syndica server");
            server.run().await.context(WebServerSnafu)?;

            serde_json::Value::Null
        }
    })
}

async fn build_state(
    global: &GlobalOpts,
    blogger: &BloggerOpts,
    batch: &BatchOpts,
) -> CliResult<SharedState> {
    let db_path = Database::mk_db_path(global.data_dir())
        .await
        .context(DataDirSnafu)?;
    let db = Arc::new(Database::open(db_path).await.context(DatabaseSnafu)?);

    let client = Arc::new(BloggerClient::new(blogger.config()));
    let gateway = Arc::new(BloggerGateway::new(
        client.clone(),
        db.clone(),
        blogger.title_suffix.clone(),
        blogger.refresh_token.clone(),
    ));

    let pipeline_opts = batch.pipeline_opts().context(OffsetSnafu)?;
    let pipeline = Pipeline::new(db.clone(), gateway.clone(), pipeline_opts);

    Ok(Arc::new(AppState {
        db,
        blogger: client,
        gateway,
        pipeline,
    }))
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
