mod error;
mod routes;

use std::net::{AddrParseError, SocketAddr};
use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Duration;
use std::{io, result};

use axum::Router;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use snafu::{ResultExt as _, Snafu};
use syndica_blogger::BloggerClient;
use syndica_db::Database;
use syndica_publisher::{BloggerGateway, Pipeline};
use tokio::net::{TcpListener, TcpSocket};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

pub(crate) const LOG_TARGET: &str = "syndica::web";

#[derive(Clone, Debug)]
pub struct Opts {
    pub listen: String,
    pub cors_origin: Option<String>,
    pub reuseport: bool,
}

/// Everything the route handlers need, owned once and shared.
pub struct AppState {
    pub db: Arc<Database>,
    pub blogger: Arc<BloggerClient>,
    pub gateway: Arc<BloggerGateway>,
    pub pipeline: Pipeline,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Snafu)]
pub enum WebServerError {
    #[snafu(transparent)]
    Io {
        source: io::Error,
    },

    ListenAddr {
        source: AddrParseError,
    },

    CorsOrigin {
        source: axum::http::header::InvalidHeaderValue,
    },
}

pub type ServerResult<T> = result::Result<T, WebServerError>;

pub struct Server {
    listener: TcpListener,
    state: SharedState,
    opts: Opts,
}

impl Server {
    pub async fn init(opts: Opts, state: SharedState) -> ServerResult<Server> {
        let listener = Self::get_listener(&opts).await?;

        info!(target: LOG_TARGET, "Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            state,
            opts,
        })
    }

    pub async fn get_listener(opts: &Opts) -> ServerResult<TcpListener> {
        let socket = {
            let addr = SocketAddr::from_str(&opts.listen).context(ListenAddrSnafu)?;

            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            if opts.reuseport {
                #[cfg(unix)]
                socket.set_reuseport(true)?;
            }
            socket.set_nodelay(true)?;

            socket.bind(addr)?;

            socket
        };

        Ok(socket.listen(1024)?)
    }

    pub async fn run(self) -> ServerResult<()> {
        let listen = self.addr()?;
        let router = Router::new().merge(routes::route_handler(self.state.clone()));

        info!(target: LOG_TARGET, "Starting server");
        axum::serve(
            self.listener,
            router
                .layer(cors_layer(&self.opts, listen)?)
                .into_make_service(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }

    pub fn addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

fn cors_layer(opts: &Opts, listen: SocketAddr) -> ServerResult<CorsLayer> {
    let origin: HeaderValue = opts
        .cors_origin
        .clone()
        .unwrap_or_else(|| format!("http://{listen}"))
        .parse()
        .context(CorsOriginSnafu)?;

    Ok(CorsLayer::new()
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400))
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
