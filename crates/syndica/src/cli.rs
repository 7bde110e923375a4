use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use syndica_blogger::BloggerConfig;
use syndica_publisher::{DEFAULT_RUN_JOB, PipelineOpts, RunWindow};
use time::UtcOffset;
use time::error::ComponentRange;

/// Command line options for the syndica CLI application
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    /// Global options that apply to all commands
    #[command(flatten)]
    pub global: GlobalOpts,

    /// The specific command to execute
    #[command(subcommand)]
    pub cmd: OptsCmd,
}

/// Global options that apply across all commands
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory the database lives in
    #[arg(env = "SYNDICA_DATA_DIR", long)]
    pub data_dir: Option<PathBuf>,
}

static PROJECTS_DIR: LazyLock<directories::ProjectDirs> = LazyLock::new(|| {
    directories::ProjectDirs::from("org", "Syndica", "syndica")
        .expect("Unable to determine project's dir")
});

impl GlobalOpts {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| {
            PROJECTS_DIR
                .state_dir()
                .unwrap_or_else(|| PROJECTS_DIR.data_local_dir())
        })
    }
}

/// Blogger API credentials and target, environment-sourced
#[derive(Debug, Args)]
pub struct BloggerOpts {
    /// OAuth client id for the Blogger API
    #[arg(long, env = "BLOGGER_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret for the Blogger API
    #[arg(long, env = "BLOGGER_CLIENT_SECRET")]
    pub client_secret: String,

    /// Redirect URI registered for the consent flow
    #[arg(
        long,
        env = "BLOGGER_REDIRECT_URI",
        default_value = "http://localhost:3000/auth/callback"
    )]
    pub redirect_uri: String,

    /// Identifier of the target blog
    #[arg(long, env = "BLOGGER_BLOG_ID")]
    pub blog_id: String,

    /// Pre-provisioned refresh token, used instead of the stored one
    #[arg(long, env = "BLOGGER_REFRESH_TOKEN")]
    pub refresh_token: Option<String>,

    /// Tagline appended to every published title
    #[arg(long, env = "SYNDICA_TITLE_SUFFIX", default_value = " | Syndica Daily")]
    pub title_suffix: String,
}

impl BloggerOpts {
    pub fn config(&self) -> BloggerConfig {
        BloggerConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            blog_id: self.blog_id.clone(),
        }
    }
}

/// Knobs for the publication batch
#[derive(Debug, Args)]
pub struct BatchOpts {
    /// Hour of day the publish window opens
    #[arg(long, env = "SYNDICA_WINDOW_HOUR", default_value = "23")]
    pub window_hour: u8,

    /// Minute of the publish window
    #[arg(long, env = "SYNDICA_WINDOW_MINUTE", default_value = "30")]
    pub window_minute: u8,

    /// Fixed UTC offset, in hours, the window is evaluated at
    #[arg(long, env = "SYNDICA_UTC_OFFSET", default_value = "0")]
    pub utc_offset_hours: i8,

    /// Maximum successful submissions per batch
    #[arg(long, env = "SYNDICA_BATCH_CAP", default_value = "4")]
    pub batch_cap: usize,

    /// Delay before each submission, in seconds
    #[arg(long, env = "SYNDICA_PUBLISH_DELAY_SECS", default_value = "5")]
    pub publish_delay_secs: u64,

    /// Job name run history is recorded under
    #[arg(long, default_value = DEFAULT_RUN_JOB)]
    pub job_name: String,
}

impl BatchOpts {
    pub fn pipeline_opts(&self) -> Result<PipelineOpts, ComponentRange> {
        Ok(PipelineOpts {
            job: self.job_name.clone(),
            window: RunWindow {
                hour: self.window_hour,
                minute: self.window_minute,
            },
            utc_offset: UtcOffset::from_hms(self.utc_offset_hours, 0, 0)?,
            batch_cap: self.batch_cap,
            publish_delay: Duration::from_secs(self.publish_delay_secs),
        })
    }
}

/// Available commands for the syndica CLI
#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Start the HTTP server
    Serve {
        #[command(flatten)]
        blogger: BloggerOpts,

        #[command(flatten)]
        batch: BatchOpts,

        /// Listen address
        #[arg(long, short, default_value = "127.0.0.1:3000", env = "SYNDICA_LISTEN")]
        listen: String,

        /// Set SO_REUSEPORT
        #[arg(long, env = "SYNDICA_REUSEPORT")]
        reuseport: bool,

        /// Cors origin settings
        #[arg(long, env = "SYNDICA_CORS_ORIGIN")]
        cors_origin: Option<String>,
    },

    /// Run one publication batch and print the summary
    RunBatch {
        #[command(flatten)]
        blogger: BloggerOpts,

        #[command(flatten)]
        batch: BatchOpts,
    },

    /// Print the OAuth consent URL
    AuthUrl {
        #[command(flatten)]
        blogger: BloggerOpts,
    },
}
