use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "woispace", version, about = "Work through WOI learning flows from the terminal")]
pub struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "woispace.yml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Credentials; an access token wins over email/password
#[derive(clap::Args)]
pub struct AuthArgs {
    #[arg(long, env = "WOISPACE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, env = "WOISPACE_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    #[arg(long, env = "WOISPACE_USER_ID")]
    pub user_id: Option<i64>,

    #[arg(long, env = "WOISPACE_EMAIL")]
    pub email: Option<String>,

    #[arg(long, env = "WOISPACE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// List the signed-in user's enrollments
    Enrollments,
    /// Show the steps and progress of an enrollment
    Status { enrollment: i64 },
    /// Print the current step's paragraph
    Read {
        enrollment: i64,
        /// Step index (defaults to the first open step)
        #[arg(long)]
        step: Option<usize>,
    },
    /// Save a first impression
    Impression {
        enrollment: i64,
        text: String,
        #[arg(long)]
        step: Option<usize>,
    },
    /// Save a reflection
    Reflection {
        enrollment: i64,
        text: String,
        #[arg(long)]
        step: Option<usize>,
    },
    /// Mark a step completed
    CompleteStep {
        enrollment: i64,
        #[arg(long)]
        step: Option<usize>,
        /// Complete even without both answers
        #[arg(long)]
        force: bool,
    },
    /// Complete the enrollment once every step is done
    Complete { enrollment: i64 },
}

impl Cmd {
    /// Enrollment the command works on; `None` for listing commands
    pub fn enrollment(&self) -> Option<i64> {
        match self {
            Cmd::Enrollments => None,
            Cmd::Status { enrollment }
            | Cmd::Read { enrollment, .. }
            | Cmd::Impression { enrollment, .. }
            | Cmd::Reflection { enrollment, .. }
            | Cmd::CompleteStep { enrollment, .. }
            | Cmd::Complete { enrollment } => Some(*enrollment),
        }
    }
}
