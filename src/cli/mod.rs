//! CLI for browsing the cached dashboard data
//!
//! Every subcommand reads through a [`CacheRegistry`](crate::CacheRegistry)
//! built over a JSON fixture and prints one JSON document per line.

mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use run::run;

/// Seetrum dashboard cache
#[derive(Parser)]
#[command(name = "seetrum-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON fixture with the document collections
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List scheduled events
    Events(EventsArgs),

    /// List trainings or opportunities
    Trainings(TrainingsArgs),

    /// List the applicants of a training
    Applicants(ApplicantsArgs),

    /// List a member's opportunity applications
    Opportunities(OpportunitiesArgs),

    /// List members of one account type
    Members(MembersArgs),
}

#[derive(Args)]
pub struct EventsArgs {
    /// Client-side ordering, `field[:asc|desc]`
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct TrainingsArgs {
    /// `training` or `opportunity`
    #[arg(long, default_value = "training")]
    pub tag: String,

    /// Client-side ordering, `field[:asc|desc]`
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct ApplicantsArgs {
    pub training_id: String,

    /// Print the reviewer label next to each applicant
    #[arg(long)]
    pub labels: bool,
}

#[derive(Args)]
pub struct OpportunitiesArgs {
    pub member_id: String,

    /// Only applications in this status
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct MembersArgs {
    /// `individual` or `organization`
    #[arg(long = "type", default_value = "individual")]
    pub member_type: String,
}
