use std::io::Write;

use serde::Serialize;
use tracing::{debug, warn};

use super::{Cli, Command};
use crate::CacheRegistry;
use crate::config::AppConfig;
use crate::domain::cache::SortOrder;
use crate::domain::event::EventField;
use crate::domain::member::MemberType;
use crate::domain::training::{ApplicantStatus, TrainingField, TrainingTag};
use crate::infrastructure::logging;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelledApplicant<'a, T: Serialize> {
    #[serde(flatten)]
    applicant: &'a T,
    review_label: &'static str,
}

/// Runs one CLI command against a fixture-backed registry
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (config, load_error) = AppConfig::or_default(AppConfig::load());
    logging::init_logging(&config.logging)?;
    if let Some(error) = load_error {
        warn!(error = %error, "Failed to load configuration, using defaults");
    }

    let registry = CacheRegistry::in_memory(&config, cli.fixture.as_deref())?;
    debug!(fixture = ?cli.fixture, "Registry built");

    match cli.command {
        Command::Events(args) => {
            let events = registry.events();
            if let Some(sort) = args.sort {
                let order: SortOrder<EventField> = sort.parse()?;
                events.sort_events(order.field, order.direction);
            }
            print_lines(&events.list_events().await?)
        }
        Command::Trainings(args) => {
            let tag: TrainingTag = args.tag.parse()?;
            let trainings = registry.trainings();
            if let Some(sort) = args.sort {
                let order: SortOrder<TrainingField> = sort.parse()?;
                trainings.sort(order.field, order.direction);
            }
            print_lines(&trainings.list(tag).await?)
        }
        Command::Applicants(args) => {
            let applicants = registry.trainings().applicants(&args.training_id).await?;
            if args.labels {
                let labelled: Vec<_> = applicants
                    .iter()
                    .map(|applicant| LabelledApplicant {
                        applicant,
                        review_label: applicant.status.review_label(),
                    })
                    .collect();
                print_lines(&labelled)
            } else {
                print_lines(&applicants)
            }
        }
        Command::Opportunities(args) => {
            let status = args
                .status
                .as_deref()
                .map(str::parse::<ApplicantStatus>)
                .transpose()?;
            let applications = registry
                .trainings()
                .member_opportunities(&args.member_id, status)
                .await?;
            print_lines(&applications)
        }
        Command::Members(args) => {
            let member_type: MemberType = args.member_type.parse()?;
            print_lines(&registry.members().members(member_type).await?)
        }
    }
}

fn print_lines<T: Serialize>(items: &[T]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for item in items {
        serde_json::to_writer(&mut stdout, item)?;
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}
