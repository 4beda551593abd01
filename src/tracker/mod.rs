//! Time tracking. Projects and their start/stop entries live in one `data.json` document which is
//! loaded fully at startup and rewritten fully on every save.

pub mod entities;
pub mod session;
pub mod store;
pub mod terminal;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use session::{run_session, SessionTiming};
use store::{ClearChoice, ClearOutcome, RegisterOutcome, StopOutcome, TimeTrackerStore};
use terminal::TerminalKeys;
use tracing::info;

use crate::utils::{
    clock::DefaultClock,
    dir::tracking_dir,
    logging::{LogArgs, TRACKER_PREFIX},
    runtime::single_thread_runtime,
    time::{format_pretty_time, ms_to_seconds},
};

const DEFAULT_PROJECT_NAME: &str = "NO_NAME";

#[derive(Parser, Debug)]
#[command(name = "time-tracker", version, long_about = None)]
#[command(about = "Track time spent on projects until a key is pressed")]
pub struct TrackerArgs {
    #[arg(help = "Project name to start tracking")]
    project: Option<String>,
    #[arg(short, long, help = "Comment for the tracking entry")]
    comment: Option<String>,
    #[arg(
        short,
        long,
        visible_alias = "ls",
        help = "List all projects with their total time and tags"
    )]
    list: bool,
    #[arg(
        short,
        long = "new-project",
        alias = "new_project",
        value_name = "NAME",
        help = "Register a new project"
    )]
    new_project: Option<String>,
    #[arg(short, long, num_args = 0.., help = "Tags for the new project")]
    tags: Vec<String>,
    #[arg(long, help = "Delete data.json after confirmation")]
    clear: bool,
    #[arg(
        long,
        help = "Tracking directory. By default $DS_TIME_TRACKING_DIR or ./time_tracker/"
    )]
    dir: Option<PathBuf>,
    #[command(flatten)]
    logging: LogArgs,
}

pub fn run_time_tracker() -> Result<()> {
    let args = TrackerArgs::parse();
    let dir = tracking_dir(args.dir.clone());
    args.logging.enable(TRACKER_PREFIX, &dir)?;
    single_thread_runtime()?.block_on(async move { process_tracker_command(args, dir).await })
}

async fn process_tracker_command(args: TrackerArgs, dir: PathBuf) -> Result<()> {
    let mut store = TimeTrackerStore::open(&dir, Box::new(DefaultClock)).await?;

    if args.list {
        print!("{}", store.report());
    } else if let Some(name) = args.new_project {
        match store.register(&name, args.tags.clone()).await? {
            RegisterOutcome::Registered => {
                println!("Registered new project: {name} with tags: {:?}", args.tags)
            }
            RegisterOutcome::AlreadyExists => println!("Project {name} already exists"),
        }
    } else if args.clear {
        clear(&mut store).await?;
    } else {
        let project = args
            .project
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_owned());
        track(&mut store, &project, args.comment.as_deref().unwrap_or_default()).await?;
    }

    store.close().await
}

async fn track(store: &mut TimeTrackerStore, project: &str, comment: &str) -> Result<()> {
    let started = store.start(project, comment).await?;
    if started.registered {
        println!("Registered {project} before tracking.");
    }
    if started.sealed_previous {
        println!("Closed an entry of {project} that was left running.");
    }
    println!("Started tracking project: {project}");

    let summary = {
        let mut keys = TerminalKeys::new()?;
        run_session(
            store,
            project,
            &mut keys,
            &mut io::stdout(),
            SessionTiming::default(),
        )
        .await
    }?;

    match summary.stop {
        StopOutcome::Stopped { duration_ms } => println!(
            "Tracking stopped after {}.",
            format_pretty_time(ms_to_seconds(duration_ms))
        ),
        StopOutcome::UnknownProject => println!("Project {project} not found"),
        StopOutcome::NotRunning => println!("Project {project} was not running"),
    }
    info!("Finished session with {} autosaves", summary.autosaves);
    Ok(())
}

async fn clear(store: &mut TimeTrackerStore) -> Result<()> {
    print!("Are you sure you want to delete data.json? (y/n/b for backup): ");
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().lock().read_line(&mut response)?;

    match store.clear(ClearChoice::from_response(&response)).await? {
        ClearOutcome::Deleted => println!("data.json has been deleted."),
        ClearOutcome::BackedUp(backup) => println!(
            "Backup created and data.json has been deleted. Backup path: {}",
            backup.display()
        ),
        ClearOutcome::Cancelled => println!("Operation cancelled."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::TrackerArgs;

    #[test]
    fn parses_registration_with_tags() {
        let args =
            TrackerArgs::try_parse_from(["time-tracker", "-n", "blog", "-t", "writing", "web"])
                .unwrap();
        assert_eq!(args.new_project.as_deref(), Some("blog"));
        assert_eq!(args.tags, vec!["writing", "web"]);
        assert!(args.project.is_none());
    }

    #[test]
    fn parses_project_with_comment() {
        let args =
            TrackerArgs::try_parse_from(["time-tracker", "thesis", "--comment", "intro"]).unwrap();
        assert_eq!(args.project.as_deref(), Some("thesis"));
        assert_eq!(args.comment.as_deref(), Some("intro"));
        assert!(!args.list && !args.clear);
    }

    #[test]
    fn list_has_ls_alias() {
        let args = TrackerArgs::try_parse_from(["time-tracker", "--ls"]).unwrap();
        assert!(args.list);
    }
}
