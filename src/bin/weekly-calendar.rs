use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use weekly_calendar::cache::Cache;
use weekly_calendar::client::Client;
use weekly_calendar::config::{BackendConfig, Settings, CONFIG_ENV_VAR};
use weekly_calendar::output::{ErrorReport, OperationOutcome};
use weekly_calendar::traits::SourceRegistry;
use weekly_calendar::{Error, NewEvent, NewTodo, Provider, TodoAction};

#[derive(Parser)]
#[command(name = "weekly-calendar")]
#[command(about = "Create, list and update calendar events and to-do items. Results are printed as JSON")]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a calendar event
    CreateEvent {
        /// Calendar uid or name
        #[arg(long)]
        calendar: String,
        #[arg(long)]
        summary: String,
        /// Start time (UNIX timestamp)
        #[arg(long, allow_negative_numbers = true)]
        start: i64,
        /// End time (UNIX timestamp)
        #[arg(long, allow_negative_numbers = true)]
        end: i64,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Create a to-do item
    CreateTodo {
        /// Task list uid or name
        #[arg(long)]
        task_list: String,
        #[arg(long)]
        summary: String,
        /// Due date (UNIX timestamp, 0 for none)
        #[arg(long, default_value_t = 0)]
        due: i64,
        /// 0 (none) to 9
        #[arg(long, default_value_t = 0)]
        priority: u8,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List every task list
    ListTaskLists,
    /// List the to-do items of every enabled task list, by due date
    ListTodos {
        #[arg(long)]
        include_completed: bool,
    },
    /// Complete, uncomplete or delete a to-do item
    UpdateTodo {
        /// Task list uid or name
        #[arg(long)]
        task_list: String,
        #[arg(long)]
        uid: String,
        /// complete, uncomplete or delete
        #[arg(long)]
        action: String,
    },
}

impl Commands {
    fn is_listing(&self) -> bool {
        matches!(self, Commands::ListTaskLists | Commands::ListTodos { .. })
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => return fail(&cli.command, &Error::from(err)),
    };

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => return fail(&cli.command, &err),
    };
    log::debug!("Using settings {:?}", settings.backend);

    match &settings.backend {
        BackendConfig::Local { path } => match Cache::open(path) {
            Err(err) => fail(&cli.command, &err),
            Ok(cache) => runtime.block_on(run(provider(cache, &settings), &cli.command)),
        },
        BackendConfig::Caldav { url, username, password } => match Client::new(url, username, password) {
            Err(err) => fail(&cli.command, &err),
            Ok(client) => runtime.block_on(run(provider(client, &settings), &cli.command)),
        },
    }
}

fn provider<R: SourceRegistry + Sync>(registry: R, settings: &Settings) -> Provider<R> {
    Provider::new(registry).with_connect_timeout(settings.connect_timeout())
}

async fn run<R: SourceRegistry + Sync>(provider: Provider<R>, command: &Commands) -> ExitCode {
    match command {
        Commands::CreateEvent { calendar, summary, start, end, location, description } => {
            let fields = NewEvent {
                summary: summary.clone(),
                start: *start,
                end: *end,
                location: location.clone(),
                description: description.clone(),
            };
            outcome(provider.create_event(calendar, &fields).await.map(OperationOutcome::created))
        },
        Commands::CreateTodo { task_list, summary, due, priority, description } => {
            let fields = NewTodo {
                summary: summary.clone(),
                due: *due,
                priority: *priority,
                description: description.clone(),
            };
            outcome(provider.create_todo(task_list, &fields).await.map(OperationOutcome::created))
        },
        Commands::ListTaskLists => listing(provider.list_task_lists().await),
        Commands::ListTodos { include_completed } => listing(provider.list_todos(*include_completed).await),
        Commands::UpdateTodo { task_list, uid, action } => {
            let result = match action.parse::<TodoAction>() {
                Err(err) => Err(err),
                Ok(action) => provider.update_todo(task_list, uid, action).await,
            };
            outcome(result.map(|()| OperationOutcome::done()))
        },
    }
}

fn print_json<T: Serialize>(value: &T, to_stderr: bool) {
    match serde_json::to_string(value) {
        Ok(text) if to_stderr => eprintln!("{}", text),
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("Unable to serialize the result: {}", err),
    }
}

fn outcome(result: Result<OperationOutcome, Error>) -> ExitCode {
    match result {
        Ok(outcome) => {
            print_json(&outcome, false);
            ExitCode::SUCCESS
        },
        Err(err) => {
            log::debug!("{}", err);
            print_json(&OperationOutcome::failed(&err), false);
            ExitCode::FAILURE
        },
    }
}

fn listing<T: Serialize>(result: Result<Vec<T>, Error>) -> ExitCode {
    match result {
        Ok(items) => {
            print_json(&items, false);
            ExitCode::SUCCESS
        },
        Err(err) => {
            log::debug!("{}", err);
            print_json(&ErrorReport::from(&err), true);
            ExitCode::FAILURE
        },
    }
}

/// Report an error that happened before the command could run
fn fail(command: &Commands, err: &Error) -> ExitCode {
    log::debug!("{}", err);
    if command.is_listing() {
        print_json(&ErrorReport::from(err), true);
    } else {
        print_json(&OperationOutcome::failed(err), false);
    }
    ExitCode::FAILURE
}
