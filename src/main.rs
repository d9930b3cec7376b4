use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use dogeplus_console::assessment::{AssessmentView, GlobalOverview};
use dogeplus_console::board::SectionId;
use dogeplus_console::config::{ConfigError, ConsoleConfig};
use dogeplus_console::coordinator::{MoveError, MoveOutcome, RejectionPolicy};
use dogeplus_console::escalation::MoveIntent;
use dogeplus_console::events::{self, EventAuthority, EventDraft, EventError};
use dogeplus_console::levels;
use dogeplus_console::live::{LiveChannel, SocketChannel};
use dogeplus_console::notify::Notifications;
use dogeplus_console::remote::{HttpAuthority, MockAuthority, RemoteAuthority, RemoteError};
use dogeplus_console::session::{Session, SessionError};
use dogeplus_console::tasks::{self, TaskAuthority, TaskStatus, TaskUpdate};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("backend error: {0}")]
    Remote(#[from] RemoteError),
    #[error("move failed: {0}")]
    Move(#[from] MoveError),
    #[error("no central selected; pass --central or run `dogeplus session set-central`")]
    MissingCentral,
    #[error("no event selected; pass --event or run `dogeplus session set-event`")]
    MissingEvent,
    #[error("unknown section: {0}")]
    UnknownSection(String),
    #[error("unknown task status: {0} (expected notdone, working or done)")]
    UnknownStatus(String),
    #[error("task {0} was not updated")]
    TaskNotUpdated(String),
    #[error("event error: {0}")]
    Event(#[from] EventError),
    #[error("unknown lane: {0}")]
    UnknownLane(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dogeplus", about = "DogePlus operator console")]
struct Cli {
    /// Backend host and port, without scheme.
    #[arg(long, env = "DOGEPLUS_BASE_URL")]
    base_url: Option<String>,

    /// Dispatch center; defaults to the one stored in the session.
    #[arg(long, env = "DOGEPLUS_CENTRAL")]
    central: Option<String>,

    /// Serve fixture data instead of calling the backend.
    #[arg(long, default_value_t = false)]
    mock: bool,

    #[arg(long, value_enum, default_value_t = OnReject::Restore)]
    on_reject: OnReject,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnReject {
    Restore,
    Detach,
}

impl From<OnReject> for RejectionPolicy {
    fn from(value: OnReject) -> Self {
        match value {
            OnReject::Restore => Self::Restore,
            OnReject::Detach => Self::Detach,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the center's board.
    Board,
    /// Move one card and print the outcome.
    Move {
        card_id: String,
        /// Destination lane id or name.
        lane: String,
        #[arg(long)]
        section: Option<String>,
    },
    /// Keep the board live and print it on every change.
    Watch,
    /// Global four-quadrant overview with auto-scroll.
    Overview {
        /// Cards visible per quadrant.
        #[arg(long, default_value_t = 5)]
        window: usize,
        /// Stop after this many scroll steps.
        #[arg(long)]
        ticks: Option<usize>,
    },
    Tasks(TasksCommand),
    Events(EventsCommand),
    /// Print the escalation level definitions.
    Levels,
    Session(SessionCommand),
}

#[derive(Args, Debug)]
struct TasksCommand {
    #[command(subcommand)]
    command: TasksSubcommand,
}

#[derive(Subcommand, Debug)]
enum TasksSubcommand {
    List {
        #[arg(long)]
        event: Option<u64>,
    },
    SetStatus {
        uuid: String,
        status: String,
        #[arg(long)]
        event: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct EventsCommand {
    #[command(subcommand)]
    command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EventsSubcommand {
    /// List the center's active events; a single one is selected.
    List,
    /// List the categories a new event can be filed under.
    Categories,
    /// Request a new event from a lane or Incidente section.
    New { lane: String },
    /// Create the requested event.
    Create {
        event_nr: u64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        location_detail: String,
    },
    /// Drop the pending new-event request.
    Cancel,
}

#[derive(Args, Debug)]
struct SessionCommand {
    #[command(subcommand)]
    command: SessionSubcommand,
}

#[derive(Subcommand, Debug)]
enum SessionSubcommand {
    Show,
    SetUsername { username: String },
    SetCentral { central: String },
    SetEvent { event_nr: u64 },
    SetIncidentLevel { level: String },
}

struct Backend {
    board: Arc<dyn RemoteAuthority>,
    tasks: Arc<dyn TaskAuthority>,
    events: Arc<dyn EventAuthority>,
}

impl Backend {
    fn new(config: &ConsoleConfig) -> Result<Self, CliError> {
        if config.mock {
            let mock = Arc::new(MockAuthority::new());
            return Ok(Self { board: mock.clone(), tasks: mock.clone(), events: mock });
        }
        let http = Arc::new(HttpAuthority::new(config)?);
        Ok(Self { board: http.clone(), tasks: http.clone(), events: http })
    }
}

struct CliContext {
    config: ConsoleConfig,
    session: Session,
    central: Option<String>,
    policy: RejectionPolicy,
}

impl CliContext {
    fn central(&self) -> Result<String, CliError> {
        self.central
            .clone()
            .or_else(|| self.session.central().map(str::to_owned))
            .ok_or(CliError::MissingCentral)
    }

    fn event(&self, explicit: Option<u64>) -> Result<u64, CliError> {
        explicit.or(self.session.state().event_nr).ok_or(CliError::MissingEvent)
    }

    fn notifications(&self) -> Notifications {
        Notifications::new(self.config.notification_ttl)
    }

    async fn mount(&self, backend: &Backend) -> Result<AssessmentView, CliError> {
        let central = self.central()?;
        Ok(AssessmentView::mount(central, Arc::clone(&backend.board), self.notifications(), self.policy).await)
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::from_env()?;
    if let Some(base) = cli.base_url {
        config.base = base;
    }
    config.mock |= cli.mock;

    let session = Session::load(&config.session_path)?;
    let mut ctx = CliContext { config, session, central: cli.central, policy: cli.on_reject.into() };

    match cli.command {
        Command::Board => run_board(&ctx).await,
        Command::Move { card_id, lane, section } => run_move(&ctx, card_id, lane, section).await,
        Command::Watch => run_watch(&ctx).await,
        Command::Overview { window, ticks } => run_overview(&ctx, window, ticks).await,
        Command::Tasks(cmd) => run_tasks(&ctx, cmd).await,
        Command::Events(cmd) => run_events(&mut ctx, cmd).await,
        Command::Levels => print_json(&levels::definitions()),
        Command::Session(cmd) => run_session(&mut ctx, cmd),
    }
}

async fn run_board(ctx: &CliContext) -> Result<(), CliError> {
    let backend = Backend::new(&ctx.config)?;
    let view = ctx.mount(&backend).await?;
    print_json(&view.lanes())
}

async fn run_move(ctx: &CliContext, card_id: String, lane: String, section: Option<String>) -> Result<(), CliError> {
    let section = section
        .map(|raw| SectionId::parse(&raw).ok_or(CliError::UnknownSection(raw)))
        .transpose()?;
    let backend = Backend::new(&ctx.config)?;
    let view = ctx.mount(&backend).await?;

    match view.move_card(MoveIntent::new(card_id, lane, section)).await? {
        MoveOutcome::Noop => println!("no move: card already there"),
        MoveOutcome::Committed { from, to, direction } => println!("{} {from} -> {to}", direction.as_str()),
    }
    Ok(())
}

async fn run_watch(ctx: &CliContext) -> Result<(), CliError> {
    let backend = Backend::new(&ctx.config)?;
    let mut view = ctx.mount(&backend).await?;
    let channel = SocketChannel::new(ctx.config.ws_url(), ctx.config.live);
    view.attach_live(&channel);
    channel.connect();

    let mut revisions = view.store().subscribe();
    print_json(&view.lanes())?;
    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                print_json(&view.lanes())?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    view.teardown();
    channel.disconnect();
    Ok(())
}

#[derive(Serialize)]
struct QuadrantStatus<'a> {
    center: &'a str,
    cards: usize,
    cursor: Option<usize>,
    showing: Option<u64>,
}

async fn run_overview(ctx: &CliContext, window: usize, ticks: Option<usize>) -> Result<(), CliError> {
    let backend = Backend::new(&ctx.config)?;
    let central = ctx.central()?;
    let mut overview = GlobalOverview::new();
    overview.refresh(backend.board.as_ref(), &central).await;
    print_json(&overview.boards())?;

    let mut interval = tokio::time::interval(ctx.config.scroll_interval);
    interval.tick().await;
    let mut done = 0;
    while ticks.is_none_or(|limit| done < limit) {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        let cursors = overview.tick(window);
        let status: Vec<QuadrantStatus<'_>> = overview
            .boards()
            .iter()
            .zip(cursors)
            .map(|(board, cursor)| QuadrantStatus {
                center: &board.center,
                cards: board.card_count(),
                cursor,
                showing: cursor.and_then(|idx| board.cards().nth(idx)).map(|card| card.event),
            })
            .collect();
        print_json(&status)?;
        done += 1;
    }
    Ok(())
}

async fn run_tasks(ctx: &CliContext, cmd: TasksCommand) -> Result<(), CliError> {
    let backend = Backend::new(&ctx.config)?;
    let central = ctx.central()?;
    match cmd.command {
        TasksSubcommand::List { event } => {
            let event = ctx.event(event)?;
            let list = backend.tasks.fetch_tasks(&central, event).await?;
            let groups: Vec<_> = tasks::group_by_role(&list)
                .into_iter()
                .map(|(role, tasks)| json!({"role": role, "tasks": tasks}))
                .collect();
            print_json(&json!({"completion": tasks::completion_of(&list), "groups": groups}))
        }
        TasksSubcommand::SetStatus { uuid, status, event } => {
            let status = TaskStatus::parse(&status).ok_or(CliError::UnknownStatus(status))?;
            let modified_by = ctx.session.state().username.clone().unwrap_or_default();
            let update = TaskUpdate { uuid: uuid.clone(), status, modified_by };
            if !backend.tasks.update_task_status(&update).await? {
                return Err(CliError::TaskNotUpdated(uuid));
            }
            let event = ctx.event(event)?;
            let list = backend.tasks.fetch_tasks(&central, event).await?;
            print_json(&tasks::completion_of(&list))
        }
    }
}

async fn run_events(ctx: &mut CliContext, cmd: EventsCommand) -> Result<(), CliError> {
    match cmd.command {
        EventsSubcommand::List => {
            let backend = Backend::new(&ctx.config)?;
            let central = ctx.central()?;
            let active = events::load_active_events(backend.events.as_ref(), &mut ctx.session, &central).await?;
            print_json(&active)
        }
        EventsSubcommand::Categories => {
            let backend = Backend::new(&ctx.config)?;
            print_json(&backend.events.fetch_categories().await?)
        }
        EventsSubcommand::New { lane } => {
            let (kind, section) = events::new_event_target(&lane).ok_or(CliError::UnknownLane(lane))?;
            ctx.session.open_new_event(kind, section)?;
            print_json(ctx.session.state())
        }
        EventsSubcommand::Create { event_nr, category, location, location_detail } => {
            let backend = Backend::new(&ctx.config)?;
            let central = ctx.central()?;
            let available = backend.events.fetch_categories().await?;
            let categories = events::select_categories(&available, category.as_deref())?;
            let draft = EventDraft { event_number: event_nr, location, location_detail, categories };
            let notifications = ctx.notifications();
            let authority = backend.events.as_ref();
            let created = events::create_event(authority, &mut ctx.session, &notifications, &central, &draft).await?;
            print_json(&created)
        }
        EventsSubcommand::Cancel => {
            ctx.session.cancel_new_event()?;
            print_json(ctx.session.state())
        }
    }
}

fn run_session(ctx: &mut CliContext, cmd: SessionCommand) -> Result<(), CliError> {
    let session = &mut ctx.session;
    match cmd.command {
        SessionSubcommand::Show => {}
        SessionSubcommand::SetUsername { username } => session.set_username(Some(username))?,
        SessionSubcommand::SetCentral { central } => session.set_central(Some(central))?,
        SessionSubcommand::SetEvent { event_nr } => session.set_event_nr(Some(event_nr))?,
        SessionSubcommand::SetIncidentLevel { level } => {
            let level = SectionId::parse(&level).ok_or(CliError::UnknownSection(level))?;
            session.set_incident_level(Some(level))?;
        }
    }
    print_json(session.state())?;
    eprintln!("next step: {:?}", session.next_step());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
