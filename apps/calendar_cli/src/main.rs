use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client_core::{config::load_settings, Alert, AuthState, CalendarApp};
use shared::{
    domain::{CalendarEvent, EventId},
    protocol::{LoginRequest, RegisterRequest},
};
use tokio::sync::broadcast::Receiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "calendar", about = "Calendar API client")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Status,
    Events,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,
    },
    Delete {
        id: String,
    },
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 timestamp: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    info!(api_url = %settings.api_url, mode = ?settings.mode, "starting");

    let app = CalendarApp::from_settings(&settings).await?;
    let mut alerts = app.subscribe_alerts();
    app.bootstrap().await?;

    let outcome = run(&app, cli.command).await;
    print_alerts(&mut alerts);
    outcome
}

async fn run(app: &CalendarApp, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            app.auth()
                .start_login(&LoginRequest { email, password })
                .await?;
            print_status(app);
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            app.auth()
                .start_register(&RegisterRequest {
                    name,
                    email,
                    password,
                })
                .await?;
            print_status(app);
        }
        Command::Logout => {
            app.auth().start_logout().await?;
            print_status(app);
        }
        Command::Status => print_status(app),
        Command::Events => {
            require_login(app)?;
            print_events(&app.events().events());
        }
        Command::Create {
            title,
            notes,
            start,
            end,
        } => {
            require_login(app)?;
            let mut draft = app.editor().open_new_event(Utc::now());
            draft.title = title;
            draft.notes = notes;
            if let Some(start) = start {
                let length = draft.end - draft.start;
                draft.start = start;
                draft.end = start + length;
            }
            if let Some(end) = end {
                draft.end = end;
            }
            let saved = app.editor().submit(draft).await?;
            println!("created {}", describe(&saved));
        }
        Command::Update {
            id,
            title,
            notes,
            start,
            end,
        } => {
            require_login(app)?;
            let event = find_event(app, &id)?;
            app.editor().open_event(event);
            let mut draft = app.editor().form_values(Utc::now());
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(notes) = notes {
                draft.notes = notes;
            }
            if let Some(start) = start {
                draft.start = start;
            }
            if let Some(end) = end {
                draft.end = end;
            }
            let saved = app.editor().submit(draft).await?;
            println!("updated {}", describe(&saved));
        }
        Command::Delete { id } => {
            require_login(app)?;
            let event = find_event(app, &id)?;
            app.events().set_active_event(event);
            app.events().start_deleting_event().await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn require_login(app: &CalendarApp) -> Result<()> {
    if !app.auth_store().select(AuthState::is_authenticated) {
        bail!("not signed in; run `calendar login` first");
    }
    Ok(())
}

fn find_event(app: &CalendarApp, id: &str) -> Result<CalendarEvent> {
    app.calendar_store()
        .select(|state| state.event(&EventId::new(id)).cloned())
        .with_context(|| format!("no event with id {id}"))
}

fn print_status(app: &CalendarApp) {
    let state = app.auth().snapshot();
    match &state.user {
        Some(user) => println!("{} as {} ({})", state.status, user.name, user.uid),
        None => println!("{}", state.status),
    }
    if let Some(message) = &state.error_message {
        println!("error: {message}");
    }
}

fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("no events");
        return;
    }
    for event in events {
        println!("{}", describe(event));
    }
}

fn describe(event: &CalendarEvent) -> String {
    format!(
        "{}  {} .. {}  {}",
        event.id,
        event.start.to_rfc3339(),
        event.end.to_rfc3339(),
        event.title
    )
}

fn print_alerts(alerts: &mut Receiver<Alert>) {
    while let Ok(alert) = alerts.try_recv() {
        eprintln!("{}: {}", alert.title, alert.message);
    }
}
