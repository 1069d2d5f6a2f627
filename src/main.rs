use chrono::NaiveDate;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use igazolas::attendance::{explain_attendance, is_range_non_attendance, required_days_in_range};
use igazolas::config::ClientConfig;
use igazolas::error::AppError;
use igazolas::models::{StudentClass, SyncType, Theme};
use igazolas::services::{MulasztasSource, SyncOptions, SyncOutcome, SyncService};
use igazolas::session::Session;
use igazolas::state::AppState;

const USAGE: &str = "usage: igazolas <command>
  check <date> [--class <id>]
  range <from> <to> [--class <id>]
  mulasztasok [--no-live]
  sync-status <base|user|class>
  sync <base|user|class>
  login <token>
  logout
  theme [light|dark|system]";

enum Command {
    Check { date: NaiveDate, class_id: Option<i64> },
    Range { from: NaiveDate, to: NaiveDate, class_id: Option<i64> },
    Mulasztasok { live: bool },
    SyncStatus(SyncType),
    Sync(SyncType),
    Login(String),
    Logout,
    Theme(Option<Theme>),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, AppError> {
        let (name, rest) = args
            .split_first()
            .ok_or_else(|| AppError::Validation(USAGE.to_string()))?;
        let class_id = class_flag(rest)?;
        let positional: Vec<&String> = positional_args(rest);

        match (name.as_str(), positional.as_slice()) {
            ("check", [date]) => Ok(Command::Check {
                date: parse_date(date)?,
                class_id,
            }),
            ("range", [from, to]) => Ok(Command::Range {
                from: parse_date(from)?,
                to: parse_date(to)?,
                class_id,
            }),
            ("mulasztasok", []) => Ok(Command::Mulasztasok {
                live: !rest.iter().any(|a| a == "--no-live"),
            }),
            ("sync-status", [kind]) => Ok(Command::SyncStatus(kind.parse()?)),
            ("sync", [kind]) => Ok(Command::Sync(kind.parse()?)),
            ("login", [token]) => Ok(Command::Login(token.to_string())),
            ("logout", []) => Ok(Command::Logout),
            ("theme", []) => Ok(Command::Theme(None)),
            ("theme", [value]) => Theme::parse(value)
                .map(|t| Command::Theme(Some(t)))
                .ok_or_else(|| AppError::Validation(format!("unknown theme: {}", value))),
            _ => Err(AppError::Validation(USAGE.to_string())),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("invalid date {:?}: {}", raw, e)))
}

fn class_flag(args: &[String]) -> Result<Option<i64>, AppError> {
    match args.iter().position(|a| a == "--class") {
        Some(i) => {
            let raw = args
                .get(i + 1)
                .ok_or_else(|| AppError::Validation("--class needs an id".to_string()))?;
            raw.parse()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("invalid class id: {}", raw)))
        }
        None => Ok(None),
    }
}

fn positional_args(args: &[String]) -> Vec<&String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--class" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg);
    }
    out
}

fn resolve_class(class_id: Option<i64>, session: Option<&Session>) -> Option<StudentClass> {
    match class_id {
        Some(id) => Some(StudentClass::new(id, "")),
        None => session.and_then(|s| s.student_class().cloned()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "igazolas=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = ClientConfig::new_from_env()?;
    let state = AppState::init(config).await?;

    let session = match state.credentials.token() {
        Some(_) if matches!(command, Command::Login(_)) => None,
        Some(token) => {
            match Session::login(&token, state.credentials.clone(), state.backend.as_ref(), &state.store).await {
                Ok(session) => Some(session),
                Err(e) if e.is_auth() => {
                    warn!("stored credentials were rejected, continuing without a session");
                    None
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => None,
    };

    match command {
        Command::Login(token) => {
            let session =
                Session::login(&token, state.credentials.clone(), state.backend.as_ref(), &state.store).await?;
            println!("logged in as {}", session.profile().name);
        }
        Command::Check { date, class_id } => {
            let class = resolve_class(class_id, session.as_deref());
            let schedule = state.backend.fetch_schedule(date, date).await?;
            let decision = explain_attendance(date, class.as_ref(), &schedule);
            let verdict = if decision.required { "required" } else { "not required" };
            println!("{}: {} ({})", date, verdict, decision.reason);
        }
        Command::Range { from, to, class_id } => {
            let class = resolve_class(class_id, session.as_deref());
            let schedule = state.backend.fetch_schedule(from, to).await?;
            if is_range_non_attendance(from, to, class.as_ref(), &schedule) {
                println!("{} .. {}: no attendance required", from, to);
            } else {
                for day in required_days_in_range(from, to, class.as_ref(), &schedule) {
                    println!("{}: required", day);
                }
            }
        }
        Command::Mulasztasok { live } => {
            let mut options = SyncOptions::from_config(&state.config, SyncType::User);
            options.auto_sync = options.auto_sync && live;
            let service = SyncService::new(MulasztasSource::new(state.backend.clone()), options);

            let pending = service.mount().await?;
            println!("cached: {} entries", service.snapshot().item_count());

            if let Some(handle) = pending {
                match handle.await? {
                    SyncOutcome::Synced { items } => println!("live: {} entries", items),
                    SyncOutcome::NotRegistered => println!("not registered with FTV, showing cached data"),
                    SyncOutcome::Failed { message } => println!("live sync failed, showing cached data: {}", message),
                    other => info!("sync finished: {:?}", other),
                }
            }
            for entry in service.data().unwrap_or_default() {
                let status = if entry.excused { "excused" } else { "unexcused" };
                println!("{} #{} {:?} {}", entry.date, entry.period, entry.kind, status);
            }
        }
        Command::SyncStatus(sync_type) => {
            let metadata = state.backend.fetch_sync_metadata(sync_type).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Sync(sync_type) => {
            let metadata = state.backend.trigger_sync(sync_type).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Logout => {
            match &session {
                Some(session) => session.logout(&state.store).await?,
                None => state.store.clear_auth_token().await?,
            }
            println!("logged out");
        }
        Command::Theme(Some(theme)) => {
            state.store.set_theme(theme).await?;
            println!("theme set to {}", theme.as_str());
        }
        Command::Theme(None) => {
            let theme = match &session {
                Some(session) => session.theme(),
                None => state.store.theme().await?,
            };
            println!("{}", theme.as_str());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mulasztasok_live_flag() {
        let parsed = Command::parse(&args(&["mulasztasok"])).expect("parse");
        assert!(matches!(parsed, Command::Mulasztasok { live: true }));

        let parsed = Command::parse(&args(&["mulasztasok", "--no-live"])).expect("parse");
        assert!(matches!(parsed, Command::Mulasztasok { live: false }));
    }

    #[test]
    fn test_check_with_class_flag() {
        let parsed = Command::parse(&args(&["check", "2024-09-02", "--class", "7"])).expect("parse");
        match parsed {
            Command::Check { date, class_id } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 9, 2).expect("date"));
                assert_eq!(class_id, Some(7));
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(Command::parse(&args(&["check", "2024-13-40"])).is_err());
        assert!(Command::parse(&args(&["unknown"])).is_err());
        assert!(Command::parse(&[]).is_err());
    }
}
