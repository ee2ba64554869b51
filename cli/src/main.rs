use clap::Parser;
mod commands;
mod progress;
mod workspace;
use commands::cli;
use taskforge_core::api::{AppConfig, CliError, LoggingConfig, SessionError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use workspace::Workspace;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(args.config.as_deref())?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;
    tracing::debug!(storage = %cfg.storage.directory, "config loaded");

    let ws = Workspace::new(cfg);
    dispatch(args.command, &ws).await
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, CliError> {
    let loaded = match path {
        Some(path) => taskforge_core::config::get_data_dir().and_then(|data_dir| {
            taskforge_core::config::load_from(path)
                .and_then(|cfg| taskforge_core::config::finalize(cfg, &data_dir))
        }),
        None => taskforge_core::config::load_default(),
    };
    loaded.map_err(|e| CliError::Config(format!("{e:#}")))
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 20: IO / persistence error
    // 30: planning failed
    // 40: execution paused (failed or stalled tasks, ctrl-c)
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) | CliError::Json(_) | CliError::Command(_) => 20,
        CliError::Session(se) => match se {
            SessionError::Planning(_) => 30,
            SessionError::Artifact(_) => 20,
            _ => 50,
        },
        CliError::Paused(_) => 40,
        CliError::Plan(_) => 50,
        CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(cmd: cli::Commands, ws: &Workspace) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Plan(plan_args) => commands::plan::plan(ws, plan_args).await,
        cli::Commands::Run(run_args) => commands::run::run(ws, run_args).await,
        cli::Commands::Status(status_args) => commands::status::status(ws, status_args).await,
        cli::Commands::Validate => commands::status::validate(ws).await,
        cli::Commands::Task(task_cmd) => commands::edit::task(ws, task_cmd).await,
        cli::Commands::Role(role_cmd) => commands::edit::role(ws, role_cmd).await,
        cli::Commands::Artifacts(view_args) => {
            commands::artifacts::artifacts(ws, view_args).await
        }
        cli::Commands::Export(export_args) => commands::artifacts::export(ws, export_args).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("taskforge"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("taskforge.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::api::PlanningError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for_error(&CliError::Config("x".into())), 11);
        assert_eq!(
            exit_code_for_error(&CliError::Session(SessionError::Planning(
                PlanningError::EmptyGoal
            ))),
            30
        );
        assert_eq!(exit_code_for_error(&CliError::Paused("x".into())), 40);
        assert_eq!(
            exit_code_for_error(&CliError::Session(SessionError::NoPlan)),
            50
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\npacing_ms = 5\n").unwrap();
        let cfg = load_config(Some(path.as_path())).unwrap();
        assert!(!cfg.storage.directory.is_empty());

        assert!(matches!(
            load_config(Some(tmp.path().join("missing.toml").as_path())),
            Err(CliError::Config(_))
        ));
    }
}
