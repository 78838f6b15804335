//! CLI entry point for tarefas.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tarefas_app::{MemoryStore, ProjectConfig, TaskStore};
use tarefas_core::{Backlog, Priority, SortKey, StatusFilter};
use tarefas_store_rest::RestStore;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Tasks and subtasks kept in a hosted table service.
#[derive(Parser, Debug)]
#[command(
    name = "tarefas",
    version,
    about = "tarefas: team task tracking backed by a hosted tasks/subtasks table pair"
)]
struct Cli {
    /// Directory holding `.tarefas/config.toml` (defaults to current).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Use a throwaway in-memory table service instead of the configured one.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks.
    Ls {
        #[arg(short = 'u', long)]
        user: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<Priority>,
        #[arg(short = 's', long, value_enum, default_value_t = StatusArg::All)]
        status: StatusArg,
        #[arg(short = 'b', long)]
        backlog: Option<Backlog>,
        #[arg(long, value_enum, default_value_t = SortArg::Due)]
        sort: SortArg,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show one task with its subtasks.
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Create a task.
    New {
        #[arg(short = 'u', long)]
        user: String,
        #[arg(long)]
        solicitante: String,
        #[arg(short = 't', long)]
        title: String,
        /// Due day, `YYYY-MM-DD`.
        #[arg(short = 'd', long)]
        due: String,
        #[arg(short = 'p', long, default_value_t = Priority::Media)]
        priority: Priority,
        #[arg(short = 'b', long)]
        backlog: Option<Backlog>,
        #[arg(long, allow_negative_numbers = true)]
        porcentagem: Option<i64>,
        #[arg(short = 'c', long)]
        comentario: Option<String>,
    },

    /// Change fields of an existing task.
    Edit {
        id: String,
        #[arg(short = 'u', long)]
        user: Option<String>,
        #[arg(long)]
        solicitante: Option<String>,
        #[arg(short = 't', long)]
        title: Option<String>,
        #[arg(short = 'd', long)]
        due: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<Priority>,
        #[arg(short = 'b', long)]
        backlog: Option<Backlog>,
        #[arg(long, allow_negative_numbers = true)]
        porcentagem: Option<i64>,
        #[arg(short = 'c', long)]
        comentario: Option<String>,
    },

    /// Flip a task between pending and completed.
    Toggle { id: String },

    /// Delete a task and its subtasks.
    Rm { id: String },

    /// Manage the subtasks of a task.
    Subtask {
        #[command(subcommand)]
        cmd: SubtaskCommand,
    },

    /// Summary figures over every task.
    Dashboard {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Exercise the connection: read, create, update and delete a throwaway task.
    Check,
}

#[derive(Subcommand, Debug)]
enum SubtaskCommand {
    /// Add a subtask.
    Add {
        task: String,
        #[arg(short = 't', long)]
        title: String,
        #[arg(short = 'c', long)]
        comentario: Option<String>,
    },
    /// Flip a subtask between pending and completed.
    Toggle { task: String, subtask: String },
    /// Delete a subtask.
    Rm { task: String, subtask: String },
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum StatusArg {
    All,
    Done,
    Pending,
}

impl From<StatusArg> for StatusFilter {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::All => Self::All,
            StatusArg::Done => Self::Completed,
            StatusArg::Pending => Self::Pending,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum SortArg {
    Due,
    Priority,
    User,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Due => Self::DueDate,
            SortArg::Priority => Self::Priority,
            SortArg::User => Self::User,
        }
    }
}

fn main() -> ExitCode {
    let Cli { config_dir, memory, cmd } = Cli::parse();
    install_tracing();

    let config_dir = config_dir.unwrap_or_else(|| PathBuf::from("."));
    match execute_command(&config_dir, memory, cmd) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Erro: {err:#}");
            eprintln!("A operação não foi concluída. Corrija o problema e execute o comando novamente.");
            ExitCode::FAILURE
        }
    }
}

fn execute_command(config_dir: &Path, memory: bool, command: Command) -> Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new()?;
    let mut stdout = io::stdout().lock();

    if memory {
        let store = TaskStore::new(MemoryStore::new());
        runtime.block_on(commands::run(command, &store, &mut stdout))?;
        stdout.flush()?;
        return Ok(ExitCode::SUCCESS);
    }

    let connection = ProjectConfig::load(config_dir)?.connection;
    let (url, key) = match connection.credentials() {
        Ok(credentials) => credentials,
        Err(issue) => {
            writeln!(io::stderr(), "{}", issue.banner())?;
            return Ok(ExitCode::from(2));
        }
    };
    let store = TaskStore::new(RestStore::new(url, key)?);
    runtime.block_on(commands::run(command, &store, &mut stdout))?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn install_tracing() {
    // RUST_LOG is honored; defaults to INFO. Logs go to stderr, output to stdout.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_new_command() {
        let cli = Cli::parse_from([
            "tarefas",
            "new",
            "--user",
            "Ana",
            "--solicitante",
            "Bruno",
            "--title",
            "Publicar edital",
            "--due",
            "2030-01-15",
            "--priority",
            "urgente",
            "--backlog",
            "Em andamento",
            "--porcentagem",
            "-5",
        ]);

        match cli.cmd {
            Command::New {
                user,
                title,
                priority,
                backlog,
                porcentagem,
                ..
            } => {
                assert_eq!(user, "Ana");
                assert_eq!(title, "Publicar edital");
                assert_eq!(priority, Priority::Urgente);
                assert_eq!(backlog, Some(Backlog::EmAndamento));
                assert_eq!(porcentagem, Some(-5));
            }
            _ => panic!("expected new command"),
        }
    }

    #[test]
    fn parse_ls_filters() {
        let cli = Cli::parse_from([
            "tarefas", "--memory", "ls", "--user", "ana", "--status", "pending", "--sort", "priority",
            "--format", "json",
        ]);
        assert!(cli.memory);
        match cli.cmd {
            Command::Ls {
                user,
                status,
                sort,
                format,
                priority,
                ..
            } => {
                assert_eq!(user.as_deref(), Some("ana"));
                assert_eq!(StatusFilter::from(status), StatusFilter::Pending);
                assert_eq!(SortKey::from(sort), SortKey::Priority);
                assert_eq!(format, OutputFormat::Json);
                assert!(priority.is_none());
            }
            _ => panic!("expected ls command"),
        }
    }

    #[test]
    fn parse_subtask_toggle() {
        let cli = Cli::parse_from(["tarefas", "subtask", "toggle", "t1", "s1"]);
        match cli.cmd {
            Command::Subtask {
                cmd: SubtaskCommand::Toggle { task, subtask },
            } => {
                assert_eq!(task, "t1");
                assert_eq!(subtask, "s1");
            }
            _ => panic!("expected subtask toggle"),
        }
    }

    #[test]
    fn rejects_unknown_priority() {
        let result = Cli::try_parse_from(["tarefas", "ls", "--priority", "critica"]);
        assert!(result.is_err());
    }

    #[test]
    fn unconfigured_directory_exits_with_banner_code() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let code = execute_command(dir.path(), false, Command::Dashboard {
            format: OutputFormat::Table,
        })?;
        assert_eq!(code, ExitCode::from(2));
        Ok(())
    }
}
