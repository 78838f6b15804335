use std::io::Write;

use anyhow::{Result, anyhow};
use tarefas_app::{
    FieldErrors, RemoteStore, StoreError, SubtaskFormData, TaskEditData, TaskFormData, TaskPatch, TaskStore,
    validate_edit,
};
use tarefas_core::due::parse_day;
use tarefas_core::{StatusFilter, SubtaskId, Task, TaskFilter, TaskFilterBuilder, TaskId, local_today};
use time::Date;

use crate::{Command, OutputFormat, SubtaskCommand};

mod check;
mod render;

/// Execute `command` against `store`, writing results to `out`.
pub async fn run<R: RemoteStore>(command: Command, store: &TaskStore<R>, out: &mut impl Write) -> Result<()> {
    run_at(command, store, local_today(), out).await
}

async fn run_at<R: RemoteStore>(
    command: Command,
    store: &TaskStore<R>,
    today: Date,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Check => check::run(store, today, out).await?,

        Command::Ls {
            user,
            priority,
            status,
            backlog,
            sort,
            format,
        } => {
            refresh(store).await?;
            let filter = TaskFilterBuilder::new()
                .user(user)
                .priority(priority)
                .status(StatusFilter::from(status))
                .backlog(backlog)
                .build();
            let tasks = store.tasks();
            let selected = filter.apply(&tasks, sort.into());
            list(out, &filter, &selected, format, today)?;
        }

        Command::Show { id, format } => {
            refresh(store).await?;
            let task = find_task(store, &id)?;
            match format {
                OutputFormat::Table => render::task_detail(out, &task, today)?,
                OutputFormat::Json => write_json(out, &task)?,
            }
        }

        Command::New {
            user,
            solicitante,
            title,
            due,
            priority,
            backlog,
            porcentagem,
            comentario,
        } => {
            let form = TaskFormData {
                user_name: user,
                solicitante,
                title,
                comentario: comentario.unwrap_or_default(),
                porcentagem,
                backlog,
                priority,
                due_date: due,
            };
            let input = form.validate(today).map_err(form_error)?;
            let task = store.create(input).await.map_err(store_error)?;
            writeln!(out, "Tarefa criada: {}", task.id)?;
        }

        Command::Edit {
            id,
            user,
            solicitante,
            title,
            due,
            priority,
            backlog,
            porcentagem,
            comentario,
        } => {
            refresh(store).await?;
            let task = find_task(store, &id)?;
            let mut edited = TaskEditData::from(&task);
            if let Some(value) = user {
                edited.user_name = value;
            }
            if let Some(value) = solicitante {
                edited.solicitante = value;
            }
            if let Some(value) = title {
                edited.title = value;
            }
            if let Some(value) = comentario {
                edited.comentario = value;
            }
            if let Some(raw) = due {
                edited.due_date = parse_day(raw.trim()).map_err(|_| anyhow!("Data de entrega inválida: {raw}"))?;
            }
            if let Some(value) = priority {
                edited.priority = value;
            }
            if let Some(value) = backlog {
                edited.backlog = value;
            }
            if let Some(value) = porcentagem {
                edited.porcentagem = tarefas_core::Percentage::clamped(value);
            }
            validate_edit(&edited).map_err(form_error)?;

            let patch = TaskPatch::from_task(&task, edited);
            if patch.is_empty() {
                writeln!(out, "Nenhuma alteração para a tarefa {}", task.id)?;
                return Ok(());
            }
            let updated = store
                .update(&task.id, patch.into_task_update())
                .await
                .map_err(store_error)?;
            writeln!(out, "Tarefa atualizada: {}", updated.id)?;
        }

        Command::Toggle { id } => {
            refresh(store).await?;
            let task = store.toggle_complete(&TaskId::from(id)).await.map_err(store_error)?;
            let state = if task.completed { "concluída" } else { "pendente" };
            writeln!(out, "Tarefa {} marcada como {state}", task.id)?;
        }

        Command::Rm { id } => {
            refresh(store).await?;
            let task = find_task(store, &id)?;
            store.remove(&task.id).await.map_err(store_error)?;
            writeln!(out, "Tarefa removida: {}", task.id)?;
        }

        Command::Subtask { cmd } => run_subtask(cmd, store, out).await?,

        Command::Dashboard { format } => {
            refresh(store).await?;
            let stats = store.dashboard(today);
            match format {
                OutputFormat::Table => render::dashboard(out, &stats)?,
                OutputFormat::Json => write_json(out, &stats)?,
            }
        }
    }

    Ok(())
}

async fn run_subtask<R: RemoteStore>(command: SubtaskCommand, store: &TaskStore<R>, out: &mut impl Write) -> Result<()> {
    match command {
        SubtaskCommand::Add { task, title, comentario } => {
            let form = SubtaskFormData {
                title,
                comentario: comentario.unwrap_or_default(),
            };
            let input = form.validate().map_err(form_error)?;
            refresh(store).await?;
            let task = find_task(store, &task)?;
            let subtask = store.add_subtask(&task.id, input).await.map_err(store_error)?;
            writeln!(out, "Subtarefa criada: {}", subtask.id)?;
        }
        SubtaskCommand::Toggle { task, subtask } => {
            refresh(store).await?;
            let task = find_task(store, &task)?;
            let subtask_id = find_subtask(&task, &subtask)?;
            store
                .toggle_subtask_complete(&task.id, &subtask_id)
                .await
                .map_err(store_error)?;
            let (done, total) = store.task(&task.id).map_or((0, 0), |task| task.subtask_progress());
            writeln!(out, "Subtarefa {subtask_id} atualizada ({done}/{total} concluídas)")?;
        }
        SubtaskCommand::Rm { task, subtask } => {
            refresh(store).await?;
            let task = find_task(store, &task)?;
            let subtask_id = find_subtask(&task, &subtask)?;
            store.remove_subtask(&task.id, &subtask_id).await.map_err(store_error)?;
            writeln!(out, "Subtarefa removida: {subtask_id}")?;
        }
    }
    Ok(())
}

/// Pull the current task list before a command that reads it.
async fn refresh<R: RemoteStore>(store: &TaskStore<R>) -> Result<()> {
    store.load_all().await.map_err(store_error)?;
    Ok(())
}

fn list(out: &mut impl Write, filter: &TaskFilter, tasks: &[&Task], format: OutputFormat, today: Date) -> Result<()> {
    if tasks.is_empty() && format == OutputFormat::Table {
        if filter.is_empty() {
            writeln!(out, "Nenhuma tarefa encontrada")?;
        } else {
            writeln!(out, "Nenhuma tarefa corresponde aos filtros informados")?;
        }
        return Ok(());
    }
    match format {
        OutputFormat::Table => render::task_table(out, tasks, today)?,
        OutputFormat::Json => write_json(out, &tasks)?,
    }
    Ok(())
}

fn write_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn find_task<R>(store: &TaskStore<R>, raw: &str) -> Result<Task> {
    let id = TaskId::from(raw.trim());
    store
        .task(&id)
        .ok_or_else(|| store_error(StoreError::task_not_found(id.as_str())))
}

fn find_subtask(task: &Task, raw: &str) -> Result<SubtaskId> {
    let id = SubtaskId::from(raw);
    task.subtask(&id)
        .map(|subtask| subtask.id.clone())
        .ok_or_else(|| store_error(StoreError::subtask_not_found(id.as_str())))
}

fn store_error(err: StoreError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn form_error(errors: FieldErrors) -> anyhow::Error {
    let lines: Vec<String> = errors.iter().map(|(_, message)| format!("  - {message}")).collect();
    anyhow!("Formulário inválido:\n{}", lines.join("\n"))
}
