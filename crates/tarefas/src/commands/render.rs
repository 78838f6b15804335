use std::io::{self, Write};

use tarefas_core::due::format_day;
use tarefas_core::{DashboardStats, DueStatus, Task};
use time::Date;
use time::format_description::well_known::Rfc3339;

pub fn task_table(out: &mut impl Write, tasks: &[&Task], today: Date) -> io::Result<()> {
    writeln!(
        out,
        "ID | Título | Responsável | Solicitante | Prioridade | Backlog | % | Entrega | Status | Subtarefas"
    )?;
    writeln!(
        out,
        "-- | ------ | ----------- | ----------- | ---------- | ------- | - | ------- | ------ | ----------"
    )?;

    for task in tasks {
        let (done, total) = task.subtask_progress();
        writeln!(
            out,
            "{} | {} | {} | {} | {} | {} | {}% | {} | {} | {done}/{total}",
            task.id,
            task.title,
            task.user_name,
            task.solicitante,
            task.priority.label(),
            task.backlog,
            task.porcentagem.get(),
            due_label(task, today),
            status_label(task),
        )?;
    }
    Ok(())
}

pub fn task_detail(out: &mut impl Write, task: &Task, today: Date) -> io::Result<()> {
    writeln!(out, "{} [{}]", task.title, status_label(task))?;
    writeln!(out, "ID:          {}", task.id)?;
    writeln!(out, "Responsável: {}", task.user_name)?;
    writeln!(out, "Solicitante: {}", task.solicitante)?;
    writeln!(out, "Prioridade:  {}", task.priority.label())?;
    writeln!(out, "Backlog:     {}", task.backlog)?;
    writeln!(out, "Progresso:   {}%", task.porcentagem.get())?;
    writeln!(out, "Entrega:     {}", due_label(task, today))?;
    writeln!(out, "Criada em:   {}", timestamp(task.created_at))?;
    writeln!(out, "Atualizada:  {}", timestamp(task.updated_at))?;
    if !task.comentario.is_empty() {
        writeln!(out, "Comentário:  {}", task.comentario)?;
    }

    let (done, total) = task.subtask_progress();
    writeln!(out, "Subtarefas ({done}/{total}):")?;
    if task.subtasks.is_empty() {
        writeln!(out, "  -")?;
    }
    for subtask in &task.subtasks {
        let mark = if subtask.completed { 'x' } else { ' ' };
        write!(out, "  [{mark}] {} ({})", subtask.title, subtask.id)?;
        if subtask.comentario.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, " - {}", subtask.comentario)?;
        }
    }
    Ok(())
}

pub fn dashboard(out: &mut impl Write, stats: &DashboardStats) -> io::Result<()> {
    writeln!(out, "Total de tarefas: {}", stats.total)?;
    writeln!(out, "Concluídas: {} ({:.0}%)", stats.completed, stats.share(stats.completed))?;
    writeln!(out, "Pendentes: {} ({:.0}%)", stats.pending, stats.share(stats.pending))?;
    writeln!(out, "Urgentes: {}", stats.urgent)?;
    writeln!(out, "Vencem hoje: {}", stats.due_today)?;
    writeln!(out, "Atrasadas: {}", stats.overdue)?;
    writeln!(out, "Usuários ativos: {}", stats.active_users)?;
    writeln!(
        out,
        "Subtarefas concluídas: {}/{}",
        stats.completed_subtasks, stats.total_subtasks
    )?;
    writeln!(out, "Por prioridade:")?;
    for entry in &stats.by_priority {
        writeln!(
            out,
            "  {}: {} ({:.0}%)",
            entry.priority.label(),
            entry.count,
            stats.share(entry.count)
        )?;
    }
    Ok(())
}

fn due_label(task: &Task, today: Date) -> String {
    let day = format_day(task.due_date);
    if task.completed {
        return day;
    }
    match task.due_status(today) {
        DueStatus::Overdue => format!("{day} (atrasada)"),
        DueStatus::Today => format!("{day} (hoje)"),
        DueStatus::Upcoming => day,
    }
}

const fn status_label(task: &Task) -> &'static str {
    if task.completed { "Concluída" } else { "Pendente" }
}

fn timestamp(value: time::OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| "-".to_owned())
}
