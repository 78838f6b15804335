//! Connection self-test.

use std::io::Write;

use anyhow::Result;
use tarefas_app::{RemoteStore, StoreError, TaskFormData, TaskStore, TaskUpdate};
use tarefas_core::Priority;
use tarefas_core::due::format_day;
use time::Date;
use tracing::warn;

use super::{form_error, store_error};

const TEST_TITLE: &str = "Teste de conexão";

/// Read, create, update and delete a throwaway task, reporting each step.
pub async fn run<R: RemoteStore>(store: &TaskStore<R>, today: Date, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Testando conexão com o serviço de tabelas...")?;

    let tasks = step(out, "Leitura das tarefas", store.load_all().await)?;
    writeln!(out, "  {} tarefa(s) encontrada(s)", tasks.len())?;

    let form = TaskFormData {
        user_name: "tarefas".into(),
        solicitante: "tarefas check".into(),
        title: TEST_TITLE.into(),
        comentario: "Tarefa temporária criada pelo teste de conexão".into(),
        porcentagem: None,
        backlog: None,
        priority: Priority::Baixa,
        due_date: format_day(today),
    }
    .validate(today)
    .map_err(form_error)?;
    let created = step(out, "Criação da tarefa de teste", store.create(form).await)?;

    let updated = store.update(&created.id, TaskUpdate::completed(true)).await;
    if updated.is_err() {
        if let Err(err) = store.remove(&created.id).await {
            warn!(task = %created.id, error = %err, "test task left behind");
        }
    }
    step(out, "Atualização da tarefa de teste", updated)?;
    step(out, "Remoção da tarefa de teste", store.remove(&created.id).await)?;

    writeln!(out, "Conexão OK: leitura e escrita funcionando.")?;
    Ok(())
}

fn step<T>(out: &mut impl Write, label: &str, result: Result<T, StoreError>) -> Result<T> {
    match result {
        Ok(value) => {
            writeln!(out, "✓ {label}")?;
            Ok(value)
        }
        Err(err) => {
            writeln!(out, "✗ {label}: {}", err.user_message())?;
            Err(store_error(err))
        }
    }
}
