//! Operator-facing notification texts.
//!
//! All user-visible strings live here so the wording stays consistent
//! between the watcher, the confirmation flow, and the executor.

use std::time::Duration;
use vigia_core::types::FileRef;

/// Batch announcement for newly detected files.
pub fn new_files(files: &[FileRef]) -> String {
    let mut lines = vec![format!("Nuevos archivos detectados ({}):", files.len())];
    for file in files {
        lines.push(format!("  • {}", file.name));
    }
    lines.push(String::new());
    lines.push("Escribí la instrucción a ejecutar sobre estos archivos.".to_string());
    lines.join("\n")
}

/// A batch arrived while another task was still undecided or running.
pub fn batch_queued(count: usize) -> String {
    format!(
        "Se detectaron {count} archivo(s) nuevos. Quedan en cola hasta resolver la tarea pendiente."
    )
}

/// Confirmation prompt echoing the captured instruction.
pub fn confirm_prompt(instruction: &str, count: usize) -> String {
    format!(
        "Vas a ejecutar \"{instruction}\" sobre {count} archivo(s). \
         Respondé \"si\" para confirmar o \"no\" para cancelar."
    )
}

/// Prompt after the operator replaced the instruction mid-confirmation.
pub fn replaced_prompt(instruction: &str, count: usize) -> String {
    format!(
        "Instrucción actualizada. Vas a ejecutar \"{instruction}\" sobre {count} archivo(s). \
         Respondé \"si\" para confirmar o \"no\" para cancelar."
    )
}

pub fn no_pending() -> String {
    "No hay archivos pendientes.".to_string()
}

pub fn task_running() -> String {
    "Ya hay una tarea en ejecución. Esperá a que termine.".to_string()
}

pub fn cancelled() -> String {
    "Tarea cancelada.".to_string()
}

/// Success notice with elapsed time and, when present, the artifact location.
pub fn finalized(artifact: Option<&str>, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    match artifact {
        Some(location) => format!("Tarea finalizada en {secs:.1} s.\nResultado: {location}"),
        None => format!("Tarea finalizada en {secs:.1} s."),
    }
}

pub fn failed(reason: &str) -> String {
    format!("La tarea falló: {reason}\nEnviá una nueva instrucción para reintentar.")
}

pub fn suspended() -> String {
    "Tu suscripción está vencida. Renovala para seguir recibiendo avisos y ejecutar tareas."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_files_lists_names_and_count() {
        let files = vec![
            FileRef::new("f1", "informe.pdf"),
            FileRef::new("f2", "datos.csv"),
        ];
        let msg = new_files(&files);
        assert!(msg.contains("(2)"));
        assert!(msg.contains("informe.pdf"));
        assert!(msg.contains("datos.csv"));
        assert!(msg.contains("instrucción"));
    }

    #[test]
    fn test_confirm_prompt_echoes_instruction_and_count() {
        let msg = confirm_prompt("summarize these", 2);
        assert!(msg.contains("summarize these"));
        assert!(msg.contains("2 archivo(s)"));
        assert!(msg.contains("confirmar"));
    }

    #[test]
    fn test_replaced_prompt_mentions_update() {
        let msg = replaced_prompt("otra cosa", 3);
        assert!(msg.contains("actualizada"));
        assert!(msg.contains("otra cosa"));
        assert!(msg.contains("3 archivo(s)"));
    }

    #[test]
    fn test_finalized_with_and_without_artifact() {
        let with = finalized(Some("https://example.com/out.xlsx"), Duration::from_millis(12_340));
        assert!(with.contains("12.3 s"));
        assert!(with.contains("https://example.com/out.xlsx"));

        let without = finalized(None, Duration::from_secs(2));
        assert!(without.contains("2.0 s"));
        assert!(!without.contains("Resultado"));
    }

    #[test]
    fn test_failed_carries_reason() {
        let msg = failed("agent timed out");
        assert!(msg.contains("agent timed out"));
        assert!(msg.contains("falló"));
    }

    #[test]
    fn test_batch_queued_count() {
        assert!(batch_queued(4).contains("4 archivo(s)"));
    }
}
