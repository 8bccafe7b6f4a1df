//! Instruction payload for the narrative generator
//!
//! One self-contained instruction string: report identity, the
//! operation-type rule, content rules, the full checklist and the bitácora
//! with explicit fallbacks for empty fields.

use crate::types::{OperationType, ShiftData, Task};

/// Placeholder for tasks without a recorded status
pub const UNRECORDED: &str = "SIN REGISTRO";

/// Fallbacks used when a bitácora field is empty
pub const NO_DECISIONS: &str = "No se registraron decisiones extraordinarias";
pub const NO_AVOIDED_RISKS: &str = "No se reportaron riesgos evitados";
pub const NO_PENDING_ALERTS: &str = "Sin alertas pendientes";

const DRILLING_RULE: &str = "TIPO DE OPERACIÓN: PERFORACIÓN. Los parámetros de taladro \
(RPM, torque, ROP, presión de lodo) solo pueden mencionarse si aparecen en las notas del usuario.";

const WORKOVER_RULE: &str = "TIPO DE OPERACIÓN: WORKOVER. Está prohibido mencionar RPM, torque, \
ROP o presión de lodo. El resumen debe centrarse en velocidad de viaje, tensión (overpull), \
asentamiento de herramientas, pruebas de integridad y completamiento.";

/// Tunables for the instruction text
#[derive(Debug, Clone)]
pub struct PromptStyle {
    /// Upper bound on narrative length
    pub max_words: u32,
    /// Operator name used in the persona line, if any
    pub organization: Option<String>,
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self {
            max_words: 180,
            organization: None,
        }
    }
}

/// Operation-type conditioned rule for technical parameters
pub fn operation_rule(operation: OperationType) -> &'static str {
    match operation {
        OperationType::Perforacion => DRILLING_RULE,
        OperationType::Workover => WORKOVER_RULE,
    }
}

fn or_fallback<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}

fn format_task(task: &Task) -> String {
    let status = task.status.map_or(UNRECORDED, |s| s.code());
    match task.note.as_deref().map(str::trim) {
        Some(note) if !note.is_empty() => {
            format!("{} [{}] (Nota técnica: {})", task.label, status, note)
        }
        _ => format!("{} [{}]", task.label, status),
    }
}

/// Checklist section: one line per block, tasks separated by `; `
pub fn format_checklist(shift: &ShiftData) -> String {
    shift
        .blocks
        .iter()
        .map(|block| {
            let tasks: Vec<String> = block.tasks.iter().map(format_task).collect();
            format!("- {}: {}", block.title, tasks.join("; "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full instruction for `shift` graded at `score`.
pub fn build_instruction(shift: &ShiftData, score: u8, style: &PromptStyle) -> String {
    let persona = match style.organization.as_deref() {
        Some(org) if !org.trim().is_empty() => {
            format!("Actúa como un arquitecto senior de operaciones de {}.", org.trim())
        }
        _ => "Actúa como un arquitecto senior de operaciones de pozo.".to_string(),
    };
    let company_man = or_fallback(&shift.company_man, "No informado");

    format!(
        "{persona}\n\
         Genera el \"Reporte Ejecutivo - {well}\".\n\
         \n\
         IDENTIFICACIÓN DEL REPORTE (usa estos datos exactos):\n\
         - Nombre del Pozo: {well}\n\
         - Equipo/Rig: {rig}\n\
         - Company Man Responsable: {company_man}\n\
         - Fecha Operativa: {date}\n\
         - Gestión de Seguridad (Score): {score}%\n\
         \n\
         LÓGICA DE NEGOCIO:\n\
         {rule}\n\
         \n\
         REGLAS DE CONTENIDO:\n\
         1. No inventes nombres de pozos, equipos ni parámetros técnicos que no estén en los datos.\n\
         2. Si no hay notas técnicas, el resumen trata solo del cumplimiento de los bloques de seguridad.\n\
         3. Identifica las desviaciones y resalta las decisiones críticas del turno.\n\
         4. Estilo corporativo, sobrio y técnico, orientado a alta gerencia.\n\
         \n\
         CONTENIDO DEL CHECKLIST:\n\
         {checklist}\n\
         \n\
         NOTAS DE CAMPO:\n\
         - Decisiones Tomadas: {decisions}\n\
         - Riesgos Mitigados: {risks}\n\
         - Alertas para el siguiente turno: {alerts}\n\
         \n\
         Formato de salida: Markdown estructurado, tono profesional, máximo {max_words} palabras.",
        persona = persona,
        well = shift.well_name,
        rig = shift.rig,
        company_man = company_man,
        date = shift.date.format("%d/%m/%Y"),
        score = score,
        rule = operation_rule(shift.operation_type),
        checklist = format_checklist(shift),
        decisions = or_fallback(&shift.critical_decisions, NO_DECISIONS),
        risks = or_fallback(&shift.avoided_risks, NO_AVOIDED_RISKS),
        alerts = or_fallback(&shift.next_shift_alerts, NO_PENDING_ALERTS),
        max_words = style.max_words,
    )
}
