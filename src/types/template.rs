//! Fixed checklist template: five blocks of five tasks each.

use super::{Block, BlockId, Task};

/// Number of tasks in every block
pub const TASKS_PER_BLOCK: usize = 5;

/// Total number of checklist tasks (5 blocks × 5 tasks)
pub const TOTAL_TASKS: usize = BlockId::ALL.len() * TASKS_PER_BLOCK;

const TEMPLATE: [(BlockId, &str, [(&str, &str); TASKS_PER_BLOCK]); 5] = [
    (
        BlockId::PreShift,
        "Bloque 1: Antes del Turno (Riesgo)",
        [
            ("1.1", "Charla pre-operacional con foco en peligros del día"),
            ("1.2", "Validación de permisos de trabajo (PT) críticos"),
            ("1.3", "Inspección de condiciones de terreno y clima"),
            ("1.4", "Disponibilidad y estado de EPP específicos"),
            ("1.5", "Simulacro o validación de rutas de emergencia"),
        ],
    ),
    (
        BlockId::Operation,
        "Bloque 2: Durante la Operación (Presencia)",
        [
            ("2.1", "Supervisión directa en maniobras críticas/izajes"),
            ("2.2", "Monitoreo de parámetros (bombeo, RPM, peso)"),
            ("2.3", "Inspección visual periódica de equipos activos"),
            ("2.4", "Control de niveles de tanques y fluidos"),
            ("2.5", "Verificación de cumplimiento de tiempos operativos"),
        ],
    ),
    (
        BlockId::Technical,
        "Bloque 3: Técnica del Pozo (No Negociables)",
        [
            ("3.1", "Integridad de barreras mecánicas y de presión"),
            ("3.2", "Control de presiones en anular y cabezal"),
            ("3.3", "Alineación de válvulas y manifolds de superficie"),
            ("3.4", "Validación de profundidades y pesos de sarta"),
            ("3.5", "Check de herramientas de fondo (BHA/WL)"),
        ],
    ),
    (
        BlockId::Leadership,
        "Bloque 4: Personas y Decisiones (Liderazgo)",
        [
            ("4.1", "Confirmación de competencias críticas del personal"),
            ("4.2", "Gestión de cambios (MOC) ante imprevistos"),
            ("4.3", "Reunión de coordinación de mediodía (Toolbox)"),
            ("4.4", "Control de ingreso de visitas y terceros"),
            ("4.5", "Feedback correctivo de seguridad en el sitio"),
        ],
    ),
    (
        BlockId::Closure,
        "Bloque 5: Cierre del Turno (Evidencia)",
        [
            ("5.1", "Registro exacto de tiempos no productivos (NPT)"),
            ("5.2", "Reporte de incidentes o cuasi-accidentes"),
            ("5.3", "Conciliación de insumos y consumibles usados"),
            ("5.4", "Actualización de notas de entrega (Handover)"),
            ("5.5", "Identificación de lecciones aprendidas del día"),
        ],
    ),
];

/// Build the template blocks with every status and note cleared.
pub fn template_blocks() -> Vec<Block> {
    TEMPLATE
        .iter()
        .map(|(id, title, tasks)| Block {
            id: *id,
            title: (*title).to_string(),
            tasks: tasks
                .iter()
                .map(|(task_id, label)| Task::new(task_id, label))
                .collect(),
        })
        .collect()
}

/// Whether `blocks` carries exactly the template's block and task ids, in order.
pub fn matches_template(blocks: &[Block]) -> bool {
    blocks.len() == TEMPLATE.len()
        && blocks.iter().zip(TEMPLATE.iter()).all(|(block, (id, _, tasks))| {
            block.id == *id
                && block.tasks.len() == tasks.len()
                && block
                    .tasks
                    .iter()
                    .zip(tasks.iter())
                    .all(|(task, (task_id, _))| task.id == *task_id)
        })
}
