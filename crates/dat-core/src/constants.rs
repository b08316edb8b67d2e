//! Constantes del motor de agregación.

/// Cuerpo exacto del mensaje LOG con el que el worker cierra una ejecución.
/// La comparación es literal: variantes ("Job run ended.", minúsculas) no
/// cuentan como cierre.
pub const JOB_RUN_ENDED: &str = "Job run ended";

/// Campo numérico que los generators publican en mensajes estructurados.
pub const DOCS_PROCESSED_FIELD: &str = "n_docs_processed";

/// Frase que emiten los destinations al terminar un lote de un stream.
pub const PROCESSED_CHUNKS_PATTERN: &str = r"Processed (?P<stream>.+?): (?P<count>\d+) document chunks\.";
