#[derive(thiserror::Error, Debug)]
pub enum ExportErrorKind {
    #[error("field `{field}` is marked for export but `{type_name}` isn't an interface")]
    NotInterface { field: &'static str, type_name: &'static str },
    #[error("field `{field}` can't be both exported and injected")]
    ExportWithInject { field: &'static str },
    #[error("field `{field}` embeds `{type_name}` inside itself")]
    EmbeddingCycle { field: &'static str, type_name: &'static str },
}
