use std::{io, path::PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum PropertiesErrorKind {
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("Invalid property line {line}: `{content}`")]
    Syntax { line: usize, content: String },
    #[error("Property `{key}` has value `{value}` that can't be parsed as {type_name}")]
    Parse {
        key: String,
        value: String,
        type_name: &'static str,
    },
}
