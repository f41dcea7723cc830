#[derive(thiserror::Error, Debug)]
pub enum SortErrorKind {
    #[error("Found sorting cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
}
