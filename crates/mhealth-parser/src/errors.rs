use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("header invalid: {message}")]
    InvalidHeader { message: String },

    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("data row at line {line_index} invalid: {message}")]
    DataRow { line_index: u64, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },
}

impl From<csv::Error> for ParserError {
    fn from(source: csv::Error) -> Self {
        ParserError::Csv { source }
    }
}
