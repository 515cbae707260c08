use std::fmt::{Display, Formatter};

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorCategory {
    InputValidationError,
    IoSystemError,
    DataIntegrityError,
    InternalError,
}

impl ImportErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::DataIntegrityError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::DataIntegrityError => "DataIntegrityError",
            Self::InternalError => "InternalError",
        }
    }
}

impl Display for ImportErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category} [{placeholder}] {message}")]
pub struct ImportError {
    category: ImportErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl ImportError {
    pub fn new(
        category: ImportErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImportErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImportErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn data_integrity(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImportErrorCategory::DataIntegrityError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImportErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> ImportErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}
