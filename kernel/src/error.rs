use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KernelError {
    Concurrency,
    Timeout,
    NotFound,
    Discarded,
    BusinessRule,
    Validation,
    Internal,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::Concurrency => write!(f, "Concurrency error"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::NotFound => write!(f, "Entity not found"),
            KernelError::Discarded => write!(f, "Entity has been discarded"),
            KernelError::BusinessRule => write!(f, "Business rule violated"),
            KernelError::Validation => write!(f, "Validation failed"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
