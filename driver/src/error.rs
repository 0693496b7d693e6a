use application::transfer::ConversionError;
use kernel::KernelError;

/// Lifts driver-level failures into [`KernelError`] reports.
pub trait ConvertError {
    type Ok;
    fn convert_error(self) -> error_stack::Result<Self::Ok, KernelError>;
}

/// A stored row that no longer passes validation is a storage fault.
impl<T> ConvertError for error_stack::Result<T, ConversionError> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|report| report.change_context(KernelError::Internal))
    }
}
