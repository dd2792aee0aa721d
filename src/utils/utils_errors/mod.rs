use std::fmt;

/// A common error type returned by functions throughout the crate.
///
/// Configuration and lifecycle misuse surface through this type.  Degenerate numeric results
/// (e.g., a poor inverse kinematics solution) and controllers that run out of their tick budget are
/// NOT errors and never produce one of these.
#[derive(Clone, Debug, PartialEq)]
pub enum BlocksimError {
    GenericError(String),
    IdxOutOfBoundError(String),
    UnsupportedOperationError(String),
    UnregisteredActionError(String),
    SessionClosedError(String),
    ParseError(String)
}
impl BlocksimError {
    pub fn new_generic_error_str(s: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: {} -- File: {}, Line: {}", s, file, line);
        return Self::GenericError(s);
    }
    pub fn new_idx_out_of_bound_error(given_idx: usize, length_of_array: usize, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Index {:?} is too large for the array of length {:?} -- File: {}, Line: {}", given_idx, length_of_array, file, line);
        return Self::IdxOutOfBoundError(s)
    }
    pub fn new_unsupported_operation_error(function_name: &str, message: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Unsupported operation error in function {}.  {} -- File: {}, Line: {}", function_name, message, file, line);
        return Self::UnsupportedOperationError(s);
    }
    pub fn new_unregistered_action_error(predicate_name: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: No controller is registered for action predicate {:?} -- File: {}, Line: {}", predicate_name, file, line);
        return Self::UnregisteredActionError(s);
    }
    pub fn new_session_closed_error(function_name: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Physics session was already closed when calling {}. -- File: {}, Line: {}", function_name, file, line);
        return Self::SessionClosedError(s);
    }
    pub fn new_parse_error(format_name: &str, message: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Could not parse {} string.  {} -- File: {}, Line: {}", format_name, message, file, line);
        return Self::ParseError(s);
    }
    pub fn message(&self) -> &str {
        match self {
            BlocksimError::GenericError(s) => { s }
            BlocksimError::IdxOutOfBoundError(s) => { s }
            BlocksimError::UnsupportedOperationError(s) => { s }
            BlocksimError::UnregisteredActionError(s) => { s }
            BlocksimError::SessionClosedError(s) => { s }
            BlocksimError::ParseError(s) => { s }
        }
    }
}
impl fmt::Display for BlocksimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
impl std::error::Error for BlocksimError { }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_record_location() {
        let e = BlocksimError::new_idx_out_of_bound_error(7, 3, "robot.rs", 12);
        assert!(matches!(e, BlocksimError::IdxOutOfBoundError(_)));
        assert!(e.to_string().contains("Index 7"));
        assert!(e.to_string().contains("robot.rs"));

        let e = BlocksimError::new_unregistered_action_error("stack", file!(), line!());
        assert!(e.message().contains("\"stack\""));
    }
}
