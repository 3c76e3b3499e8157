use std::fmt;

#[derive(Debug, Clone)]
pub enum IntoPboPathError {
    UnrepresentableStr,
    NonRelative,
    EmptyPath,
}

impl std::error::Error for IntoPboPathError {}

impl fmt::Display for IntoPboPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl IntoPboPathError {
    pub fn as_str(&self) -> &str {
        match self {
            IntoPboPathError::UnrepresentableStr => "path is not representable as ASCII",
            IntoPboPathError::NonRelative => "path is not relative to the archive root",
            IntoPboPathError::EmptyPath => "no path provided",
        }
    }
}
