use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortenerError {
    NotFound(String),
    InvalidIdentifier(String),
    StorageIo(String),
    ConstraintViolation(String),
    Initialization(String),
    DatabaseConfig(String),
    Serialization(String),
    Validation(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::NotFound(_) => "E001",
            ShortenerError::InvalidIdentifier(_) => "E002",
            ShortenerError::StorageIo(_) => "E003",
            ShortenerError::ConstraintViolation(_) => "E004",
            ShortenerError::Initialization(_) => "E005",
            ShortenerError::DatabaseConfig(_) => "E006",
            ShortenerError::Serialization(_) => "E007",
            ShortenerError::Validation(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::InvalidIdentifier(_) => "Invalid Identifier",
            ShortenerError::StorageIo(_) => "Storage I/O Error",
            ShortenerError::ConstraintViolation(_) => "Constraint Violation",
            ShortenerError::Initialization(_) => "Initialization Failure",
            ShortenerError::DatabaseConfig(_) => "Database Configuration Error",
            ShortenerError::Serialization(_) => "Serialization Error",
            ShortenerError::Validation(_) => "Validation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::NotFound(msg)
            | ShortenerError::InvalidIdentifier(msg)
            | ShortenerError::StorageIo(msg)
            | ShortenerError::ConstraintViolation(msg)
            | ShortenerError::Initialization(msg)
            | ShortenerError::DatabaseConfig(msg)
            | ShortenerError::Serialization(msg)
            | ShortenerError::Validation(msg) => msg,
        }
    }

    /// 请求级错误（NotFound / InvalidIdentifier / Validation），不需要按内部故障记录
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ShortenerError::NotFound(_)
                | ShortenerError::InvalidIdentifier(_)
                | ShortenerError::Validation(_)
        )
    }

    /// 启动期致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShortenerError::Initialization(_) | ShortenerError::DatabaseConfig(_)
        )
    }

    /// 格式化为彩色输出（用于启动失败时打印到终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn invalid_identifier<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidIdentifier(msg.into())
    }

    pub fn storage_io<T: Into<String>>(msg: T) -> Self {
        ShortenerError::StorageIo(msg.into())
    }

    pub fn constraint_violation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::ConstraintViolation(msg.into())
    }

    pub fn initialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Initialization(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConfig(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Validation(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::StorageIo(err.to_string())
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::StorageIo(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            ShortenerError::not_found("x"),
            ShortenerError::invalid_identifier("x"),
            ShortenerError::storage_io("x"),
            ShortenerError::constraint_violation("x"),
            ShortenerError::initialization("x"),
            ShortenerError::database_config("x"),
            ShortenerError::serialization("x"),
            ShortenerError::validation("x"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ShortenerError::not_found("short link 42");
        assert_eq!(err.to_string(), "Resource Not Found: short link 42");
    }

    #[test]
    fn test_io_error_maps_to_storage_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ShortenerError = io.into();
        assert!(matches!(err, ShortenerError::StorageIo(_)));
        assert!(err.message().contains("denied"));
    }

    #[test]
    fn test_client_and_fatal_classification() {
        assert!(ShortenerError::not_found("").is_client_error());
        assert!(ShortenerError::invalid_identifier("").is_client_error());
        assert!(!ShortenerError::storage_io("").is_client_error());
        assert!(ShortenerError::initialization("").is_fatal());
        assert!(!ShortenerError::constraint_violation("").is_fatal());
    }
}
