use stylepak_packages::PackageError;
use stylepak_types::ObjectId;
use thiserror::Error;

/// Result type alias using [`ExportError`].
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("style \"{0}\" is not loaded")]
    UnknownStyle(ObjectId),

    #[error(
        "unresolved variable in \"{source_desc}\": %{var}%, valid variables: {}",
        .valid.join(", ")
    )]
    UnresolvedVariable {
        source_desc: String,
        var: String,
        valid: Vec<String>,
    },

    #[error("item \"{item}\" has no resolved data for style \"{style}\" (version {version})")]
    MissingVariant {
        item: ObjectId,
        version: ObjectId,
        style: ObjectId,
    },

    #[error("item \"{0}\" has no default version")]
    NoDefaultVersion(ObjectId),

    #[error("invalid replacement pattern: {0}")]
    Pattern(#[from] regex_lite::Error),

    #[error("failed to write item defaults: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Packages(#[from] PackageError),
}
