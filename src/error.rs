use thiserror::Error as ThisError;

/// Failure of a single call to a storage backend.
#[derive(ThisError, Debug)]
pub enum GatewayError {
    #[error("AWS-sdk error: {0}")]
    S3(#[from] aws_sdk_s3::Error),

    #[error("Bucket not found: {0}")]
    ContainerNotFound(String),

    #[error("Object not found: {container}:{key}")]
    ItemNotFound { container: String, key: String },

    #[error("Bucket {0} is not empty")]
    ContainerNotEmpty(String),

    #[error("{0}")]
    Injected(String),
}

#[derive(ThisError, Debug)]
pub enum PurgeError {
    #[error("failed to list buckets, {0}")]
    Enumeration(#[source] GatewayError),

    #[error("unable to list objects of bucket {container}, {source}")]
    PageList {
        container: String,
        #[source]
        source: GatewayError,
    },

    #[error("failed to delete object {key} from bucket {container}, {source}")]
    ItemDelete {
        container: String,
        key: String,
        #[source]
        source: GatewayError,
    },

    #[error("failed to delete bucket {container}, {source}")]
    ContainerDelete {
        container: String,
        #[source]
        source: GatewayError,
    },

    #[error("permit pool for bucket {container} was closed while objects were pending")]
    PermitsClosed { container: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;
