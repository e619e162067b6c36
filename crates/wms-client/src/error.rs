//! Error types for the WMS client.

use std::fmt;

use thiserror::Error;

use projection::ProjectionError;
use wms_common::BoundingBox;
use wms_protocol::CapabilitiesError;

use crate::transport::TransportError;

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// How many allowed values an [`ClientError::UnsupportedValue`] message lists.
const MAX_LISTED_VALUES: usize = 32;

/// Session setting a rejected value was meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Format,
    Layer,
    Style,
    Epsg,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Format => "format",
            Field::Layer => "layer",
            Field::Style => "style",
            Field::Epsg => "EPSG code",
        })
    }
}

/// Broad class of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputValidation,
    CapabilityDocument,
    Geometry,
    Transport,
    Output,
}

/// Errors that can occur while negotiating a session or fetching maps.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("malformed URL '{url}': {message}")]
    MalformedUrl { url: String, message: String },

    /// A format, layer, style or EPSG code the server does not support.
    #[error("invalid {field} '{value}', valid values: {}", list_values(.allowed))]
    UnsupportedValue {
        field: Field,
        value: String,
        allowed: Vec<String>,
    },

    #[error("server advertises no bounding box with an EPSG code")]
    NoEpsgAdvertised,

    #[error("no service URL set")]
    NotReady,

    #[error(transparent)]
    Capabilities(#[from] CapabilitiesError),

    /// The document decoded but lacks something a session needs.
    #[error("unusable capabilities: {0}")]
    InvalidCapabilities(String),

    #[error("size must be set (width, height or scale/dpi)")]
    SizeNotSpecified,

    #[error("width or height must be set")]
    DimensionNotSpecified,

    #[error("image too large: {pixels} pixels, maximum is {max}")]
    ImageTooLarge { pixels: u64, max: u64 },

    #[error("bounding box {requested} is out of bounds, valid box: {valid}")]
    BoundingBoxOutOfRange {
        requested: BoundingBox,
        valid: BoundingBox,
    },

    #[error("invalid source EPSG: {0}")]
    UnknownSourceEpsg(u32),

    #[error("invalid target EPSG: {0}")]
    UnknownTargetEpsg(u32),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fetch task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

impl ClientError {
    pub fn unsupported(field: Field, value: impl Into<String>, allowed: Vec<String>) -> Self {
        Self::UnsupportedValue {
            field,
            value: value.into(),
            allowed,
        }
    }

    pub fn invalid_capabilities(msg: impl Into<String>) -> Self {
        Self::InvalidCapabilities(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedUrl { .. }
            | Self::UnsupportedValue { .. }
            | Self::NoEpsgAdvertised
            | Self::NotReady => ErrorCategory::InputValidation,
            Self::Capabilities(_) | Self::InvalidCapabilities(_) => {
                ErrorCategory::CapabilityDocument
            }
            Self::SizeNotSpecified
            | Self::DimensionNotSpecified
            | Self::ImageTooLarge { .. }
            | Self::BoundingBoxOutOfRange { .. }
            | Self::UnknownSourceEpsg(_)
            | Self::UnknownTargetEpsg(_)
            | Self::Projection(_) => ErrorCategory::Geometry,
            Self::Transport(_) | Self::UnexpectedStatus { .. } => ErrorCategory::Transport,
            Self::Image(_) | Self::Io(_) | Self::TaskFailed(_) => ErrorCategory::Output,
        }
    }
}

fn list_values(values: &[String]) -> String {
    if values.len() <= MAX_LISTED_VALUES {
        return format!("[{}]", values.join(", "));
    }
    format!(
        "[{}, ... and {} more]",
        values[..MAX_LISTED_VALUES].join(", "),
        values.len() - MAX_LISTED_VALUES
    )
}
