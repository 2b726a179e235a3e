//! Error types for yang-tree.
//!
//! Two layers are distinguished. [`Error`] covers infrastructure failures
//! (I/O, malformed UTF-8 and the like) that abort an operation outright.
//! [`RpcError`] is the structured NETCONF-style error report: decoders and
//! validators return [`Outcome`], whose `Err` side carries an `RpcError`
//! describing why the input is invalid while the operation itself completed
//! normally.

use thiserror::Error;

use crate::tree::{NodeRef, XmlNode};

/// Result type alias for yang-tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Two-state outcome of parse/decode/validate operations: valid payload or
/// a populated error report. Infrastructure failures use [`Error`] instead.
pub type Outcome<T> = std::result::Result<T, RpcError>;

/// Errors that can occur during yang-tree operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A leaf body did not parse under its resolved YANG type.
    #[error("cannot parse {field}: {reason}")]
    ValueParse {
        /// The body text that failed to parse.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The YANG type of a statement cannot be reduced to a base kind.
    #[error("cannot resolve type of {0}")]
    TypeResolution(String),

    /// Schema construction error (malformed statement tree).
    #[error("schema error: {0}")]
    Schema(String),
}

/// NETCONF `error-type` field (RFC 6241 appendix A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Transport,
    Rpc,
    Protocol,
    Application,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Transport => "transport",
            ErrorType::Rpc => "rpc",
            ErrorType::Protocol => "protocol",
            ErrorType::Application => "application",
        }
    }
}

/// NETCONF `error-tag` values used by this crate (RFC 6241 appendix A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    InvalidValue,
    MissingElement,
    UnknownElement,
    UnknownNamespace,
    DataMissing,
    OperationFailed,
    MalformedMessage,
}

impl ErrorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorTag::InvalidValue => "invalid-value",
            ErrorTag::MissingElement => "missing-element",
            ErrorTag::UnknownElement => "unknown-element",
            ErrorTag::UnknownNamespace => "unknown-namespace",
            ErrorTag::DataMissing => "data-missing",
            ErrorTag::OperationFailed => "operation-failed",
            ErrorTag::MalformedMessage => "malformed-message",
        }
    }
}

/// Structured payload of the `error-info` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcErrorInfo {
    /// Name of the offending element, if any.
    pub bad_element: Option<String>,
    /// Name of an unsatisfied choice, if any.
    pub missing_choice: Option<String>,
    /// Offending namespace URI or module name, if any.
    pub namespace: Option<String>,
}

/// A NETCONF-style error report, sufficient to render an `<rpc-error>`.
///
/// Severity is always `error`; the protocol's `warning` level is unused here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub error_type: ErrorType,
    pub tag: ErrorTag,
    pub app_tag: Option<String>,
    pub info: RpcErrorInfo,
    pub message: Option<String>,
}

impl RpcError {
    /// A mandatory element is absent.
    pub fn missing_element(name: &str) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::MissingElement,
            app_tag: None,
            info: RpcErrorInfo {
                bad_element: Some(name.to_string()),
                ..Default::default()
            },
            message: Some("Mandatory variable".to_string()),
        }
    }

    /// An element appears where the schema does not allow it.
    pub fn unknown_element(name: &str) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::UnknownElement,
            app_tag: None,
            info: RpcErrorInfo {
                bad_element: Some(name.to_string()),
                ..Default::default()
            },
            message: None,
        }
    }

    /// No case of a mandatory choice is present.
    pub fn missing_choice(name: &str) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::DataMissing,
            app_tag: Some("missing-choice".to_string()),
            info: RpcErrorInfo {
                missing_choice: Some(name.to_string()),
                ..Default::default()
            },
            message: None,
        }
    }

    /// A namespace URI or module name could not be resolved.
    pub fn unknown_namespace(namespace: &str, message: &str) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::UnknownNamespace,
            app_tag: None,
            info: RpcErrorInfo {
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            message: Some(message.to_string()),
        }
    }

    /// The message itself is not well-formed (JSON syntax, XML
    /// well-formedness, missing RFC 7951 top-level qualifier).
    pub fn malformed_message(message: &str) -> Self {
        RpcError {
            error_type: ErrorType::Rpc,
            tag: ErrorTag::MalformedMessage,
            app_tag: None,
            info: RpcErrorInfo::default(),
            message: Some(message.to_string()),
        }
    }

    /// Two list instances carry the same key tuple.
    pub fn data_not_unique(name: &str) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::OperationFailed,
            app_tag: Some("data-not-unique".to_string()),
            info: RpcErrorInfo {
                bad_element: Some(name.to_string()),
                ..Default::default()
            },
            message: None,
        }
    }

    /// Renders this report as an `<rpc-error>` element tree.
    pub fn to_xml(&self) -> NodeRef {
        let err = XmlNode::new_element("rpc-error");
        let add_leaf = |name: &str, value: &str| {
            let leaf = XmlNode::new_element(name);
            XmlNode::add_child_to_ref(&leaf, XmlNode::new_body(value));
            leaf
        };
        XmlNode::add_child_to_ref(&err, add_leaf("error-type", self.error_type.as_str()));
        XmlNode::add_child_to_ref(&err, add_leaf("error-tag", self.tag.as_str()));
        if let Some(app_tag) = &self.app_tag {
            XmlNode::add_child_to_ref(&err, add_leaf("error-app-tag", app_tag));
        }
        XmlNode::add_child_to_ref(&err, add_leaf("error-severity", "error"));
        if self.info.bad_element.is_some()
            || self.info.missing_choice.is_some()
            || self.info.namespace.is_some()
        {
            let info = XmlNode::new_element("error-info");
            if let Some(bad) = &self.info.bad_element {
                XmlNode::add_child_to_ref(&info, add_leaf("bad-element", bad));
            }
            if let Some(choice) = &self.info.missing_choice {
                XmlNode::add_child_to_ref(&info, add_leaf("missing-choice", choice));
            }
            if let Some(ns) = &self.info.namespace {
                XmlNode::add_child_to_ref(&info, add_leaf("namespace", ns));
            }
            XmlNode::add_child_to_ref(&err, info);
        }
        if let Some(msg) = &self.message {
            XmlNode::add_child_to_ref(&err, add_leaf("error-message", msg));
        }
        err
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.error_type.as_str(), self.tag.as_str())?;
        if let Some(app_tag) = &self.app_tag {
            write!(f, " ({})", app_tag)?;
        }
        if let Some(bad) = &self.info.bad_element {
            write!(f, " element {}", bad)?;
        }
        if let Some(choice) = &self.info.missing_choice {
            write!(f, " choice {}", choice)?;
        }
        if let Some(ns) = &self.info.namespace {
            write!(f, " namespace {}", ns)?;
        }
        if let Some(msg) = &self.message {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::print_to_string;

    #[test]
    fn test_missing_element_shape() {
        let e = RpcError::missing_element("x");
        assert_eq!(e.error_type, ErrorType::Application);
        assert_eq!(e.tag, ErrorTag::MissingElement);
        assert_eq!(e.info.bad_element.as_deref(), Some("x"));
        assert_eq!(e.message.as_deref(), Some("Mandatory variable"));
    }

    #[test]
    fn test_missing_choice_shape() {
        let e = RpcError::missing_choice("config-target");
        assert_eq!(e.tag, ErrorTag::DataMissing);
        assert_eq!(e.app_tag.as_deref(), Some("missing-choice"));
        assert_eq!(e.info.missing_choice.as_deref(), Some("config-target"));
    }

    #[test]
    fn test_render_rpc_error() {
        let e = RpcError::unknown_element("extra");
        let xml = print_to_string(&e.to_xml());
        assert!(xml.contains("<rpc-error>"));
        assert!(xml.contains("<error-type>application</error-type>"));
        assert!(xml.contains("<error-tag>unknown-element</error-tag>"));
        assert!(xml.contains("<bad-element>extra</bad-element>"));
        assert!(xml.contains("<error-severity>error</error-severity>"));
    }

    #[test]
    fn test_display() {
        let e = RpcError::missing_element("x");
        let s = e.to_string();
        assert!(s.contains("application missing-element"));
        assert!(s.contains("Mandatory variable"));
    }
}
