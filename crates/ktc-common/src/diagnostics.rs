//! Diagnostic types and message lookup.
//!
//! Every diagnostic the resolver and constructor checker can produce has a
//! fixed numeric code and a message template with `{0}`, `{1}` placeholders.

use serde::{Deserialize, Serialize};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

impl DiagnosticCategory {
    pub const fn label(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        }
    }
}

/// Related information for a diagnostic (e.g., "see also" locations).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A diagnostic message with optional related information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., where a property was declared)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a diagnostic from a registered code, filling the template with `args`.
    ///
    /// Unknown codes produce an error diagnostic whose text is the joined args.
    #[must_use]
    pub fn from_code(file: &str, start: u32, length: u32, code: u32, args: &[&str]) -> Self {
        let (message, category) = match get_diagnostic_message(code) {
            Some(def) => (format_message(def.message, args), def.category),
            None => (args.join(" "), DiagnosticCategory::Error),
        };
        Self {
            file: file.to_string(),
            start,
            length,
            message_text: message,
            category,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub name: &'static str,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

// =============================================================================
// Message table
// =============================================================================

pub mod diagnostic_codes {
    pub const CALLABLE_REFERENCE_LHS_NOT_A_CLASS: u32 = 4001;
    pub const EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED: u32 = 4002;
    pub const UNSUPPORTED: u32 = 4003;
    pub const CALLABLE_REFERENCE_RESOLUTION_AMBIGUITY: u32 = 4004;
    pub const UNRESOLVED_REFERENCE: u32 = 4005;
    pub const DANGEROUS_THIS_IN_CONSTRUCTOR: u32 = 4101;
    pub const DANGEROUS_METHOD_CALL_IN_CONSTRUCTOR: u32 = 4102;
}

pub mod diagnostic_messages {
    pub const CALLABLE_REFERENCE_LHS_NOT_A_CLASS: &str =
        "Callable reference left-hand side must be a class";
    pub const EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED: &str = "'{0}' is a member and an extension at the same time. References to such elements are not allowed";
    pub const UNSUPPORTED: &str = "Unsupported [{0}]";
    pub const CALLABLE_REFERENCE_RESOLUTION_AMBIGUITY: &str =
        "Callable reference resolution ambiguity: {0}";
    pub const UNRESOLVED_REFERENCE: &str = "Unresolved reference: {0}";
    pub const DANGEROUS_THIS_IN_CONSTRUCTOR: &str = "Unsafe 'this' usage in constructor of {0}: not all non-null properties are initialized";
    pub const DANGEROUS_METHOD_CALL_IN_CONSTRUCTOR: &str =
        "Unsafe call of {0} requiring implicit receiver in constructor";
}

macro_rules! message {
    ($name:ident, $category:ident) => {
        DiagnosticMessage {
            code: diagnostic_codes::$name,
            name: stringify!($name),
            category: DiagnosticCategory::$category,
            message: diagnostic_messages::$name,
        }
    };
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    message!(CALLABLE_REFERENCE_LHS_NOT_A_CLASS, Error),
    message!(EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED, Error),
    message!(UNSUPPORTED, Error),
    message!(CALLABLE_REFERENCE_RESOLUTION_AMBIGUITY, Error),
    message!(UNRESOLVED_REFERENCE, Error),
    message!(DANGEROUS_THIS_IN_CONSTRUCTOR, Warning),
    message!(DANGEROUS_METHOD_CALL_IN_CONSTRUCTOR, Warning),
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
///
/// Returns the template string with `{0}`, `{1}`, etc. placeholders.
/// Use `format_message()` to fill in the placeholders.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

/// Get the category for a diagnostic code.
#[must_use]
pub fn get_diagnostic_category(code: u32) -> Option<DiagnosticCategory> {
    get_diagnostic_message(code).map(|m| m.category)
}

/// Get the symbolic name for a diagnostic code (e.g. `UNRESOLVED_REFERENCE`).
#[must_use]
pub fn get_diagnostic_name(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.name)
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
