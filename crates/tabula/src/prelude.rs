//! Prelude module - common imports for tabula users
//!
//! ```rust
//! use tabula::prelude::*;
//! ```

pub use crate::{
    CalculationStats,
    CellId,
    // Diagnostics
    CollectingSink,
    DiagnosticSink,
    // Configuration
    EngineOptions,
    // Errors
    Error,
    ErrorKind,
    EvalError,
    Grid,
    GridAccess,
    // Links
    LinkResolver,
    NoLinks,
    Result,
    Sheet,
    StaticLinks,
    Syntax,
    TableRef,
    TracingSink,
    Value,
};
