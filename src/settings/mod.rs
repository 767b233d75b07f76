//! Schema-less configuration editing.
//!
//! The service's configuration is a two-level map of strings with no
//! published schema. This module infers a field type per value
//! ([`infer`]), renders an editable form ([`form::render`]) and converts the
//! edited form back into a snapshot in the service's own encoding
//! ([`form::extract`]).

pub mod form;
pub mod infer;
pub mod snapshot;

pub use form::{FieldValue, FormField, FormModel, FormOptions, FormSection, extract, render};
pub use infer::{FieldKind, infer_kind};
pub use snapshot::ConfigSnapshot;
