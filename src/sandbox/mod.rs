//! Sandbox - ephemeral build projects and the external tool run against them.
//!
//! - **Manifests**: dependency/package descriptors via [`manifest`]
//! - **Templates**: entry programs per [`TemplateKind`](crate::model::TemplateKind)
//! - **Project**: scoped directory lifecycle via [`ScopedProject`]
//! - **Tool**: process invocation via [`ExternalTool`]

pub mod manifest;
pub mod project;
pub mod templates;
pub mod tool;

pub use manifest::{ModuleManifest, PackageManifest, ProjectEnv};
pub use project::{Released, SandboxError, ScopedProject};
pub use templates::{entry_program, ENTRY_FILE};
pub use tool::ExternalTool;
