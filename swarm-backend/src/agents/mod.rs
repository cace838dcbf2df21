pub mod agent;
pub mod builtin;
pub mod catalog;
pub mod registry;
pub mod response;
pub mod types;

pub use agent::{parse_args, Agent};
pub use builtin::{create_default_registry, AgentDeps, AgentKind};
pub use catalog::{load_catalog, CatalogError};
pub use registry::{AgentRegistry, RegistryError};
pub use response::{AgentResponse, ResponseType};
pub use types::{AgentDescriptor, AgentError, ChatPrompt, ChatRequest};
