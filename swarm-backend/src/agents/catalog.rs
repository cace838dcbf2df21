//! Static agent catalog loaded from config/agents.ron
//!
//! Every entry must name a compiled-in `AgentKind`; the catalog decides
//! order, descriptions and commands but cannot introduce new agents.

use super::builtin::AgentKind;
use super::types::AgentDescriptor;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("agent catalog not found at {0:?}")]
    Missing(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse agent catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("no agent implementation named '{0}'")]
    UnknownKind(String),

    #[error("duplicate agent name '{0}'")]
    DuplicateName(String),

    #[error("duplicate command '/{0}'")]
    DuplicateCommand(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    agents: Vec<AgentDescriptor>,
}

/// Load `<config_dir>/agents.ron`
pub fn load_catalog(config_dir: &Path) -> Result<Vec<AgentDescriptor>, CatalogError> {
    let path = config_dir.join("agents.ron");
    if !path.exists() {
        return Err(CatalogError::Missing(path));
    }
    let content = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: path.clone(),
        source,
    })?;
    let catalog = parse_catalog(&content)?;
    log::info!("[CATALOG] Loaded {} agents from {:?}", catalog.len(), path);
    Ok(catalog)
}

pub fn parse_catalog(content: &str) -> Result<Vec<AgentDescriptor>, CatalogError> {
    let file: CatalogFile = ron::from_str(content)?;

    let mut names = HashSet::new();
    let mut commands = HashSet::new();
    let mut agents = Vec::with_capacity(file.agents.len());

    for descriptor in file.agents {
        let descriptor = descriptor.clone().with_command(&descriptor.command);
        AgentKind::from_str(&descriptor.name)
            .map_err(|_| CatalogError::UnknownKind(descriptor.name.clone()))?;
        if !names.insert(descriptor.name.clone()) {
            return Err(CatalogError::DuplicateName(descriptor.name));
        }
        if !commands.insert(descriptor.command.to_lowercase()) {
            return Err(CatalogError::DuplicateCommand(descriptor.command));
        }
        agents.push(descriptor);
    }

    Ok(agents)
}
