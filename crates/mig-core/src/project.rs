//! Project discovery and loading

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::graph::RevisionGraph;
use crate::models::load_models;
use crate::node::discover_nodes;
use crate::schema::SchemaSnapshot;
use std::path::{Path, PathBuf};

/// A migrations project: its config and revision graph
#[derive(Debug)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Validated revision graph built from the versions directory
    pub graph: RevisionGraph,
}

impl Project {
    /// Load a project from a directory
    pub fn load(path: &Path) -> CoreResult<Self> {
        Self::load_with_config(path, None)
    }

    /// Load a project, reading the config from `config_path` when given
    /// instead of searching the project root.
    pub fn load_with_config(path: &Path, config_path: Option<&Path>) -> CoreResult<Self> {
        let root = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if !root.exists() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let config = match config_path {
            Some(p) => Config::load(p)?,
            None => Config::load_from_dir(&root)?,
        };

        let graph = Self::load_graph(&root, &config)?;
        log::debug!(
            "Loaded project '{}' with {} revision(s)",
            config.name,
            graph.len()
        );

        Ok(Self {
            root,
            config,
            graph,
        })
    }

    fn load_graph(root: &Path, config: &Config) -> CoreResult<RevisionGraph> {
        let nodes = discover_nodes(&config.versions_path_absolute(root))?;
        RevisionGraph::build(nodes)
    }

    /// Re-read the versions directory after nodes were written
    pub fn reload_graph(&mut self) -> CoreResult<()> {
        self.graph = Self::load_graph(&self.root, &self.config)?;
        Ok(())
    }

    /// Absolute versions directory
    pub fn versions_dir(&self) -> PathBuf {
        self.config.versions_path_absolute(&self.root)
    }

    /// Absolute models directory
    pub fn models_dir(&self) -> PathBuf {
        self.config.models_path_absolute(&self.root)
    }

    /// Schema declared by the model files
    pub fn declared_schema(&self) -> CoreResult<SchemaSnapshot> {
        load_models(&self.models_dir())
    }

    /// Snapshot of the single head, or the empty schema for an empty graph
    pub fn head_snapshot(&self) -> CoreResult<SchemaSnapshot> {
        Ok(self
            .graph
            .single_head()?
            .and_then(|head| self.graph.get(&head))
            .map(|node| node.snapshot.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
