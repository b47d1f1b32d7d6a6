//! Producer stages and their dependency order.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;

use galforge_contracts::{
    agent::{AgentSpec, PromptInputs},
    document::Document,
    error::{GalforgeError, GalforgeResult},
};

/// One producer agent and the document section it owns.
#[derive(Debug, Clone)]
pub struct ProducerStage {
    pub spec: AgentSpec,
    /// Document section written by this stage.
    pub section: String,
    /// Sections that must exist before this stage runs. Each is passed to
    /// the stage's template under its section name.
    pub depends_on: Vec<String>,
}

impl ProducerStage {
    pub fn new(spec: AgentSpec, section: impl Into<String>) -> Self {
        Self {
            spec,
            section: section.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn after<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(sections.into_iter().map(Into::into));
        self
    }

    /// Prompt inputs for this stage: the shared inputs plus every
    /// dependency section present in `document`.
    pub fn inputs(&self, shared: &PromptInputs, document: &Document) -> PromptInputs {
        let mut inputs = shared.clone();
        for dep in &self.depends_on {
            if let Some(content) = document.get(dep) {
                inputs.insert(dep.clone(), Value::Object(content.clone()));
            }
        }
        inputs
    }
}

/// Indices of `stages` in an order where every stage follows its
/// dependencies.
///
/// # Errors
///
/// `InvalidSpec` for duplicate sections or agent names, a dependency on an
/// unknown section, or a dependency cycle.
pub fn stage_order(stages: &[ProducerStage]) -> GalforgeResult<Vec<usize>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut by_section: HashMap<&str, NodeIndex> = HashMap::new();
    let mut agents: HashMap<&str, &str> = HashMap::new();

    for (i, stage) in stages.iter().enumerate() {
        stage.spec.validate()?;
        if by_section.insert(stage.section.as_str(), graph.add_node(i)).is_some() {
            return Err(GalforgeError::InvalidSpec {
                reason: format!("section '{}' is produced by more than one stage", stage.section),
            });
        }
        if let Some(other) = agents.insert(stage.spec.name.as_str(), stage.section.as_str()) {
            return Err(GalforgeError::InvalidSpec {
                reason: format!(
                    "agent '{}' owns both section '{other}' and section '{}'",
                    stage.spec.name, stage.section
                ),
            });
        }
    }

    for stage in stages {
        let to = by_section[stage.section.as_str()];
        for dep in &stage.depends_on {
            let from = by_section.get(dep.as_str()).ok_or_else(|| GalforgeError::InvalidSpec {
                reason: format!("stage '{}' depends on unknown section '{dep}'", stage.section),
            })?;
            graph.add_edge(*from, to, ());
        }
    }

    let sorted = toposort(&graph, None).map_err(|cycle| GalforgeError::InvalidSpec {
        reason: format!(
            "stage dependencies form a cycle through section '{}'",
            stages[graph[cycle.node_id()]].section
        ),
    })?;

    Ok(sorted.into_iter().map(|n| graph[n]).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stage(name: &str) -> ProducerStage {
        ProducerStage::new(AgentSpec::new(name, "s", "h"), name)
    }

    fn names(stages: &[ProducerStage], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| stages[i].section.clone()).collect()
    }

    #[test]
    fn test_dependencies_run_first() {
        let stages = vec![
            stage("plot").after(["cast", "world"]),
            stage("cast").after(["world", "story_core"]),
            stage("world").after(["story_core"]),
            stage("story_core"),
        ];
        let order = stage_order(&stages).unwrap();
        assert_eq!(names(&stages, &order), vec!["story_core", "world", "cast", "plot"]);
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let stages = vec![stage("cast").after(["world"])];
        match stage_order(&stages) {
            Err(GalforgeError::InvalidSpec { reason }) => assert!(reason.contains("unknown section 'world'")),
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_is_rejected() {
        let stages = vec![stage("a").after(["b"]), stage("b").after(["a"])];
        match stage_order(&stages) {
            Err(GalforgeError::InvalidSpec { reason }) => assert!(reason.contains("cycle")),
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_section_is_rejected() {
        let stages = vec![
            stage("world"),
            ProducerStage::new(AgentSpec::new("world_v2", "s", "h"), "world"),
        ];
        assert!(stage_order(&stages).is_err());
    }

    #[test]
    fn test_inputs_include_dependency_sections() {
        let mut doc = Document::new();
        let mut core = serde_json::Map::new();
        core.insert("tone".to_string(), json!("warm"));
        doc.insert("story_core", core);

        let mut shared = PromptInputs::new();
        shared.insert("idea".to_string(), json!("festival"));

        let inputs = stage("world").after(["story_core"]).inputs(&shared, &doc);
        assert_eq!(inputs["idea"], json!("festival"));
        assert_eq!(inputs["story_core"]["tone"], json!("warm"));
    }
}
