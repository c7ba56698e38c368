use crate::config::RefineOptions;
use crate::{HeadshotError, HeadshotResult};

/// A named background-removal recipe: which cutout model to run and how to
/// refine its alpha afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub key: String,
    pub label: String,
    pub description: String,
    /// Model identifier handed to the cutout factory.
    pub model: String,
    pub refine: RefineOptions,
}

impl Workflow {
    pub fn new(key: impl Into<String>, model: impl Into<String>, refine: RefineOptions) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            description: String::new(),
            model: model.into(),
            refine,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Ordered table of workflows, looked up by key.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    workflows: Vec<Workflow>,
}

impl WorkflowRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The portrait, general and bria workflows.
    pub fn builtin() -> Self {
        Self::empty()
            .with_workflow(
                Workflow::new(
                    "portrait",
                    "birefnet-portrait",
                    RefineOptions {
                        blur_radius: 0.8,
                        low_threshold: 15,
                        alpha_boost: 1.08,
                    },
                )
                .with_label("Portrait (BiRefNet-Portrait)")
                .with_description(
                    "Best for headshots and people. Exceptional hair and shoulder edge quality.",
                ),
            )
            .with_workflow(
                Workflow::new(
                    "general",
                    "birefnet-general",
                    RefineOptions {
                        blur_radius: 1.0,
                        low_threshold: 20,
                        alpha_boost: 1.05,
                    },
                )
                .with_label("General Purpose (BiRefNet-General)")
                .with_description(
                    "Best all-around model. Great for products, objects, and mixed content.",
                ),
            )
            .with_workflow(
                Workflow::new(
                    "bria",
                    "bria-rmbg",
                    RefineOptions {
                        blur_radius: 0.6,
                        low_threshold: 12,
                        alpha_boost: 1.10,
                    },
                )
                .with_label("High Detail (BRIA RMBG)")
                .with_description(
                    "State-of-the-art by BRIA AI. Excels at complex scenes and fine textures.",
                ),
            )
    }

    /// Add a workflow, replacing any existing one with the same key in place.
    pub fn with_workflow(mut self, workflow: Workflow) -> Self {
        match self.workflows.iter_mut().find(|w| w.key == workflow.key) {
            Some(existing) => *existing = workflow,
            None => self.workflows.push(workflow),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.key == key)
    }

    /// Like [`get`](Self::get), but an unknown key or out-of-range refine
    /// settings are an error.
    pub fn resolve(&self, key: &str) -> HeadshotResult<&Workflow> {
        let workflow = self
            .get(key)
            .ok_or_else(|| HeadshotError::UnknownWorkflow(key.to_string()))?;
        workflow.refine.validate()?;
        Ok(workflow)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.workflows.iter().map(|w| w.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod builtin {
        use super::*;

        #[test]
        fn has_three_workflows_in_order() {
            let registry = WorkflowRegistry::builtin();
            let keys: Vec<_> = registry.keys().collect();
            assert_eq!(keys, vec!["portrait", "general", "bria"]);
        }

        #[test]
        fn portrait_parameters() {
            let registry = WorkflowRegistry::builtin();
            let portrait = registry.get("portrait").unwrap();
            assert_eq!(portrait.model, "birefnet-portrait");
            assert_eq!(portrait.refine.blur_radius, 0.8);
            assert_eq!(portrait.refine.low_threshold, 15);
            assert_eq!(portrait.refine.alpha_boost, 1.08);
        }

        #[test]
        fn bria_parameters() {
            let registry = WorkflowRegistry::builtin();
            let bria = registry.get("bria").unwrap();
            assert_eq!(bria.model, "bria-rmbg");
            assert_eq!(bria.label, "High Detail (BRIA RMBG)");
            assert_eq!(bria.refine.low_threshold, 12);
        }

        #[test]
        fn general_matches_default_refine() {
            let registry = WorkflowRegistry::builtin();
            assert_eq!(
                registry.get("general").unwrap().refine,
                RefineOptions::default()
            );
        }
    }

    mod with_workflow {
        use super::*;

        #[test]
        fn appends_new_key() {
            let registry = WorkflowRegistry::builtin().with_workflow(Workflow::new(
                "isnet",
                "isnet-general-use",
                RefineOptions::default(),
            ));
            assert_eq!(registry.len(), 4);
            assert_eq!(registry.get("isnet").unwrap().label, "isnet");
        }

        #[test]
        fn replaces_existing_key_in_place() {
            let registry = WorkflowRegistry::builtin().with_workflow(Workflow::new(
                "general",
                "u2net",
                RefineOptions::default(),
            ));
            assert_eq!(registry.len(), 3);
            assert_eq!(registry.keys().nth(1), Some("general"));
            assert_eq!(registry.get("general").unwrap().model, "u2net");
        }
    }

    #[test]
    fn unknown_key_resolves_to_error() {
        let err = WorkflowRegistry::builtin().resolve("nope").unwrap_err();
        assert!(matches!(err, HeadshotError::UnknownWorkflow(key) if key == "nope"));
        assert!(WorkflowRegistry::empty().is_empty());
    }

    #[test]
    fn weak_boost_fails_to_resolve() {
        let registry = WorkflowRegistry::empty().with_workflow(Workflow::new(
            "faint",
            "u2net",
            RefineOptions {
                alpha_boost: 0.9,
                ..RefineOptions::default()
            },
        ));
        assert!(registry.get("faint").is_some());
        let err = registry.resolve("faint").unwrap_err();
        assert!(matches!(err, HeadshotError::InvalidRefine(_)));
    }
}
