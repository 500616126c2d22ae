//! Registry of language backends keyed by generator id

use std::sync::Arc;

use indexmap::IndexMap;

use super::backends::{
    CSharpGenerator, DefaultGenerator, GoGenerator, JavaGenerator, KotlinGenerator,
    PythonGenerator, TypeScriptGenerator,
};
use super::{CodeGenerator, GenerationError, Language};

/// Registry that owns the available code generators
pub struct GeneratorRegistry {
    generators: IndexMap<String, Arc<dyn CodeGenerator>>,
}

impl GeneratorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            generators: IndexMap::new(),
        }
    }

    /// Registry with every built-in backend
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DefaultGenerator::new()));
        registry.register(Arc::new(GoGenerator::new()));
        registry.register(Arc::new(JavaGenerator::new()));
        registry.register(Arc::new(KotlinGenerator::new()));
        registry.register(Arc::new(PythonGenerator::new()));
        registry.register(Arc::new(CSharpGenerator::new()));
        registry.register(Arc::new(TypeScriptGenerator::new()));
        registry
    }

    /// Register a generator, replacing any with the same id
    pub fn register(&mut self, generator: Arc<dyn CodeGenerator>) {
        self.generators
            .insert(generator.id().to_string(), generator);
    }

    /// Look a generator up by id or language alias (`golang`, `ts`, `c#`)
    pub fn get(&self, id: &str) -> Result<Arc<dyn CodeGenerator>, GenerationError> {
        if let Some(generator) = self.generators.get(id) {
            return Ok(generator.clone());
        }
        id.parse::<Language>()
            .ok()
            .and_then(|language| {
                self.generators
                    .values()
                    .find(|g| g.language() == language)
                    .cloned()
            })
            .ok_or_else(|| GenerationError::GeneratorNotFound(id.to_string()))
    }

    pub fn has_generator(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    /// Registered generators in registration order
    pub fn list(&self) -> Vec<Arc<dyn CodeGenerator>> {
        self.generators.values().cloned().collect()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_default_generators() {
        let registry = GeneratorRegistry::with_defaults();
        let ids: Vec<&str> = registry.list().iter().map(|g| g.id()).collect();
        assert_eq!(
            ids,
            vec!["default", "go", "java", "kotlin", "python", "csharp", "typescript"]
        );
    }

    #[test]
    fn test_lookup_by_alias() {
        let registry = GeneratorRegistry::with_defaults();
        assert_eq!(registry.get("golang").unwrap().id(), "go");
        assert_eq!(registry.get("ts").unwrap().id(), "typescript");
        assert!(registry.has_generator("kotlin"));
    }

    #[test]
    fn test_unknown_generator() {
        let registry = GeneratorRegistry::with_defaults();
        let err = registry.get("cobol").err().unwrap();
        assert!(matches!(err, GenerationError::GeneratorNotFound(id) if id == "cobol"));
    }
}
