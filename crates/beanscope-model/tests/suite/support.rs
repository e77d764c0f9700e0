use std::sync::Arc;

use beanscope_core::{ConfigurationUnit, ImportTarget, UnitDeclarations};
use beanscope_model::{MemoryWorkspace, ModelEngine};

pub fn class(name: &str) -> ConfigurationUnit {
    ConfigurationUnit::annotated(name)
}

pub fn importing(targets: &[&str]) -> UnitDeclarations {
    UnitDeclarations {
        imports: targets
            .iter()
            .map(|target| ImportTarget::Type((*target).into()))
            .collect(),
        ..Default::default()
    }
}

pub fn workspace() -> Arc<MemoryWorkspace> {
    Arc::new(MemoryWorkspace::new())
}

pub fn engine(workspace: &Arc<MemoryWorkspace>) -> ModelEngine {
    ModelEngine::for_workspace(Arc::clone(workspace))
}

pub fn handles<'a>(units: impl IntoIterator<Item = &'a ConfigurationUnit>) -> Vec<&'a str> {
    units.into_iter().map(ConfigurationUnit::handle).collect()
}
