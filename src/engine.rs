//! Resolve semantic fields to controls and fill them.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::{classify, WidgetType};
use crate::config::EngineConfig;
use crate::contexts::enumerate;
use crate::driver::Document;
use crate::error::Result;
use crate::field::{Field, FieldValue, FillOutcome};
use crate::locator::{build_strategies, locate};
use crate::plan::FillPlan;
use crate::registry::FillerRegistry;
use crate::report::{FieldReport, FillReport};
use crate::wait::wait_attached;

/// Entry point of the engine. One instance can serve many pages; it holds
/// no page state between calls.
pub struct FormFiller {
    config: Arc<EngineConfig>,
    registry: FillerRegistry,
}

impl FormFiller {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, FillerRegistry::with_defaults())
    }

    pub fn with_registry(config: EngineConfig, registry: FillerRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut FillerRegistry {
        &mut self.registry
    }

    /// Search every context, main document first, for the first visible and
    /// attached control matching one of `synonyms`. Absence is a normal
    /// outcome and comes back as [`Field::not_found`].
    pub async fn resolve(&self, doc: &dyn Document, key: &str, synonyms: &[String]) -> Field {
        let strategies = build_strategies(synonyms, &self.config);
        if strategies.is_empty() {
            return Field::not_found(key);
        }

        for ctx in enumerate(doc, self.config.frame_timeout).await {
            let Some(candidate) = locate(&ctx, &strategies, &self.config).await else {
                continue;
            };
            if let Err(e) = wait_attached(&candidate.element, self.config.attach_timeout).await {
                debug!(%key, context = %ctx.describe(), error = %e, "candidate detached, trying next context");
                continue;
            }
            let widget = classify(&ctx, &candidate.element).await;
            info!(%key, tier = %candidate.tier, synonym = %candidate.synonym, %widget, "field resolved");
            return Field::new(key, ctx, candidate.element, widget);
        }

        info!(%key, "field not found");
        Field::not_found(key)
    }

    /// Fill one resolved field. Not-found fields are a no-op.
    pub async fn fill(&self, field: &Field, value: &FieldValue) -> Result<FillOutcome> {
        let filler = self.registry.create(field, Arc::clone(&self.config));
        filler.fill(value).await
    }

    /// Resolve and fill every field of `plan` in order. A failing field is
    /// recorded and the pass moves on.
    pub async fn fill_all(&self, doc: &dyn Document, plan: &FillPlan, country: Option<&str>) -> FillReport {
        let mut report = FillReport::default();
        let mut found = HashSet::new();

        for spec in &plan.fields {
            let field = self.resolve(doc, &spec.key, &spec.effective_synonyms()).await;
            if !field.is_found() {
                report.push(FieldReport {
                    key: spec.key.clone(),
                    widget: WidgetType::NotFound,
                    outcome: FillOutcome::absent(),
                    error: None,
                });
                continue;
            }

            let value = spec.value_for(country, &found);
            found.insert(spec.key.clone());

            let (outcome, error) = match self.fill(&field, &value).await {
                Ok(outcome) => (outcome, None),
                Err(e) => {
                    warn!(key = %spec.key, widget = %field.widget(), error = %e, "fill failed");
                    (FillOutcome::unfilled(), Some(e.to_string()))
                }
            };
            info!(
                key = %spec.key,
                widget = %field.widget(),
                filled = outcome.is_filled(),
                already_correct = outcome.is_already_correct(),
                "field processed"
            );
            report.push(FieldReport {
                key: spec.key.clone(),
                widget: field.widget(),
                outcome,
                error,
            });
        }
        report
    }
}

impl Default for FormFiller {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
