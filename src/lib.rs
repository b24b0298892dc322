pub mod browser;
pub mod classifier;
pub mod config;
pub mod contexts;
pub mod country;
mod dom_script;
pub mod driver;
pub mod element;
pub mod engine;
pub mod error;
pub mod field;
pub mod fill;
pub mod locator;
pub mod page;
pub mod plan;
pub mod query;
pub mod registry;
pub mod report;
pub mod similarity;
pub mod wait;

pub use browser::FormBrowser;
pub use classifier::WidgetType;
pub use config::{BrowserConfig, EngineBuilder, EngineConfig};
pub use country::{detect_country, CountryKeywords};
pub use driver::{Context, Document, ElementHandle, Handle, SearchContext};
pub use engine::FormFiller;
pub use error::{Error, Result};
pub use field::{Field, FieldValue, FillOutcome};
pub use page::Page;
pub use plan::{FieldSpec, FillPlan};
pub use registry::FillerRegistry;
pub use report::{FieldReport, FillReport};
