//! Budget line item data structures, category classification and loading

pub mod category;
mod item;
pub mod loader;

pub use category::{section_for, Activity, CategoryPath, LineKind, SectionId};
pub use item::{
    BudgetLineItem, Container, CpmFields, CurveProfile, EscalationMethod, ItemTiming, TimingMethod,
};
pub use loader::{load_items, load_items_auto, load_items_from_reader, load_items_json, load_portfolio, ProjectBudget};
