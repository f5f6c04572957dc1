pub mod chart_options;
pub mod chart_state;
pub mod error;
pub mod export;
pub mod fragment;
pub mod geo;
pub mod measure;
pub mod options;
pub mod ordering;
pub mod panels;
pub mod spending;
pub mod template;
pub mod transform;

pub use chart_options::{ChartOptions, graph_options};
pub use chart_state::ChartState;
pub use error::DashboardError;
pub use measure::{GlobalMeasure, MeasureRecord, MeasuresPayload, PanelMeasure};
pub use options::{Options, OrgType, RollUpBy};
pub use ordering::{Slot, SortOrder, SortOrderings};
pub use transform::{GlobalCentiles, PreparedMeasures, prepare};
