//! Console core: row reconciliation, keyword highlighting and the pure
//! state machine behind the log search view.
mod effect;
mod highlight;
mod loading;
mod msg;
mod reconcile;
mod row;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use highlight::{highlight, Segment};
pub use loading::LoadingTracker;
pub use msg::Msg;
pub use reconcile::{classify, dedupe_by_key, reconcile, Merge};
pub use row::{Keyed, LogRow, RowKey, RowSet};
pub use state::{
    AppState, FetchOrigin, ProcessId, SearchQuery, TaskOutcome, TaskStatus, DEFAULT_PAGE_SIZE,
};
pub use update::update;
pub use view_model::{AppViewModel, CellView, LogRowView, TaskRowView};
