pub mod client;
pub mod poller;
pub mod user_list;

pub use client::{ApiClient, PanelApi};
pub use poller::{PollerState, ProgressPoller, ProgressSink};
pub use user_list::{PageItem, PageView, Pagination, RowView, Selection, UserListModel};
