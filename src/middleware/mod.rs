pub mod context;
pub mod gate;
pub mod sessions;

pub use context::{sign_in, sign_out, Identity, RequestContext};
pub use gate::{admin_gate, model_view_gate, Gate};
pub use sessions::SessionRecords;
