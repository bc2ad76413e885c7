use serde::Serialize;
use utoipa::ToSchema;

use crate::notify::Toast;

#[derive(Debug, Serialize, ToSchema)]
pub struct ToastList {
    /// Oldest first.
    pub items: Vec<Toast>,
}
