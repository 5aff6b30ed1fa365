pub mod next;
pub mod plan;
