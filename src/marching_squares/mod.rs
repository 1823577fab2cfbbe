//! Marching squares terrain algorithm: case selection, plan building,
//! vertex encoding and watertightness checks.
mod boundary;
mod cases;
mod cell_context;
mod plan;
mod primitives;
mod types;
mod validator;
mod vertex;

pub use boundary::*;
pub use cases::{generate_cell, generate_cell_traced, match_case, CaseId, CellOutcome};
pub use cell_context::{CellContext, CornerPaint, CORNER_A, CORNER_B, CORNER_C, CORNER_D};
pub use types::*;
pub use validator::*;
