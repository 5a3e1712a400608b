mod write_gate;

pub use write_gate::{ensure_write_allowed, validate_maintenance};
