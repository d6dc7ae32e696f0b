pub mod domain;
pub mod error;
pub mod frame_state;
pub mod lineage;
pub mod protocol;
