pub mod composite;
pub mod consts;
pub mod edge;
pub mod error;
pub mod extract;
pub mod filters;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod refine;
pub mod segment;
