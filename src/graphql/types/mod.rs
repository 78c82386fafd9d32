pub mod connection;
pub mod custom_filter;
pub mod data_source;
pub mod group;
pub mod group_individual;
pub mod individual;
pub mod mutation;

pub use connection::*;
pub use custom_filter::*;
pub use data_source::*;
pub use group::*;
pub use group_individual::*;
pub use individual::*;
pub use mutation::*;
