pub mod context;
pub mod errors;
pub mod loaders;
pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

pub use context::{GraphQLContext, RequestSession};
pub use schema::{build_schema, GraphQLSchema};
