pub mod dispatcher;
pub mod model;
