mod management_client_builder;
mod management_client_error;
mod management_client_handle;

pub use management_client_builder::*;
pub use management_client_error::*;
pub use management_client_handle::*;
