pub mod scp_request;
pub mod scp_route;
