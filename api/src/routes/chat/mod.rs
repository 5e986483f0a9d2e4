pub mod chat_request;
pub mod joke_route;
pub mod role_play_route;
