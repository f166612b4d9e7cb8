pub mod bundle;
pub mod get_tx;
pub mod index;
pub mod leader;
pub mod post_tx;
pub mod status;
pub mod validator;
