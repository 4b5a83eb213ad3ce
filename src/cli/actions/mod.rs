pub mod server;

/// Actions the binary can dispatch to.
#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}
