pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        redis_url: Option<String>,
        environment: String,
        jwt_secret: SecretString,
    },
}
