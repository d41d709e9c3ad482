use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::user_store::retry::RetryPolicy;

/// Pings tolerated while a freshly built client discovers the deployment.
const INITIAL_PING: RetryPolicy = RetryPolicy {
    max_attempts: 10,
    initial_backoff: Duration::from_millis(250),
    max_backoff: Duration::from_secs(5),
};

/// Build a client for `database_name` and return once the server answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut delay = INITIAL_PING.initial_backoff;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let Err(err) = database.run_command(doc! { "ping": 1 }).await else {
            return Ok((client, database));
        };
        if attempts >= INITIAL_PING.max_attempts {
            return Err(MongoDaoError::InitialPing {
                attempts,
                source: err,
            });
        }
        debug!(attempts, database = database_name, error = %err, "MongoDB not reachable yet");
        sleep(delay).await;
        delay = INITIAL_PING.next_backoff(delay);
    }
}
